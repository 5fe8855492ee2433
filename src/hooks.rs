//! Seam between the lifecycle controller and the platform hooking facility.

use std::fmt;
use std::sync::Arc;

use crate::error::HookError;
use crate::state::OverrideState;

/// Names of the entry points the interception layer hooks.
pub const HOOKED_FUNCTIONS: [&str; 4] = [
    "RegOpenKeyExW",
    "RegQueryValueExW",
    "RegGetValueW",
    "RegCloseKey",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookReport {
    pub installed: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

impl HookReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.installed.len() == HOOKED_FUNCTIONS.len()
    }
}

impl fmt::Display for HookReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "hooked [{}]", self.installed.join(", "))?;
        if !self.failed.is_empty() {
            write!(f, ", failed [{}]", self.failed.join(", "))?;
        }
        Ok(())
    }
}

/// Redirects the registry entry points of the host process into an
/// [`crate::intercept::Interceptor`] sharing `state`.
pub trait HookInstaller {
    fn install(&mut self, state: &Arc<OverrideState>) -> Result<HookReport, HookError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_display() {
        let r = HookReport {
            installed: vec!["RegOpenKeyExW", "RegCloseKey"],
            failed: vec!["RegGetValueW"],
        };
        assert!(!r.is_complete());
        assert_eq!(
            r.to_string(),
            "hooked [RegOpenKeyExW, RegCloseKey], failed [RegGetValueW]"
        );
        let full = HookReport {
            installed: HOOKED_FUNCTIONS.to_vec(),
            failed: vec![],
        };
        assert!(full.is_complete());
    }
}
