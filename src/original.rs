use once_cell::sync::OnceCell;

use crate::propagate::AlignmentStore;
use crate::watched::DEFAULT_ORIGINAL;

/// The alignment that was stored before the override first took effect.
///
/// Set at most once per process. A failed capture leaves it unset so a later
/// call can try again.
#[derive(Debug, Default)]
pub struct OriginalValue {
    value: OnceCell<u32>,
}

impl OriginalValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the stored value through `store` unless one was already captured.
    /// Returns whether a value is captured after the call.
    pub fn capture_once(&self, store: &impl AlignmentStore) -> bool {
        if let Some(v) = self.value.get() {
            log::trace!("original alignment already captured: {v}");
            return true;
        }
        match store.read() {
            Ok(v) => {
                if self.value.set(v).is_ok() {
                    log::info!("saved original TaskbarAl={v}");
                }
                true
            }
            Err(e) => {
                log::warn!("could not capture original alignment, will retry later: {e}");
                false
            }
        }
    }

    pub fn is_captured(&self) -> bool {
        self.value.get().is_some()
    }

    pub fn captured(&self) -> Option<u32> {
        self.value.get().copied()
    }

    /// Captured value, or [`DEFAULT_ORIGINAL`] when nothing was captured.
    pub fn value(&self) -> u32 {
        self.captured().unwrap_or(DEFAULT_ORIGINAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimRegistry;

    #[test]
    fn captures_once() {
        let reg = SimRegistry::with_alignment(2);
        let original = OriginalValue::new();
        assert!(original.capture_once(&reg.store()));
        reg.set_alignment(0);
        assert!(original.capture_once(&reg.store()));
        assert_eq!(original.captured(), Some(2));
        assert_eq!(original.value(), 2);
    }

    #[test]
    fn failed_capture_is_retried() {
        let reg = SimRegistry::new();
        let original = OriginalValue::new();
        assert!(!original.capture_once(&reg.store()));
        assert!(!original.is_captured());
        assert_eq!(original.value(), DEFAULT_ORIGINAL);

        reg.set_alignment(0);
        assert!(original.capture_once(&reg.store()));
        assert_eq!(original.captured(), Some(0));
    }

    #[test]
    fn wrong_type_is_not_captured() {
        let reg = SimRegistry::new();
        reg.set_raw_value(
            crate::watched::ADVANCED_SUBKEY,
            crate::watched::TASKBAR_AL,
            crate::registry::REG_SZ,
            b"1\0\0\0".to_vec(),
        );
        let original = OriginalValue::new();
        assert!(!original.capture_once(&reg.store()));
        assert_eq!(original.value(), DEFAULT_ORIGINAL);
    }
}
