//! Durable writes of the alignment and the broadcast that makes Explorer
//! re-read it.

use std::time::Duration;

use crate::error::StoreError;
use crate::registry::*;
use crate::watched::{ADVANCED_SUBKEY, TASKBAR_AL};

/// Settings area named in the change broadcast.
pub const BROADCAST_SCOPE: &str = "TraySettings";

/// Upper bound on how long a hung top-level window can hold up a broadcast.
pub const BROADCAST_TIMEOUT: Duration = Duration::from_millis(200);

/// Unintercepted access to the watched value.
pub trait AlignmentStore {
    fn read(&self) -> Result<u32, StoreError>;
    fn write(&self, value: u32) -> Result<(), StoreError>;
}

impl<T: AlignmentStore + ?Sized> AlignmentStore for &T {
    fn read(&self) -> Result<u32, StoreError> {
        (**self).read()
    }

    fn write(&self, value: u32) -> Result<(), StoreError> {
        (**self).write(value)
    }
}

/// [`AlignmentStore`] over registry entry points that are not hooked.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore<A> {
    api: A,
}

impl<A> RegistryStore<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: RegistryApi + RegistryWrite> AlignmentStore for RegistryStore<A> {
    fn read(&self) -> Result<u32, StoreError> {
        let mut buf = [0u8; DWORD_LEN];
        let mut len = DWORD_LEN as u32;
        let mut out = ValueOut::new(None, Some(&mut buf), Some(&mut len));
        let status = self.api.get_value(
            HKEY_CURRENT_USER,
            Some(ADVANCED_SUBKEY),
            Some(TASKBAR_AL),
            RRF_RT_REG_DWORD,
            &mut out,
        );
        match status {
            ERROR_SUCCESS => Ok(u32::from_ne_bytes(buf)),
            ERROR_FILE_NOT_FOUND => Err(StoreError::NotFound),
            ERROR_UNSUPPORTED_TYPE => Err(StoreError::WrongType),
            s => Err(StoreError::Read(s)),
        }
    }

    fn write(&self, value: u32) -> Result<(), StoreError> {
        match self
            .api
            .write_dword(HKEY_CURRENT_USER, ADVANCED_SUBKEY, TASKBAR_AL, value)
        {
            ERROR_SUCCESS => Ok(()),
            s => Err(StoreError::Write(s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    /// Some listener did not answer within the timeout.
    TimedOut,
}

/// System-wide "settings changed" broadcast.
pub trait Notifier {
    fn notify_settings_changed(&self, scope: &str, timeout: Duration) -> NotifyOutcome;
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify_settings_changed(&self, scope: &str, timeout: Duration) -> NotifyOutcome {
        (**self).notify_settings_changed(scope, timeout)
    }
}

/// Stores `value` and, if that worked, tells listeners to refresh.
///
/// Failures are logged and dropped; there is no retry. A broadcast timeout
/// still counts as applied since the store already holds the value. Returns
/// whether the value was stored.
pub fn apply_value(store: &impl AlignmentStore, notifier: &impl Notifier, value: u32) -> bool {
    if let Err(e) = store.write(value) {
        log::error!("could not write TaskbarAl={value}: {e}");
        return false;
    }
    log::info!("wrote TaskbarAl={value}");
    match notifier.notify_settings_changed(BROADCAST_SCOPE, BROADCAST_TIMEOUT) {
        NotifyOutcome::Delivered => log::debug!("{BROADCAST_SCOPE} change broadcast delivered"),
        NotifyOutcome::TimedOut => {
            log::debug!("{BROADCAST_SCOPE} change broadcast timed out, value is stored anyway")
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{RecordingNotifier, SimRegistry};

    #[test]
    fn write_then_broadcast() {
        let reg = SimRegistry::with_alignment(1);
        let notifier = RecordingNotifier::new();
        assert!(apply_value(&reg.store(), &notifier, 0));
        assert_eq!(reg.alignment(), Some(0));
        assert_eq!(notifier.scopes(), vec![BROADCAST_SCOPE.to_string()]);
        assert_eq!(notifier.timeouts(), vec![BROADCAST_TIMEOUT]);
    }

    #[test]
    fn write_creates_missing_key() {
        let reg = SimRegistry::new();
        let notifier = RecordingNotifier::new();
        assert!(apply_value(&reg.store(), &notifier, 2));
        assert_eq!(reg.alignment(), Some(2));
        assert_eq!(reg.store().read(), Ok(2));
    }

    #[test]
    fn failed_write_does_not_broadcast() {
        let reg = SimRegistry::with_alignment(1);
        reg.fail_writes(true);
        let notifier = RecordingNotifier::new();
        assert!(!apply_value(&reg.store(), &notifier, 0));
        assert_eq!(reg.alignment(), Some(1));
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn broadcast_timeout_still_counts_as_applied() {
        let reg = SimRegistry::with_alignment(1);
        let notifier = RecordingNotifier::timing_out();
        assert!(apply_value(&reg.store(), &notifier, 0));
        assert_eq!(reg.alignment(), Some(0));
        assert_eq!(notifier.count(), 1);
    }

    #[test]
    fn read_reports_missing_and_mistyped_values() {
        let reg = SimRegistry::new();
        assert_eq!(reg.store().read(), Err(StoreError::NotFound));
        reg.set_raw_value(ADVANCED_SUBKEY, TASKBAR_AL, REG_BINARY, vec![1, 0, 0, 0]);
        assert_eq!(reg.store().read(), Err(StoreError::WrongType));
    }
}
