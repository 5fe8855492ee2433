use std::time::Duration;

use widestring::U16CString;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    HWND_BROADCAST, SMTO_ABORTIFHUNG, SendMessageTimeoutW, WM_SETTINGCHANGE,
};

use crate::propagate::{Notifier, NotifyOutcome};

/// `WM_SETTINGCHANGE` sent to every top-level window, skipping hung ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastNotifier;

impl Notifier for BroadcastNotifier {
    fn notify_settings_changed(&self, scope: &str, timeout: Duration) -> NotifyOutcome {
        let scope = U16CString::from_str_truncate(scope);
        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        let mut result = 0usize;
        let sent = unsafe {
            SendMessageTimeoutW(
                HWND_BROADCAST,
                WM_SETTINGCHANGE,
                0,
                scope.as_ptr() as isize,
                SMTO_ABORTIFHUNG,
                timeout_ms,
                &mut result,
            )
        };
        if sent == 0 {
            NotifyOutcome::TimedOut
        } else {
            NotifyOutcome::Delivered
        }
    }
}
