//! The four intercepted registry entry points.
//!
//! [`Interceptor`] wraps the original functions and is itself a
//! [`RegistryApi`], so the Windows detours forward to it and tests drive it
//! directly over [`crate::simulated::SimRegistry`]. Every call reaches the
//! original first; return codes and out-parameters are only ever changed for a
//! successful read of `TaskbarAl` on the watched key while left alignment is
//! forced.

use std::sync::Arc;

use widestring::U16CStr;

use crate::override_value::force_value;
use crate::registry::*;
use crate::state::OverrideState;
use crate::watched::{is_watched_field, is_watched_key};

pub struct Interceptor<A> {
    state: Arc<OverrideState>,
    original: A,
}

impl<A: RegistryApi> Interceptor<A> {
    pub fn new(state: Arc<OverrideState>, original: A) -> Self {
        Self { state, original }
    }
}

impl<A: RegistryApi> RegistryApi for Interceptor<A> {
    fn open_key(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        options: u32,
        access: u32,
        mut result: Option<&mut KeyHandle>,
    ) -> Status {
        let status = self
            .original
            .open_key(root, sub_key, options, access, result.as_deref_mut());
        if status == ERROR_SUCCESS && self.state.force_left() && is_watched_key(root, sub_key) {
            if let Some(handle) = result.as_deref().copied() {
                log::trace!("tracking watched key handle {handle:?}");
                self.state.tracker.track(handle);
            }
        }
        status
    }

    fn query_value(
        &self,
        key: KeyHandle,
        value_name: Option<&U16CStr>,
        out: &mut ValueOut<'_>,
    ) -> Status {
        let status = self.original.query_value(key, value_name, out);
        if status == ERROR_SUCCESS
            && self.state.force_left()
            && self.state.tracker.is_tracked(key)
            && is_watched_field(value_name)
        {
            let (ty, len) = (out.claimed_type(), out.reported_len());
            if force_value(ty, out.data.as_deref_mut(), len) {
                log::trace!("forced TaskbarAl to left on handle {key:?}");
            }
        }
        status
    }

    fn get_value(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        value_name: Option<&U16CStr>,
        flags: u32,
        out: &mut ValueOut<'_>,
    ) -> Status {
        let status = self
            .original
            .get_value(root, sub_key, value_name, flags, out);
        if status == ERROR_SUCCESS
            && self.state.force_left()
            && is_watched_key(root, sub_key)
            && is_watched_field(value_name)
        {
            // A caller restricting the read to REG_DWORD may leave out the
            // type slot; the OS has already rejected any other type.
            let ty = out
                .claimed_type()
                .or_else(|| restricted_to_dword(flags).then_some(REG_DWORD));
            let len = out.reported_len();
            if force_value(ty, out.data.as_deref_mut(), len) {
                log::trace!("forced TaskbarAl to left on path read");
            }
        }
        status
    }

    fn close_key(&self, key: KeyHandle) -> Status {
        // Always forget the handle first: the OS may hand the same value out
        // for an unrelated key as soon as it is closed.
        if self.state.tracker.untrack(key) {
            log::trace!("untracked watched key handle {key:?}");
        }
        self.original.close_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimRegistry;
    use crate::watched::{ADVANCED_SUBKEY, TASKBAR_AL};

    fn forced() -> Arc<OverrideState> {
        let state = Arc::new(OverrideState::new());
        state.set_force_left(true);
        state
    }

    #[test]
    fn open_tracks_only_when_forced() {
        let reg = SimRegistry::with_alignment(1);
        let state = Arc::new(OverrideState::new());
        let icpt = Interceptor::new(state.clone(), &reg);

        let mut h = KeyHandle::default();
        let s = icpt.open_key(HKEY_CURRENT_USER, Some(ADVANCED_SUBKEY), 0, KEY_QUERY_VALUE, Some(&mut h));
        assert_eq!(s, ERROR_SUCCESS);
        assert!(!state.tracker.is_tracked(h));
        icpt.close_key(h);

        state.set_force_left(true);
        let s = icpt.open_key(HKEY_CURRENT_USER, Some(ADVANCED_SUBKEY), 0, KEY_QUERY_VALUE, Some(&mut h));
        assert_eq!(s, ERROR_SUCCESS);
        assert!(state.tracker.is_tracked(h));
    }

    #[test]
    fn failed_open_is_not_tracked() {
        let reg = SimRegistry::new();
        let state = forced();
        let icpt = Interceptor::new(state.clone(), &reg);
        let mut h = KeyHandle::default();
        let s = icpt.open_key(HKEY_CURRENT_USER, Some(ADVANCED_SUBKEY), 0, KEY_QUERY_VALUE, Some(&mut h));
        assert_eq!(s, ERROR_FILE_NOT_FOUND);
        assert!(state.tracker.is_empty());
    }

    #[test]
    fn open_without_result_slot_passes_through() {
        let reg = SimRegistry::with_alignment(1);
        let state = forced();
        let icpt = Interceptor::new(state.clone(), &reg);
        let s = icpt.open_key(HKEY_CURRENT_USER, Some(ADVANCED_SUBKEY), 0, KEY_QUERY_VALUE, None);
        assert_eq!(s, reg.open_key(HKEY_CURRENT_USER, Some(ADVANCED_SUBKEY), 0, KEY_QUERY_VALUE, None));
        assert!(state.tracker.is_empty());
    }

    #[test]
    fn close_untracks_even_when_not_forced() {
        let reg = SimRegistry::with_alignment(1);
        let state = forced();
        let icpt = Interceptor::new(state.clone(), &reg);
        let mut h = KeyHandle::default();
        icpt.open_key(HKEY_CURRENT_USER, Some(ADVANCED_SUBKEY), 0, KEY_QUERY_VALUE, Some(&mut h));
        assert!(state.tracker.is_tracked(h));

        state.set_force_left(false);
        assert_eq!(icpt.close_key(h), ERROR_SUCCESS);
        assert!(state.tracker.is_empty());
        assert_eq!(reg.open_handles(), 0);
    }

    #[test]
    fn close_of_unknown_handle_keeps_original_status() {
        let reg = SimRegistry::new();
        let icpt = Interceptor::new(forced(), &reg);
        assert_eq!(icpt.close_key(KeyHandle(0x7777)), ERROR_INVALID_HANDLE);
    }

    #[test]
    fn query_on_untracked_handle_is_untouched() {
        let reg = SimRegistry::with_alignment(2);
        let state = Arc::new(OverrideState::new());
        let icpt = Interceptor::new(state.clone(), &reg);
        let mut h = KeyHandle::default();
        icpt.open_key(HKEY_CURRENT_USER, Some(ADVANCED_SUBKEY), 0, KEY_QUERY_VALUE, Some(&mut h));
        // Flag flips on after the key was opened: this handle stays unknown.
        state.set_force_left(true);

        let (mut ty, mut buf, mut len) = (0u32, [0u8; 4], 4u32);
        let mut out = ValueOut::new(Some(&mut ty), Some(&mut buf), Some(&mut len));
        assert_eq!(icpt.query_value(h, Some(TASKBAR_AL), &mut out), ERROR_SUCCESS);
        assert_eq!(u32::from_ne_bytes(buf), 2);
    }
}
