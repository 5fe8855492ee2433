//! In-memory stand-ins for the registry, the broadcast, the host settings and
//! the hooking facility.
//!
//! [`SimRegistry`] follows the Win32 rules the interception layer relies on:
//! handles are allocated from a free list and a closed handle value is the
//! next one handed out, a read with no buffer reports the required size, and a
//! buffer that is too small yields `ERROR_MORE_DATA`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use widestring::U16CStr;

use crate::error::HookError;
use crate::hooks::{HOOKED_FUNCTIONS, HookInstaller, HookReport};
use crate::propagate::{NotifyOutcome, Notifier, RegistryStore};
use crate::registry::*;
use crate::settings::{FORCE_LEFT, Settings};
use crate::state::OverrideState;
use crate::watched::{ADVANCED_SUBKEY, TASKBAR_AL};

const FIRST_HANDLE: isize = 0x100;

fn lower(s: &U16CStr) -> String {
    s.to_string_lossy().to_ascii_lowercase()
}

#[derive(Debug, Default)]
struct SimState {
    keys: FxHashSet<String>,
    values: FxHashMap<(String, String), (u32, Vec<u8>)>,
    open: FxHashMap<KeyHandle, String>,
    free: Vec<KeyHandle>,
    next: isize,
    writes: Vec<u32>,
}

impl SimState {
    /// Path of `root\sub_key`, `None` for an unknown root handle.
    fn resolve(&self, root: KeyHandle, sub_key: Option<&U16CStr>) -> Option<String> {
        let base = if root == HKEY_CURRENT_USER {
            String::new()
        } else {
            self.open.get(&root)?.clone()
        };
        Some(match sub_key.map(lower).filter(|s| !s.is_empty()) {
            Some(sub) if base.is_empty() => sub,
            Some(sub) => format!(r"{base}\{sub}"),
            None => base,
        })
    }

    fn key_exists(&self, path: &str) -> bool {
        path.is_empty() || self.keys.contains(path)
    }

    fn allocate(&mut self, path: String) -> KeyHandle {
        let handle = self.free.pop().unwrap_or_else(|| {
            self.next += 4;
            KeyHandle(FIRST_HANDLE + self.next)
        });
        self.open.insert(handle, path);
        handle
    }
}

fn fill(out: &mut ValueOut<'_>, ty: u32, bytes: &[u8]) -> Status {
    if let Some(t) = out.ty.as_deref_mut() {
        *t = ty;
    }
    let needed = bytes.len() as u32;
    match (out.data.as_deref_mut(), out.len.as_deref_mut()) {
        (None, Some(len)) => {
            *len = needed;
            ERROR_SUCCESS
        }
        (None, None) => ERROR_SUCCESS,
        (Some(_), None) => ERROR_INVALID_PARAMETER,
        (Some(buf), Some(len)) => {
            let capacity = (*len as usize).min(buf.len());
            *len = needed;
            if bytes.len() > capacity {
                ERROR_MORE_DATA
            } else {
                buf[..bytes.len()].copy_from_slice(bytes);
                ERROR_SUCCESS
            }
        }
    }
}

/// In-memory `HKEY_CURRENT_USER` hive.
#[derive(Debug, Default)]
pub struct SimRegistry {
    state: Mutex<SimState>,
    fail_writes: AtomicBool,
}

impl SimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alignment(value: u32) -> Self {
        let reg = Self::new();
        reg.set_alignment(value);
        reg
    }

    /// Stores a value the way another program would, bypassing the write
    /// history.
    pub fn set_raw_value(&self, sub_key: &U16CStr, name: &U16CStr, ty: u32, bytes: Vec<u8>) {
        let mut st = self.state.lock();
        let key = lower(sub_key);
        st.keys.insert(key.clone());
        st.values.insert((key, lower(name)), (ty, bytes));
    }

    pub fn set_alignment(&self, value: u32) {
        self.set_raw_value(ADVANCED_SUBKEY, TASKBAR_AL, REG_DWORD, value.to_ne_bytes().to_vec());
    }

    pub fn alignment(&self) -> Option<u32> {
        let st = self.state.lock();
        match st.values.get(&(lower(ADVANCED_SUBKEY), lower(TASKBAR_AL))) {
            Some((REG_DWORD, bytes)) if bytes.len() == DWORD_LEN => {
                let mut b = [0u8; DWORD_LEN];
                b.copy_from_slice(bytes);
                Some(u32::from_ne_bytes(b))
            }
            _ => None,
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Values written through [`RegistryWrite`], oldest first.
    pub fn writes(&self) -> Vec<u32> {
        self.state.lock().writes.clone()
    }

    pub fn open_handles(&self) -> usize {
        self.state.lock().open.len()
    }

    pub fn store(&self) -> RegistryStore<&Self> {
        RegistryStore::new(self)
    }
}

impl RegistryApi for SimRegistry {
    fn open_key(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        _options: u32,
        _access: u32,
        result: Option<&mut KeyHandle>,
    ) -> Status {
        let Some(result) = result else {
            return ERROR_INVALID_PARAMETER;
        };
        let mut st = self.state.lock();
        let Some(path) = st.resolve(root, sub_key) else {
            return ERROR_INVALID_HANDLE;
        };
        if !st.key_exists(&path) {
            return ERROR_FILE_NOT_FOUND;
        }
        *result = st.allocate(path);
        ERROR_SUCCESS
    }

    fn query_value(
        &self,
        key: KeyHandle,
        value_name: Option<&U16CStr>,
        out: &mut ValueOut<'_>,
    ) -> Status {
        let st = self.state.lock();
        let Some(path) = st.resolve(key, None) else {
            return ERROR_INVALID_HANDLE;
        };
        let name = value_name.map(lower).unwrap_or_default();
        match st.values.get(&(path, name)) {
            Some((ty, bytes)) => fill(out, *ty, bytes),
            None => ERROR_FILE_NOT_FOUND,
        }
    }

    fn get_value(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        value_name: Option<&U16CStr>,
        flags: u32,
        out: &mut ValueOut<'_>,
    ) -> Status {
        let st = self.state.lock();
        let Some(path) = st.resolve(root, sub_key) else {
            return ERROR_INVALID_HANDLE;
        };
        if !st.key_exists(&path) {
            return ERROR_FILE_NOT_FOUND;
        }
        let name = value_name.map(lower).unwrap_or_default();
        let Some((ty, bytes)) = st.values.get(&(path, name)) else {
            return ERROR_FILE_NOT_FOUND;
        };
        if flags & RRF_RT_ANY != RRF_RT_ANY && flags & 1u32.checked_shl(*ty).unwrap_or(0) == 0 {
            return ERROR_UNSUPPORTED_TYPE;
        }
        fill(out, *ty, bytes)
    }

    fn close_key(&self, key: KeyHandle) -> Status {
        if key == HKEY_CURRENT_USER {
            return ERROR_SUCCESS;
        }
        let mut st = self.state.lock();
        if st.open.remove(&key).is_some() {
            st.free.push(key);
            ERROR_SUCCESS
        } else {
            ERROR_INVALID_HANDLE
        }
    }
}

impl RegistryWrite for SimRegistry {
    fn write_dword(
        &self,
        root: KeyHandle,
        sub_key: &U16CStr,
        value_name: &U16CStr,
        value: u32,
    ) -> Status {
        if self.fail_writes.load(Ordering::SeqCst) {
            return ERROR_ACCESS_DENIED;
        }
        let mut st = self.state.lock();
        let Some(path) = st.resolve(root, Some(sub_key)) else {
            return ERROR_INVALID_HANDLE;
        };
        st.keys.insert(path.clone());
        st.values
            .insert((path, lower(value_name)), (REG_DWORD, value.to_ne_bytes().to_vec()));
        st.writes.push(value);
        ERROR_SUCCESS
    }
}

/// Notifier that records every broadcast.
#[derive(Debug)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(String, Duration)>>,
    outcome: NotifyOutcome,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(vec![]),
            outcome: NotifyOutcome::Delivered,
        }
    }

    /// Every broadcast behaves as if a listener hung.
    pub fn timing_out() -> Self {
        Self {
            outcome: NotifyOutcome::TimedOut,
            ..Self::new()
        }
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn scopes(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.calls.lock().iter().map(|(_, t)| *t).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_settings_changed(&self, scope: &str, timeout: Duration) -> NotifyOutcome {
        self.calls.lock().push((scope.to_string(), timeout));
        self.outcome
    }
}

/// Host settings held in memory.
#[derive(Debug, Default)]
pub struct SimSettings {
    force_left: AtomicBool,
}

impl SimSettings {
    pub fn new(force_left: bool) -> Self {
        Self {
            force_left: AtomicBool::new(force_left),
        }
    }

    pub fn set_force_left(&self, on: bool) {
        self.force_left.store(on, Ordering::SeqCst);
    }
}

impl Settings for SimSettings {
    fn get_bool(&self, name: &str) -> bool {
        match name {
            FORCE_LEFT => self.force_left.load(Ordering::SeqCst),
            _ => false,
        }
    }
}

/// Hook installer that hands the shared state back to the test instead of
/// patching anything.
#[derive(Debug, Default)]
pub struct SimHooks {
    fail: bool,
    installs: usize,
    state: Option<Arc<OverrideState>>,
}

impl SimHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn installs(&self) -> usize {
        self.installs
    }

    pub fn installed_state(&self) -> Option<&Arc<OverrideState>> {
        self.state.as_ref()
    }
}

impl HookInstaller for SimHooks {
    fn install(&mut self, state: &Arc<OverrideState>) -> Result<HookReport, HookError> {
        self.installs += 1;
        if self.fail {
            return Err(HookError::ModuleNotFound("advapi32.dll"));
        }
        self.state = Some(state.clone());
        Ok(HookReport {
            installed: HOOKED_FUNCTIONS.to_vec(),
            failed: vec![],
        })
    }
}
