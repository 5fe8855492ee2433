//! The functions the host patches into advapi32's registry entry points, and
//! the installer that asks the host to do so.

use core::ffi::c_void;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::AtomicPtr;

use once_cell::sync::OnceCell;
use widestring::{U16CStr, u16cstr};
use windows_sys::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress, LoadLibraryW};

use super::trampolines::*;
use crate::error::HookError;
use crate::hooks::{HookInstaller, HookReport};
use crate::intercept::Interceptor;
use crate::registry::{KeyHandle, RegistryApi, ValueOut, needs_raw_passthrough};
use crate::state::OverrideState;

static INTERCEPTOR: OnceCell<Interceptor<Trampolines>> = OnceCell::new();

/// What the detours forward to: the interceptor once installed, the
/// originals before that.
pub fn interceptor() -> &'static dyn RegistryApi {
    match INTERCEPTOR.get() {
        Some(i) => i,
        None => &Trampolines,
    }
}

/// The host's function hooking facility.
pub trait FunctionHooker {
    /// Redirects `target` to `detour`. The host stores the address to call the
    /// original through in `*original` before the detour can first run.
    ///
    /// # Safety
    ///
    /// `target` and `detour` must be functions of the same signature and
    /// `original` must stay valid for the life of the hook.
    unsafe fn set_function_hook(
        &self,
        target: *mut c_void,
        detour: *mut c_void,
        original: *mut *mut c_void,
    ) -> bool;
}

unsafe fn wide<'a>(p: *const u16) -> Option<&'a U16CStr> {
    if p.is_null() {
        None
    } else {
        Some(unsafe { U16CStr::from_ptr_str(p) })
    }
}

unsafe extern "system" fn reg_open_key_ex_w(
    hkey: isize,
    sub_key: *const u16,
    options: u32,
    sam_desired: u32,
    result: *mut isize,
) -> u32 {
    let sub_key = unsafe { wide(sub_key) };
    let result = unsafe { result.cast::<KeyHandle>().as_mut() };
    interceptor().open_key(KeyHandle(hkey), sub_key, options, sam_desired, result)
}

unsafe extern "system" fn reg_query_value_ex_w(
    hkey: isize,
    value_name: *const u16,
    reserved: *const u32,
    ty: *mut u32,
    data: *mut u8,
    cb_data: *mut u32,
) -> u32 {
    // Calls the OS rejects anyway: let it do so with the caller's own pointers.
    if needs_raw_passthrough(reserved, data.cast_const(), cb_data.cast_const()) {
        return unsafe { query_fn()(hkey, value_name, reserved, ty, data, cb_data) };
    }
    let value_name = unsafe { wide(value_name) };
    let mut out = unsafe { ValueOut::from_raw(ty, data, cb_data) };
    interceptor().query_value(KeyHandle(hkey), value_name, &mut out)
}

unsafe extern "system" fn reg_get_value_w(
    hkey: isize,
    sub_key: *const u16,
    value: *const u16,
    flags: u32,
    ty: *mut u32,
    data: *mut c_void,
    cb_data: *mut u32,
) -> u32 {
    if needs_raw_passthrough(ptr::null(), data.cast_const(), cb_data.cast_const()) {
        return unsafe { get_fn()(hkey, sub_key, value, flags, ty, data, cb_data) };
    }
    let sub_key = unsafe { wide(sub_key) };
    let value = unsafe { wide(value) };
    let mut out = unsafe { ValueOut::from_raw(ty, data.cast::<u8>(), cb_data) };
    interceptor().get_value(KeyHandle(hkey), sub_key, value, flags, &mut out)
}

unsafe extern "system" fn reg_close_key(hkey: isize) -> u32 {
    interceptor().close_key(KeyHandle(hkey))
}

fn advapi32() -> Result<isize, HookError> {
    let name = u16cstr!("advapi32.dll");
    let mut module = unsafe { GetModuleHandleW(name.as_ptr()) };
    if module == 0 {
        module = unsafe { LoadLibraryW(name.as_ptr()) };
    }
    if module == 0 {
        return Err(HookError::ModuleNotFound("advapi32.dll"));
    }
    Ok(module)
}

/// Hooks `RegOpenKeyExW`, `RegQueryValueExW`, `RegGetValueW` and
/// `RegCloseKey` in the current process through the host's hooker.
pub struct AdvapiHooks<H> {
    hooker: H,
}

impl<H: FunctionHooker> AdvapiHooks<H> {
    pub fn new(hooker: H) -> Self {
        Self { hooker }
    }
}

impl<H: FunctionHooker> HookInstaller for AdvapiHooks<H> {
    fn install(&mut self, state: &Arc<OverrideState>) -> Result<HookReport, HookError> {
        if INTERCEPTOR
            .set(Interceptor::new(state.clone(), Trampolines))
            .is_err()
        {
            log::warn!("interceptor already set in this process, keeping the existing state");
        }
        let module = advapi32()?;

        let table: [(&'static str, &'static [u8], *mut c_void, &'static AtomicPtr<c_void>); 4] = [
            (
                "RegOpenKeyExW",
                b"RegOpenKeyExW\0",
                reg_open_key_ex_w as RegOpenKeyExWFn as *mut c_void,
                &ORIGINAL_OPEN,
            ),
            (
                "RegQueryValueExW",
                b"RegQueryValueExW\0",
                reg_query_value_ex_w as RegQueryValueExWFn as *mut c_void,
                &ORIGINAL_QUERY,
            ),
            (
                "RegGetValueW",
                b"RegGetValueW\0",
                reg_get_value_w as RegGetValueWFn as *mut c_void,
                &ORIGINAL_GET,
            ),
            (
                "RegCloseKey",
                b"RegCloseKey\0",
                reg_close_key as RegCloseKeyFn as *mut c_void,
                &ORIGINAL_CLOSE,
            ),
        ];

        let mut report = HookReport::default();
        for (name, proc_name, detour, slot) in table {
            let Some(target) = (unsafe { GetProcAddress(module, proc_name.as_ptr()) }) else {
                log::warn!("{name} not exported by advapi32.dll");
                report.failed.push(name);
                continue;
            };
            let hooked = unsafe {
                self.hooker
                    .set_function_hook(target as *mut c_void, detour, slot.as_ptr())
            };
            if hooked {
                log::debug!("hooked {name}");
                report.installed.push(name);
            } else {
                log::warn!("host refused to hook {name}");
                report.failed.push(name);
            }
        }
        if report.installed.is_empty() {
            return Err(HookError::NothingHooked);
        }
        Ok(report)
    }
}
