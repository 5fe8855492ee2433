//! The services the plugin runtime hands to `lefty_mod_init`.

use core::ffi::{c_int, c_void};
use winapi::shared::minwindef::{BOOL, FALSE};

use widestring::U16CString;

use lefty_taskbar::settings::{ModSettings, Settings};
use lefty_taskbar::windows::FunctionHooker;

use crate::log_win::HostLogFn;

pub type GetIntSettingFn = unsafe extern "system" fn(name: *const u16) -> c_int;
pub type SetFunctionHookFn = unsafe extern "system" fn(
    target: *mut c_void,
    hook: *mut c_void,
    original: *mut *mut c_void,
) -> BOOL;

/// Function table supplied by the host. Any entry may be null.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct HostApi {
    pub get_int_setting: Option<GetIntSettingFn>,
    pub set_function_hook: Option<SetFunctionHookFn>,
    pub log: Option<HostLogFn>,
}

/// The host's settings storage.
#[derive(Clone, Copy)]
pub struct HostSettings {
    get_int_setting: Option<GetIntSettingFn>,
}

impl HostSettings {
    pub fn new(host: &HostApi) -> Self {
        Self {
            get_int_setting: host.get_int_setting,
        }
    }
}

impl Settings for HostSettings {
    fn get_bool(&self, name: &str) -> bool {
        let Some(get_int_setting) = self.get_int_setting else {
            log::warn!("host has no settings storage, using defaults");
            return ModSettings::default().force_left;
        };
        let name = U16CString::from_str_truncate(name);
        unsafe { get_int_setting(name.as_ptr()) != 0 }
    }
}

/// The host's function hooking facility.
#[derive(Clone, Copy)]
pub struct HostHooker {
    set_function_hook: Option<SetFunctionHookFn>,
}

impl HostHooker {
    pub fn new(host: &HostApi) -> Self {
        Self {
            set_function_hook: host.set_function_hook,
        }
    }
}

impl FunctionHooker for HostHooker {
    unsafe fn set_function_hook(
        &self,
        target: *mut c_void,
        detour: *mut c_void,
        original: *mut *mut c_void,
    ) -> bool {
        match self.set_function_hook {
            Some(hook) => unsafe { hook(target, detour, original) != FALSE },
            None => false,
        }
    }
}
