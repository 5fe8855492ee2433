//! Calls into the original, unhooked registry functions.
//!
//! Once a hook is installed the host writes the address of its trampoline into
//! the matching slot below. Until then the slot is null and the import from
//! advapi32 is called directly, which is the unhooked function at that point.

use core::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use widestring::U16CStr;
use windows_sys::Win32::System::Registry::{
    REG_OPTION_NON_VOLATILE, RegCloseKey, RegCreateKeyExW, RegGetValueW, RegOpenKeyExW,
    RegQueryValueExW, RegSetValueExW,
};

use crate::registry::*;

pub(super) type RegOpenKeyExWFn =
    unsafe extern "system" fn(isize, *const u16, u32, u32, *mut isize) -> u32;
pub(super) type RegQueryValueExWFn =
    unsafe extern "system" fn(isize, *const u16, *const u32, *mut u32, *mut u8, *mut u32) -> u32;
pub(super) type RegGetValueWFn = unsafe extern "system" fn(
    isize,
    *const u16,
    *const u16,
    u32,
    *mut u32,
    *mut c_void,
    *mut u32,
) -> u32;
pub(super) type RegCloseKeyFn = unsafe extern "system" fn(isize) -> u32;

pub(super) static ORIGINAL_OPEN: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());
pub(super) static ORIGINAL_QUERY: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());
pub(super) static ORIGINAL_GET: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());
pub(super) static ORIGINAL_CLOSE: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());

pub(super) fn open_fn() -> RegOpenKeyExWFn {
    let p = ORIGINAL_OPEN.load(Ordering::Acquire);
    if p.is_null() {
        RegOpenKeyExW
    } else {
        unsafe { std::mem::transmute::<*mut c_void, RegOpenKeyExWFn>(p) }
    }
}

pub(super) fn query_fn() -> RegQueryValueExWFn {
    let p = ORIGINAL_QUERY.load(Ordering::Acquire);
    if p.is_null() {
        RegQueryValueExW
    } else {
        unsafe { std::mem::transmute::<*mut c_void, RegQueryValueExWFn>(p) }
    }
}

pub(super) fn get_fn() -> RegGetValueWFn {
    let p = ORIGINAL_GET.load(Ordering::Acquire);
    if p.is_null() {
        RegGetValueW
    } else {
        unsafe { std::mem::transmute::<*mut c_void, RegGetValueWFn>(p) }
    }
}

pub(super) fn close_fn() -> RegCloseKeyFn {
    let p = ORIGINAL_CLOSE.load(Ordering::Acquire);
    if p.is_null() {
        RegCloseKey
    } else {
        unsafe { std::mem::transmute::<*mut c_void, RegCloseKeyFn>(p) }
    }
}

fn wide_ptr(s: Option<&U16CStr>) -> *const u16 {
    s.map_or(ptr::null(), |s| s.as_ptr())
}

fn raw_out(out: &mut ValueOut<'_>) -> (*mut u32, *mut u8, *mut u32) {
    (
        out.ty.as_deref_mut().map_or(ptr::null_mut(), |t| t as *mut u32),
        out.data.as_deref_mut().map_or(ptr::null_mut(), |d| d.as_mut_ptr()),
        out.len.as_deref_mut().map_or(ptr::null_mut(), |l| l as *mut u32),
    )
}

/// The unhooked registry API.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trampolines;

impl RegistryApi for Trampolines {
    fn open_key(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        options: u32,
        access: u32,
        result: Option<&mut KeyHandle>,
    ) -> Status {
        let result = result.map_or(ptr::null_mut(), |r| (r as *mut KeyHandle).cast::<isize>());
        unsafe { open_fn()(root.0, wide_ptr(sub_key), options, access, result) }
    }

    fn query_value(
        &self,
        key: KeyHandle,
        value_name: Option<&U16CStr>,
        out: &mut ValueOut<'_>,
    ) -> Status {
        let (ty, data, len) = raw_out(out);
        unsafe { query_fn()(key.0, wide_ptr(value_name), ptr::null(), ty, data, len) }
    }

    fn get_value(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        value_name: Option<&U16CStr>,
        flags: u32,
        out: &mut ValueOut<'_>,
    ) -> Status {
        let (ty, data, len) = raw_out(out);
        unsafe {
            get_fn()(
                root.0,
                wide_ptr(sub_key),
                wide_ptr(value_name),
                flags,
                ty,
                data.cast::<c_void>(),
                len,
            )
        }
    }

    fn close_key(&self, key: KeyHandle) -> Status {
        unsafe { close_fn()(key.0) }
    }
}

impl RegistryWrite for Trampolines {
    fn write_dword(
        &self,
        root: KeyHandle,
        sub_key: &U16CStr,
        value_name: &U16CStr,
        value: u32,
    ) -> Status {
        let mut key: isize = 0;
        let status = unsafe {
            RegCreateKeyExW(
                root.0,
                sub_key.as_ptr(),
                0,
                ptr::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_SET_VALUE,
                ptr::null(),
                &mut key,
                ptr::null_mut(),
            )
        };
        if status != ERROR_SUCCESS {
            return status;
        }
        let bytes = value.to_ne_bytes();
        let status = unsafe {
            RegSetValueExW(
                key,
                value_name.as_ptr(),
                0,
                REG_DWORD,
                bytes.as_ptr(),
                bytes.len() as u32,
            )
        };
        self.close_key(KeyHandle(key));
        status
    }
}
