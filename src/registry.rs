//! Portable view of the registry entry points this crate intercepts.
//!
//! The types mirror the Win32 calling conventions closely enough that the
//! Windows backend can convert raw hook arguments into them and back without
//! changing what the original function sees, while the rest of the crate stays
//! testable against [`crate::simulated`].

use widestring::U16CStr;

/// Return code of a registry call (`WIN32_ERROR` / `LSTATUS`).
pub type Status = u32;

pub const ERROR_SUCCESS: Status = 0;
pub const ERROR_FILE_NOT_FOUND: Status = 2;
pub const ERROR_ACCESS_DENIED: Status = 5;
pub const ERROR_INVALID_HANDLE: Status = 6;
pub const ERROR_INVALID_PARAMETER: Status = 87;
pub const ERROR_MORE_DATA: Status = 234;
pub const ERROR_UNSUPPORTED_TYPE: Status = 1630;

pub const REG_SZ: u32 = 1;
pub const REG_BINARY: u32 = 3;
pub const REG_DWORD: u32 = 4;

/// `RRF_RT_*` restriction flags. Each registry type `t` maps to bit `1 << t`.
pub const RRF_RT_REG_DWORD: u32 = 1 << REG_DWORD;
pub const RRF_RT_ANY: u32 = 0xffff;

pub const KEY_QUERY_VALUE: u32 = 0x0001;
pub const KEY_SET_VALUE: u32 = 0x0002;

pub const DWORD_LEN: usize = std::mem::size_of::<u32>();

/// Opaque registry key handle, layout compatible with `HKEY`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyHandle(pub isize);

pub const HKEY_CURRENT_USER: KeyHandle = KeyHandle(-2147483647);

/// The out-parameters of a value read.
///
/// `data`, when present, spans the caller's whole buffer: its length is the
/// capacity the caller declared through `len` before the call. After a
/// successful call `len` holds the number of bytes the callee reported.
#[derive(Debug, Default)]
pub struct ValueOut<'a> {
    pub ty: Option<&'a mut u32>,
    pub data: Option<&'a mut [u8]>,
    pub len: Option<&'a mut u32>,
}

impl<'a> ValueOut<'a> {
    pub fn new(ty: Option<&'a mut u32>, data: Option<&'a mut [u8]>, len: Option<&'a mut u32>) -> Self {
        Self { ty, data, len }
    }

    /// Size query: no buffer, only a length slot.
    pub fn probe(len: &'a mut u32) -> Self {
        Self {
            ty: None,
            data: None,
            len: Some(len),
        }
    }

    pub fn claimed_type(&self) -> Option<u32> {
        self.ty.as_deref().copied()
    }

    pub fn reported_len(&self) -> Option<u32> {
        self.len.as_deref().copied()
    }

    /// Borrows a caller's raw out-parameters. The buffer spans the capacity
    /// the caller declared in `*len` before the call; a buffer without a
    /// length slot is treated as empty.
    ///
    /// # Safety
    ///
    /// Each non-null pointer must be valid for writes for `'a`, and `data`
    /// must be valid for `*len` bytes.
    pub unsafe fn from_raw(ty: *mut u32, data: *mut u8, len: *mut u32) -> Self {
        let len = unsafe { len.as_mut() };
        let capacity = len.as_deref().map_or(0, |l| *l as usize);
        let data = if data.is_null() {
            None
        } else {
            Some(unsafe { std::slice::from_raw_parts_mut(data, capacity) })
        };
        Self::new(unsafe { ty.as_mut() }, data, len)
    }
}

/// Whether a value read must reach the original with the caller's own
/// pointers: a non-null reserved pointer, or a buffer with no length slot.
/// The OS rejects both, and neither can be borrowed as a [`ValueOut`].
pub fn needs_raw_passthrough<T>(reserved: *const u32, data: *const T, len: *const u32) -> bool {
    !reserved.is_null() || (!data.is_null() && len.is_null())
}

/// The four entry points routed through the interception layer.
///
/// Implementations must behave like the Win32 functions they stand for:
/// `RegOpenKeyExW`, `RegQueryValueExW`, `RegGetValueW` and `RegCloseKey`.
pub trait RegistryApi: Send + Sync {
    fn open_key(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        options: u32,
        access: u32,
        result: Option<&mut KeyHandle>,
    ) -> Status;

    fn query_value(
        &self,
        key: KeyHandle,
        value_name: Option<&U16CStr>,
        out: &mut ValueOut<'_>,
    ) -> Status;

    fn get_value(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        value_name: Option<&U16CStr>,
        flags: u32,
        out: &mut ValueOut<'_>,
    ) -> Status;

    fn close_key(&self, key: KeyHandle) -> Status;
}

/// Unintercepted write path, creating the key when it does not exist.
pub trait RegistryWrite {
    fn write_dword(
        &self,
        root: KeyHandle,
        sub_key: &U16CStr,
        value_name: &U16CStr,
        value: u32,
    ) -> Status;
}

impl<T: RegistryApi + ?Sized> RegistryApi for &T {
    fn open_key(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        options: u32,
        access: u32,
        result: Option<&mut KeyHandle>,
    ) -> Status {
        (**self).open_key(root, sub_key, options, access, result)
    }

    fn query_value(
        &self,
        key: KeyHandle,
        value_name: Option<&U16CStr>,
        out: &mut ValueOut<'_>,
    ) -> Status {
        (**self).query_value(key, value_name, out)
    }

    fn get_value(
        &self,
        root: KeyHandle,
        sub_key: Option<&U16CStr>,
        value_name: Option<&U16CStr>,
        flags: u32,
        out: &mut ValueOut<'_>,
    ) -> Status {
        (**self).get_value(root, sub_key, value_name, flags, out)
    }

    fn close_key(&self, key: KeyHandle) -> Status {
        (**self).close_key(key)
    }
}

impl<T: RegistryWrite + ?Sized> RegistryWrite for &T {
    fn write_dword(
        &self,
        root: KeyHandle,
        sub_key: &U16CStr,
        value_name: &U16CStr,
        value: u32,
    ) -> Status {
        (**self).write_dword(root, sub_key, value_name, value)
    }
}

/// Whether `flags` restricts a `RegGetValueW` read to REG_DWORD and nothing
/// else, which lets the caller omit the type slot.
pub fn restricted_to_dword(flags: u32) -> bool {
    flags & RRF_RT_ANY == RRF_RT_REG_DWORD
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn raw_passthrough_cases() {
        let (reserved, mut buf, mut len) = (0u32, [0u8; 4], 4u32);
        let data = buf.as_mut_ptr().cast_const();
        let len = ptr::addr_of_mut!(len).cast_const();
        assert!(!needs_raw_passthrough(ptr::null(), data, len));
        assert!(!needs_raw_passthrough(ptr::null(), ptr::null::<u8>(), len));
        assert!(!needs_raw_passthrough(ptr::null(), ptr::null::<u8>(), ptr::null()));
        assert!(needs_raw_passthrough(ptr::null(), data, ptr::null()));
        assert!(needs_raw_passthrough(&reserved, data, len));
        assert!(needs_raw_passthrough(&reserved, ptr::null::<u8>(), ptr::null()));
    }

    #[test]
    fn from_raw_probe_has_no_buffer() {
        let (mut ty, mut len) = (0u32, 0u32);
        let out = unsafe { ValueOut::from_raw(&mut ty, ptr::null_mut(), &mut len) };
        assert!(out.data.is_none());
        assert_eq!(out.reported_len(), Some(0));
        assert_eq!(out.claimed_type(), Some(0));
    }

    #[test]
    fn from_raw_buffer_spans_declared_capacity() {
        let mut buf = [0xeeu8; 8];
        let mut len = 6u32;
        let out = unsafe { ValueOut::from_raw(ptr::null_mut(), buf.as_mut_ptr(), &mut len) };
        assert!(out.ty.is_none());
        assert_eq!(out.data.as_deref().map(<[u8]>::len), Some(6));
    }

    #[test]
    fn from_raw_zero_capacity_and_missing_len_give_empty_buffers() {
        let mut buf = [0xeeu8; 4];
        let mut len = 0u32;
        let out = unsafe { ValueOut::from_raw(ptr::null_mut(), buf.as_mut_ptr(), &mut len) };
        assert_eq!(out.data.as_deref(), Some(&[][..]));

        let out = unsafe { ValueOut::from_raw(ptr::null_mut(), buf.as_mut_ptr(), ptr::null_mut()) };
        assert_eq!(out.data.as_deref(), Some(&[][..]));
        assert!(out.len.is_none());
    }

    #[test]
    fn dword_restriction() {
        assert!(restricted_to_dword(RRF_RT_REG_DWORD));
        assert!(restricted_to_dword(RRF_RT_REG_DWORD | 0x1000_0000));
        assert!(!restricted_to_dword(RRF_RT_ANY));
        assert!(!restricted_to_dword(RRF_RT_REG_DWORD | (1 << REG_BINARY)));
    }
}
