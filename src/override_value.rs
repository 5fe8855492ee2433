//! Substitution of the forced value into a completed read.

use crate::registry::{DWORD_LEN, REG_DWORD};
use crate::watched::FORCED_VALUE;

/// Overwrites the first four bytes of `data` with [`FORCED_VALUE`] when the
/// read produced a REG_DWORD of at least four bytes that is not already the
/// forced value. Returns whether the buffer was changed.
///
/// `len` is the length the callee reported; `data` is the caller's buffer.
/// Anything malformed or undersized is left untouched, so size probes with no
/// buffer pass straight through.
pub fn force_value(ty: Option<u32>, data: Option<&mut [u8]>, len: Option<u32>) -> bool {
    let (Some(REG_DWORD), Some(data), Some(len)) = (ty, data, len) else {
        return false;
    };
    if (len as usize) < DWORD_LEN {
        return false;
    }
    let Some(slot) = data.get_mut(..DWORD_LEN) else {
        return false;
    };
    let mut current = [0u8; DWORD_LEN];
    current.copy_from_slice(slot);
    if u32::from_ne_bytes(current) == FORCED_VALUE {
        return false;
    }
    slot.copy_from_slice(&FORCED_VALUE.to_ne_bytes());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{REG_BINARY, REG_SZ};

    #[test]
    fn overrides_dword() {
        let mut buf = 2u32.to_ne_bytes();
        assert!(force_value(Some(REG_DWORD), Some(&mut buf), Some(4)));
        assert_eq!(u32::from_ne_bytes(buf), 0);
    }

    #[test]
    fn already_forced_is_untouched() {
        let mut buf = 0u32.to_ne_bytes();
        assert!(!force_value(Some(REG_DWORD), Some(&mut buf), Some(4)));
        assert_eq!(buf, [0; 4]);
    }

    #[test]
    fn only_first_four_bytes_change() {
        let mut buf = [1, 0, 0, 0, 0xaa, 0xbb];
        assert!(force_value(Some(REG_DWORD), Some(&mut buf), Some(6)));
        assert_eq!(buf, [0, 0, 0, 0, 0xaa, 0xbb]);
    }

    #[test]
    fn other_types_pass_through() {
        let mut buf = 1u32.to_ne_bytes();
        assert!(!force_value(Some(REG_BINARY), Some(&mut buf), Some(4)));
        assert!(!force_value(Some(REG_SZ), Some(&mut buf), Some(4)));
        assert!(!force_value(None, Some(&mut buf), Some(4)));
        assert_eq!(u32::from_ne_bytes(buf), 1);
    }

    #[test]
    fn probes_and_short_buffers_pass_through() {
        assert!(!force_value(Some(REG_DWORD), None, Some(4)));
        assert!(!force_value(Some(REG_DWORD), None, None));

        let mut buf = 1u32.to_ne_bytes();
        assert!(!force_value(Some(REG_DWORD), Some(&mut buf), None));
        assert!(!force_value(Some(REG_DWORD), Some(&mut buf), Some(3)));
        assert_eq!(u32::from_ne_bytes(buf), 1);

        // Reported length larger than the buffer the caller actually owns.
        let mut short = [1u8, 0];
        assert!(!force_value(Some(REG_DWORD), Some(&mut short), Some(4)));
        assert_eq!(short, [1, 0]);
        let mut empty: [u8; 0] = [];
        assert!(!force_value(Some(REG_DWORD), Some(&mut empty), Some(4)));
    }
}
