//! The one configuration location this crate overrides.

use std::fmt;
use std::str::FromStr;

use widestring::{U16CStr, u16cstr};

use crate::registry::{HKEY_CURRENT_USER, KeyHandle};

pub const ADVANCED_SUBKEY: &U16CStr =
    u16cstr!(r"Software\Microsoft\Windows\CurrentVersion\Explorer\Advanced");
pub const TASKBAR_AL: &U16CStr = u16cstr!("TaskbarAl");

/// Value written and reported while left alignment is forced.
pub const FORCED_VALUE: u32 = Alignment::Left as u32;

/// Assumed original when capture has not succeeded yet.
pub const DEFAULT_ORIGINAL: u32 = Alignment::Center as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Alignment {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Left),
            1 => Some(Self::Center),
            2 => Some(Self::Right),
            _ => None,
        }
    }
}

impl From<Alignment> for u32 {
    fn from(a: Alignment) -> Self {
        a as u32
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        };
        f.write_str(s)
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "center" | "centre" | "c" => Ok(Self::Center),
            "right" | "r" => Ok(Self::Right),
            other => other
                .parse::<u32>()
                .ok()
                .and_then(Self::from_raw)
                .ok_or_else(|| format!("unknown alignment '{s}', expected left, center or right")),
        }
    }
}

/// Human readable form of a raw stored value, which may be outside the known
/// range.
pub fn describe(raw: u32) -> String {
    match Alignment::from_raw(raw) {
        Some(a) => format!("{raw} ({a})"),
        None => format!("{raw} (unknown)"),
    }
}

fn fold(unit: u16) -> u16 {
    if (u16::from(b'A')..=u16::from(b'Z')).contains(&unit) {
        unit + 32
    } else {
        unit
    }
}

/// Case-insensitive comparison of UTF-16 strings, folding ASCII letters only.
pub fn eq_ignore_ascii_case(a: &U16CStr, b: &U16CStr) -> bool {
    let (a, b) = (a.as_slice(), b.as_slice());
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| fold(*x) == fold(*y))
}

/// `root\sub_key` names the watched key.
pub fn is_watched_key(root: KeyHandle, sub_key: Option<&U16CStr>) -> bool {
    root == HKEY_CURRENT_USER && sub_key.is_some_and(|s| eq_ignore_ascii_case(s, ADVANCED_SUBKEY))
}

pub fn is_watched_field(value_name: Option<&U16CStr>) -> bool {
    value_name.is_some_and(|v| eq_ignore_ascii_case(v, TASKBAR_AL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use widestring::U16CString;

    fn w(s: &str) -> U16CString {
        U16CString::from_str(s).unwrap()
    }

    #[test]
    fn watched_key_matches_any_case() {
        let lower = w(r"software\microsoft\windows\currentversion\explorer\advanced");
        assert!(is_watched_key(HKEY_CURRENT_USER, Some(lower.as_ucstr())));
        assert!(is_watched_key(HKEY_CURRENT_USER, Some(ADVANCED_SUBKEY)));
    }

    #[test]
    fn watched_key_requires_current_user_root() {
        assert!(!is_watched_key(KeyHandle(-2147483646), Some(ADVANCED_SUBKEY)));
        assert!(!is_watched_key(HKEY_CURRENT_USER, None));
        let trailing = w(r"Software\Microsoft\Windows\CurrentVersion\Explorer\Advanced\");
        assert!(!is_watched_key(HKEY_CURRENT_USER, Some(trailing.as_ucstr())));
    }

    #[test]
    fn watched_field() {
        assert!(is_watched_field(Some(w("TASKBARAL").as_ucstr())));
        assert!(is_watched_field(Some(w("taskbaral").as_ucstr())));
        assert!(!is_watched_field(Some(w("TaskbarAlx").as_ucstr())));
        assert!(!is_watched_field(Some(w("TaskbarDa").as_ucstr())));
        assert!(!is_watched_field(None));
    }

    #[test]
    fn fold_leaves_non_letters_alone() {
        assert!(!eq_ignore_ascii_case(&w("a["), &w("A{")));
        assert!(eq_ignore_ascii_case(&w("Ä1"), &w("Ä1")));
    }

    #[test]
    fn parse_alignment() {
        assert_eq!("Left".parse(), Ok(Alignment::Left));
        assert_eq!("centre".parse(), Ok(Alignment::Center));
        assert_eq!(" right ".parse(), Ok(Alignment::Right));
        assert_eq!("1".parse(), Ok(Alignment::Center));
        assert!("3".parse::<Alignment>().is_err());
        assert!("up".parse::<Alignment>().is_err());
    }

    #[test]
    fn describe_raw_values() {
        assert_eq!(describe(0), "0 (left)");
        assert_eq!(describe(7), "7 (unknown)");
    }
}
