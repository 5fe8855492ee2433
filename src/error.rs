use thiserror::Error;

use crate::registry::Status;

/// Failure to read or write the watched value through the unhooked API.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error(r"registry value 'HKCU\...\Explorer\Advanced\TaskbarAl' not found")]
    NotFound,
    #[error("registry value TaskbarAl is not a REG_DWORD")]
    WrongType,
    #[error("registry read failed with status {0}")]
    Read(Status),
    #[error("registry write failed with status {0}")]
    Write(Status),
}

/// Failure to install the interception hooks. Never fatal: the plugin keeps
/// running with interception inert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("module {0} could not be located")]
    ModuleNotFound(&'static str),
    #[error("none of the registry entry points could be hooked")]
    NothingHooked,
}
