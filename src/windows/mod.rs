//! advapi32/user32 bindings for the portable core.

mod broadcast;
mod detours;
mod trampolines;

pub use broadcast::BroadcastNotifier;
pub use detours::{AdvapiHooks, FunctionHooker, interceptor};
pub use trampolines::Trampolines;

use crate::propagate::RegistryStore;

/// The store the lifecycle controller uses inside a hooked process.
pub type WinStore = RegistryStore<Trampolines>;

pub fn win_store() -> WinStore {
    RegistryStore::new(Trampolines)
}
