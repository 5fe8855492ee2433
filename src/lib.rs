//! Forces Explorer's taskbar alignment to the left at runtime and restores the
//! previous alignment when switched off.
//!
//! The portable core lives in the top-level modules: the [`registry`] API
//! surface, the [`intercept::Interceptor`] that wraps it, the
//! [`lifecycle::Lifecycle`] controller driven by the host, and the state they
//! share. The [`windows`] module binds all of it to advapi32 and user32.

pub mod error;
pub mod hooks;
pub mod intercept;
pub mod lifecycle;
pub mod original;
pub mod override_value;
pub mod propagate;
pub mod registry;
pub mod settings;
pub mod state;
pub mod tracker;
pub mod watched;

#[cfg(any(test, feature = "simulated_registry"))]
pub mod simulated;

#[cfg(target_os = "windows")]
pub mod windows;

pub use error::{HookError, StoreError};
pub use intercept::Interceptor;
pub use lifecycle::Lifecycle;
pub use state::OverrideState;
pub use watched::Alignment;

#[cfg(test)]
mod tests;
