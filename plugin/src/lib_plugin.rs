//! The DLL the plugin runtime loads into `explorer.exe`.
//!
//! Exports `lefty_mod_init`, `lefty_mod_settings_changed` and
//! `lefty_mod_uninit`, each forwarding to one [`lefty_taskbar::Lifecycle`]
//! built around the host's services.

pub mod log_win;

#[cfg(target_os = "windows")]
mod host;
#[cfg(target_os = "windows")]
pub use host::{HostApi, HostHooker, HostSettings};

#[cfg(target_os = "windows")]
mod entry {
    use std::sync::Arc;

    use log::*;
    use once_cell::sync::Lazy;
    use parking_lot::Mutex;
    use winapi::shared::minwindef::{BOOL, FALSE, TRUE};

    use lefty_taskbar::windows::{AdvapiHooks, BroadcastNotifier, WinStore, win_store};
    use lefty_taskbar::{Lifecycle, OverrideState};

    use crate::host::{HostApi, HostHooker, HostSettings};
    use crate::log_win;

    type Plugin = Lifecycle<WinStore, BroadcastNotifier, HostSettings>;

    // Outlives init/uninit pairs so the original alignment is captured once
    // per process.
    static STATE: Lazy<Arc<OverrideState>> = Lazy::new(|| Arc::new(OverrideState::new()));
    static PLUGIN: Lazy<Mutex<Option<Plugin>>> = Lazy::new(|| Mutex::new(None));

    fn log_init(host: &HostApi) {
        log_win::init(host.log);
        let _ = log_win::set_thread_state(true);
        log::set_max_level(log::LevelFilter::Debug);
    }

    /// # Safety
    ///
    /// `host` is null or points to a [`HostApi`] that is valid for this call.
    #[unsafe(no_mangle)]
    pub unsafe extern "system" fn lefty_mod_init(host: *const HostApi) -> BOOL {
        let Some(host) = (unsafe { host.as_ref() }) else {
            log_win::dbg_win("✗ lefty_mod_init: no host API\n");
            return FALSE;
        };
        log_init(host);
        info!("lefty v{} loading", env!("CARGO_PKG_VERSION"));

        let plugin = Lifecycle::new(
            STATE.clone(),
            win_store(),
            BroadcastNotifier,
            HostSettings::new(host),
        );
        let loaded = plugin.on_load(&mut AdvapiHooks::new(HostHooker::new(host)));
        let mut slot = PLUGIN.lock();
        if slot.replace(plugin).is_some() {
            warn!("lefty_mod_init called twice without lefty_mod_uninit");
        }
        if loaded { TRUE } else { FALSE }
    }

    #[unsafe(no_mangle)]
    pub extern "system" fn lefty_mod_settings_changed() {
        debug!("settings changed");
        match PLUGIN.lock().as_ref() {
            Some(plugin) => plugin.on_settings_changed(),
            None => error!("settings changed before lefty_mod_init"),
        }
    }

    #[unsafe(no_mangle)]
    pub extern "system" fn lefty_mod_uninit() {
        match PLUGIN.lock().take() {
            Some(plugin) => plugin.on_unload(),
            None => warn!("lefty_mod_uninit without a loaded plugin"),
        }
        info!("lefty unloaded");
    }
}
