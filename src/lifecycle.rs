//! Reactions to the host's load, settings-changed and unload events.
//!
//! Every transition runs on the thread the host delivers the event on. The
//! controller keeps nothing between events beyond [`OverrideState`].

use std::sync::Arc;

use crate::hooks::HookInstaller;
use crate::propagate::{AlignmentStore, Notifier, apply_value};
use crate::settings::{ModSettings, Settings};
use crate::state::OverrideState;
use crate::watched::{FORCED_VALUE, describe};

pub struct Lifecycle<S, N, P> {
    state: Arc<OverrideState>,
    store: S,
    notifier: N,
    settings: P,
}

impl<S: AlignmentStore, N: Notifier, P: Settings> Lifecycle<S, N, P> {
    pub fn new(state: Arc<OverrideState>, store: S, notifier: N, settings: P) -> Self {
        Self {
            state,
            store,
            notifier,
            settings,
        }
    }

    fn load_settings(&self) -> ModSettings {
        let settings = ModSettings::load(&self.settings);
        self.state.set_force_left(settings.force_left);
        log::debug!("forceLeft={}", settings.force_left);
        settings
    }

    fn apply(&self, value: u32) -> bool {
        apply_value(&self.store, &self.notifier, value)
    }

    /// Captures the original, writes the alignment the settings ask for and
    /// then installs the hooks. Hooking problems leave interception inert but
    /// never fail the load.
    pub fn on_load(&self, hooks: &mut impl HookInstaller) -> bool {
        let settings = self.load_settings();
        self.state.original.capture_once(&self.store);
        let target = if settings.force_left {
            FORCED_VALUE
        } else {
            self.state.original.value()
        };
        self.apply(target);

        match hooks.install(&self.state) {
            Ok(report) if report.is_complete() => log::info!("{report}"),
            Ok(report) => log::warn!("partial interception: {report}"),
            Err(e) => log::warn!("registry interception inactive: {e}"),
        }
        true
    }

    pub fn on_settings_changed(&self) {
        let settings = self.load_settings();
        if settings.force_left {
            // Covers a load with the feature off where nothing was captured.
            self.state.original.capture_once(&self.store);
            self.apply(FORCED_VALUE);
        } else if let Some(original) = self.state.original.captured() {
            log::info!("restoring original alignment {}", describe(original));
            self.apply(original);
        } else {
            log::debug!("no original alignment captured, nothing to restore");
        }
    }

    /// Leaves the system as it was found, whatever the current setting.
    ///
    /// Also turns the override off, so reads still in flight through hooks
    /// that outlive this call report the stored value.
    pub fn on_unload(&self) {
        // Stop forcing reads before the broadcast makes Explorer re-read.
        self.state.set_force_left(false);
        match self.state.original.captured() {
            Some(original) => {
                log::info!("unloading, restoring alignment {}", describe(original));
                self.apply(original);
            }
            None => log::debug!("unloading, no original alignment captured"),
        }
    }
}
