use std::sync::Arc;

use crate::intercept::Interceptor;
use crate::lifecycle::Lifecycle;
use crate::simulated::*;
use crate::state::OverrideState;


fn init_log() {
    use simplelog::*;
    use std::sync::OnceLock;
    static LOG_INIT: OnceLock<()> = OnceLock::new();
    LOG_INIT.get_or_init(|| {
        let mut log_cfg = ConfigBuilder::new();
        if let Err(e) = log_cfg.set_time_offset_to_local() {
            eprintln!("WARNING: could not set log TZ to local: {e:?}");
        };
        log_cfg.set_time_format_rfc3339();
        // Note: set to a different level to see logs in tests.
        CombinedLogger::init(vec![TermLogger::new(
            LevelFilter::Off,
            log_cfg.build(),
            TerminalMode::Stderr,
            ColorChoice::AlwaysAnsi,
        )])
        .expect("logger can init");
    });
}

type SimLifecycle<'a> = Lifecycle<
    crate::propagate::RegistryStore<&'a SimRegistry>,
    &'a RecordingNotifier,
    &'a SimSettings,
>;

/// Everything a scenario needs: the fake OS, the controller and the hooked
/// API the host's threads would be calling.
struct Harness {
    reg: SimRegistry,
    notifier: RecordingNotifier,
    settings: SimSettings,
    state: Arc<OverrideState>,
}

impl Harness {
    fn new(stored: Option<u32>, force_left: bool) -> Self {
        init_log();
        let reg = match stored {
            Some(v) => SimRegistry::with_alignment(v),
            None => SimRegistry::new(),
        };
        Self {
            reg,
            notifier: RecordingNotifier::new(),
            settings: SimSettings::new(force_left),
            state: Arc::new(OverrideState::new()),
        }
    }

    fn lifecycle(&self) -> SimLifecycle<'_> {
        Lifecycle::new(
            self.state.clone(),
            self.reg.store(),
            &self.notifier,
            &self.settings,
        )
    }

    fn hooked(&self) -> Interceptor<&SimRegistry> {
        Interceptor::new(self.state.clone(), &self.reg)
    }
}
