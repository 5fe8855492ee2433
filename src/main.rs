use anyhow::Result;
use clap::Parser;
use simplelog::*;

use lefty_taskbar::Alignment;

#[derive(Parser, Debug)]
#[command(author, version, verbatim_doc_comment)]
/// lefty: inspect or set the Windows 11 taskbar alignment
///
/// Without arguments, prints the alignment stored for the current user.
/// With --align, stores the new alignment and tells Explorer to re-read it.
struct Args {
    /// Alignment to store: left, center, right, or the raw value 0-2.
    #[arg(short, long, verbatim_doc_comment)]
    align: Option<Alignment>,

    /// Store the value without broadcasting the settings change.
    #[arg(long)]
    no_broadcast: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging; implies --debug as well.
    #[arg(short, long)]
    trace: bool,
}

/// Parse CLI arguments and initialize logging.
fn cli_init() -> Args {
    let args = Args::parse();

    let log_lvl = match (args.quiet, args.debug, args.trace) {
        (_, _, true) => LevelFilter::Trace,
        (_, true, false) => LevelFilter::Debug,
        (true, false, false) => LevelFilter::Warn,
        (false, false, false) => LevelFilter::Info,
    };

    let mut log_cfg = ConfigBuilder::new();
    if let Err(e) = log_cfg.set_time_offset_to_local() {
        eprintln!("WARNING: could not set log TZ to local: {e:?}");
    };
    log_cfg.set_time_format_rfc3339();
    CombinedLogger::init(vec![TermLogger::new(
        log_lvl,
        log_cfg.build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .expect("logger can init");
    log::debug!("lefty v{} starting", env!("CARGO_PKG_VERSION"));
    args
}

#[cfg(target_os = "windows")]
fn main_impl() -> Result<()> {
    use anyhow::{Context, bail};
    use lefty_taskbar::propagate::{AlignmentStore, Notifier, apply_value};
    use lefty_taskbar::watched::describe;
    use lefty_taskbar::windows::{BroadcastNotifier, win_store};

    /// Stands in for the broadcast when `--no-broadcast` is given.
    struct Silent;

    impl Notifier for Silent {
        fn notify_settings_changed(
            &self,
            _scope: &str,
            _timeout: std::time::Duration,
        ) -> lefty_taskbar::propagate::NotifyOutcome {
            lefty_taskbar::propagate::NotifyOutcome::Delivered
        }
    }

    let args = cli_init();
    let store = win_store();

    let Some(align) = args.align else {
        let raw = store.read().context("could not read TaskbarAl")?;
        println!("{}", describe(raw));
        return Ok(());
    };

    let written = if args.no_broadcast {
        apply_value(&store, &Silent, align.into())
    } else {
        apply_value(&store, &BroadcastNotifier, align.into())
    };
    if !written {
        bail!("could not store alignment {align}");
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn main_impl() -> Result<()> {
    let args = cli_init();
    log::debug!("requested alignment: {:?}", args.align);
    anyhow::bail!("the taskbar alignment lives in the Windows registry; lefty only runs on Windows")
}

fn main() -> Result<()> {
    let ret = main_impl();
    if let Err(ref e) = ret {
        log::error!("{e:#}");
    }
    ret
}
