//! A logger that forwards to the host's log callback, or to OutputDebugString
//! when the host did not provide one.
use log::{Level, Metadata, Record};

/// Host logging entry point, takes a nul-terminated UTF-16 message.
pub type HostLogFn = unsafe extern "system" fn(message: *const u16);

/// Implements `log::Log`, forwarding every record to [`dbg_win`].
pub struct PluginLogger;

/// Static instance of `PluginLogger`, registered by [`init`].
pub static PLUGIN_LOGGER: PluginLogger = PluginLogger;

use std::sync::OnceLock;
static SINK: OnceLock<Option<HostLogFn>> = OnceLock::new();

/// Convert logging levels to shorter and more visible icons
pub fn iconify(lvl: log::Level) -> char {
    match lvl {
        Level::Error => '❗',
        Level::Warn => '⚠',
        Level::Info => 'ⓘ',
        Level::Debug => 'ⓓ',
        Level::Trace => 'ⓣ',
    }
}

pub fn is_thread_state() -> &'static bool {
    set_thread_state(false)
}
pub fn set_thread_state(is: bool) -> &'static bool {
    // first caller wins
    static CELL: OnceLock<bool> = OnceLock::new();
    CELL.get_or_init(|| is)
}

use once_cell::sync::Lazy;
use regex::Regex;
// shorten source file name, no src/ no .rs ext
static RE_EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[^.\\/]*$").expect("valid regex"));
static RE_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r"src[\\/]").expect("valid regex"));

fn clean_name(path: Option<&str>) -> String {
    if let Some(p) = path {
        RE_SRC.replace(&RE_EXT.replace(p, ""), "").to_string()
    } else {
        "?".to_string()
    }
}

fn format_line(thread_id: &str, record: &Record) -> String {
    format!(
        "{}{}{}:{} {}",
        thread_id,
        iconify(record.level()),
        clean_name(record.file()),
        record.line().unwrap_or(0),
        record.args()
    )
}

#[cfg(target_os = "windows")]
use winapi::um::processthreadsapi::GetCurrentThreadId;
impl log::Log for PluginLogger {
    #[cfg(windows)]
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }
    #[cfg(not(windows))]
    fn enabled(&self, _metadata: &Metadata) -> bool {
        false
    }
    fn log(&self, record: &Record) {
        #[cfg(not(target_os = "windows"))]
        let thread_id = String::new();
        #[cfg(target_os = "windows")]
        let thread_id = if *is_thread_state() {
            format!("¦{}¦", unsafe { GetCurrentThreadId() })
        } else {
            String::new()
        };
        if self.enabled(record.metadata()) {
            dbg_win(&format_line(&thread_id, record));
        }
    }
    fn flush(&self) {}
}

pub fn dbg_win(s: &str) {
    //! Hands a line to the host's logger, or to
    //! [`OutputDebugStringW`](https://docs.microsoft.com/en-us/windows/win32/api/debugapi/nf-debugapi-outputdebugstringw)
    //! when there is none (Windows only).
    #[cfg(windows)]
    {
        let mut s_utf16: Vec<u16> = Vec::with_capacity(s.len() + 1);
        s_utf16.extend(s.encode_utf16());
        s_utf16.push(0);
        match SINK.get().copied().flatten() {
            Some(host_log) => unsafe { host_log(s_utf16.as_ptr()) },
            None => unsafe {
                windows_sys::Win32::System::Diagnostics::Debug::OutputDebugStringW(
                    s_utf16.as_ptr(),
                )
            },
        }
    }
    #[cfg(not(windows))]
    let _ = (s, &SINK);
}

pub fn init(host_log: Option<HostLogFn>) {
    //! Set `PluginLogger` as the active logger, sending to `host_log` when
    //! given. Only the first call in a process has any effect.<br>
    //! Doesn't panic on failure as it creates other problems for FFI etc.
    let _ = SINK.set(host_log);
    if log::set_logger(&PLUGIN_LOGGER).is_err() {
        dbg_win("Warning: ✗ Failed to register PluginLogger\n");
    }
}
