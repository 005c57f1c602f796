//! Environment-driven diagnostics.
//!
//! All knobs are read once. `PI_TUI_WRITE_LOG` appends every terminal
//! write to a file, `PI_TUI_DEBUG=1` dumps each composed frame as JSON
//! under the tmp dir, `PI_DEBUG_REDRAW=1` logs why full redraws
//! happened, `PI_HARDWARE_CURSOR=1` keeps the OS cursor visible for
//! IME candidate windows, and `PI_CLEAR_ON_SHRINK=0` disables the
//! full-redraw-on-shrink heuristic.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Serialize;

/// Debug and behavior knobs, captured from the environment at engine
/// construction.
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Append every terminal write to this file.
    pub write_log: Option<PathBuf>,
    /// Dump every composed frame as JSON under the tmp dir.
    pub frame_dumps: bool,
    /// Log the reason for each full redraw.
    pub log_redraws: bool,
    /// Show the OS cursor at the marker position.
    pub hardware_cursor: bool,
    /// Full redraw when content shrinks below the working area.
    pub clear_on_shrink: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            write_log: None,
            frame_dumps: false,
            log_redraws: false,
            hardware_cursor: false,
            clear_on_shrink: true,
        }
    }
}

impl DebugConfig {
    /// Read the `PI_TUI_*` / `PI_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            write_log: std::env::var_os("PI_TUI_WRITE_LOG").map(PathBuf::from),
            frame_dumps: env_flag("PI_TUI_DEBUG"),
            log_redraws: env_flag("PI_DEBUG_REDRAW"),
            hardware_cursor: env_flag("PI_HARDWARE_CURSOR"),
            clear_on_shrink: std::env::var("PI_CLEAR_ON_SHRINK")
                .map(|v| v != "0")
                .unwrap_or(true),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

fn write_log_path() -> Option<&'static PathBuf> {
    static PATH: OnceLock<Option<PathBuf>> = OnceLock::new();
    PATH.get_or_init(|| std::env::var_os("PI_TUI_WRITE_LOG").map(PathBuf::from))
        .as_ref()
}

/// Append one terminal write to the write log, if enabled.
pub(crate) fn append_write_log(data: &str) {
    let Some(path) = write_log_path() else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{:?}", data);
    }
}

#[derive(Serialize)]
struct FrameDump<'a> {
    frame: u64,
    width: usize,
    lines: &'a [String],
    cursor: Option<(usize, usize)>,
}

/// Write a per-frame JSON dump under the tmp dir.
pub(crate) fn dump_frame(frame: u64, width: usize, lines: &[String], cursor: Option<(usize, usize)>) {
    dump_frame_to(
        &std::env::temp_dir().join("pi-tui-debug"),
        frame,
        width,
        lines,
        cursor,
    );
}

fn dump_frame_to(
    dir: &std::path::Path,
    frame: u64,
    width: usize,
    lines: &[String],
    cursor: Option<(usize, usize)>,
) {
    if fs::create_dir_all(dir).is_err() {
        return;
    }
    let dump = FrameDump {
        frame,
        width,
        lines,
        cursor,
    };
    if let Ok(json) = serde_json::to_string_pretty(&dump) {
        let _ = fs::write(dir.join(format!("frame-{frame:06}.json")), json);
    }
}

/// Location of the crash dump written on contract violations.
pub(crate) fn crash_log_path() -> PathBuf {
    home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".pi")
        .join("agent")
        .join("pi-crash.log")
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    let var = "USERPROFILE";
    #[cfg(not(windows))]
    let var = "HOME";
    std::env::var_os(var).map(PathBuf::from)
}

/// Write the crash dump for a width-contract violation: every rendered
/// line with its measured width.
pub(crate) fn write_crash_dump(lines: &[String], widths: &[usize], max: usize) -> PathBuf {
    let path = crash_log_path();
    write_crash_dump_to(&path, lines, widths, max);
    path
}

fn write_crash_dump_to(path: &std::path::Path, lines: &[String], widths: &[usize], max: usize) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let mut report = String::new();
    report.push_str(&format!(
        "component rendered lines wider than the terminal ({max} columns)\n\n"
    ));
    for (i, (line, width)) in lines.iter().zip(widths).enumerate() {
        let flag = if *width > max { " <-- OVERFLOW" } else { "" };
        report.push_str(&format!("[{i:4}] width {width:4}{flag}: {line:?}\n"));
    }
    let _ = fs::write(path, report);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clear_on_shrink_is_on() {
        let config = DebugConfig::default();
        assert!(config.clear_on_shrink);
        assert!(!config.frame_dumps);
    }

    #[test]
    fn crash_log_path_is_under_pi_agent() {
        let path = crash_log_path();
        let display = path.display().to_string();
        assert!(display.contains(".pi"));
        assert!(display.ends_with("pi-crash.log"));
    }

    #[test]
    fn frame_dump_is_valid_json() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(_) => unreachable!(),
        };
        let lines = vec!["hello".to_string(), "world".to_string()];
        dump_frame_to(dir.path(), 3, 80, &lines, Some((1, 2)));
        let content = match fs::read_to_string(dir.path().join("frame-000003.json")) {
            Ok(c) => c,
            Err(_) => unreachable!(),
        };
        let parsed: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(_) => unreachable!(),
        };
        assert_eq!(parsed["frame"], 3);
        assert_eq!(parsed["lines"][1], "world");
    }

    #[test]
    fn crash_dump_flags_offending_lines() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(_) => unreachable!(),
        };
        let path = dir.path().join("crash.log");
        let lines = vec!["ok".to_string(), "too wide".to_string()];
        write_crash_dump_to(&path, &lines, &[2, 90], 80);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => unreachable!(),
        };
        assert!(content.contains("OVERFLOW"));
        assert!(content.contains("\"too wide\""));
    }
}
