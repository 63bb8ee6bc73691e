//! localchat — terminal chat client for local reasoning models.
//!
//! Talks the Ollama wire protocol: streams chat completions from a local
//! inference server, splits each response into its reasoning block and final
//! answer, and renders both incrementally in a terminal REPL.

pub mod chat;
pub mod inference;
pub mod repl;

use std::path::Path;

/// Return the platform-standard data directory for localchat.
///
/// Falls back to `~/.localchat/` only if no platform data directory can be
/// resolved.
pub(crate) fn data_dir() -> std::path::PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("localchat");
    }
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".localchat")
}

/// Initialize the tracing subscriber.
///
/// Structured logs go to `localchat.log` in the data directory; stdout
/// belongs to the REPL. On each startup existing logs rotate
/// (localchat.log → .1 → .2 → .3, keeping the last 3) and a fresh file is
/// opened, with a startup banner so the right log is easy to find.
pub fn init_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = data_dir();
    let _ = std::fs::create_dir_all(&log_dir);

    let log_path = log_dir.join("localchat.log");
    rotate_log_file(&log_path, 3);

    let Ok(log_file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    else {
        // No log file, no logging; the chat still works
        return;
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("localchat=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %log_dir.display(),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "localchat starting"
    );
}

/// Rotate log files: `localchat.log` → `.1` → `.2` → … → `.{keep}`.
///
/// The oldest file beyond `keep` is deleted. Missing files in the chain are
/// skipped.
fn rotate_log_file(base_path: &Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}
