use fxg_expected::FamilyRun;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

pub const RUN_LOG_ENV: &str = "FXG_RUN_LOG_PATH";

static RUN_LOG_PATH: OnceLock<Mutex<Option<PathBuf>>> = OnceLock::new();

/// One JSONL line per completed family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub ts_millis: u128,
    pub family: String,
    pub prefix: String,
    pub format: String,
    pub tuple_count: usize,
    pub written: usize,
    pub skipped: usize,
    pub suppressed: usize,
    pub duration_ms: u128,
}

impl RunLogEntry {
    #[must_use]
    pub fn from_run(run: &FamilyRun, format: &str) -> Self {
        let ts_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        Self {
            ts_millis,
            family: run.name.to_string(),
            prefix: run.prefix.clone(),
            format: format.to_string(),
            tuple_count: run.tuple_count,
            written: run.written,
            skipped: run.skipped,
            suppressed: run.suppressed,
            duration_ms: run.duration_ms,
        }
    }
}

pub fn set_run_log_path(path: Option<PathBuf>) {
    let cell = RUN_LOG_PATH.get_or_init(|| Mutex::new(None));
    if let Ok(mut slot) = cell.lock() {
        *slot = path;
    }
}

/// Append `entry` when a log path is configured via [`set_run_log_path`] or `FXG_RUN_LOG_PATH`.
pub fn maybe_append_run_log(entry: &RunLogEntry) -> Result<(), String> {
    let configured = RUN_LOG_PATH
        .get()
        .and_then(|cell| cell.lock().ok())
        .and_then(|slot| slot.clone());
    let from_env = std::env::var_os(RUN_LOG_ENV).map(PathBuf::from);
    let Some(path) = configured.or(from_env) else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed creating {}: {err}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|err| format!("failed opening {}: {err}", path.display()))?;
    let line = serde_json::to_string(entry)
        .map_err(|err| format!("failed serializing run log entry: {err}"))?;
    let mut payload = line.into_bytes();
    payload.push(b'\n');
    file.write_all(&payload)
        .map_err(|err| format!("failed appending run log {}: {err}", path.display()))
}
