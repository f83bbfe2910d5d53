use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use env_logger::{Env, Target};
use log::info;

const LOG_FILE: &str = "clipdeck.log";
const OLD_LOG_FILE: &str = "clipdeck.old.log";
const MAX_LOG_BYTES: u64 = 2 * 1024 * 1024;

/// Writes each line to stderr and, when available, the log file.
struct TeeWriter {
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = std::io::stderr().write_all(buf);
        if let Some(file) = self.file.as_mut() {
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = std::io::stderr().flush();
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Install the global logger. `RUST_LOG` overrides the default `info` filter.
/// Safe to call more than once; later calls are ignored.
pub fn init(data_dir: &Path) {
    let _ = std::fs::create_dir_all(data_dir);
    let log_path = data_dir.join(LOG_FILE);
    rotate_if_needed(&log_path, &data_dir.join(OLD_LOG_FILE), MAX_LOG_BYTES);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();
    let has_file = file.is_some();

    let installed = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {:<5} {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(TeeWriter { file })))
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    info!("=== clipdeck v{} started ===", env!("CARGO_PKG_VERSION"));
    info!("OS: {}", std::env::consts::OS);
    info!("Arch: {}", std::env::consts::ARCH);
    if has_file {
        info!("Log file: {}", log_path.display());
    }
}

/// Rename the log to `old_path` once it grows past `max_bytes`.
fn rotate_if_needed(log_path: &Path, old_path: &Path, max_bytes: u64) -> bool {
    match std::fs::metadata(log_path) {
        Ok(meta) if meta.len() > max_bytes => std::fs::rename(log_path, old_path).is_ok(),
        _ => false,
    }
}
