use std::fs;
use std::io::{self, Write};
use std::path::Path;

use env_logger::Target;
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};

use crate::conf::LoggingConfig;
use crate::core::GatewayError;

/// Configured level first, then `RUST_LOG` directives on top.
///
/// With a log file configured, records go to stderr and to that file, which
/// rotates at `max_bytes` keeping `backup_count` old files.
pub fn setup_logging(config: &LoggingConfig) -> Result<(), GatewayError> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(config.level_filter()?)
        .parse_default_env()
        .format_timestamp_millis();

    if let Some(path) = config.log_file() {
        let file = rotating_file(path, config.max_bytes, config.backup_count)?;
        builder.target(Target::Pipe(Box::new(Tee { file })));
    }

    builder.init();
    Ok(())
}

fn rotating_file(
    path: &Path,
    max_bytes: usize,
    backup_count: usize,
) -> Result<FileRotate<AppendCount>, GatewayError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(FileRotate::new(
        path,
        AppendCount::new(backup_count),
        ContentLimit::Bytes(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}

struct Tee<W> {
    file: W,
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_rotates_by_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("app.log");
        let mut file = rotating_file(&path, 10, 2).unwrap();

        for _ in 0..6 {
            file.write_all(b"0123456789").unwrap();
        }
        file.flush().unwrap();

        assert!(path.exists());
        assert!(dir.path().join("logs/app.log.1").exists());
        assert!(dir.path().join("logs/app.log.2").exists());
        assert!(!dir.path().join("logs/app.log.3").exists());
    }

    #[test]
    fn test_tee_writes_through_to_file() {
        let mut tee = Tee { file: Vec::new() };
        tee.write_all(b"line\n").unwrap();
        tee.flush().unwrap();
        assert_eq!(tee.file, b"line\n");
    }
}
