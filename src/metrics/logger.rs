use super::WorkerReport;
use crate::error::{Result, SimError};
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

pub const HEADER: [&str; 4] = ["thread", "local", "remote", "time"];

#[derive(Debug, Serialize)]
struct LogRow {
    thread: usize,
    local: usize,
    remote: usize,
    time: u64,
}

impl From<&WorkerReport> for LogRow {
    fn from(report: &WorkerReport) -> Self {
        Self {
            thread: report.worker_id,
            local: report.metrics.local_access,
            remote: report.metrics.remote_access,
            time: report.metrics.total_time,
        }
    }
}

/// CSV sink for worker results. The header is written on open, so an empty
/// run still produces a well-formed file.
pub struct ResultLogger {
    writer: Writer<File>,
}

impl ResultLogger {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|source| SimError::ResourceUnavailable { path: path.to_path_buf(), source })?;

        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn log(&mut self, report: &WorkerReport) -> Result<()> {
        self.writer.serialize(LogRow::from(report))?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
