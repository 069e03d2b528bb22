use super::WorkerReport;
use super::logger::ResultLogger;
use crate::error::Result;
use crate::simulation::config::{LogPolicy, SimConfig};
use std::io::Write;
use tracing::{debug, warn};

/// The shared output of a run: console block plus CSV row per worker.
/// The orchestrator wraps it in a mutex so each worker's two writes land
/// together.
pub struct Reporter {
    console: Option<Box<dyn Write + Send>>,
    logger: Option<ResultLogger>,
    emitted: usize,
}

impl Reporter {
    pub fn new(console: Option<Box<dyn Write + Send>>, logger: Option<ResultLogger>) -> Self {
        Self {
            console,
            logger,
            emitted: 0,
        }
    }

    /// Opens the sinks `config` asks for, writing console blocks to `console`.
    /// A log file that cannot be created either aborts (`LogPolicy::Strict`)
    /// or is reported and skipped. Skipping it never leaves the run without a
    /// sink: the console is switched on if it was off.
    pub fn open(config: &SimConfig, console: Box<dyn Write + Send>) -> Result<Self> {
        let mut use_console = config.console;

        let logger = match &config.log_path {
            None => None,
            Some(path) => match ResultLogger::create(path) {
                Ok(logger) => {
                    debug!("Logging results to {}", path.display());
                    Some(logger)
                }
                Err(e) if config.log_policy == LogPolicy::Strict => return Err(e),
                Err(e) => {
                    if !use_console {
                        warn!("{} - falling back to console output", e);
                        use_console = true;
                    } else {
                        warn!("{} - continuing with console output only", e);
                    }
                    None
                }
            },
        };

        Ok(Self::new(use_console.then_some(console), logger))
    }

    pub fn emit(&mut self, report: &WorkerReport) -> Result<()> {
        if let Some(out) = self.console.as_mut() {
            writeln!(out, "\n{}", report)?;
            out.flush()?;
        }
        if let Some(logger) = self.logger.as_mut() {
            logger.log(report)?;
        }
        self.emitted += 1;
        Ok(())
    }

    /// Flushes and closes the sinks, returning how many results went out.
    pub fn finish(self) -> Result<usize> {
        if let Some(mut out) = self.console {
            out.flush()?;
        }
        if let Some(logger) = self.logger {
            logger.finish()?;
        }
        Ok(self.emitted)
    }
}
