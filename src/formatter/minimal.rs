use std::io;

use crate::formatter::{ModuleEnd, ModuleStart, Reporter, RunHeader, RunSummary};

/// One line per module, one line at the end. No color, no chatter.
pub struct MinimalReporter<W> {
    target: W,
}

impl<W: io::Write> MinimalReporter<W> {
    pub fn new(target: W) -> Self {
        Self { target }
    }
}

impl<W: io::Write> Reporter for MinimalReporter<W> {
    fn write_message(&mut self, _: &str) -> io::Result<()> {
        Ok(())
    }

    fn write_header(&mut self, _: &RunHeader<'_>) -> io::Result<()> {
        Ok(())
    }

    fn write_module_start(&mut self, _: &ModuleStart<'_>) -> io::Result<()> {
        Ok(())
    }

    fn write_module_end(&mut self, end: &ModuleEnd<'_>) -> io::Result<()> {
        let outcome = match end.passed {
            true => "ok",
            false => "FAILED",
        };
        writeln!(self.target, "{}: {outcome}", end.name)
    }

    fn write_summary(&mut self, summary: &RunSummary<'_>) -> io::Result<()> {
        writeln!(
            self.target,
            "{} failures in {} modules",
            summary.failure_count, summary.stats.modules.run,
        )
    }

    fn flush(&mut self) -> io::Result<()> {
        self.target.flush()
    }
}
