use std::io;

use crate::formatter::{ModuleEnd, ModuleStart, Reporter, RunHeader, RunSummary};

/// Reporter that swallows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReporter;

impl Reporter for NoReporter {
    fn write_message(&mut self, _: &str) -> io::Result<()> {
        Ok(())
    }

    fn write_header(&mut self, _: &RunHeader<'_>) -> io::Result<()> {
        Ok(())
    }

    fn write_module_start(&mut self, _: &ModuleStart<'_>) -> io::Result<()> {
        Ok(())
    }

    fn write_module_end(&mut self, _: &ModuleEnd<'_>) -> io::Result<()> {
        Ok(())
    }

    fn write_summary(&mut self, _: &RunSummary<'_>) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
