use std::{io, time::Instant};

use crate::formatter::{
    ColorSetting, ModuleEnd, ModuleStart, Reporter, RunHeader, RunSummary, SupportsColor,
    Verbosity, colors,
};
use crate::session::SessionStatus;

/// Human-facing reporter with optional ANSI color and an elapsed-time
/// prefix. The default target is stdout.
pub struct ConsoleReporter<W> {
    target: W,
    color: ColorSetting,
    verbosity: Verbosity,
    show_timestamps: bool,
    show_duration: bool,
    started: Instant,
}

impl Default for ConsoleReporter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            color: ColorSetting::default(),
            verbosity: Verbosity::default(),
            show_timestamps: false,
            show_duration: false,
            started: Instant::now(),
        }
    }
}

impl<W> ConsoleReporter<W> {
    pub fn with_target<T>(self, target: T) -> ConsoleReporter<T> {
        ConsoleReporter {
            target,
            color: self.color,
            verbosity: self.verbosity,
            show_timestamps: self.show_timestamps,
            show_duration: self.show_duration,
            started: self.started,
        }
    }

    pub fn with_color(mut self, color: ColorSetting) -> Self {
        self.color = color;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_timestamps(mut self, on: bool) -> Self {
        self.show_timestamps = on;
        self
    }

    pub fn with_duration(mut self, on: bool) -> Self {
        self.show_duration = on;
        self
    }
}

impl<W: SupportsColor> ConsoleReporter<W> {
    fn color_enabled(&self) -> bool {
        match self.color {
            ColorSetting::Always => true,
            ColorSetting::Never => false,
            ColorSetting::Automatic => self.target.supports_color(),
        }
    }

    fn paint(&self, color: &'static str, text: &str) -> String {
        match self.color_enabled() {
            true => format!("{color}{text}{}", colors::RESET),
            false => text.to_string(),
        }
    }

    fn stamp(&self) -> String {
        match self.show_timestamps {
            true => format!("[{:>9.3}s] ", self.started.elapsed().as_secs_f64()),
            false => String::new(),
        }
    }
}

impl<W: io::Write + SupportsColor> Reporter for ConsoleReporter<W> {
    fn write_message(&mut self, text: &str) -> io::Result<()> {
        if self.verbosity < Verbosity::Normal {
            return Ok(());
        }
        writeln!(self.target, "{}{text}", self.stamp())
    }

    fn write_header(&mut self, header: &RunHeader<'_>) -> io::Result<()> {
        self.started = Instant::now();
        if self.verbosity < Verbosity::Minimal {
            return Ok(());
        }
        let iterations = match header.repeat_count {
            0 | 1 => String::new(),
            repeat => format!(", {repeat} iterations"),
        };
        writeln!(
            self.target,
            "{}running session {}: {} modules{iterations}",
            self.stamp(),
            header.session,
            header.modules,
        )
    }

    fn write_module_start(&mut self, start: &ModuleStart<'_>) -> io::Result<()> {
        if self.verbosity < Verbosity::Verbose {
            return Ok(());
        }
        writeln!(self.target, "{}module {} ...", self.stamp(), start.name)
    }

    fn write_module_end(&mut self, end: &ModuleEnd<'_>) -> io::Result<()> {
        if self.verbosity < Verbosity::Normal {
            return Ok(());
        }
        let outcome = match end.passed {
            true => self.paint(colors::GREEN, "ok"),
            false => self.paint(colors::RED, "FAILED"),
        };
        let blocks = match self.verbosity >= Verbosity::Verbose {
            true => format!(" ({}/{} blocks)", end.blocks_passed, end.blocks_total),
            false => String::new(),
        };
        writeln!(
            self.target,
            "{}module {} ... {outcome}{blocks}",
            self.stamp(),
            end.name,
        )
    }

    fn write_summary(&mut self, summary: &RunSummary<'_>) -> io::Result<()> {
        if self.verbosity < Verbosity::Minimal {
            return Ok(());
        }
        let stats = summary.stats;
        let outcome = match summary.status {
            SessionStatus::Completed if summary.failure_count == 0 => {
                self.paint(colors::GREEN, "ok")
            }
            SessionStatus::Completed => self.paint(colors::RED, "FAILED"),
            SessionStatus::Aborted => self.paint(colors::YELLOW, "aborted"),
            status => self.paint(colors::YELLOW, &format!("{status:?}").to_lowercase()),
        };

        writeln!(self.target)?;
        writeln!(
            self.target,
            "{}session {}: {outcome}. {} modules ({} failed, {} skipped); \
             {} tests, {} assertions",
            self.stamp(),
            summary.session,
            stats.modules.run,
            stats.modules.failed,
            stats.modules.skipped,
            stats.tests.run,
            stats.asserts.run,
        )?;
        if self.verbosity >= Verbosity::Verbose {
            writeln!(
                self.target,
                "{}pass rate: {:.1}% tests, {:.1}% assertions",
                self.stamp(),
                stats.pass_rate() * 100.0,
                stats.assert_rate() * 100.0,
            )?;
        }
        if self.show_duration {
            writeln!(
                self.target,
                "{}finished in {:.3}s",
                self.stamp(),
                stats.total_time.as_secs_f64(),
            )?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.target.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stats::StatsSnapshot, test_support::Buffer};

    fn reporter(buffer: &Buffer) -> ConsoleReporter<Buffer> {
        ConsoleReporter::default().with_target(buffer.clone())
    }

    #[test]
    fn module_end_lines_name_the_outcome() {
        let buffer = Buffer::default();
        let mut console = reporter(&buffer);

        console
            .write_module_end(&ModuleEnd {
                name: "storage",
                passed: true,
                blocks_total: 2,
                blocks_passed: 2,
            })
            .unwrap();
        console
            .write_module_end(&ModuleEnd {
                name: "network",
                passed: false,
                blocks_total: 2,
                blocks_passed: 1,
            })
            .unwrap();

        let output = buffer.try_to_string().unwrap();
        assert_eq!(output, "module storage ... ok\nmodule network ... FAILED\n");
    }

    #[test]
    fn color_is_painted_only_when_forced() {
        let buffer = Buffer::default();
        let mut console = reporter(&buffer).with_color(ColorSetting::Always);
        console
            .write_module_end(&ModuleEnd {
                name: "m",
                passed: true,
                blocks_total: 1,
                blocks_passed: 1,
            })
            .unwrap();
        assert!(buffer.try_to_string().unwrap().contains(colors::GREEN));

        // the capture buffer is not a terminal, so automatic stays plain
        let buffer = Buffer::default();
        let mut console = reporter(&buffer);
        console
            .write_module_end(&ModuleEnd {
                name: "m",
                passed: true,
                blocks_total: 1,
                blocks_passed: 1,
            })
            .unwrap();
        assert!(!buffer.try_to_string().unwrap().contains('\x1b'));
    }

    #[test]
    fn silent_verbosity_suppresses_everything() {
        let buffer = Buffer::default();
        let mut console = reporter(&buffer).with_verbosity(Verbosity::Silent);

        console
            .write_header(&RunHeader {
                session: "s",
                modules: 1,
                repeat_count: 1,
            })
            .unwrap();
        console.write_message("hidden").unwrap();
        console
            .write_summary(&RunSummary {
                session: "s",
                status: SessionStatus::Completed,
                failure_count: 0,
                stats: &StatsSnapshot::default(),
            })
            .unwrap();

        assert_eq!(buffer.try_to_string().unwrap(), "");
    }

    #[test]
    fn verbose_output_adds_module_starts_and_block_tallies() {
        let buffer = Buffer::default();
        let mut console = reporter(&buffer).with_verbosity(Verbosity::Verbose);

        console
            .write_module_start(&ModuleStart { name: "m" })
            .unwrap();
        console
            .write_module_end(&ModuleEnd {
                name: "m",
                passed: false,
                blocks_total: 3,
                blocks_passed: 1,
            })
            .unwrap();

        let output = buffer.try_to_string().unwrap();
        assert!(output.contains("module m ...\n"));
        assert!(output.contains("(1/3 blocks)"));
    }
}
