//! Reporter sinks.
//!
//! The engine talks to its output through the [`Reporter`] trait; everything
//! here is replaceable by library users. Three implementations are provided:
//! [`ConsoleReporter`] (colored, verbosity-aware), [`MinimalReporter`] (one
//! line per module) and [`NoReporter`].
//!
//! [`ReporterOptions`] bridges from a session [`Config`](crate::config::Config)
//! (or CLI flags) to a boxed reporter, including output-file handling: a
//! file name without an extension gets `.txt` appended.

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use crate::{config::Config, registry::keys, session::SessionStatus, stats::StatsSnapshot};

mod console;
pub use console::*;

mod minimal;
pub use minimal::*;

mod no;
pub use no::*;

pub struct RunHeader<'a> {
    pub session: &'a str,
    pub modules: usize,
    pub repeat_count: usize,
}

pub struct ModuleStart<'a> {
    pub name: &'a str,
}

pub struct ModuleEnd<'a> {
    pub name: &'a str,
    pub passed: bool,
    pub blocks_total: usize,
    pub blocks_passed: usize,
}

pub struct RunSummary<'a> {
    pub session: &'a str,
    pub status: SessionStatus,
    pub failure_count: usize,
    pub stats: &'a StatsSnapshot,
}

/// Output sink for a session run. Write failures are collected by the
/// engine, never fatal.
pub trait Reporter {
    fn write_message(&mut self, text: &str) -> io::Result<()>;
    fn write_header(&mut self, header: &RunHeader<'_>) -> io::Result<()>;
    fn write_module_start(&mut self, start: &ModuleStart<'_>) -> io::Result<()>;
    fn write_module_end(&mut self, end: &ModuleEnd<'_>) -> io::Result<()>;
    fn write_summary(&mut self, summary: &RunSummary<'_>) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ColorSetting {
    #[default]
    Automatic,
    Always,
    Never,
}

pub(crate) mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

pub trait SupportsColor {
    fn supports_color(&self) -> bool;
}

impl SupportsColor for io::Stdout {
    fn supports_color(&self) -> bool {
        io::IsTerminal::is_terminal(self)
    }
}

impl SupportsColor for io::Stderr {
    fn supports_color(&self) -> bool {
        io::IsTerminal::is_terminal(self)
    }
}

// files get plain text even when stdout would be colored
impl SupportsColor for File {
    fn supports_color(&self) -> bool {
        false
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent,
    Minimal,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl Verbosity {
    /// Clamp a numeric level (0–4) into a verbosity.
    pub fn from_level(level: u32) -> Self {
        match level {
            0 => Verbosity::Silent,
            1 => Verbosity::Minimal,
            2 => Verbosity::Normal,
            3 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    }

    pub fn level(self) -> u32 {
        match self {
            Verbosity::Silent => 0,
            Verbosity::Minimal => 1,
            Verbosity::Normal => 2,
            Verbosity::Verbose => 3,
            Verbosity::Debug => 4,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Console,
    Text,
    Verbose,
    Minimal,
    Silent,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "console" => Some(OutputFormat::Console),
            "text" => Some(OutputFormat::Text),
            "verbose" => Some(OutputFormat::Verbose),
            "minimal" => Some(OutputFormat::Minimal),
            "silent" => Some(OutputFormat::Silent),
            _ => None,
        }
    }
}

/// Append the default `.txt` extension when the file name has none.
pub fn with_default_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(_) => path.to_path_buf(),
        None => path.with_extension("txt"),
    }
}

/// Everything needed to build a reporter for a session.
#[derive(Debug, Default)]
pub struct ReporterOptions {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    pub color: ColorSetting,
    pub show_timestamps: bool,
    pub show_duration: bool,
    pub output_file: Option<PathBuf>,
}

impl ReporterOptions {
    /// Read the reporter-facing keys out of a session config.
    pub fn from_config(config: &Config) -> Self {
        let format =
            OutputFormat::from_name(config.get_str(keys::OUTPUT_FORMAT)).unwrap_or_default();
        let color = match config.get_bool(keys::COLOR) {
            true => ColorSetting::Always,
            false => ColorSetting::Automatic,
        };
        let output_file = match config.get_str(keys::OUTPUT_FILE) {
            "" => None,
            path => Some(PathBuf::from(path)),
        };
        Self {
            format,
            verbosity: Verbosity::from_level(config.get_u32(keys::VERBOSITY)),
            color,
            show_timestamps: config.get_bool(keys::SHOW_TIMESTAMPS),
            show_duration: config.get_bool(keys::SHOW_DURATION),
            output_file,
        }
    }

    /// Build the reporter these options describe.
    pub fn build(self) -> io::Result<Box<dyn Reporter>> {
        let verbosity = match self.format {
            OutputFormat::Verbose => self.verbosity.max(Verbosity::Verbose),
            OutputFormat::Minimal => Verbosity::Minimal,
            _ => self.verbosity,
        };
        let color = match self.format {
            // plain text stays plain even on a terminal
            OutputFormat::Text => ColorSetting::Never,
            _ => self.color,
        };

        if matches!(self.format, OutputFormat::Silent) {
            return Ok(Box::new(NoReporter));
        }

        let target = self
            .output_file
            .map(|path| File::create(with_default_extension(&path)))
            .transpose()?;

        let reporter: Box<dyn Reporter> = match (self.format, target) {
            (OutputFormat::Minimal, Some(file)) => Box::new(MinimalReporter::new(file)),
            (OutputFormat::Minimal, None) => Box::new(MinimalReporter::new(io::stdout())),
            (_, Some(file)) => Box::new(
                ConsoleReporter::default()
                    .with_target(file)
                    .with_color(ColorSetting::Never)
                    .with_verbosity(verbosity)
                    .with_timestamps(self.show_timestamps)
                    .with_duration(self.show_duration),
            ),
            (_, None) => Box::new(
                ConsoleReporter::default()
                    .with_color(color)
                    .with_verbosity(verbosity)
                    .with_timestamps(self.show_timestamps)
                    .with_duration(self.show_duration),
            ),
        };
        Ok(reporter)
    }
}
