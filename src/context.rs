//! Execution context threaded through a run.
//!
//! A [`RunContext`] owns the live statistics and the scratch state of the
//! walk (which module/block/test is current, the last assertion seen, the
//! running all-passed flag) and borrows the reporter and event sinks.
//! Reporter write failures never abort a run; they are collected and handed
//! back in the session report.
//!
//! Hooks and event handlers see the context through the borrowed
//! [`ContextView`].

use std::io;

use crate::{
    config::Config,
    event::{Event, EventHandler},
    formatter::Reporter,
    stage::Stage,
    stats::Stats,
};

/// The assertion most recently evaluated in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionRecord {
    pub message: String,
    pub passed: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ScopeNames {
    pub module: Option<String>,
    pub block: Option<String>,
    pub test: Option<String>,
}

pub struct RunContext<'r> {
    pub stats: Stats,
    pub(crate) scope: ScopeNames,
    pub(crate) last_assertion: Option<AssertionRecord>,
    pub(crate) all_passed: bool,
    reporter: &'r mut dyn Reporter,
    events: &'r mut dyn EventHandler,
    write_errors: Vec<io::Error>,
}

impl<'r> RunContext<'r> {
    pub fn new(reporter: &'r mut dyn Reporter, events: &'r mut dyn EventHandler) -> Self {
        Self {
            stats: Stats::new(),
            scope: ScopeNames::default(),
            last_assertion: None,
            all_passed: true,
            reporter,
            events,
            write_errors: Vec::new(),
        }
    }

    /// Whether every node visited so far passed.
    pub fn all_passed(&self) -> bool {
        self.all_passed
    }

    pub fn last_assertion(&self) -> Option<&AssertionRecord> {
        self.last_assertion.as_ref()
    }

    pub(crate) fn record_assertion(&mut self, message: &str, passed: bool) {
        self.last_assertion = Some(AssertionRecord {
            message: message.to_owned(),
            passed,
        });
    }

    /// Run a reporter call, keeping any write error for the report.
    pub(crate) fn write(&mut self, f: impl FnOnce(&mut dyn Reporter) -> io::Result<()>) {
        if let Err(error) = f(&mut *self.reporter) {
            self.write_errors.push(error);
        }
    }

    pub(crate) fn take_write_errors(&mut self) -> Vec<io::Error> {
        std::mem::take(&mut self.write_errors)
    }

    /// Notify the event handler, passing the current view.
    pub(crate) fn emit(&mut self, event: Event) {
        let view = ContextView {
            module: self.scope.module.as_deref(),
            block: self.scope.block.as_deref(),
            test: self.scope.test.as_deref(),
            depth: self.stats.current_depth(),
            all_passed: self.all_passed,
            last_assertion: self.last_assertion.as_ref(),
        };
        self.events.emit(event, &view);
    }

    /// Dispatch one stage hook from `config`. A missing hook counts as true.
    pub(crate) fn run_stage(&self, config: Option<&Config>, stage: Stage) -> bool {
        let Some(hook) = config.and_then(|config| config.hook(stage)) else {
            return true;
        };
        tracing::trace!(?stage, "dispatching stage hook");
        let view = ContextView {
            module: self.scope.module.as_deref(),
            block: self.scope.block.as_deref(),
            test: self.scope.test.as_deref(),
            depth: self.stats.current_depth(),
            all_passed: self.all_passed,
            last_assertion: self.last_assertion.as_ref(),
        };
        hook.call(&view)
    }
}

/// Borrowed view of a [`RunContext`], handed to hooks and event handlers.
#[derive(Debug, Clone, Copy)]
pub struct ContextView<'c> {
    pub module: Option<&'c str>,
    pub block: Option<&'c str>,
    pub test: Option<&'c str>,
    pub depth: usize,
    pub all_passed: bool,
    pub last_assertion: Option<&'c AssertionRecord>,
}
