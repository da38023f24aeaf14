//! Session orchestration.
//!
//! A [`Session`] owns a list of module nodes and drives them through
//! repeated iterations with abort-on-failure and fail-fast policies. Its
//! status machine is
//!
//! ```text
//! Created → Running → (Paused ⇄ Running) → Completed | Aborted | Error
//! ```
//!
//! Terminal states never transition back; [`reset`](Session::reset) is the
//! explicit way to make a finished session runnable again.
//!
//! Execution is synchronous and single-threaded. Pause, resume and abort
//! are cooperative: they are *requests*, placed through a cloneable
//! [`SessionController`] (typically from a stage hook or event handler),
//! and the run loop applies them between modules. An in-flight module is
//! never preempted; a paused session skips modules, one boundary at a
//! time, until a resume request arrives.

use std::{
    borrow::Cow,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use crate::{
    config::{Config, Value},
    context::RunContext,
    event::{Event, EventHandler, NoEvents},
    formatter::{ConsoleReporter, Reporter, RunHeader, RunSummary},
    node::{Node, NodeKind},
    registry::keys,
    report::SessionReport,
    stage::{HookHandle, Stage, StageHook},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    #[default]
    Created,
    Running,
    Paused,
    Completed,
    Aborted,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Aborted | SessionStatus::Error
        )
    }

    pub fn is_active(self) -> bool {
        matches!(self, SessionStatus::Running | SessionStatus::Paused)
    }

    /// Whether the status machine allows moving from `self` to `to`.
    pub fn can_transition(self, to: SessionStatus) -> bool {
        match (self, to) {
            (SessionStatus::Created, SessionStatus::Running) => true,
            (
                SessionStatus::Running,
                SessionStatus::Paused
                | SessionStatus::Completed
                | SessionStatus::Aborted
                | SessionStatus::Error,
            ) => true,
            (
                SessionStatus::Paused,
                SessionStatus::Running | SessionStatus::Aborted | SessionStatus::Error,
            ) => true,
            _ => false,
        }
    }
}

const REQ_NONE: u8 = 0;
const REQ_PAUSE: u8 = 1;
const REQ_RESUME: u8 = 2;
const REQ_ABORT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlRequest {
    Pause,
    Resume,
    Abort,
}

/// Cloneable handle for cooperative session control.
///
/// Requests are applied by the run loop at the next module boundary; the
/// latest request wins, except that an abort request is never overwritten.
#[derive(Debug, Clone, Default)]
pub struct SessionController {
    request: Arc<AtomicU8>,
}

impl SessionController {
    pub fn pause(&self) {
        self.put(REQ_PAUSE);
    }

    pub fn resume(&self) {
        self.put(REQ_RESUME);
    }

    pub fn abort(&self) {
        self.request.store(REQ_ABORT, Ordering::SeqCst);
    }

    fn put(&self, request: u8) {
        let _ = self
            .request
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                match current {
                    REQ_ABORT => None,
                    _ => Some(request),
                }
            });
    }

    pub(crate) fn take(&self) -> Option<ControlRequest> {
        match self.request.swap(REQ_NONE, Ordering::SeqCst) {
            REQ_PAUSE => Some(ControlRequest::Pause),
            REQ_RESUME => Some(ControlRequest::Resume),
            REQ_ABORT => Some(ControlRequest::Abort),
            _ => None,
        }
    }

    pub(crate) fn clear(&self) {
        self.request.store(REQ_NONE, Ordering::SeqCst);
    }
}

/// The options the run loop actually reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SessionOptions {
    abort_on_failure: bool,
    repeat_count: usize,
    fail_fast: usize,
}

impl SessionOptions {
    fn read(config: &Config) -> Self {
        Self {
            abort_on_failure: config.get_bool(keys::ABORT_ON_FAILURE),
            // a repeat count of zero would make the run a no-op
            repeat_count: config.get_usize(keys::REPEAT_COUNT).max(1),
            fail_fast: config.get_usize(keys::FAIL_FAST),
        }
    }
}

/// Top-level orchestrator. Accepts [`Module`](crate::node::Module) nodes
/// only.
pub struct Session {
    name: Cow<'static, str>,
    config: Config,
    modules: Vec<Node>,
    status: SessionStatus,
    controller: SessionController,
    reporter: Box<dyn Reporter>,
    events: Box<dyn EventHandler>,
    report: Option<SessionReport>,
}

impl Session {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            config: Config::new(),
            modules: Vec::new(),
            status: SessionStatus::default(),
            controller: SessionController::default(),
            reporter: Box::new(ConsoleReporter::default()),
            events: Box::new(NoEvents),
            report: None,
        }
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn with_reporter_boxed(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_events(mut self, events: impl EventHandler + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    /// Set a session option; see [`Config::set`] for validation rules.
    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.set(key, value);
        self
    }

    pub fn with_hook<H>(mut self, stage: Stage, hook: H) -> Self
    where
        H: StageHook + Send + Sync + 'static,
    {
        self.config.set_hook(stage, HookHandle::from_boxed(hook));
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Append a module. Anything but a [`NodeKind::Module`] is rejected.
    pub fn add_module(&mut self, module: impl Into<Node>) -> bool {
        let node = module.into();
        if !matches!(node.kind(), NodeKind::Module) {
            return false;
        }
        self.modules.push(node);
        true
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn module(&self, at: usize) -> Option<&Node> {
        self.modules.get(at)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Handle for pause/resume/abort requests; safe to clone into hooks.
    pub fn controller(&self) -> SessionController {
        self.controller.clone()
    }

    /// The report of the latest finished run.
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    pub fn all_passed(&self) -> bool {
        self.report
            .as_ref()
            .map(SessionReport::all_passed)
            .unwrap_or(false)
    }

    /// Mark the session errored, e.g. when an embedder-side fault
    /// invalidates the run. Terminal for exit-code purposes.
    pub fn mark_error(&mut self) {
        self.status = SessionStatus::Error;
    }

    /// Make a finished session runnable again. Active sessions cannot be
    /// reset.
    pub fn reset(&mut self) -> bool {
        if self.status.is_active() {
            return false;
        }
        self.status = SessionStatus::Created;
        self.report = None;
        self.controller.clear();
        true
    }

    /// Process exit code for the current state: 2 for aborted or errored
    /// sessions, 1 for completed runs with failures, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            SessionStatus::Error | SessionStatus::Aborted => 2,
            _ => {
                let failures = self
                    .report
                    .as_ref()
                    .map(|report| report.failure_count)
                    .unwrap_or(0);
                match failures {
                    0 => 0,
                    _ => 1,
                }
            }
        }
    }

    /// Run every module, in declared order, `repeat_count` times.
    ///
    /// Returns true when no module failed. Only a freshly created (or
    /// [`reset`](Self::reset)) session runs; anything else returns false
    /// immediately.
    pub fn run(&mut self) -> bool {
        if !matches!(self.status, SessionStatus::Created) {
            tracing::debug!(status = ?self.status, "session is not runnable");
            return false;
        }
        let options = SessionOptions::read(&self.config);
        self.status = SessionStatus::Running;
        tracing::debug!(
            session = %self.name,
            modules = self.modules.len(),
            repeat_count = options.repeat_count,
            "session running"
        );

        let Session {
            name,
            config,
            modules,
            status,
            controller,
            reporter,
            events,
            report,
        } = self;
        let run_config = (!config.is_empty()).then_some(&*config);

        let mut ctx = RunContext::new(reporter.as_mut(), events.as_mut());
        ctx.stats.start_timer();
        ctx.write(|reporter| {
            reporter.write_header(&RunHeader {
                session: name.as_ref(),
                modules: modules.len(),
                repeat_count: options.repeat_count,
            })
        });
        ctx.emit(Event::Start);

        let mut failure_count = 0usize;
        'iterations: for _ in 0..options.repeat_count {
            for module in modules.iter_mut() {
                match controller.take() {
                    Some(ControlRequest::Pause) if *status == SessionStatus::Running => {
                        tracing::debug!("session paused");
                        *status = SessionStatus::Paused;
                    }
                    Some(ControlRequest::Resume) if *status == SessionStatus::Paused => {
                        tracing::debug!("session resumed");
                        *status = SessionStatus::Running;
                    }
                    Some(ControlRequest::Abort) => {
                        *status = SessionStatus::Aborted;
                    }
                    _ => {}
                }

                match *status {
                    SessionStatus::Paused => {
                        let line = format!("module {}: skipped (session paused)", module.name());
                        ctx.write(|reporter| reporter.write_message(&line));
                        ctx.stats.modules.skip();
                        continue;
                    }
                    SessionStatus::Aborted => break 'iterations,
                    _ => {}
                }

                let passed = module.run(&mut ctx, run_config);
                if !passed {
                    failure_count += 1;
                }

                let abort = (options.abort_on_failure && !passed)
                    || (options.fail_fast > 0 && failure_count >= options.fail_fast);
                if abort {
                    tracing::debug!(failure_count, "aborting session");
                    *status = SessionStatus::Aborted;
                    break 'iterations;
                }
            }
        }

        if *status != SessionStatus::Aborted {
            *status = SessionStatus::Completed;
        }
        ctx.stats.stop_timer();
        ctx.emit(Event::End);

        let stats = ctx.stats.snapshot();
        ctx.write(|reporter| {
            reporter.write_summary(&RunSummary {
                session: name.as_ref(),
                status: *status,
                failure_count,
                stats: &stats,
            })
        });
        ctx.write(|reporter| reporter.flush());

        *report = Some(SessionReport {
            status: *status,
            failure_count,
            stats,
            duration: stats.total_time,
            write_errors: ctx.take_write_errors(),
        });
        tracing::debug!(status = ?*status, failure_count, "session finished");

        failure_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{formatter::NoReporter, test_support::*};

    fn quiet_session(name: &'static str) -> Session {
        Session::new(name).with_reporter(NoReporter)
    }

    #[test]
    fn only_modules_are_accepted() {
        let mut session = quiet_session("s");
        assert!(session.add_module(module_of("m", vec![])));
        assert!(!session.add_module(crate::node::Block::new("b")));
        assert!(!session.add_module(crate::node::Test::new("t")));
        assert_eq!(session.module_count(), 1);
    }

    #[test]
    fn transitions_follow_the_machine() {
        use SessionStatus::*;
        assert!(Created.can_transition(Running));
        assert!(Running.can_transition(Paused));
        assert!(Paused.can_transition(Running));
        assert!(Running.can_transition(Completed));
        assert!(Paused.can_transition(Aborted));

        assert!(!Created.can_transition(Completed));
        assert!(!Completed.can_transition(Running));
        assert!(!Aborted.can_transition(Running));
        assert!(!Error.can_transition(Running));
        assert!(!Created.can_transition(Paused));
    }

    #[test]
    fn finished_sessions_need_a_reset_to_run_again() {
        let mut session = quiet_session("again");
        session.add_module(module_of("m", vec![passing_block("b")]));

        assert!(session.run());
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(!session.run());

        assert!(session.reset());
        assert_eq!(session.status(), SessionStatus::Created);
        assert!(session.run());
        assert_eq!(session.report().unwrap().modules_run(), 1);
    }

    #[test]
    fn exit_code_is_zero_before_any_run() {
        let session = quiet_session("fresh");
        assert_eq!(session.exit_code(), 0);
        assert!(!session.all_passed());
    }

    #[test]
    fn mark_error_maps_to_exit_code_two() {
        let mut session = quiet_session("broken");
        session.mark_error();
        assert_eq!(session.exit_code(), 2);
    }

    #[test]
    fn abort_request_stops_before_the_next_module() {
        let mut session = quiet_session("aborting");
        session.add_module(module_of("first", vec![passing_block("b")]));
        session.add_module(module_of("second", vec![passing_block("b")]));

        let controller = session.controller();
        controller.abort();

        assert!(session.run());
        assert_eq!(session.status(), SessionStatus::Aborted);
        assert_eq!(session.report().unwrap().modules_run(), 0);
        assert_eq!(session.exit_code(), 2);
    }

    #[test]
    fn abort_request_is_not_overwritten() {
        let controller = SessionController::default();
        controller.abort();
        controller.pause();
        assert_eq!(controller.take(), Some(ControlRequest::Abort));
        assert_eq!(controller.take(), None);
    }

    #[test]
    fn reserved_options_do_not_change_execution() {
        let mut session = quiet_session("reserved")
            .with_option(keys::PARALLEL, true)
            .with_option(keys::PARALLEL_WORKERS, 8usize)
            .with_option(keys::SHUFFLE, true)
            .with_option(keys::TIMEOUT_MS, 5usize)
            .with_option(keys::FILTER_INCLUDE, "nothing");
        session.add_module(module_of("a", vec![passing_block("b")]));
        session.add_module(module_of("b", vec![passing_block("b")]));

        assert!(session.run());
        let report = session.report().unwrap();
        // declared in order, run in order, nothing filtered or parallel
        assert_eq!(report.modules_run(), 2);
        assert_eq!(report.failure_count, 0);
    }

    #[test]
    fn abort_on_failure_stops_at_the_failing_module() {
        let mut session = quiet_session("ordered").with_option(keys::ABORT_ON_FAILURE, true);
        session.add_module(module_of("good", vec![passing_block("b")]));
        session.add_module(module_of("bad", vec![failing_block("b")]));
        session.add_module(module_of("unreached", vec![passing_block("b")]));

        assert!(!session.run());
        assert_eq!(session.status(), SessionStatus::Aborted);
        assert_eq!(session.report().unwrap().modules_run(), 2);
        assert_eq!(session.exit_code(), 2);
    }

    #[test]
    fn repeat_count_zero_still_runs_once() {
        let mut session = quiet_session("zero").with_option(keys::REPEAT_COUNT, 0usize);
        session.add_module(module_of("m", vec![passing_block("b")]));

        assert!(session.run());
        assert_eq!(session.report().unwrap().modules_run(), 1);
    }
}
