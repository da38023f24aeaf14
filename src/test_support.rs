//! Helpers shared by the unit tests.

use std::{
    io,
    sync::{Arc, Mutex},
};

use crate::{
    context::RunContext,
    event::NoEvents,
    formatter::{NoReporter, SupportsColor},
    node::{Assertion, Block, Module, Node, Test},
};

/// Run `f` with a context wired to throwaway sinks.
pub(crate) fn with_ctx<R>(f: impl FnOnce(&mut RunContext<'_>) -> R) -> R {
    let mut reporter = NoReporter;
    let mut events = NoEvents;
    let mut ctx = RunContext::new(&mut reporter, &mut events);
    f(&mut ctx)
}

pub(crate) fn passing_test(name: &'static str) -> Node {
    Test::new(name)
        .with_child(Assertion::new(true, "holds"))
        .into()
}

pub(crate) fn failing_test(name: &'static str) -> Node {
    Test::new(name)
        .with_child(Assertion::new(false, "broken"))
        .into()
}

pub(crate) fn passing_block(name: &'static str) -> Node {
    Block::new(name).with_child(passing_test("t")).into()
}

pub(crate) fn failing_block(name: &'static str) -> Node {
    Block::new(name).with_child(failing_test("t")).into()
}

pub(crate) fn module_of(name: &'static str, blocks: Vec<Node>) -> Module {
    let mut module = Module::new(name);
    for block in blocks {
        module.add_child(block);
    }
    module
}

/// Shared capture target for reporter output.
#[derive(Debug, Default, Clone)]
pub(crate) struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    pub fn try_to_string(&self) -> io::Result<String> {
        let guard = self.0.lock().map_err(|_| io::Error::other("poisoned"))?;
        String::from_utf8(guard.to_vec()).map_err(io::Error::other)
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.0.lock().map_err(|_| io::Error::other("poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self.0.lock().map_err(|_| io::Error::other("poisoned"))?;
        guard.flush()
    }
}

impl SupportsColor for Buffer {
    fn supports_color(&self) -> bool {
        false
    }
}
