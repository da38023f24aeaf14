use std::borrow::Cow;

use crate::{config::Config, context::RunContext};

/// Leaf node holding an already-computed comparison result and its message.
///
/// The result is immutable once constructed; running the node yields it and
/// records it as the context's last assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    message: Cow<'static, str>,
    passed: bool,
}

impl Assertion {
    pub fn new(passed: bool, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            passed,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    pub(crate) fn run(&self, ctx: &mut RunContext<'_>, config: Option<&Config>) -> bool {
        ctx.stats.asserts.record(self.passed);
        ctx.record_assertion(self.message.as_ref(), self.passed);

        if let Some(config) = config {
            let flags = config.flags();
            let echo = flags.show_messages() || (!self.passed && flags.print_on_fail());
            if echo {
                let line = match self.passed {
                    true => format!("assert: {}", self.message),
                    false => format!("assert FAILED: {}", self.message),
                };
                ctx.write(|reporter| reporter.write_message(&line));
            }
        }

        self.passed
    }
}
