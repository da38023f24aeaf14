use std::{borrow::Cow, fmt::Debug};

use crate::{config::Config, context::RunContext};

/// Leaf node wrapping a zero-argument predicate.
#[derive(Debug)]
pub struct TestFn {
    name: Cow<'static, str>,
    predicate: PredicateHandle,
}

impl TestFn {
    pub fn new(name: impl Into<Cow<'static, str>>, predicate: impl Into<PredicateHandle>) -> Self {
        Self {
            name: name.into(),
            predicate: predicate.into(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    pub(crate) fn run(&self, ctx: &mut RunContext<'_>, config: Option<&Config>) -> bool {
        let passed = self.predicate.call();
        ctx.stats.test_fns.record(passed);

        if let Some(config) = config {
            let flags = config.flags();
            let echo = (passed && flags.print_on_pass()) || (!passed && flags.print_on_fail());
            if echo {
                let outcome = match passed {
                    true => "ok",
                    false => "FAILED",
                };
                let line = format!("{} ... {outcome}", self.name);
                ctx.write(|reporter| reporter.write_message(&line));
            }
        }

        passed
    }
}

pub trait Predicate {
    fn check(&self) -> bool;
}

impl<F> Predicate for F
where
    F: Fn() -> bool,
{
    fn check(&self) -> bool {
        self()
    }
}

#[non_exhaustive]
pub enum PredicateHandle {
    Ptr(fn() -> bool),
    Owned(Box<dyn Predicate + Send + Sync>),
    Static(&'static (dyn Predicate + Send + Sync)),
}

impl Debug for PredicateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ptr(ptr) => f.debug_tuple("Ptr").field(ptr).finish(),
            Self::Owned(_) => write!(f, "Owned(...)"),
            Self::Static(_) => write!(f, "Static(...)"),
        }
    }
}

impl PredicateHandle {
    pub const fn from_const_fn(f: fn() -> bool) -> Self {
        Self::Ptr(f)
    }

    pub fn from_boxed<F>(f: F) -> Self
    where
        F: Predicate + Send + Sync + 'static,
    {
        Self::Owned(Box::new(f))
    }

    pub const fn from_static_obj(f: &'static (dyn Predicate + Send + Sync)) -> Self {
        Self::Static(f)
    }

    pub fn call(&self) -> bool {
        match self {
            Self::Ptr(f) => f(),
            Self::Owned(f) => f.check(),
            Self::Static(f) => f.check(),
        }
    }
}

impl<F> From<F> for PredicateHandle
where
    F: Predicate + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::from_boxed(f)
    }
}
