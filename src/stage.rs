//! Lifecycle stages and their hooks.
//!
//! Every container node may carry at most one hook per stage. A hook
//! receives the current [`ContextView`] and returns a boolean. Dispatch
//! order around a container's children is fixed:
//!
//! ```text
//! Setup → children → (OnSuccess xor OnFailure) → TearDown
//! ```
//!
//! TearDown always fires, even when Setup failed — and when Setup succeeded
//! it runs *after* the success/failure dispatch. A missing hook is a silent
//! no-op; a missing Setup counts as having returned true.

use std::fmt::Debug;

use crate::{
    config::Config,
    context::{ContextView, RunContext},
    event::Event,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Setup,
    TearDown,
    OnSuccess,
    OnFailure,
    /// Reserved for modules; never dispatched by the engine.
    Before,
    /// Reserved for modules; never dispatched by the engine.
    After,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Setup,
        Stage::TearDown,
        Stage::OnSuccess,
        Stage::OnFailure,
        Stage::Before,
        Stage::After,
    ];

    fn index(self) -> usize {
        match self {
            Stage::Setup => 0,
            Stage::TearDown => 1,
            Stage::OnSuccess => 2,
            Stage::OnFailure => 3,
            Stage::Before => 4,
            Stage::After => 5,
        }
    }
}

/// A stage callback.
pub trait StageHook {
    fn call_hook(&self, ctx: &ContextView<'_>) -> bool;
}

impl<F> StageHook for F
where
    F: Fn(&ContextView<'_>) -> bool,
{
    fn call_hook(&self, ctx: &ContextView<'_>) -> bool {
        self(ctx)
    }
}

#[non_exhaustive]
pub enum HookHandle {
    Ptr(fn(&ContextView<'_>) -> bool),
    Owned(Box<dyn StageHook + Send + Sync>),
    Static(&'static (dyn StageHook + Send + Sync)),
}

impl Debug for HookHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ptr(ptr) => f.debug_tuple("Ptr").field(ptr).finish(),
            Self::Owned(_) => write!(f, "Owned(...)"),
            Self::Static(_) => write!(f, "Static(...)"),
        }
    }
}

impl HookHandle {
    pub const fn from_const_fn(f: fn(&ContextView<'_>) -> bool) -> Self {
        Self::Ptr(f)
    }

    pub fn from_boxed<H>(hook: H) -> Self
    where
        H: StageHook + Send + Sync + 'static,
    {
        Self::Owned(Box::new(hook))
    }

    pub const fn from_static_obj(hook: &'static (dyn StageHook + Send + Sync)) -> Self {
        Self::Static(hook)
    }

    pub fn call(&self, ctx: &ContextView<'_>) -> bool {
        match self {
            Self::Ptr(f) => f(ctx),
            Self::Owned(hook) => hook.call_hook(ctx),
            Self::Static(hook) => hook.call_hook(ctx),
        }
    }
}

impl<H> From<H> for HookHandle
where
    H: StageHook + Send + Sync + 'static,
{
    fn from(hook: H) -> Self {
        Self::from_boxed(hook)
    }
}

/// Per-node hook table, one optional slot per stage.
#[derive(Debug, Default)]
pub struct StageHooks {
    slots: [Option<HookHandle>; 6],
}

impl StageHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, stage: Stage, hook: HookHandle) {
        self.slots[stage.index()] = Some(hook);
    }

    pub fn get(&self, stage: Stage) -> Option<&HookHandle> {
        self.slots[stage.index()].as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Wrap `body` in the fixed stage order for one container node.
///
/// On Setup failure the children are never visited: TearDown fires and the
/// node fails. Events mirror the stages as they are entered.
pub(crate) fn run_stages_around(
    ctx: &mut RunContext<'_>,
    config: Option<&Config>,
    body: impl FnOnce(&mut RunContext<'_>) -> bool,
) -> bool {
    ctx.emit(Event::Setup);
    if !ctx.run_stage(config, Stage::Setup) {
        ctx.emit(Event::Failure);
        ctx.emit(Event::TearDown);
        ctx.run_stage(config, Stage::TearDown);
        return false;
    }

    let passed = body(ctx);
    match passed {
        true => {
            ctx.emit(Event::Success);
            ctx.run_stage(config, Stage::OnSuccess);
        }
        false => {
            ctx.emit(Event::Failure);
            ctx.run_stage(config, Stage::OnFailure);
        }
    }

    ctx.emit(Event::TearDown);
    ctx.run_stage(config, Stage::TearDown);
    passed
}
