//! Run event notifications.
//!
//! An [`EventHandler`] observes the engine as it walks the tree. Events
//! mirror the lifecycle stages plus node start/end; the handler receives the
//! current [`ContextView`] alongside each event. The default handler,
//! [`NoEvents`], drops everything.

use crate::context::ContextView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Setup,
    Start,
    Success,
    Failure,
    End,
    TearDown,
}

pub trait EventHandler {
    fn emit(&mut self, event: Event, ctx: &ContextView<'_>);
}

impl<F> EventHandler for F
where
    F: FnMut(Event, &ContextView<'_>),
{
    fn emit(&mut self, event: Event, ctx: &ContextView<'_>) {
        self(event, ctx)
    }
}

/// Handler that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl EventHandler for NoEvents {
    fn emit(&mut self, _: Event, _: &ContextView<'_>) {}
}
