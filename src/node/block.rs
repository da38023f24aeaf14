use std::borrow::Cow;

use crate::{
    config::Config,
    context::RunContext,
    event::Event,
    node::{Node, NodeKind},
    registry::keys,
    stage::run_stages_around,
};

/// Mid-level container: accepts [`Test`](super::Test), nested `Block`,
/// [`Assertion`](super::Assertion) and [`TestFn`](super::TestFn) children.
///
/// When the effective config asks for abort-on-failure, iteration stops at
/// the first failing child; children that were never visited are tallied as
/// skipped, not failed.
#[derive(Debug, Default)]
pub struct Block {
    name: Cow<'static, str>,
    config: Option<Config>,
    children: Vec<Node>,
}

impl Block {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            config: None,
            children: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.add_child(child.into());
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn config_mut(&mut self) -> &mut Config {
        self.config.get_or_insert_with(Config::new)
    }

    pub fn add_child(&mut self, child: Node) -> bool {
        if !NodeKind::Block.accepts(child.kind()) {
            return false;
        }
        self.children.push(child);
        true
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, at: usize) -> Option<&Node> {
        self.children.get(at)
    }

    pub(crate) fn run(&mut self, ctx: &mut RunContext<'_>, run_config: Option<&Config>) -> bool {
        let Block {
            name,
            config,
            children,
        } = self;
        let config = Config::effective(run_config, config.as_ref());
        let abort_on_failure = config
            .map(|c| c.get_bool(keys::ABORT_ON_FAILURE))
            .unwrap_or(false);

        ctx.stats.enter();
        let parent = std::mem::replace(&mut ctx.scope.block, Some(name.to_string()));
        ctx.emit(Event::Start);

        let all_passed = run_stages_around(ctx, config, |ctx| {
            let mut passed = true;
            let mut stopped_at = None;
            for (at, child) in children.iter_mut().enumerate() {
                passed &= child.run(ctx, config);
                if !passed && abort_on_failure {
                    stopped_at = Some(at + 1);
                    break;
                }
            }

            if let Some(from) = stopped_at {
                let remaining = &children[from..];
                if !remaining.is_empty() {
                    tracing::debug!(
                        block = %name,
                        skipped = remaining.len(),
                        "aborting on first failure"
                    );
                }
                for child in remaining {
                    ctx.stats.record_skip(child.kind());
                }
            }

            passed
        });

        ctx.stats.blocks.record(all_passed);
        ctx.all_passed &= all_passed;
        ctx.emit(Event::End);
        ctx.scope.block = parent;
        ctx.stats.exit();
        all_passed
    }
}
