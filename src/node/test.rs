use std::borrow::Cow;

use crate::{
    config::Config,
    context::RunContext,
    event::Event,
    node::{Node, NodeKind},
    stage::run_stages_around,
};

/// Container for leaf checks: accepts [`Assertion`](super::Assertion) and
/// [`TestFn`](super::TestFn) children.
#[derive(Debug, Default)]
pub struct Test {
    name: Cow<'static, str>,
    config: Option<Config>,
    children: Vec<Node>,
}

impl Test {
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

    /// Builder form of [`add_child`](Self::add_child); an illegal child is
    /// dropped silently.
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
        if !NodeKind::Test.accepts(child.kind()) {
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
        let Test {
            name,
            config,
            children,
        } = self;
        let config = Config::effective(run_config, config.as_ref());

        ctx.stats.enter();
        let parent = std::mem::replace(&mut ctx.scope.test, Some(name.to_string()));
        ctx.emit(Event::Start);

        let mut checks = 0usize;
        let mut checks_passed = 0usize;
        let all_passed = run_stages_around(ctx, config, |ctx| {
            let mut passed = true;
            for child in children.iter_mut() {
                let child_passed = child.run(ctx, config);
                checks += 1;
                if child_passed {
                    checks_passed += 1;
                }
                passed &= child_passed;
            }
            passed
        });

        if config.map(|c| c.flags().show_counts()).unwrap_or(false) {
            let line = format!("{name}: {checks_passed}/{checks} checks passed");
            ctx.write(|reporter| reporter.write_message(&line));
        }

        ctx.stats.tests.record(all_passed);
        ctx.all_passed &= all_passed;
        ctx.emit(Event::End);
        ctx.scope.test = parent;
        ctx.stats.exit();
        all_passed
    }
}
