use std::borrow::Cow;

use crate::{
    config::Config,
    context::RunContext,
    event::Event,
    formatter::{ModuleEnd, ModuleStart},
    node::{Node, NodeKind},
    registry::keys,
    stage::run_stages_around,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    #[default]
    Pending,
    Running,
    Passed,
    Failed,
}

impl ModuleStatus {
    pub fn passed(self) -> bool {
        matches!(self, ModuleStatus::Passed)
    }

    pub fn failed(self) -> bool {
        matches!(self, ModuleStatus::Failed)
    }

    pub fn finished(self) -> bool {
        matches!(self, ModuleStatus::Passed | ModuleStatus::Failed)
    }
}

/// Top-level container below the session: accepts [`Block`](super::Block)
/// children only.
///
/// A module whose effective config marks it disabled is skipped entirely: it
/// reports passing, counts as a skip, and never leaves `Pending`.
#[derive(Debug, Default)]
pub struct Module {
    name: Cow<'static, str>,
    config: Option<Config>,
    children: Vec<Node>,
    status: ModuleStatus,
    blocks_total: usize,
    blocks_passed: usize,
}

impl Module {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
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

    pub fn status(&self) -> ModuleStatus {
        self.status
    }

    /// Blocks visited by the latest run.
    pub fn blocks_total(&self) -> usize {
        self.blocks_total
    }

    pub fn blocks_passed(&self) -> usize {
        self.blocks_passed
    }

    pub fn add_child(&mut self, child: Node) -> bool {
        if !NodeKind::Module.accepts(child.kind()) {
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
        let Module {
            name,
            config,
            children,
            status,
            blocks_total,
            blocks_passed,
        } = self;
        let config = Config::effective(run_config, config.as_ref());

        if config.map(|c| c.get_bool(keys::DISABLED)).unwrap_or(false) {
            tracing::debug!(module = %name, "module disabled, skipping");
            ctx.stats.modules.skip();
            let line = format!("module {name}: skipped (disabled)");
            ctx.write(|reporter| reporter.write_message(&line));
            return true;
        }

        *status = ModuleStatus::Running;
        tracing::debug!(module = %name, "module running");

        ctx.stats.enter();
        let parent = std::mem::replace(&mut ctx.scope.module, Some(name.to_string()));
        ctx.write(|reporter| {
            reporter.write_module_start(&ModuleStart {
                name: name.as_ref(),
            })
        });
        ctx.emit(Event::Start);

        *blocks_total = 0;
        *blocks_passed = 0;
        let all_passed = run_stages_around(ctx, config, |ctx| {
            let mut passed = true;
            for child in children.iter_mut() {
                *blocks_total += 1;
                let child_passed = child.run(ctx, config);
                if child_passed {
                    *blocks_passed += 1;
                }
                passed &= child_passed;
            }
            passed
        });

        *status = match all_passed {
            true => ModuleStatus::Passed,
            false => ModuleStatus::Failed,
        };
        ctx.stats.modules.record(all_passed);
        ctx.all_passed &= all_passed;
        ctx.write(|reporter| {
            reporter.write_module_end(&ModuleEnd {
                name: name.as_ref(),
                passed: all_passed,
                blocks_total: *blocks_total,
                blocks_passed: *blocks_passed,
            })
        });
        ctx.emit(Event::End);
        ctx.scope.module = parent;
        ctx.stats.exit();
        all_passed
    }
}
