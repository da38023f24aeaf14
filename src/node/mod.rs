//! The test tree.
//!
//! A [`Node`] is one element of the hierarchy: two leaf kinds
//! ([`Assertion`], [`TestFn`]) and three container kinds ([`Test`],
//! [`Block`], [`Module`]). Containers own their children and only accept
//! the kinds legal for them; an illegal add is rejected, never coerced.
//!
//! Running a node walks its subtree depth-first, AND-reducing child results.
//! A failing child never unwinds — it only flips the accumulated boolean.

mod assertion;
pub use assertion::*;

mod test_fn;
pub use test_fn::*;

mod test;
pub use test::*;

mod block;
pub use block::*;

mod module;
pub use module::*;

use crate::{config::Config, context::RunContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Assertion,
    TestFn,
    Test,
    Block,
    Module,
}

impl NodeKind {
    /// Whether a node of this kind accepts a child of kind `child`.
    pub fn accepts(self, child: NodeKind) -> bool {
        match self {
            NodeKind::Assertion | NodeKind::TestFn => false,
            NodeKind::Test => matches!(child, NodeKind::Assertion | NodeKind::TestFn),
            NodeKind::Block => !matches!(child, NodeKind::Module),
            NodeKind::Module => matches!(child, NodeKind::Block),
        }
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Assertion | NodeKind::TestFn)
    }

    pub fn is_container(self) -> bool {
        !self.is_leaf()
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum Node {
    Assertion(Assertion),
    TestFn(TestFn),
    Test(Test),
    Block(Block),
    Module(Module),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Assertion(_) => NodeKind::Assertion,
            Node::TestFn(_) => NodeKind::TestFn,
            Node::Test(_) => NodeKind::Test,
            Node::Block(_) => NodeKind::Block,
            Node::Module(_) => NodeKind::Module,
        }
    }

    /// The node's name; for an assertion, its message.
    pub fn name(&self) -> &str {
        match self {
            Node::Assertion(assertion) => assertion.message(),
            Node::TestFn(test_fn) => test_fn.name(),
            Node::Test(test) => test.name(),
            Node::Block(block) => block.name(),
            Node::Module(module) => module.name(),
        }
    }

    pub fn config(&self) -> Option<&Config> {
        match self {
            Node::Assertion(_) | Node::TestFn(_) => None,
            Node::Test(test) => test.config(),
            Node::Block(block) => block.config(),
            Node::Module(module) => module.config(),
        }
    }

    /// Append `child`, if this node is a container that accepts its kind.
    /// Returns false (and leaves the tree unchanged) otherwise.
    pub fn add_child(&mut self, child: Node) -> bool {
        match self {
            Node::Assertion(_) | Node::TestFn(_) => false,
            Node::Test(test) => test.add_child(child),
            Node::Block(block) => block.add_child(child),
            Node::Module(module) => module.add_child(child),
        }
    }

    pub fn child_count(&self) -> usize {
        match self {
            Node::Assertion(_) | Node::TestFn(_) => 0,
            Node::Test(test) => test.child_count(),
            Node::Block(block) => block.child_count(),
            Node::Module(module) => module.child_count(),
        }
    }

    pub fn child(&self, at: usize) -> Option<&Node> {
        match self {
            Node::Assertion(_) | Node::TestFn(_) => None,
            Node::Test(test) => test.child(at),
            Node::Block(block) => block.child(at),
            Node::Module(module) => module.child(at),
        }
    }

    /// Run this subtree. `run_config`, when given, overrides the configs of
    /// every node below (see [`Config::effective`]).
    pub fn run(&mut self, ctx: &mut RunContext<'_>, run_config: Option<&Config>) -> bool {
        match self {
            Node::Assertion(assertion) => assertion.run(ctx, run_config),
            Node::TestFn(test_fn) => test_fn.run(ctx, run_config),
            Node::Test(test) => test.run(ctx, run_config),
            Node::Block(block) => block.run(ctx, run_config),
            Node::Module(module) => module.run(ctx, run_config),
        }
    }
}

impl From<Assertion> for Node {
    fn from(assertion: Assertion) -> Self {
        Node::Assertion(assertion)
    }
}

impl From<TestFn> for Node {
    fn from(test_fn: TestFn) -> Self {
        Node::TestFn(test_fn)
    }
}

impl From<Test> for Node {
    fn from(test: Test) -> Self {
        Node::Test(test)
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Node::Block(block)
    }
}

impl From<Module> for Node {
    fn from(module: Module) -> Self {
        Node::Module(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{registry::keys, stage::Stage, test_support::*};

    fn node_of(kind: NodeKind) -> Node {
        match kind {
            NodeKind::Assertion => Assertion::new(true, "ok").into(),
            NodeKind::TestFn => TestFn::new("fn", PredicateHandle::from_const_fn(|| true)).into(),
            NodeKind::Test => Test::new("test").into(),
            NodeKind::Block => Block::new("block").into(),
            NodeKind::Module => Module::new("module").into(),
        }
    }

    const KINDS: [NodeKind; 5] = [
        NodeKind::Assertion,
        NodeKind::TestFn,
        NodeKind::Test,
        NodeKind::Block,
        NodeKind::Module,
    ];

    #[test]
    fn containment_invariant() {
        for parent_kind in KINDS {
            for child_kind in KINDS {
                let mut parent = node_of(parent_kind);
                let before = parent.child_count();
                let added = parent.add_child(node_of(child_kind));

                assert_eq!(
                    added,
                    parent_kind.accepts(child_kind),
                    "{parent_kind:?} <- {child_kind:?}"
                );
                let expected = match added {
                    true => before + 1,
                    false => before,
                };
                assert_eq!(parent.child_count(), expected);
            }
        }
    }

    #[test]
    fn child_lookup_is_bounds_checked() {
        let mut test = Test::new("t");
        assert!(test.add_child(Assertion::new(true, "one").into()));
        let node = Node::Test(test);

        assert!(node.child(0).is_some());
        assert!(node.child(1).is_none());
        assert!(node_of(NodeKind::Assertion).child(0).is_none());
    }

    #[test]
    fn assertion_yields_stored_result() {
        with_ctx(|ctx| {
            assert!(Assertion::new(true, "holds").run(ctx, None));
            assert!(!Assertion::new(false, "broken").run(ctx, None));
            assert_eq!(ctx.stats.asserts.run, 2);
            assert_eq!(ctx.stats.asserts.passed, 1);
            assert_eq!(ctx.stats.asserts.failed, 1);

            let last = ctx.last_assertion().unwrap();
            assert_eq!(last.message, "broken");
            assert!(!last.passed);
        });
    }

    #[test]
    fn test_fn_invokes_predicate() {
        with_ctx(|ctx| {
            let odd = TestFn::new("odd", PredicateHandle::from_const_fn(|| 3 % 2 == 1));
            assert!(odd.run(ctx, None));

            let broken = TestFn::new("broken", || false);
            assert!(!broken.run(ctx, None));
            assert_eq!(ctx.stats.test_fns.run, 2);
            assert_eq!(ctx.stats.test_fns.failed, 1);
        });
    }

    #[test]
    fn test_visits_every_child_despite_failures() {
        let mut test = Test::new("all children");
        test.add_child(Assertion::new(true, "first").into());
        test.add_child(Assertion::new(false, "second").into());
        test.add_child(Assertion::new(true, "third").into());

        with_ctx(|ctx| {
            assert!(!test.run(ctx, None));
            assert_eq!(ctx.stats.asserts.run, 3);
            assert_eq!(ctx.stats.tests.failed, 1);
        });
    }

    #[test]
    fn setup_failure_skips_children_and_fails_the_test() {
        let config = Config::new().with_hook(Stage::Setup, |_: &crate::ContextView<'_>| false);
        let mut test = Test::new("unreached")
            .with_config(config)
            .with_child(Assertion::new(true, "never run"));

        with_ctx(|ctx| {
            assert!(!test.run(ctx, None));
            assert_eq!(ctx.stats.asserts.run, 0);
            assert_eq!(ctx.stats.tests.failed, 1);
        });
    }

    #[test]
    fn block_aborts_on_first_failure_when_asked() {
        let config = Config::new().with(keys::ABORT_ON_FAILURE, true);
        let block = Block::new("aborting")
            .with_child(Assertion::new(true, "first"))
            .with_child(Assertion::new(false, "second"))
            .with_child(Assertion::new(true, "unreached"))
            .with_child(Test::new("also unreached").with_child(Assertion::new(true, "inner")));

        with_ctx(|ctx| {
            assert!(!Node::Block(block).run(ctx, Some(&config)));
            assert_eq!(ctx.stats.asserts.run, 2);
            assert_eq!(ctx.stats.asserts.skipped, 1);
            assert_eq!(ctx.stats.tests.skipped, 1);
            assert_eq!(ctx.stats.tests.run, 0);
        });
    }

    #[test]
    fn block_without_abort_visits_everything() {
        let mut block = Block::new("thorough")
            .with_child(Assertion::new(false, "first"))
            .with_child(Assertion::new(true, "second"));

        with_ctx(|ctx| {
            assert!(!block.run(ctx, None));
            assert_eq!(ctx.stats.asserts.run, 2);
            assert_eq!(ctx.stats.asserts.skipped, 0);
        });
    }

    #[test]
    fn module_tracks_block_tally_and_status() {
        let mut module = Module::new("m")
            .with_child(Block::new("good").with_child(Assertion::new(true, "ok")))
            .with_child(Block::new("bad").with_child(Assertion::new(false, "broken")));

        assert_eq!(module.status(), ModuleStatus::Pending);
        with_ctx(|ctx| {
            assert!(!module.run(ctx, None));
        });
        assert_eq!(module.status(), ModuleStatus::Failed);
        assert_eq!(module.blocks_total(), 2);
        assert_eq!(module.blocks_passed(), 1);
    }

    #[test]
    fn disabled_module_is_skipped_and_reports_passing() {
        let config = Config::new().with(keys::DISABLED, true);
        let mut module = Module::new("off")
            .with_config(config)
            .with_child(Block::new("never").with_child(Assertion::new(false, "unreached")));

        with_ctx(|ctx| {
            assert!(module.run(ctx, None));
            assert_eq!(ctx.stats.modules.skipped, 1);
            assert_eq!(ctx.stats.modules.run, 0);
            assert_eq!(ctx.stats.asserts.run, 0);
        });
        assert_eq!(module.status(), ModuleStatus::Pending);
    }

    #[test]
    fn run_config_overrides_node_config() {
        // own config says abort, run config says keep going
        let own = Config::new().with(keys::ABORT_ON_FAILURE, true);
        let run = Config::new().with(keys::ABORT_ON_FAILURE, false);
        let mut block = Block::new("overridden")
            .with_config(own)
            .with_child(Assertion::new(false, "first"))
            .with_child(Assertion::new(true, "second"));

        with_ctx(|ctx| {
            assert!(!block.run(ctx, Some(&run)));
            assert_eq!(ctx.stats.asserts.run, 2);
        });
    }

    #[test]
    fn depth_returns_to_zero_after_a_run() {
        let mut module = Module::new("deep").with_child(
            Block::new("outer").with_child(
                Block::new("inner")
                    .with_child(Test::new("leafy").with_child(Assertion::new(true, "ok"))),
            ),
        );

        with_ctx(|ctx| {
            assert!(module.run(ctx, None));
            assert_eq!(ctx.stats.current_depth(), 0);
            assert_eq!(ctx.stats.max_depth(), 4);
        });
    }
}
