//! Flattening of the nested suite tree into a stream of test outcomes.
//!
//! Traversal is pre-order: a suite's own tests come before its child suites,
//! children in array order. Routing tags resolved for a suite are copied into
//! each child frame, so sibling branches never share mutable context.

use crate::domain::models::{
    RawTest, ReportBundle, RoutingDefaults, RoutingTags, SuiteNode, TestOutcome, TestState,
};

/// A suite waiting to be visited, with everything it inherits.
#[derive(Debug, Clone)]
struct Frame<'a> {
    node: &'a SuiteNode,
    file: &'a str,
    context: RoutingTags,
    tests: std::slice::Iter<'a, RawTest>,
}

impl<'a> Frame<'a> {
    fn new(node: &'a SuiteNode, inherited_file: &'a str, inherited: RoutingTags) -> Self {
        let file = if inherited_file.is_empty() {
            node.file.as_deref().unwrap_or_default()
        } else {
            inherited_file
        };
        let context = RoutingTags::parse(node.title.as_deref().unwrap_or_default()).over(inherited);

        Self {
            node,
            file,
            context,
            tests: node.tests.iter(),
        }
    }
}

/// Restartable source of flattened outcomes over a set of root suites.
#[derive(Debug, Clone)]
pub struct TestFlattener<'a> {
    roots: Vec<(&'a SuiteNode, &'a str, RoutingTags)>,
    defaults: RoutingDefaults,
}

impl<'a> TestFlattener<'a> {
    /// Flatten every top-level result of a merged report.
    pub fn new(bundle: &'a ReportBundle, defaults: RoutingDefaults) -> Self {
        let roots = bundle
            .results
            .iter()
            .map(|suite| (suite, "", RoutingTags::default()))
            .collect();
        Self { roots, defaults }
    }

    /// Flatten a single suite with an explicit file and inherited context.
    pub fn for_suite(
        node: &'a SuiteNode,
        file: &'a str,
        inherited: RoutingTags,
        defaults: RoutingDefaults,
    ) -> Self {
        Self {
            roots: vec![(node, file, inherited)],
            defaults,
        }
    }

    /// A fresh pass over the tree.
    pub fn iter(&self) -> FlattenIter<'a> {
        FlattenIter {
            stack: self
                .roots
                .iter()
                .rev()
                .map(|&(node, file, context)| Frame::new(node, file, context))
                .collect(),
            current: None,
            defaults: self.defaults,
        }
    }
}

impl<'a> IntoIterator for &TestFlattener<'a> {
    type Item = TestOutcome;
    type IntoIter = FlattenIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator produced by [`TestFlattener::iter`].
#[derive(Debug, Clone)]
pub struct FlattenIter<'a> {
    stack: Vec<Frame<'a>>,
    current: Option<Frame<'a>>,
    defaults: RoutingDefaults,
}

impl Iterator for FlattenIter<'_> {
    type Item = TestOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(frame) = &mut self.current {
                if let Some(raw) = frame.tests.next() {
                    return Some(TestOutcome::from_raw(
                        raw,
                        frame.file,
                        frame.context,
                        self.defaults,
                    ));
                }

                let (node, file, context) = (frame.node, frame.file, frame.context);
                self.current = None;
                self.stack.extend(
                    node.suites
                        .iter()
                        .rev()
                        .map(|child| Frame::new(child, file, context)),
                );
            }

            self.current = Some(self.stack.pop()?);
        }
    }
}

/// Split outcomes into passed and failed; every other state is left out.
pub fn partition_by_state(outcomes: &[TestOutcome]) -> (Vec<TestOutcome>, Vec<TestOutcome>) {
    let passed = outcomes
        .iter()
        .filter(|o| o.state == TestState::Passed)
        .cloned()
        .collect();
    let failed = outcomes
        .iter()
        .filter(|o| o.state == TestState::Failed)
        .cloned()
        .collect();
    (passed, failed)
}
