// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema walk: discovers tagged positions and their ancestor paths.
use oxrdf::{BlankNode, NamedNode, NamedOrBlankNode, Term};
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, warn};

use crate::error::LensError;
use crate::generator::BlankAllocator;
use crate::graph::Graph;
use crate::schema::ShapeSchema;
use crate::segment::{Path, SegmentArena, Step};

/// Output of one schema walk: canonical tag → path, plus the segment state
/// those paths share.
///
/// A table belongs to exactly one lens call. Replaying mutates the generators
/// in its arena, so two calls must never share a table.
#[derive(Debug)]
pub struct PathTable {
    paths: FxHashMap<NamedNode, Path>,
    order: Vec<NamedNode>,
    arena: SegmentArena,
    blanks: BlankAllocator,
}

impl PathTable {
    /// Path recorded for `tag`.
    pub fn get(&self, tag: &NamedNode) -> Option<&Path> {
        self.paths.get(tag)
    }

    /// Tags in declaration order.
    pub fn tags(&self) -> impl Iterator<Item = &NamedNode> {
        self.order.iter()
    }

    /// Number of tagged positions.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the walk found no tagged position.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Distinct structural segments shared by all paths.
    pub fn arena(&self) -> &SegmentArena {
        &self.arena
    }

    /// Substitutes a root binding onto `target` at position zero of every path.
    pub fn root_at(&mut self, target: &NamedOrBlankNode) {
        for path in self.paths.values_mut() {
            path.root_at(target);
        }
    }

    /// Keeps a blank the caller already holds out of every synthesized node.
    pub fn reserve(&mut self, node: &BlankNode) {
        self.blanks.reserve(node);
    }

    /// Replays one bound value along the path for `tag`.
    pub fn replay(&mut self, tag: &NamedNode, value: Term, graph: &mut Graph) -> Result<(), LensError> {
        let path = self
            .paths
            .get(tag)
            .ok_or_else(|| LensError::MissingTag { tag: tag.clone() })?;
        path.replay(value, &mut self.arena, graph, &mut self.blanks)
    }
}

/// Walks `root` and records a path for every action tagged with `extension`.
///
/// Traversal is depth first in declaration order. A node whose handle is
/// already on the ancestor stack is not entered again, so recursive shapes
/// terminate. Raw tags are resolved through the schema's prefix table once the
/// walk is done; when two positions resolve to the same tag, the last one
/// declared wins.
pub fn walk<S: ShapeSchema>(
    schema: &S,
    root: &S::Node,
    extension: &NamedNode,
    blanks: BlankAllocator,
) -> Result<PathTable, LensError> {
    let span = debug_span!("walk", %extension);
    let _guard = span.enter();

    let mut walk = Walk {
        schema,
        extension,
        arena: SegmentArena::new(),
        found: Vec::new(),
    };
    let mut stack = Vec::new();
    walk.descend(root, &mut stack);

    let Walk { arena, found, .. } = walk;
    let prefixes = schema.prefixes().clone();
    let mut paths = FxHashMap::default();
    let mut order = Vec::with_capacity(found.len());
    for (raw, steps) in found {
        let tag = schema
            .resolve_tag(&raw, &prefixes)
            .map_err(|source| LensError::UnresolvedTag {
                token: raw.clone(),
                source,
            })?;
        let path = Path::new(tag.clone(), steps);
        if paths.insert(tag.clone(), path).is_some() {
            warn!(%tag, token = %raw, "tag declared more than once; replacing the earlier position");
        } else {
            order.push(tag);
        }
    }
    debug!(tags = order.len(), segments = arena.len(), "walk complete");
    Ok(PathTable {
        paths,
        order,
        arena,
        blanks,
    })
}

struct Walk<'s, S: ShapeSchema> {
    schema: &'s S,
    extension: &'s NamedNode,
    arena: SegmentArena,
    found: Vec<(String, Vec<Step>)>,
}

impl<'s, S: ShapeSchema> Walk<'s, S> {
    fn descend(&mut self, node: &'s S::Node, stack: &mut Vec<&'s S::Node>) {
        let schema = self.schema;
        if let Some(tag) = schema.tagged_action(node, self.extension) {
            let arena = &mut self.arena;
            let steps = stack
                .iter()
                .map(|ancestor| {
                    Step::Segment(arena.intern(schema.handle(ancestor), || schema.edge(ancestor)))
                })
                .collect();
            self.found.push((tag.to_owned(), steps));
        }
        let handle = schema.handle(node);
        stack.push(node);
        for operand in schema.operands(node) {
            let child = schema.handle(operand);
            if child == handle || stack.iter().any(|a| schema.handle(a) == child) {
                continue;
            }
            self.descend(operand, stack);
        }
        stack.pop();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::iri::PrefixMap;
    use crate::schema::{EdgeSpec, NodeHandle, Repeat};
    use oxrdf::Literal;

    /// Tree schema where `Back` nodes point at the root.
    enum N {
        Group(u32, Vec<N>),
        Edge(u32, &'static str, Vec<N>),
        Tag(u32, &'static str),
        Back(u32),
    }

    struct Tree {
        root: N,
        prefixes: PrefixMap,
    }

    impl ShapeSchema for Tree {
        type Node = N;

        fn find(&self, _label: &NamedNode) -> Option<&N> {
            Some(&self.root)
        }

        fn handle(&self, node: &N) -> NodeHandle {
            match node {
                N::Group(h, _) | N::Edge(h, _, _) | N::Tag(h, _) | N::Back(h) => NodeHandle(*h),
            }
        }

        fn operands<'a>(&'a self, node: &'a N) -> Vec<&'a N> {
            match node {
                N::Group(_, kids) | N::Edge(_, _, kids) => kids.iter().collect(),
                N::Back(_) => vec![&self.root],
                N::Tag(..) => Vec::new(),
            }
        }

        fn tagged_action<'a>(&'a self, node: &'a N, _extension: &NamedNode) -> Option<&'a str> {
            match node {
                N::Tag(_, tag) => Some(*tag),
                _ => None,
            }
        }

        fn edge(&self, node: &N) -> Option<EdgeSpec> {
            match node {
                N::Edge(_, p, _) => Some(EdgeSpec {
                    predicate: NamedNode::new(*p).unwrap(),
                    inverse: false,
                    max: Repeat::Unbounded,
                }),
                _ => None,
            }
        }

        fn prefixes(&self) -> &PrefixMap {
            &self.prefixes
        }
    }

    fn tree(root: N) -> Tree {
        Tree {
            root,
            prefixes: PrefixMap::from_pairs([("ex", "http://e/")]).unwrap(),
        }
    }

    fn tag(s: &str) -> NamedNode {
        NamedNode::new(format!("http://e/{s}")).unwrap()
    }

    fn run(schema: &Tree) -> Result<PathTable, LensError> {
        walk(schema, &schema.root, &crate::config::map_extension(), BlankAllocator::new())
    }

    #[test]
    fn records_ancestors_outermost_first() {
        let schema = tree(N::Group(
            0,
            vec![
                N::Edge(1, "http://e/p", vec![N::Tag(2, "ex:a")]),
                N::Edge(3, "http://e/q", vec![N::Edge(4, "http://e/r", vec![N::Tag(5, "ex:b")])]),
            ],
        ));
        let table = run(&schema).unwrap();
        assert_eq!(table.tags().cloned().collect::<Vec<_>>(), vec![tag("a"), tag("b")]);
        assert_eq!(table.get(&tag("a")).unwrap().steps().len(), 2);
        assert_eq!(table.get(&tag("b")).unwrap().steps().len(), 3);
        // Root group is shared by both paths.
        assert_eq!(table.arena().len(), 4);
    }

    #[test]
    fn last_declaration_of_a_tag_wins() {
        let schema = tree(N::Group(
            0,
            vec![
                N::Edge(1, "http://e/p", vec![N::Tag(2, "ex:a")]),
                N::Edge(3, "http://e/q", vec![N::Edge(4, "http://e/r", vec![N::Tag(5, "ex:a")])]),
                N::Edge(6, "http://e/s", vec![N::Tag(7, "ex:b")]),
            ],
        ));
        let table = run(&schema).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.tags().cloned().collect::<Vec<_>>(), vec![tag("a"), tag("b")]);
        let steps = table.get(&tag("a")).unwrap().steps();
        assert_eq!(steps.len(), 3);
        assert!(matches!(
            &steps[2],
            Step::Segment(id) if table.arena().get(*id).map(|s| s.handle()) == Some(NodeHandle(4))
        ));
    }

    #[test]
    fn recursion_back_to_an_ancestor_terminates() {
        let schema = tree(N::Group(
            0,
            vec![N::Edge(1, "http://e/p", vec![N::Tag(2, "ex:a"), N::Back(3)])],
        ));
        let table = run(&schema).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unresolvable_tag_fails_the_walk() {
        let schema = tree(N::Group(0, vec![N::Edge(1, "http://e/p", vec![N::Tag(2, "zz:a")])]));
        assert!(matches!(run(&schema), Err(LensError::UnresolvedTag { .. })));
    }

    #[test]
    fn replay_of_unknown_tag_is_missing() {
        let schema = tree(N::Group(0, vec![N::Edge(1, "http://e/p", vec![N::Tag(2, "ex:a")])]));
        let mut table = run(&schema).unwrap();
        table.root_at(&tag("root").into());
        let mut graph = Graph::new();
        let err = table
            .replay(&tag("other"), Term::from(Literal::new_simple_literal("v")), &mut graph)
            .unwrap_err();
        assert_eq!(err, LensError::MissingTag { tag: tag("other") });

        table
            .replay(&tag("a"), Term::from(Literal::new_simple_literal("v")), &mut graph)
            .unwrap();
        assert_eq!(graph.len(), 1);
        assert!(graph.iter().all(|t| t.subject == NamedOrBlankNode::from(tag("root"))));
    }
}
