// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Executable path steps.
//!
//! A [`Path`] is the ancestor chain of one tagged position, outermost first.
//! Replaying a value folds it through the chain from the innermost step
//! outward; each edge-producing step wraps the value in a synthesized node,
//! and the [`RootSegment`] at position zero finally renames the outermost
//! synthesized node to the caller's target.
use oxrdf::{NamedNode, NamedOrBlankNode, Term, Triple};
use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::error::LensError;
use crate::generator::{BlankAllocator, NodeGenerator};
use crate::graph::Graph;
use crate::schema::{EdgeSpec, NodeHandle};
use crate::term::{subject_term, term_subject};

/// Index of a [`PathSegment`] inside its [`SegmentArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SegmentId(usize);

/// One structural position on a path.
#[derive(Debug, Clone)]
pub struct PathSegment {
    handle: NodeHandle,
    edge: Option<(EdgeSpec, NodeGenerator)>,
}

impl PathSegment {
    /// Segment for the node `handle`; edge positions get their own generator.
    pub fn new(handle: NodeHandle, edge: Option<EdgeSpec>) -> Self {
        Self {
            handle,
            edge: edge.map(|spec| {
                let generator = NodeGenerator::new(spec.max);
                (spec, generator)
            }),
        }
    }

    /// Handle of the underlying constraint node.
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// True when folding through this segment emits an edge.
    pub fn produces_edge(&self) -> bool {
        self.edge.is_some()
    }

    /// Folds `value` one level outward.
    ///
    /// Non-edge segments return `value` untouched. Edge segments emit
    /// `(node, predicate, value)`, or `(value, predicate, node)` when inverse,
    /// and return the synthesized `node`. A literal cannot take the subject
    /// side of an inverse edge.
    pub fn fold(
        &mut self,
        value: Term,
        graph: &mut Graph,
        blanks: &mut BlankAllocator,
    ) -> Result<Term, LensError> {
        let Some((spec, generator)) = self.edge.as_mut() else {
            return Ok(value);
        };
        let triple = if spec.inverse {
            let Some(subject) = term_subject(&value) else {
                return Err(LensError::LiteralSubject {
                    predicate: spec.predicate.clone(),
                    value,
                });
            };
            Triple::new(subject, spec.predicate.clone(), generator.next(blanks))
        } else {
            Triple::new(generator.next(blanks), spec.predicate.clone(), value)
        };
        let node = if spec.inverse {
            triple.object.clone()
        } else {
            subject_term(&triple.subject)
        };
        trace!(segment = %self.handle, %triple, "fold");
        graph.insert(triple);
        Ok(node)
    }
}

/// Terminal step binding the folded value to the target identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSegment {
    target: NamedOrBlankNode,
}

impl RootSegment {
    /// Root segment renaming onto `target`.
    pub fn new(target: NamedOrBlankNode) -> Self {
        Self { target }
    }

    /// Target identity.
    pub fn target(&self) -> &NamedOrBlankNode {
        &self.target
    }

    /// Renames every occurrence of `value` to the target; returns the number
    /// of rewritten edges.
    ///
    /// Only nodes minted by `blanks` are renamed. Any other value (an IRI,
    /// a literal or a source blank that reached the root without passing an
    /// edge step) may also appear in unrelated edges, so it is left alone.
    pub fn bind(&self, value: &Term, graph: &mut Graph, blanks: &BlankAllocator) -> usize {
        match value {
            Term::BlankNode(node) if blanks.minted(node) => graph.rename_blank(node, &self.target),
            _ => {
                warn!(%value, target = %self.target, "value at root was not synthesized; not re-rooting");
                0
            }
        }
    }
}

/// Memoized segments keyed by node handle.
///
/// Every path through the same handle resolves to the same segment, so their
/// generators share grouping state.
#[derive(Debug, Default)]
pub struct SegmentArena {
    segments: Vec<PathSegment>,
    index: FxHashMap<NodeHandle, SegmentId>,
}

impl SegmentArena {
    /// Empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the segment for `handle`, creating it with `edge` on first use.
    pub fn intern(&mut self, handle: NodeHandle, edge: impl FnOnce() -> Option<EdgeSpec>) -> SegmentId {
        if let Some(id) = self.index.get(&handle) {
            return *id;
        }
        let id = SegmentId(self.segments.len());
        self.segments.push(PathSegment::new(handle, edge()));
        self.index.insert(handle, id);
        id
    }

    /// Segment by id.
    pub fn get(&self, id: SegmentId) -> Option<&PathSegment> {
        self.segments.get(id.0)
    }

    /// Mutable segment by id.
    pub fn get_mut(&mut self, id: SegmentId) -> Option<&mut PathSegment> {
        self.segments.get_mut(id.0)
    }

    /// Number of distinct segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Terminal root binding.
    Root(RootSegment),
    /// Memoized structural segment.
    Segment(SegmentId),
}

/// Ancestor chain from the schema root down to one tagged position.
#[derive(Debug, Clone)]
pub struct Path {
    tag: NamedNode,
    steps: Vec<Step>,
}

impl Path {
    /// Path for `tag` over `steps`, outermost first.
    pub fn new(tag: NamedNode, steps: Vec<Step>) -> Self {
        Self { tag, steps }
    }

    /// Canonical tag.
    pub fn tag(&self) -> &NamedNode {
        &self.tag
    }

    /// Steps, outermost first.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Replaces the outermost step with a root binding onto `target`.
    ///
    /// An empty path stays empty and is rejected at replay.
    pub fn root_at(&mut self, target: &NamedOrBlankNode) {
        if let Some(first) = self.steps.first_mut() {
            *first = Step::Root(RootSegment::new(target.clone()));
        }
    }

    /// Folds `value` from the innermost step outward and binds the result at
    /// the root.
    pub fn replay(
        &self,
        mut value: Term,
        arena: &mut SegmentArena,
        graph: &mut Graph,
        blanks: &mut BlankAllocator,
    ) -> Result<(), LensError> {
        let Some((first, inner)) = self.steps.split_first() else {
            return Err(self.malformed("path has no segments"));
        };
        let Step::Root(root) = first else {
            return Err(self.malformed("root segment missing at position zero"));
        };
        for step in inner.iter().rev() {
            let Step::Segment(id) = step else {
                return Err(self.malformed("root segment below position zero"));
            };
            let segment = arena
                .get_mut(*id)
                .ok_or_else(|| self.malformed("segment not in arena"))?;
            value = segment.fold(value, graph, blanks)?;
        }
        root.bind(&value, graph, blanks);
        Ok(())
    }

    fn malformed(&self, reason: &'static str) -> LensError {
        LensError::MalformedPath {
            tag: self.tag.clone(),
            reason,
        }
    }
}
