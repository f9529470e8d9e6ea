// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Introspection seam between the lens and a shape schema.
//!
//! The lens never parses or validates schemas itself. It only needs to walk a
//! structural tree, recognise tagged positions, and learn which positions
//! emit an edge. Any schema representation that answers these questions can
//! be mapped through.
use std::fmt;
use std::num::NonZeroU32;

use oxrdf::NamedNode;

use crate::iri::{IriError, PrefixMap};

/// Stable identity of one constraint node within a schema.
///
/// Two occurrences of the same handle are the same structural position and
/// share segment state during a replay.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeHandle(pub u32);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maximum repetition declared for an edge-producing position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Repeat {
    /// At most this many edges per subject.
    Bounded(NonZeroU32),
    /// No upper bound.
    Unbounded,
}

impl Repeat {
    /// Maps a declared maximum (`None` = unbounded) to a repeat bound.
    ///
    /// A maximum of zero is clamped to one: such a position never matches,
    /// and a zero-sized group has no meaning for allocation.
    pub fn from_max(max: Option<u32>) -> Self {
        match max {
            None => Self::Unbounded,
            Some(n) => Self::Bounded(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)),
        }
    }

    /// Upper bound, or `None` when unbounded.
    pub fn limit(self) -> Option<u32> {
        match self {
            Self::Bounded(n) => Some(n.get()),
            Self::Unbounded => None,
        }
    }
}

/// Edge emitted by a constraint node when a value is folded through it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EdgeSpec {
    /// Edge label.
    pub predicate: NamedNode,
    /// When set, the edge points from the value to the synthesized node.
    pub inverse: bool,
    /// Declared maximum repetition.
    pub max: Repeat,
}

/// Read-only view of a structural schema.
pub trait ShapeSchema {
    /// Constraint node type.
    type Node;

    /// Looks up a shape declaration by label.
    fn find(&self, label: &NamedNode) -> Option<&Self::Node>;

    /// Stable identity of `node`.
    fn handle(&self, node: &Self::Node) -> NodeHandle;

    /// Child nodes in declaration order.
    fn operands<'a>(&'a self, node: &'a Self::Node) -> Vec<&'a Self::Node>;

    /// Raw tag token when `node` is a tagged action for `extension`.
    fn tagged_action<'a>(&'a self, node: &'a Self::Node, extension: &NamedNode) -> Option<&'a str>;

    /// Edge description when `node` produces graph edges.
    fn edge(&self, node: &Self::Node) -> Option<EdgeSpec>;

    /// Namespace table the schema was authored with.
    fn prefixes(&self) -> &PrefixMap;

    /// Resolves a tag token to its canonical IRI.
    fn resolve_tag(&self, token: &str, prefixes: &PrefixMap) -> Result<NamedNode, IriError> {
        prefixes.resolve(token)
    }
}
