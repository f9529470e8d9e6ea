// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lens error type.
use oxrdf::{NamedNode, Term};
use thiserror::Error;

use crate::iri::IriError;

/// Errors surfaced by path building and replay.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LensError {
    /// A collected tag has no tagged position in the destination schema.
    #[error("tag {tag} has no tagged position in the destination shape")]
    MissingTag {
        /// Canonical tag that failed to match.
        tag: NamedNode,
    },
    /// A tag token could not be resolved to an IRI.
    #[error("cannot resolve tag token `{token}`: {source}")]
    UnresolvedTag {
        /// Token as written.
        token: String,
        /// Resolution failure.
        #[source]
        source: IriError,
    },
    /// The destination shape label is not declared in the schema.
    #[error("destination shape {0} not found")]
    UnknownShape(NamedNode),
    /// A path was replayed without segments or without a root at position zero.
    #[error("malformed path for tag {tag}: {reason}")]
    MalformedPath {
        /// Tag owning the path.
        tag: NamedNode,
        /// Which invariant failed.
        reason: &'static str,
    },
    /// An inverse edge would put a literal in subject position.
    #[error("{value} cannot be the subject of inverse edge {predicate}")]
    LiteralSubject {
        /// Edge label.
        predicate: NamedNode,
        /// Value that reached the inverse position.
        value: Term,
    },
    /// Bindings were collected for another extension than the lens follows.
    #[error("bindings collected for {collected}, lens follows {configured}")]
    ExtensionMismatch {
        /// Extension the collector recorded.
        collected: NamedNode,
        /// Extension the lens is configured with.
        configured: NamedNode,
    },
    /// The target map must bind exactly one root to one shape.
    #[error("target map must hold exactly one entry, found {0}")]
    InvalidTargetMap(usize),
}

impl LensError {
    /// True for the lookup class: the two schemas do not line up for a tag
    /// or shape, as opposed to an internal invariant failure.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::MissingTag { .. } | Self::UnresolvedTag { .. } | Self::UnknownShape(_)
        )
    }
}
