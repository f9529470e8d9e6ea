// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! shexmap-shapes: a reference shape algebra for the lens.
//!
//! Provides a concrete [`Schema`] implementing
//! [`shexmap_core::ShapeSchema`], serde documents to author schemas in JSON
//! or YAML, and a greedy [`Validator`] that drives a
//! [`shexmap_core::ValidationVisitor`]. [`map`] chains the two halves:
//! validate a source graph, then rebuild its bindings under a destination
//! schema.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod doc;
mod model;
mod validate;

use shexmap_core::{Graph, Lens, LensError, NamedNode, TargetMap, Term};
use thiserror::Error;
use tracing::info_span;

/// Serde schema documents.
pub use doc::{ExprDoc, SchemaDoc, SemActDoc, ShapeDeclDoc, ValueDoc};
/// Shape algebra.
pub use model::{
    Node, NodeConstraint, NodeKind, Schema, SchemaError, SemAct, Shape, ShapeDecl, TermKind,
    TripleConstraint,
};
/// Reference matcher.
pub use validate::{ValidationError, Validator};

/// Failure of a full source → destination mapping.
#[derive(Debug, Error)]
pub enum MapError {
    /// The source graph did not validate.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Replay into the destination failed.
    #[error(transparent)]
    Lens(#[from] LensError),
}

/// Validates `focus` in `graph` against `source_label` of `source`, then
/// rebuilds the collected bindings under `target` in `destination`.
pub fn map(
    source: &Schema,
    graph: &Graph,
    focus: &Term,
    source_label: &NamedNode,
    destination: &Schema,
    target: &TargetMap,
) -> Result<Graph, MapError> {
    map_with(
        &Lens::default(),
        source,
        graph,
        focus,
        source_label,
        destination,
        target,
    )
}

/// [`map`] with an explicitly configured lens.
pub fn map_with(
    lens: &Lens,
    source: &Schema,
    graph: &Graph,
    focus: &Term,
    source_label: &NamedNode,
    destination: &Schema,
    target: &TargetMap,
) -> Result<Graph, MapError> {
    let span = info_span!("map", source = %source_label, target = %target.shape());
    let _guard = span.enter();
    let mut collector = Validator::new(source).collect(
        graph,
        focus,
        source_label,
        lens.config().extension.clone(),
    )?;
    Ok(lens.generate_from(&mut collector, destination, target)?)
}
