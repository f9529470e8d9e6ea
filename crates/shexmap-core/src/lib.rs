// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! shexmap-core: schema-directed graph lens.
//!
//! Two shape schemas that tag corresponding positions with the same symbolic
//! names form a lens. Validating a source graph against the first schema
//! yields flat `(tag, value)` bindings; this crate replays those bindings along
//! the structural paths the second schema declares for the same tags, and
//! returns a graph rooted at a caller-chosen identity.
//!
//! The pipeline per call is:
//! 1. a host matcher drives a [`BindingCollector`] while validating the source;
//! 2. [`walk`] finds every tagged position of the destination shape and records
//!    its ancestor [`Path`];
//! 3. each binding is folded outward along its path, synthesizing blank nodes
//!    per [`NodeGenerator`] grouping rules;
//! 4. the [`RootSegment`] renames the outermost synthesized node to the target.
//!
//! Schema parsing and validation are not part of this crate; they plug in
//! through [`ShapeSchema`] and [`ValidationVisitor`]. Terms and triples are
//! `oxrdf`'s, re-exported here.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod collector;
mod config;
mod error;
mod generator;
mod graph;
mod iri;
mod lens;
mod schema;
mod segment;
mod term;
mod walker;

/// Binding capture and the matcher callback seam.
pub use collector::{Binding, BindingCollector, ShapeEvent, ValidationVisitor, VisitEvent};
/// Lens configuration and config storage port.
pub use config::{
    map_extension, ConfigError, ConfigStore, LensConfig, LENS_CONFIG_KEY, MAP_EXTENSION,
};
/// Lens error type.
pub use error::LensError;
/// Synthetic node allocation.
pub use generator::{BlankAllocator, NodeGenerator};
/// Output graph.
pub use graph::{Graph, GraphHash};
/// Prefix tables.
pub use iri::{named_node, IriError, PrefixMap};
/// Lens driver.
pub use lens::{generate_from, Lens, TargetMap};
/// Schema introspection seam.
pub use schema::{EdgeSpec, NodeHandle, Repeat, ShapeSchema};
/// Executable path steps.
pub use segment::{Path, PathSegment, RootSegment, SegmentArena, SegmentId, Step};
/// Subject/object position conversions.
pub use term::{subject_term, term_subject};
/// RDF terms, as used throughout the lens.
pub use oxrdf::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Term, Triple};
/// Schema walk.
pub use walker::{walk, PathTable};
