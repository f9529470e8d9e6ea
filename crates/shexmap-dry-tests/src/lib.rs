// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for shexmap crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`graphs`] - Term, triple and graph builders
//! - [`schemas`] - Schema fixtures: the two-schema lens pair, a nested
//!   address schema and a schema with an unmapped tag
//! - [`logging`] - Idempotent tracing subscriber for tests

pub mod config;
pub mod graphs;
pub mod logging;
pub mod schemas;

pub use config::InMemoryConfigStore;
pub use graphs::{blank, graph, iri, lit, named, triple};
pub use logging::init_tracing;
pub use schemas::{
    address_schema, left_schema, missing_tag_schema, right_schema, shared_shape_schema,
    untyped_left_schema, EX, LEFT_SHAPE, RIGHT_SHAPE, UNTYPED_LEFT_SHAPE,
};
