// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Binding collection during source validation.
//!
//! A host matcher drives a [`ValidationVisitor`] while it checks a source
//! graph. The [`BindingCollector`] is the visitor the lens uses: it records
//! every tagged match in arrival order and hands the bindings over exactly
//! once, to a single replay.
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use oxrdf::{NamedNode, Term, Triple};
use tracing::trace;

use crate::iri::{IriError, PrefixMap};

/// Shape-level lifecycle event.
#[derive(Debug, Clone, Copy)]
pub struct ShapeEvent<'a> {
    /// Label of the shape being evaluated, when it has one.
    pub label: Option<&'a NamedNode>,
    /// Node under evaluation.
    pub focus: &'a Term,
    /// Nesting depth (0 for the top-level shape).
    pub depth: usize,
}

/// One tagged match reported by the matcher.
#[derive(Debug, Clone, Copy)]
pub struct VisitEvent<'a> {
    /// Tag token exactly as written in the schema.
    pub tag: &'a str,
    /// Value the tag captured.
    pub value: &'a Term,
    /// Matched triple, absent for shape-level actions.
    pub matched: Option<&'a Triple>,
    /// Nesting depth of the owning shape.
    pub depth: usize,
}

/// Callbacks a matcher invokes for semantic actions of one extension.
pub trait ValidationVisitor {
    /// Extension IRI whose actions this visitor receives.
    fn extension(&self) -> &NamedNode;

    /// A shape evaluation begins.
    fn enter(&mut self, _event: &ShapeEvent<'_>) {}

    /// A shape evaluation ends.
    fn exit(&mut self, _event: &ShapeEvent<'_>) {}

    /// The whole validation run is finished.
    fn close(&mut self, _event: &ShapeEvent<'_>) {}

    /// A tagged position matched; returning `false` rejects the match.
    fn visit(&mut self, event: &VisitEvent<'_>) -> bool;
}

/// One captured `(tag, value)` observation.
///
/// The tag is kept raw together with the namespace table that was in effect
/// when it was seen, and resolved on first use.
#[derive(Debug, Clone)]
pub struct Binding {
    raw_tag: String,
    prefixes: Arc<PrefixMap>,
    value: Term,
    tag: OnceCell<NamedNode>,
}

impl Binding {
    /// New binding for `raw_tag` written under `prefixes`.
    pub fn new(raw_tag: impl Into<String>, prefixes: Arc<PrefixMap>, value: Term) -> Self {
        Self {
            raw_tag: raw_tag.into(),
            prefixes,
            value,
            tag: OnceCell::new(),
        }
    }

    /// Tag token as written.
    pub fn raw_tag(&self) -> &str {
        &self.raw_tag
    }

    /// Namespace table captured with the binding.
    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    /// Captured value.
    pub fn value(&self) -> &Term {
        &self.value
    }

    /// Canonical tag, resolved against the captured table on first call.
    pub fn tag(&self) -> Result<&NamedNode, IriError> {
        self.tag.get_or_try_init(|| self.prefixes.resolve(&self.raw_tag))
    }
}

/// Append-only store of bindings for one validation run.
#[derive(Debug, Clone)]
pub struct BindingCollector {
    extension: NamedNode,
    prefixes: Arc<PrefixMap>,
    bindings: Vec<Binding>,
}

impl BindingCollector {
    /// Collector for `extension` whose tags are written under `prefixes`.
    pub fn new(extension: NamedNode, prefixes: PrefixMap) -> Self {
        Self {
            extension,
            prefixes: Arc::new(prefixes),
            bindings: Vec::new(),
        }
    }

    /// Switches the table attached to bindings recorded from now on.
    ///
    /// Bindings already recorded keep the table they were captured with.
    pub fn set_prefixes(&mut self, prefixes: PrefixMap) {
        self.prefixes = Arc::new(prefixes);
    }

    /// Records one binding.
    pub fn push(&mut self, raw_tag: impl Into<String>, value: Term) {
        self.bindings
            .push(Binding::new(raw_tag, Arc::clone(&self.prefixes), value));
    }

    /// Bindings recorded so far, in arrival order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Number of recorded bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Takes every recorded binding, leaving the collector empty.
    pub fn drain(&mut self) -> Vec<Binding> {
        std::mem::take(&mut self.bindings)
    }
}

impl ValidationVisitor for BindingCollector {
    fn extension(&self) -> &NamedNode {
        &self.extension
    }

    fn visit(&mut self, event: &VisitEvent<'_>) -> bool {
        trace!(tag = event.tag, value = %event.value, depth = event.depth, "binding");
        self.push(event.tag, event.value.clone());
        true
    }
}
