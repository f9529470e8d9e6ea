// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Term and graph builders.
//!
//! These panic on malformed input; they only ever see literals written in
//! test code.
#![allow(clippy::expect_used)]

use shexmap_core::{term_subject, BlankNode, Graph, Literal, NamedNode, Term, Triple};

/// Absolute IRI.
pub fn iri(value: &str) -> NamedNode {
    NamedNode::new(value).expect("fixture IRI must be absolute")
}

/// Named node term.
pub fn named(value: &str) -> Term {
    Term::from(iri(value))
}

/// Blank node term with a fixed label.
pub fn blank(label: &str) -> Term {
    Term::from(BlankNode::new(label).expect("fixture blank label must be valid"))
}

/// Simple literal term.
pub fn lit(lexical: &str) -> Term {
    Term::from(Literal::new_simple_literal(lexical))
}

/// Triple with an IRI predicate; `subject` must not be a literal.
pub fn triple(subject: impl Into<Term>, predicate: &str, object: impl Into<Term>) -> Triple {
    let subject = term_subject(&subject.into()).expect("fixture subject must not be a literal");
    Triple::new(subject, iri(predicate), object)
}

/// Graph holding `triples`.
pub fn graph(triples: impl IntoIterator<Item = Triple>) -> Graph {
    triples.into_iter().collect()
}
