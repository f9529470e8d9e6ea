// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Namespace table used to resolve tag tokens to IRIs.
//!
//! Resolution is lexical: a token is either an `<iri>`, a `prefix:local` name
//! expanded through a [`PrefixMap`], an absolute IRI, or a relative reference
//! resolved against the table's base. IRI syntax itself is checked by
//! `oxiri`, through [`NamedNode::new`].

use std::collections::BTreeMap;

use oxrdf::{IriParseError, NamedNode};
use thiserror::Error;

/// Errors raised while resolving tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IriError {
    /// Token was empty after trimming.
    #[error("empty IRI token")]
    Empty,
    /// The expanded text is not a valid absolute IRI.
    #[error("invalid IRI `{iri}`: {reason}")]
    Invalid {
        /// Offending text, after expansion.
        iri: String,
        /// Parser message.
        reason: String,
    },
    /// A prefixed name used a prefix missing from the table.
    #[error("unknown prefix `{prefix}` in `{token}`")]
    UnknownPrefix {
        /// Prefix part of the token (without the colon).
        prefix: String,
        /// Full token as written.
        token: String,
    },
    /// A relative name was given but the table has no base IRI.
    #[error("relative name `{0}` with no base IRI")]
    NoBase(String),
    /// Blank-node labels cannot name anything a table resolves.
    #[error("blank node label `{0}` cannot be resolved to an IRI")]
    BlankLabel(String),
}

impl IriError {
    fn invalid(iri: &str, err: &IriParseError) -> Self {
        Self::Invalid {
            iri: iri.to_owned(),
            reason: err.to_string(),
        }
    }
}

/// Parses `value` as an absolute IRI.
pub fn named_node(value: &str) -> Result<NamedNode, IriError> {
    NamedNode::new(value).map_err(|err| IriError::invalid(value, &err))
}

/// Namespace table: prefix → namespace IRI, plus an optional base.
///
/// Keys are stored canonically: a trailing `:` is stripped, so `"ex:"` and
/// `"ex"` name the same prefix, and the default prefix is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixMap {
    prefixes: BTreeMap<String, NamedNode>,
    base: Option<NamedNode>,
}

impl PrefixMap {
    /// Creates an empty table without a base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(prefix, namespace)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, IriError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = Self::new();
        for (prefix, namespace) in pairs {
            map.insert(prefix.as_ref(), named_node(namespace.as_ref())?);
        }
        Ok(map)
    }

    /// Sets the base IRI used for relative names.
    pub fn with_base(mut self, base: NamedNode) -> Self {
        self.base = Some(base);
        self
    }

    /// Inserts or replaces a prefix; returns the previous namespace.
    pub fn insert(&mut self, prefix: &str, namespace: NamedNode) -> Option<NamedNode> {
        self.prefixes.insert(canonical_key(prefix).to_owned(), namespace)
    }

    /// Looks up the namespace bound to `prefix`.
    pub fn get(&self, prefix: &str) -> Option<&NamedNode> {
        self.prefixes.get(canonical_key(prefix))
    }

    /// Base IRI, when one is set.
    pub fn base(&self) -> Option<&NamedNode> {
        self.base.as_ref()
    }

    /// Iterates prefixes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NamedNode)> {
        self.prefixes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared prefixes.
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// True when no prefixes are declared.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Resolves a token written in this table's lexical context.
    pub fn resolve(&self, token: &str) -> Result<NamedNode, IriError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IriError::Empty);
        }
        if let Some(inner) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            return match (NamedNode::new(inner), &self.base) {
                (Ok(node), _) => Ok(node),
                (Err(_), Some(_)) => self.join_base(inner),
                (Err(err), None) => Err(IriError::invalid(inner, &err)),
            };
        }
        if token.starts_with("_:") {
            return Err(IriError::BlankLabel(token.to_owned()));
        }
        match token.split_once(':') {
            Some((prefix, local)) => {
                if let Some(namespace) = self.prefixes.get(prefix) {
                    return named_node(&format!("{}{local}", namespace.as_str()));
                }
                if local.starts_with("//") || prefix.eq_ignore_ascii_case("urn") {
                    return named_node(token);
                }
                Err(IriError::UnknownPrefix {
                    prefix: prefix.to_owned(),
                    token: token.to_owned(),
                })
            }
            None => self.join_base(token),
        }
    }

    fn join_base(&self, relative: &str) -> Result<NamedNode, IriError> {
        let base = self
            .base
            .as_ref()
            .ok_or_else(|| IriError::NoBase(relative.to_owned()))?;
        let base = oxiri::Iri::parse(base.as_str())
            .map_err(|err| IriError::invalid(base.as_str(), &err))?;
        base.resolve(relative)
            .map(|iri| NamedNode::new_unchecked(iri.into_inner()))
            .map_err(|err| IriError::invalid(relative, &err))
    }
}

fn canonical_key(prefix: &str) -> &str {
    prefix.strip_suffix(':').unwrap_or(prefix)
}

/// Serde adapter storing a [`NamedNode`] as its bare IRI text.
pub(crate) mod as_str {
    use oxrdf::NamedNode;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(node: &NamedNode, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(node.as_str())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NamedNode, D::Error> {
        let text = String::deserialize(de)?;
        NamedNode::new(text).map_err(D::Error::custom)
    }
}
