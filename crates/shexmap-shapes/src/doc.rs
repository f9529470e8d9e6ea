// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serde schema documents (JSON or YAML).
//!
//! A document mirrors the shape algebra one to one. Every IRI-valued field is
//! a token resolved through the document's own prefix table, so documents
//! can use `ex:name`, `<http://…>` or relative names against `base`.
//!
//! ```yaml
//! prefixes: { ex: "http://example/", map: "http://shex.io/extensions/Map/" }
//! shapes:
//!   - id: "<http://a.example/S1>"
//!     shape:
//!       type: Shape
//!       expression:
//!         type: TripleConstraint
//!         predicate: ex:x
//!         semActs: [{ name: "map:", code: "ex:a" }]
//! ```
use std::collections::BTreeMap;

use serde::Deserialize;
use shexmap_core::{Literal, NamedNode, PrefixMap, Term};

use crate::model::{
    Node, NodeConstraint, NodeKind, Schema, SchemaError, SemAct, Shape, ShapeDecl, TermKind,
    TripleConstraint,
};

/// Top-level schema document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDoc {
    /// Prefix → namespace.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
    /// Base IRI for relative names.
    #[serde(default)]
    pub base: Option<String>,
    /// Declarations in order.
    pub shapes: Vec<ShapeDeclDoc>,
}

/// One labelled declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeDeclDoc {
    /// Label token.
    pub id: String,
    /// Shape expression.
    pub shape: ExprDoc,
}

/// Expression node.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ExprDoc {
    /// Shape.
    Shape {
        /// Triple expression.
        #[serde(default)]
        expression: Option<Box<ExprDoc>>,
        /// Closed flag.
        #[serde(default)]
        closed: bool,
        /// Semantic actions.
        #[serde(default, rename = "semActs")]
        sem_acts: Vec<SemActDoc>,
    },
    /// Conjunction.
    EachOf {
        /// Sub-expressions.
        expressions: Vec<ExprDoc>,
    },
    /// Ordered choice.
    OneOf {
        /// Sub-expressions.
        expressions: Vec<ExprDoc>,
    },
    /// Arc constraint.
    TripleConstraint {
        /// Predicate token.
        predicate: String,
        /// Inverse arc.
        #[serde(default)]
        inverse: bool,
        /// Minimum count (default 1).
        #[serde(default)]
        min: Option<u32>,
        /// Maximum count (default 1, negative for unbounded).
        #[serde(default)]
        max: Option<i64>,
        /// Value expression.
        #[serde(default, rename = "valueExpr")]
        value_expr: Option<Box<ExprDoc>>,
        /// Semantic actions.
        #[serde(default, rename = "semActs")]
        sem_acts: Vec<SemActDoc>,
    },
    /// Term test.
    NodeConstraint {
        /// `iri`, `bnode`, `literal` or `nonliteral`.
        #[serde(default, rename = "nodeKind")]
        node_kind: Option<String>,
        /// Datatype token.
        #[serde(default)]
        datatype: Option<String>,
        /// Allowed values.
        #[serde(default)]
        values: Vec<ValueDoc>,
    },
    /// Reference to a declared shape.
    ShapeRef {
        /// Label token.
        reference: String,
    },
}

/// Semantic action.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemActDoc {
    /// Extension token.
    pub name: String,
    /// Action body.
    #[serde(default)]
    pub code: Option<String>,
}

/// Value-set member: an IRI token or a literal.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueDoc {
    /// IRI token.
    Iri(String),
    /// Literal with optional datatype or language.
    Literal {
        /// Lexical form.
        value: String,
        /// Datatype token.
        #[serde(default, rename = "type")]
        datatype: Option<String>,
        /// Language tag.
        #[serde(default)]
        language: Option<String>,
    },
}

impl SchemaDoc {
    /// Resolves every token and builds the schema.
    pub fn into_schema(self) -> Result<Schema, SchemaError> {
        let mut prefixes = PrefixMap::from_pairs(&self.prefixes).map_err(|source| {
            SchemaError::Iri {
                token: "prefixes".to_owned(),
                source,
            }
        })?;
        if let Some(base) = &self.base {
            prefixes = prefixes.with_base(iri(&PrefixMap::new(), &format!("<{base}>"))?);
        }
        let decls = self
            .shapes
            .into_iter()
            .map(|decl| {
                Ok(ShapeDecl {
                    label: iri(&prefixes, &decl.id)?,
                    expr: decl.shape.into_node(&prefixes)?,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;
        Schema::new(prefixes, decls)
    }
}

impl ExprDoc {
    fn into_node(self, prefixes: &PrefixMap) -> Result<Node, SchemaError> {
        let kind = match self {
            Self::Shape {
                expression,
                closed,
                sem_acts,
            } => NodeKind::Shape(Shape {
                expression: expression
                    .map(|e| (*e).into_node(prefixes).map(Box::new))
                    .transpose()?,
                sem_acts: sem_acts_of(sem_acts, prefixes)?,
                closed,
            }),
            Self::EachOf { expressions } => NodeKind::EachOf(nodes_of(expressions, prefixes)?),
            Self::OneOf { expressions } => NodeKind::OneOf(nodes_of(expressions, prefixes)?),
            Self::TripleConstraint {
                predicate,
                inverse,
                min,
                max,
                value_expr,
                sem_acts,
            } => NodeKind::TripleConstraint(TripleConstraint {
                predicate: iri(prefixes, &predicate)?,
                inverse,
                min: min.unwrap_or(1),
                max: match max {
                    None => Some(1),
                    Some(n) if n < 0 => None,
                    Some(n) => Some(u32::try_from(n).unwrap_or(u32::MAX)),
                },
                value: value_expr
                    .map(|e| (*e).into_node(prefixes).map(Box::new))
                    .transpose()?,
                sem_acts: sem_acts_of(sem_acts, prefixes)?,
            }),
            Self::NodeConstraint {
                node_kind,
                datatype,
                values,
            } => NodeKind::NodeConstraint(NodeConstraint {
                kind: node_kind.as_deref().map(term_kind).transpose()?,
                datatype: datatype.map(|dt| iri(prefixes, &dt)).transpose()?,
                values: values
                    .into_iter()
                    .map(|v| v.into_term(prefixes))
                    .collect::<Result<_, _>>()?,
            }),
            Self::ShapeRef { reference } => NodeKind::ShapeRef(iri(prefixes, &reference)?),
        };
        Ok(Node::new(kind))
    }
}

impl ValueDoc {
    fn into_term(self, prefixes: &PrefixMap) -> Result<Term, SchemaError> {
        Ok(match self {
            Self::Iri(token) => Term::NamedNode(iri(prefixes, &token)?),
            Self::Literal {
                value,
                datatype: Some(dt),
                ..
            } => Term::Literal(Literal::new_typed_literal(value, iri(prefixes, &dt)?)),
            Self::Literal {
                value,
                language: Some(lang),
                ..
            } => Term::Literal(
                Literal::new_language_tagged_literal(value, lang.as_str()).map_err(|err| {
                    SchemaError::Language {
                        tag: lang.clone(),
                        reason: err.to_string(),
                    }
                })?,
            ),
            Self::Literal { value, .. } => Term::Literal(Literal::new_simple_literal(value)),
        })
    }
}

fn nodes_of(items: Vec<ExprDoc>, prefixes: &PrefixMap) -> Result<Vec<Node>, SchemaError> {
    items.into_iter().map(|e| e.into_node(prefixes)).collect()
}

fn sem_acts_of(acts: Vec<SemActDoc>, prefixes: &PrefixMap) -> Result<Vec<Node>, SchemaError> {
    acts.into_iter()
        .map(|act| {
            Ok(Node::new(NodeKind::SemAct(SemAct {
                name: iri(prefixes, &act.name)?,
                code: act.code,
            })))
        })
        .collect()
}

fn term_kind(keyword: &str) -> Result<TermKind, SchemaError> {
    match keyword.to_ascii_lowercase().as_str() {
        "iri" => Ok(TermKind::Iri),
        "bnode" => Ok(TermKind::BNode),
        "literal" => Ok(TermKind::Literal),
        "nonliteral" => Ok(TermKind::NonLiteral),
        _ => Err(SchemaError::UnknownNodeKind(keyword.to_owned())),
    }
}

fn iri(prefixes: &PrefixMap, token: &str) -> Result<NamedNode, SchemaError> {
    prefixes.resolve(token).map_err(|source| SchemaError::Iri {
        token: token.to_owned(),
        source,
    })
}

impl Schema {
    /// Reads a JSON schema document.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str::<SchemaDoc>(text)?.into_schema()
    }

    /// Reads a YAML schema document.
    pub fn from_yaml(text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str::<SchemaDoc>(text)?.into_schema()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use shexmap_core::{map_extension, ShapeSchema};

    const LEFT: &str = r#"
prefixes:
  ex: "http://example/"
  xsd: "http://www.w3.org/2001/XMLSchema#"
  map: "http://shex.io/extensions/Map/"
shapes:
  - id: "<http://a.example/S1>"
    shape:
      type: Shape
      expression:
        type: TripleConstraint
        predicate: ex:x
        valueExpr: { type: NodeConstraint, datatype: "xsd:string" }
        semActs: [{ name: "map:", code: "ex:a" }]
"#;

    #[test]
    fn yaml_document_builds_schema() {
        let schema = Schema::from_yaml(LEFT).unwrap();
        let label = NamedNode::new("http://a.example/S1").unwrap();
        let root = schema.find(&label).unwrap();
        let tc = schema.operands(root)[0];
        let edge = schema.edge(tc).unwrap();
        assert_eq!(edge.predicate.as_str(), "http://example/x");
        assert_eq!(edge.max.limit(), Some(1));
        let act = schema.operands(tc)[1];
        assert_eq!(schema.tagged_action(act, &map_extension()), Some("ex:a"));
    }

    #[test]
    fn json_document_with_unbounded_max() {
        let text = r#"{
            "prefixes": {"ex": "http://example/"},
            "shapes": [{"id": "ex:S", "shape": {"type": "Shape", "expression":
                {"type": "TripleConstraint", "predicate": "ex:z", "min": 0, "max": -1}}}]
        }"#;
        let schema = Schema::from_json(text).unwrap();
        let root = schema.find(&NamedNode::new("http://example/S").unwrap()).unwrap();
        let edge = schema.edge(schema.operands(root)[0]).unwrap();
        assert_eq!(edge.max.limit(), None);
    }

    #[test]
    fn unknown_prefix_in_document_fails() {
        let text = r#"{"shapes": [{"id": "nope:S", "shape": {"type": "Shape"}}]}"#;
        assert!(matches!(
            Schema::from_json(text),
            Err(SchemaError::Iri { .. })
        ));
    }

    #[test]
    fn value_sets_carry_typed_and_tagged_literals() {
        let text = r#"{"prefixes": {"ex": "http://example/", "xsd": "http://www.w3.org/2001/XMLSchema#"},
            "base": "http://example/base/",
            "shapes": [{"id": "<S>", "shape": {"type": "Shape", "expression":
                {"type": "TripleConstraint", "predicate": "ex:p",
                 "valueExpr": {"type": "NodeConstraint", "values": [
                    "ex:v",
                    {"value": "1", "type": "xsd:integer"},
                    {"value": "chat", "language": "fr"}]}}}}]}"#;
        let schema = Schema::from_json(text).unwrap();
        let root = schema
            .find(&NamedNode::new("http://example/base/S").unwrap())
            .unwrap();
        let tc = schema.operands(root)[0];
        let xsd_integer = NamedNode::new("http://www.w3.org/2001/XMLSchema#integer").unwrap();
        let expected = vec![
            Term::NamedNode(NamedNode::new("http://example/v").unwrap()),
            Term::Literal(Literal::new_typed_literal("1", xsd_integer)),
            Term::Literal(Literal::new_language_tagged_literal("chat", "fr").unwrap()),
        ];
        assert!(matches!(
            schema.operands(tc)[0].kind(),
            NodeKind::NodeConstraint(nc) if nc.values == expected
        ));
    }

    #[test]
    fn malformed_language_tag_is_rejected() {
        let text = r#"{"prefixes": {"ex": "http://example/"},
            "shapes": [{"id": "ex:S", "shape": {"type": "Shape", "expression":
                {"type": "TripleConstraint", "predicate": "ex:p",
                 "valueExpr": {"type": "NodeConstraint", "values": [
                    {"value": "x", "language": "not a tag"}]}}}}]}"#;
        assert!(matches!(
            Schema::from_json(text),
            Err(SchemaError::Language { tag, .. }) if tag == "not a tag"
        ));
    }

    #[test]
    fn node_kind_keywords() {
        let text = r#"{"prefixes": {"ex": "http://example/"},
            "shapes": [{"id": "ex:S", "shape": {"type": "Shape", "expression":
                {"type": "TripleConstraint", "predicate": "ex:p",
                 "valueExpr": {"type": "NodeConstraint", "nodeKind": "widget"}}}}]}"#;
        assert!(matches!(
            Schema::from_json(text),
            Err(SchemaError::UnknownNodeKind(k)) if k == "widget"
        ));
    }
}
