// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shape algebra.
//!
//! A [`Schema`] owns labelled shape declarations. Every [`Node`] in every
//! declaration carries a [`NodeHandle`] assigned in pre-order when the schema
//! is built, which is the identity the lens memoizes segments by.
use rustc_hash::FxHashMap;
use shexmap_core::{EdgeSpec, NamedNode, NodeHandle, PrefixMap, Repeat, ShapeSchema, Term};
use thiserror::Error;

/// Errors raised while assembling a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two declarations share a label.
    #[error("shape {0} declared twice")]
    DuplicateShape(NamedNode),
    /// A shape reference names no declaration.
    #[error("reference to undeclared shape {0}")]
    UnknownReference(NamedNode),
    /// A token in a schema document did not resolve.
    #[error("cannot resolve `{token}`: {source}")]
    Iri {
        /// Token as written.
        token: String,
        /// Resolution failure.
        #[source]
        source: shexmap_core::IriError,
    },
    /// A value-set literal carries an invalid language tag.
    #[error("invalid language tag `{tag}`: {reason}")]
    Language {
        /// Tag as written.
        tag: String,
        /// Parser message.
        reason: String,
    },
    /// Unrecognised node kind keyword.
    #[error("unknown node kind `{0}`")]
    UnknownNodeKind(String),
    /// JSON document could not be read.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// YAML document could not be read.
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Kind of term a node constraint admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    /// Named nodes only.
    Iri,
    /// Blank nodes only.
    BNode,
    /// Literals only.
    Literal,
    /// Anything but literals.
    NonLiteral,
}

impl TermKind {
    /// True when `term` is of this kind.
    pub fn admits(self, term: &Term) -> bool {
        match self {
            Self::Iri => matches!(term, Term::NamedNode(_)),
            Self::BNode => matches!(term, Term::BlankNode(_)),
            Self::Literal => matches!(term, Term::Literal(_)),
            Self::NonLiteral => !matches!(term, Term::Literal(_)),
        }
    }
}

/// Value test applied to a single term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConstraint {
    /// Required term kind.
    pub kind: Option<TermKind>,
    /// Required literal datatype.
    pub datatype: Option<NamedNode>,
    /// Allowed values; empty means any.
    pub values: Vec<Term>,
}

impl NodeConstraint {
    /// Checks `term`; the error names the failing facet.
    pub fn check(&self, term: &Term) -> Result<(), String> {
        if let Some(kind) = self.kind {
            if !kind.admits(term) {
                return Err(format!("{term} is not {kind:?}"));
            }
        }
        if let Some(datatype) = &self.datatype {
            let admitted = match term {
                Term::Literal(lit) => lit.datatype() == datatype.as_ref(),
                _ => false,
            };
            if !admitted {
                return Err(format!("{term} is not of datatype {datatype}"));
            }
        }
        if !self.values.is_empty() && !self.values.contains(term) {
            return Err(format!("{term} is not in the value set"));
        }
        Ok(())
    }
}

/// Arc constraint: one predicate, a cardinality and an optional value test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleConstraint {
    /// Arc label.
    pub predicate: NamedNode,
    /// Arc points at the focus instead of away from it.
    pub inverse: bool,
    /// Minimum number of matching arcs.
    pub min: u32,
    /// Maximum number of matching arcs; `None` is unbounded.
    pub max: Option<u32>,
    /// Test for the far end of each arc.
    pub value: Option<Box<Node>>,
    /// Semantic actions run per matched arc.
    pub sem_acts: Vec<Node>,
}

impl TripleConstraint {
    /// `predicate` exactly once, no value test.
    pub fn new(predicate: NamedNode) -> Self {
        Self {
            predicate,
            inverse: false,
            min: 1,
            max: Some(1),
            value: None,
            sem_acts: Vec::new(),
        }
    }

    /// Sets the cardinality.
    pub fn card(mut self, min: u32, max: Option<u32>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Marks the arc as inverse.
    pub fn inverse(mut self) -> Self {
        self.inverse = true;
        self
    }

    /// Sets the value test.
    pub fn value(mut self, value: Node) -> Self {
        self.value = Some(Box::new(value));
        self
    }

    /// Appends a semantic action.
    pub fn act(mut self, sem_act: Node) -> Self {
        self.sem_acts.push(sem_act);
        self
    }
}

/// Shape body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    /// Triple expression the focus neighbourhood must match.
    pub expression: Option<Box<Node>>,
    /// Semantic actions run once the shape matched.
    pub sem_acts: Vec<Node>,
    /// Reject outgoing arcs not consumed by the expression.
    pub closed: bool,
}

/// Semantic action: an extension IRI and its code text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemAct {
    /// Extension IRI.
    pub name: NamedNode,
    /// Action body, for the map extension a tag token.
    pub code: Option<String>,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Shape with a triple expression.
    Shape(Shape),
    /// All sub-expressions must match.
    EachOf(Vec<Node>),
    /// Exactly the first matching sub-expression is used.
    OneOf(Vec<Node>),
    /// Arc constraint.
    TripleConstraint(TripleConstraint),
    /// Term test.
    NodeConstraint(NodeConstraint),
    /// Reference to a declared shape.
    ShapeRef(NamedNode),
    /// Semantic action.
    SemAct(SemAct),
}

/// Constraint node with its schema-assigned handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    handle: NodeHandle,
    kind: NodeKind,
}

impl Node {
    /// Unnumbered node; [`Schema::new`] assigns the handle.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            handle: NodeHandle(0),
            kind,
        }
    }

    /// Shape wrapping `expression`.
    pub fn shape(expression: Node) -> Self {
        Self::new(NodeKind::Shape(Shape {
            expression: Some(Box::new(expression)),
            ..Shape::default()
        }))
    }

    /// Conjunction.
    pub fn each_of(items: Vec<Node>) -> Self {
        Self::new(NodeKind::EachOf(items))
    }

    /// Ordered choice.
    pub fn one_of(items: Vec<Node>) -> Self {
        Self::new(NodeKind::OneOf(items))
    }

    /// Arc constraint.
    pub fn triple(tc: TripleConstraint) -> Self {
        Self::new(NodeKind::TripleConstraint(tc))
    }

    /// Term test.
    pub fn constraint(nc: NodeConstraint) -> Self {
        Self::new(NodeKind::NodeConstraint(nc))
    }

    /// Literal of the given datatype.
    pub fn datatype(datatype: NamedNode) -> Self {
        Self::constraint(NodeConstraint {
            datatype: Some(datatype),
            ..NodeConstraint::default()
        })
    }

    /// Reference to a declared shape.
    pub fn reference(label: NamedNode) -> Self {
        Self::new(NodeKind::ShapeRef(label))
    }

    /// Semantic action for `name` with body `code`.
    pub fn sem_act(name: NamedNode, code: impl Into<String>) -> Self {
        Self::new(NodeKind::SemAct(SemAct {
            name,
            code: Some(code.into()),
        }))
    }

    /// Schema-assigned handle.
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Shape(shape) => shape
                .expression
                .as_deref()
                .into_iter()
                .chain(&shape.sem_acts)
                .collect(),
            NodeKind::EachOf(items) | NodeKind::OneOf(items) => items.iter().collect(),
            NodeKind::TripleConstraint(tc) => {
                tc.value.as_deref().into_iter().chain(&tc.sem_acts).collect()
            }
            NodeKind::NodeConstraint(_) | NodeKind::ShapeRef(_) | NodeKind::SemAct(_) => Vec::new(),
        }
    }

    fn number(&mut self, next: &mut u32) {
        self.handle = NodeHandle(*next);
        *next += 1;
        match &mut self.kind {
            NodeKind::Shape(shape) => {
                if let Some(expr) = shape.expression.as_deref_mut() {
                    expr.number(next);
                }
                for act in &mut shape.sem_acts {
                    act.number(next);
                }
            }
            NodeKind::EachOf(items) | NodeKind::OneOf(items) => {
                for item in items {
                    item.number(next);
                }
            }
            NodeKind::TripleConstraint(tc) => {
                if let Some(value) = tc.value.as_deref_mut() {
                    value.number(next);
                }
                for act in &mut tc.sem_acts {
                    act.number(next);
                }
            }
            NodeKind::NodeConstraint(_) | NodeKind::ShapeRef(_) | NodeKind::SemAct(_) => {}
        }
    }

    fn references<'a>(&'a self, out: &mut Vec<&'a NamedNode>) {
        if let NodeKind::ShapeRef(label) = &self.kind {
            out.push(label);
        }
        for child in self.children() {
            child.references(out);
        }
    }
}

/// Labelled shape declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDecl {
    /// Declaration label.
    pub label: NamedNode,
    /// Declared shape expression.
    pub expr: Node,
}

/// Set of shape declarations plus the prefix table they were written with.
#[derive(Debug, Clone)]
pub struct Schema {
    decls: Vec<ShapeDecl>,
    index: FxHashMap<NamedNode, usize>,
    prefixes: PrefixMap,
}

impl Schema {
    /// Builds a schema, numbering every node in declaration pre-order.
    ///
    /// Fails on duplicate labels and on references to undeclared shapes.
    pub fn new(prefixes: PrefixMap, decls: Vec<ShapeDecl>) -> Result<Self, SchemaError> {
        let mut decls = decls;
        let mut index = FxHashMap::default();
        let mut next = 0;
        for (i, decl) in decls.iter_mut().enumerate() {
            if index.insert(decl.label.clone(), i).is_some() {
                return Err(SchemaError::DuplicateShape(decl.label.clone()));
            }
            decl.expr.number(&mut next);
        }
        let mut refs = Vec::new();
        for decl in &decls {
            decl.expr.references(&mut refs);
        }
        if let Some(missing) = refs.into_iter().find(|r| !index.contains_key(*r)) {
            return Err(SchemaError::UnknownReference(missing.clone()));
        }
        Ok(Self {
            decls,
            index,
            prefixes,
        })
    }

    /// Declarations in order.
    pub fn decls(&self) -> &[ShapeDecl] {
        &self.decls
    }

    /// Declaration for `label`.
    pub fn decl(&self, label: &NamedNode) -> Option<&ShapeDecl> {
        self.index.get(label).and_then(|i| self.decls.get(*i))
    }
}

impl ShapeSchema for Schema {
    type Node = Node;

    fn find(&self, label: &NamedNode) -> Option<&Node> {
        self.decl(label).map(|decl| &decl.expr)
    }

    fn handle(&self, node: &Node) -> NodeHandle {
        node.handle
    }

    fn operands<'a>(&'a self, node: &'a Node) -> Vec<&'a Node> {
        match &node.kind {
            NodeKind::ShapeRef(label) => self.find(label).into_iter().collect(),
            _ => node.children(),
        }
    }

    fn tagged_action<'a>(&'a self, node: &'a Node, extension: &NamedNode) -> Option<&'a str> {
        match &node.kind {
            NodeKind::SemAct(act) if &act.name == extension => act.code.as_deref().map(str::trim),
            _ => None,
        }
    }

    fn edge(&self, node: &Node) -> Option<EdgeSpec> {
        match &node.kind {
            NodeKind::TripleConstraint(tc) => Some(EdgeSpec {
                predicate: tc.predicate.clone(),
                inverse: tc.inverse,
                max: Repeat::from_max(tc.max),
            }),
            _ => None,
        }
    }

    fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }
}
