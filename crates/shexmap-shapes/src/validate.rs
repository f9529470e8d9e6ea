// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reference matcher.
//!
//! Checks a focus node against a declared shape and reports semantic actions
//! to a [`ValidationVisitor`]. Matching is greedy: triple constraints consume
//! arcs in declaration order, `OneOf` commits to its first matching branch,
//! and recursive references are assumed to hold while they are being checked.
//!
//! Visitor events are logged while matching and delivered only after the
//! whole focus node conforms, so a failed branch never leaks bindings.
use rustc_hash::FxHashSet;
use shexmap_core::{
    subject_term, BindingCollector, Graph, NamedNode, NodeHandle, ShapeEvent, ShapeSchema, Term,
    Triple, ValidationVisitor, VisitEvent,
};
use thiserror::Error;
use tracing::{debug, trace};

use crate::model::{Node, NodeKind, Schema, Shape, TripleConstraint};

/// Validation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The requested shape is not declared.
    #[error("shape {0} not found")]
    UnknownShape(NamedNode),
    /// The focus node does not conform.
    #[error("{focus} does not conform to {shape}: {reason}")]
    NonConformant {
        /// Focus node.
        focus: Term,
        /// Shape label.
        shape: NamedNode,
        /// First failure encountered.
        reason: String,
    },
    /// The visitor refused a tagged match.
    #[error("visitor rejected tag `{tag}` with value {value}")]
    Rejected {
        /// Tag token.
        tag: String,
        /// Rejected value.
        value: Term,
    },
}

#[derive(Debug, Clone)]
enum Event {
    Enter {
        label: Option<NamedNode>,
        focus: Term,
        depth: usize,
    },
    Exit {
        label: Option<NamedNode>,
        focus: Term,
        depth: usize,
    },
    Visit {
        tag: String,
        value: Term,
        matched: Option<Triple>,
        depth: usize,
    },
}

/// Matcher bound to one schema.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'s> {
    schema: &'s Schema,
}

impl<'s> Validator<'s> {
    /// Matcher for `schema`.
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Checks `focus` against the shape `label`, reporting semantic actions
    /// of `visitor.extension()` to `visitor`.
    pub fn validate<V: ValidationVisitor>(
        &self,
        graph: &Graph,
        focus: &Term,
        label: &NamedNode,
        visitor: &mut V,
    ) -> Result<(), ValidationError> {
        let decl = self
            .schema
            .find(label)
            .ok_or_else(|| ValidationError::UnknownShape(label.clone()))?;
        let mut run = Run {
            schema: self.schema,
            graph,
            extension: visitor.extension().clone(),
            in_progress: FxHashSet::default(),
        };
        let mut log = Vec::new();
        run.shape_expr(decl, focus, Some(label), 0, &mut log)
            .map_err(|reason| ValidationError::NonConformant {
                focus: focus.clone(),
                shape: label.clone(),
                reason,
            })?;
        debug!(%focus, shape = %label, events = log.len(), "focus conforms");

        for event in &log {
            match event {
                Event::Enter {
                    label,
                    focus,
                    depth,
                } => visitor.enter(&ShapeEvent {
                    label: label.as_ref(),
                    focus,
                    depth: *depth,
                }),
                Event::Exit {
                    label,
                    focus,
                    depth,
                } => visitor.exit(&ShapeEvent {
                    label: label.as_ref(),
                    focus,
                    depth: *depth,
                }),
                Event::Visit {
                    tag,
                    value,
                    matched,
                    depth,
                } => {
                    let accepted = visitor.visit(&VisitEvent {
                        tag,
                        value,
                        matched: matched.as_ref(),
                        depth: *depth,
                    });
                    if !accepted {
                        return Err(ValidationError::Rejected {
                            tag: tag.clone(),
                            value: value.clone(),
                        });
                    }
                }
            }
        }
        visitor.close(&ShapeEvent {
            label: Some(label),
            focus,
            depth: 0,
        });
        Ok(())
    }

    /// Validates and returns the bindings tagged with `extension`.
    pub fn collect(
        &self,
        graph: &Graph,
        focus: &Term,
        label: &NamedNode,
        extension: NamedNode,
    ) -> Result<BindingCollector, ValidationError> {
        let mut collector = BindingCollector::new(extension, self.schema.prefixes().clone());
        self.validate(graph, focus, label, &mut collector)?;
        Ok(collector)
    }
}

struct Run<'s, 'g> {
    schema: &'s Schema,
    graph: &'g Graph,
    extension: NamedNode,
    in_progress: FxHashSet<(Term, NodeHandle)>,
}

impl Run<'_, '_> {
    fn shape_expr(
        &mut self,
        node: &Node,
        focus: &Term,
        label: Option<&NamedNode>,
        depth: usize,
        log: &mut Vec<Event>,
    ) -> Result<(), String> {
        match node.kind() {
            NodeKind::Shape(shape) => self.shape(node.handle(), shape, focus, label, depth, log),
            NodeKind::NodeConstraint(nc) => nc.check(focus),
            NodeKind::ShapeRef(reference) => {
                let decl = self
                    .schema
                    .find(reference)
                    .ok_or_else(|| format!("shape {reference} not found"))?;
                self.shape_expr(decl, focus, Some(reference), depth, log)
            }
            other => Err(format!("{} is not a shape expression", kind_name(other))),
        }
    }

    fn shape(
        &mut self,
        handle: NodeHandle,
        shape: &Shape,
        focus: &Term,
        label: Option<&NamedNode>,
        depth: usize,
        log: &mut Vec<Event>,
    ) -> Result<(), String> {
        let key = (focus.clone(), handle);
        if !self.in_progress.insert(key.clone()) {
            trace!(%focus, %handle, "recursive reference assumed to hold");
            return Ok(());
        }
        let result = self.shape_body(shape, focus, label, depth, log);
        self.in_progress.remove(&key);
        result
    }

    fn shape_body(
        &mut self,
        shape: &Shape,
        focus: &Term,
        label: Option<&NamedNode>,
        depth: usize,
        log: &mut Vec<Event>,
    ) -> Result<(), String> {
        log.push(Event::Enter {
            label: label.cloned(),
            focus: focus.clone(),
            depth,
        });
        let mut consumed = FxHashSet::default();
        if let Some(expr) = shape.expression.as_deref() {
            self.triple_expr(expr, focus, depth, &mut consumed, log)?;
        }
        if shape.closed {
            if let Some(extra) = self
                .graph
                .triples_with_subject(focus)
                .find(|t| !consumed.contains(*t))
            {
                return Err(format!("closed shape does not allow {extra}"));
            }
        }
        for act in &shape.sem_acts {
            if let Some(tag) = self.schema.tagged_action(act, &self.extension) {
                log.push(Event::Visit {
                    tag: tag.to_owned(),
                    value: focus.clone(),
                    matched: None,
                    depth,
                });
            }
        }
        log.push(Event::Exit {
            label: label.cloned(),
            focus: focus.clone(),
            depth,
        });
        Ok(())
    }

    fn triple_expr(
        &mut self,
        node: &Node,
        focus: &Term,
        depth: usize,
        consumed: &mut FxHashSet<Triple>,
        log: &mut Vec<Event>,
    ) -> Result<(), String> {
        match node.kind() {
            NodeKind::TripleConstraint(tc) => self.triple_constraint(tc, focus, depth, consumed, log),
            NodeKind::EachOf(items) => {
                for item in items {
                    self.triple_expr(item, focus, depth, consumed, log)?;
                }
                Ok(())
            }
            NodeKind::OneOf(items) => {
                for item in items {
                    let mut branch_consumed = consumed.clone();
                    let mut branch_log = Vec::new();
                    if self
                        .triple_expr(item, focus, depth, &mut branch_consumed, &mut branch_log)
                        .is_ok()
                    {
                        *consumed = branch_consumed;
                        log.append(&mut branch_log);
                        return Ok(());
                    }
                }
                Err(format!("no alternative matched at {focus}"))
            }
            NodeKind::SemAct(_) => Ok(()),
            other => Err(format!("{} is not a triple expression", kind_name(other))),
        }
    }

    fn triple_constraint(
        &mut self,
        tc: &TripleConstraint,
        focus: &Term,
        depth: usize,
        consumed: &mut FxHashSet<Triple>,
        log: &mut Vec<Event>,
    ) -> Result<(), String> {
        let candidates: Vec<Triple> = if tc.inverse {
            self.graph.incoming(focus, &tc.predicate).cloned().collect()
        } else {
            self.graph.outgoing(focus, &tc.predicate).cloned().collect()
        };
        let mut matched = Vec::new();
        for triple in candidates {
            if consumed.contains(&triple) {
                continue;
            }
            let value = if tc.inverse {
                subject_term(&triple.subject)
            } else {
                triple.object.clone()
            };
            let mut value_log = Vec::new();
            let ok = match tc.value.as_deref() {
                Some(expr) => self
                    .shape_expr(expr, &value, None, depth + 1, &mut value_log)
                    .is_ok(),
                None => true,
            };
            if ok {
                matched.push((triple, value, value_log));
            }
        }

        let count = matched.len();
        if count < tc.min as usize {
            return Err(format!(
                "{} matched {count} time(s), expected at least {}",
                tc.predicate, tc.min
            ));
        }
        if let Some(max) = tc.max {
            if count > max as usize {
                return Err(format!(
                    "{} matched {count} time(s), expected at most {max}",
                    tc.predicate
                ));
            }
        }

        let tags: Vec<&str> = tc
            .sem_acts
            .iter()
            .filter_map(|act| self.schema.tagged_action(act, &self.extension))
            .collect();
        for (triple, value, mut value_log) in matched {
            log.append(&mut value_log);
            for tag in &tags {
                log.push(Event::Visit {
                    tag: (*tag).to_owned(),
                    value: value.clone(),
                    matched: Some(triple.clone()),
                    depth,
                });
            }
            consumed.insert(triple);
        }
        Ok(())
    }
}

fn kind_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Shape(_) => "Shape",
        NodeKind::EachOf(_) => "EachOf",
        NodeKind::OneOf(_) => "OneOf",
        NodeKind::TripleConstraint(_) => "TripleConstraint",
        NodeKind::NodeConstraint(_) => "NodeConstraint",
        NodeKind::ShapeRef(_) => "ShapeRef",
        NodeKind::SemAct(_) => "SemAct",
    }
}
