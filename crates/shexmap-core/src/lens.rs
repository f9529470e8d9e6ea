// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lens driver: replays collected bindings into the destination shape.
use oxrdf::{NamedNode, NamedOrBlankNode, Term};
use tracing::{debug, debug_span, warn};

use crate::collector::{BindingCollector, ValidationVisitor};
use crate::config::{ConfigError, ConfigStore, LensConfig};
use crate::error::LensError;
use crate::generator::BlankAllocator;
use crate::graph::Graph;
use crate::schema::ShapeSchema;
use crate::walker::{walk, PathTable};

/// Output root identity paired with the destination shape it should satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMap {
    root: NamedOrBlankNode,
    shape: NamedNode,
}

impl TargetMap {
    /// Binds `root` to the destination shape `shape`.
    pub fn new(root: impl Into<NamedOrBlankNode>, shape: NamedNode) -> Self {
        Self {
            root: root.into(),
            shape,
        }
    }

    /// Builds a target from `root → shape` entries; exactly one is allowed.
    pub fn from_entries<I>(entries: I) -> Result<Self, LensError>
    where
        I: IntoIterator<Item = (NamedOrBlankNode, NamedNode)>,
    {
        let mut entries = entries.into_iter();
        match (entries.next(), entries.count()) {
            (Some((root, shape)), 0) => Ok(Self { root, shape }),
            (None, _) => Err(LensError::InvalidTargetMap(0)),
            (Some(_), rest) => Err(LensError::InvalidTargetMap(rest + 1)),
        }
    }

    /// Output root identity.
    pub fn root(&self) -> &NamedOrBlankNode {
        &self.root
    }

    /// Destination shape label.
    pub fn shape(&self) -> &NamedNode {
        &self.shape
    }
}

/// Configured lens.
///
/// Holds configuration only; every call walks the destination afresh and owns
/// the resulting [`PathTable`], so one `Lens` can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Lens {
    config: LensConfig,
}

impl Lens {
    /// Lens with the given configuration.
    pub fn new(config: LensConfig) -> Self {
        Self { config }
    }

    /// Lens configured from whatever `store` holds under the lens key.
    pub fn from_store<S: ConfigStore + ?Sized>(store: &S) -> Result<Self, ConfigError> {
        LensConfig::load(store).map(Self::new)
    }

    /// Active configuration.
    pub fn config(&self) -> &LensConfig {
        &self.config
    }

    /// Walks the destination shape and roots every path at the target.
    pub fn paths<S: ShapeSchema>(
        &self,
        destination: &S,
        target: &TargetMap,
    ) -> Result<PathTable, LensError> {
        let shape = destination
            .find(target.shape())
            .ok_or_else(|| LensError::UnknownShape(target.shape().clone()))?;
        let mut blanks = BlankAllocator::new();
        if let NamedOrBlankNode::BlankNode(root) = target.root() {
            blanks.reserve(root);
        }
        let mut table = walk(destination, shape, &self.config.extension, blanks)?;
        table.root_at(target.root());
        Ok(table)
    }

    /// Rebuilds the bindings in `source` as a graph shaped by `destination`.
    ///
    /// Drains `source`. Fails with a lookup error when a binding's tag has no
    /// position in the destination; no partial graph is returned.
    pub fn generate_from<S: ShapeSchema>(
        &self,
        source: &mut BindingCollector,
        destination: &S,
        target: &TargetMap,
    ) -> Result<Graph, LensError> {
        let span = debug_span!("generate_from", shape = %target.shape(), root = %target.root());
        let _guard = span.enter();

        if source.extension() != &self.config.extension {
            if self.config.strict_extension {
                return Err(LensError::ExtensionMismatch {
                    collected: source.extension().clone(),
                    configured: self.config.extension.clone(),
                });
            }
            warn!(
                collected = %source.extension(),
                configured = %self.config.extension,
                "collector and lens follow different extensions"
            );
        }
        let mut table = self.paths(destination, target)?;
        let bindings = source.drain();
        for binding in &bindings {
            if let Term::BlankNode(node) = binding.value() {
                table.reserve(node);
            }
        }
        let mut graph = Graph::new();
        for binding in &bindings {
            let tag = binding.tag().map_err(|err| LensError::UnresolvedTag {
                token: binding.raw_tag().to_owned(),
                source: err,
            })?;
            table.replay(tag, binding.value().clone(), &mut graph)?;
        }
        debug!(bindings = bindings.len(), edges = graph.len(), "replay complete");
        Ok(graph)
    }
}

/// [`Lens::generate_from`] with the default configuration.
pub fn generate_from<S: ShapeSchema>(
    source: &mut BindingCollector,
    destination: &S,
    target: &TargetMap,
) -> Result<Graph, LensError> {
    Lens::default().generate_from(source, destination, target)
}
