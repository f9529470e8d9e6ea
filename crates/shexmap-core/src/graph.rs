// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory edge set with subject and object indexes.
use oxrdf::{BlankNode, NamedNode, NamedOrBlankNode, Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::term::subject_term;

/// 32-byte BLAKE3 digest of a graph's canonical form.
pub type GraphHash = [u8; 32];

/// Set of oxrdf triples.
///
/// Two secondary indexes (by subject, by object) back the blank rewrite used
/// when re-rooting, and the neighbourhood lookups a matcher needs. Every
/// traversal returns triples ordered by their N-Triples text, so the same
/// graph is always walked the same way.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: FxHashSet<Triple>,
    by_subject: FxHashMap<Term, FxHashSet<Triple>>,
    by_object: FxHashMap<Term, FxHashSet<Triple>>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct triples.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// True when the graph holds no triples.
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Inserts a triple; returns `false` when it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.triples.contains(&triple) {
            return false;
        }
        self.by_subject
            .entry(subject_term(&triple.subject))
            .or_default()
            .insert(triple.clone());
        self.by_object
            .entry(triple.object.clone())
            .or_default()
            .insert(triple.clone());
        self.triples.insert(triple)
    }

    /// Removes a triple; returns `false` when it was absent.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        if !self.triples.remove(triple) {
            return false;
        }
        unindex(&mut self.by_subject, &subject_term(&triple.subject), triple);
        unindex(&mut self.by_object, &triple.object, triple);
        true
    }

    /// True when the triple is present.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// All triples in N-Triples order.
    pub fn iter(&self) -> std::vec::IntoIter<&Triple> {
        ordered(self.triples.iter())
    }

    /// Triples whose subject is `subject`.
    pub fn triples_with_subject(&self, subject: &Term) -> std::vec::IntoIter<&Triple> {
        ordered(self.by_subject.get(subject).into_iter().flatten())
    }

    /// Triples whose object is `object`.
    pub fn triples_with_object(&self, object: &Term) -> std::vec::IntoIter<&Triple> {
        ordered(self.by_object.get(object).into_iter().flatten())
    }

    /// Outgoing triples of `subject` labelled `predicate`.
    pub fn outgoing(&self, subject: &Term, predicate: &NamedNode) -> std::vec::IntoIter<&Triple> {
        ordered(
            self.by_subject
                .get(subject)
                .into_iter()
                .flatten()
                .filter(|t| &t.predicate == predicate),
        )
    }

    /// Incoming triples of `object` labelled `predicate`.
    pub fn incoming(&self, object: &Term, predicate: &NamedNode) -> std::vec::IntoIter<&Triple> {
        ordered(
            self.by_object
                .get(object)
                .into_iter()
                .flatten()
                .filter(|t| &t.predicate == predicate),
        )
    }

    /// True when `term` occurs in subject or object position of any triple.
    pub fn mentions(&self, term: &Term) -> bool {
        self.by_subject.contains_key(term) || self.by_object.contains_key(term)
    }

    /// Replaces every subject or object occurrence of `from` with `to`.
    ///
    /// Runs in two phases: the affected triples are gathered from both
    /// indexes first, then removed and reinserted in rewritten form. Returns
    /// how many triples were rewritten (before any deduplication on insert).
    pub fn rename_blank(&mut self, from: &BlankNode, to: &NamedOrBlankNode) -> usize {
        let old = Term::BlankNode(from.clone());
        let new = subject_term(to);
        if old == new {
            return 0;
        }
        let touched: FxHashSet<Triple> = [self.by_subject.get(&old), self.by_object.get(&old)]
            .into_iter()
            .flatten()
            .flatten()
            .cloned()
            .collect();
        for triple in &touched {
            self.remove(triple);
        }
        let count = touched.len();
        for Triple {
            subject,
            predicate,
            object,
        } in touched
        {
            let subject = match subject {
                NamedOrBlankNode::BlankNode(node) if &node == from => to.clone(),
                other => other,
            };
            let object = if object == old { new.clone() } else { object };
            self.insert(Triple::new(subject, predicate, object));
        }
        count
    }

    /// N-Triples rendering, one triple per line in sorted order.
    pub fn to_ntriples(&self) -> String {
        let mut lines: Vec<String> = self.triples.iter().map(|t| format!("{t} .\n")).collect();
        lines.sort_unstable();
        lines.concat()
    }

    /// BLAKE3 hash of the graph with blank labels factored out.
    ///
    /// Blank nodes are renamed after a colour refinement over their
    /// neighbourhoods, so graphs that differ only in how their blanks are
    /// labelled hash the same.
    pub fn canonical_hash(&self) -> GraphHash {
        let colours = self.blank_colours();
        let mut lines: Vec<String> = self
            .triples
            .iter()
            .map(|t| {
                format!(
                    "{} {} {}",
                    label(&subject_term(&t.subject), &colours),
                    t.predicate,
                    label(&t.object, &colours)
                )
            })
            .collect();
        lines.sort_unstable();
        let mut hasher = blake3::Hasher::new();
        for line in &lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().into()
    }

    /// True when both graphs have the same canonical hash.
    pub fn isomorphic(&self, other: &Self) -> bool {
        self.len() == other.len() && self.canonical_hash() == other.canonical_hash()
    }

    fn blank_colours(&self) -> FxHashMap<BlankNode, blake3::Hash> {
        let seed = blake3::hash(b"_");
        let mut colours: FxHashMap<BlankNode, blake3::Hash> = FxHashMap::default();
        for triple in &self.triples {
            if let NamedOrBlankNode::BlankNode(node) = &triple.subject {
                colours.insert(node.clone(), seed);
            }
            if let Term::BlankNode(node) = &triple.object {
                colours.insert(node.clone(), seed);
            }
        }
        let mut classes = usize::from(!colours.is_empty());
        for _ in 0..colours.len() {
            let refined: FxHashMap<BlankNode, blake3::Hash> = colours
                .keys()
                .map(|node| (node.clone(), self.refine(node, &colours)))
                .collect();
            let count = refined.values().collect::<FxHashSet<_>>().len();
            colours = refined;
            if count == classes {
                break;
            }
            classes = count;
        }
        colours
    }

    fn refine(&self, node: &BlankNode, colours: &FxHashMap<BlankNode, blake3::Hash>) -> blake3::Hash {
        let term = Term::BlankNode(node.clone());
        let outgoing = self
            .by_subject
            .get(&term)
            .into_iter()
            .flatten()
            .map(|t| format!("> {} {}", t.predicate, label(&t.object, colours)));
        let incoming = self
            .by_object
            .get(&term)
            .into_iter()
            .flatten()
            .map(|t| format!("< {} {}", t.predicate, label(&subject_term(&t.subject), colours)));
        let mut facts: Vec<String> = outgoing.chain(incoming).collect();
        facts.sort_unstable();
        let mut hasher = blake3::Hasher::new();
        if let Some(own) = colours.get(node) {
            hasher.update(own.as_bytes());
        }
        for fact in &facts {
            hasher.update(fact.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize()
    }
}

fn label(term: &Term, colours: &FxHashMap<BlankNode, blake3::Hash>) -> String {
    match term {
        Term::BlankNode(node) => colours
            .get(node)
            .map_or_else(|| term.to_string(), |c| format!("_:{}", c.to_hex())),
        _ => term.to_string(),
    }
}

fn ordered<'a>(triples: impl Iterator<Item = &'a Triple>) -> std::vec::IntoIter<&'a Triple> {
    let mut out: Vec<&Triple> = triples.collect();
    out.sort_by_cached_key(|t| t.to_string());
    out.into_iter()
}

fn unindex(index: &mut FxHashMap<Term, FxHashSet<Triple>>, key: &Term, triple: &Triple) {
    if let Some(set) = index.get_mut(key) {
        set.remove(triple);
        if set.is_empty() {
            index.remove(key);
        }
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.triples == other.triples
    }
}

impl Eq for Graph {}

impl FromIterator<Triple> for Graph {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        let mut graph = Self::new();
        graph.extend(iter);
        graph
    }
}

impl Extend<Triple> for Graph {
    fn extend<T: IntoIterator<Item = Triple>>(&mut self, iter: T) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::vec::IntoIter<&'a Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
