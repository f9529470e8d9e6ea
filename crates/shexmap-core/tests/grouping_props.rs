// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Grouping and pass-through laws.

use std::num::NonZeroU32;

use proptest::prelude::*;
use shexmap_core::{
    generate_from, map_extension, subject_term, BindingCollector, BlankAllocator, Graph,
    NodeGenerator, NodeHandle, PathSegment, PrefixMap, Repeat, TargetMap, Term,
};
use shexmap_dry_tests::{address_schema, blank, iri, lit, named, EX};

fn bucket_run(schema: &shexmap_shapes::Schema, values: &[Term]) -> Graph {
    let mut bindings =
        BindingCollector::new(map_extension(), PrefixMap::from_pairs([("ex", EX)]).unwrap());
    for value in values {
        bindings.push("ex:item", value.clone());
    }
    let target = TargetMap::new(iri(&format!("{EX}root")), iri(&format!("{EX}Buckets")));
    generate_from(&mut bindings, schema, &target).unwrap()
}

fn literals(items: usize) -> Vec<Term> {
    (0..items).map(|i| lit(&format!("v{i}"))).collect()
}

fn owner_of(graph: &Graph, value: &Term) -> Term {
    graph
        .triples_with_object(value)
        .map(|t| subject_term(&t.subject))
        .next()
        .expect("every item value has an owner")
}

proptest! {
    #[test]
    fn identity_rotates_every_k_uses(k in 1u32..6, calls in 0usize..40) {
        let mut blanks = BlankAllocator::new();
        let mut generator = NodeGenerator::new(Repeat::Bounded(NonZeroU32::new(k).unwrap()));
        let ids: Vec<_> = (0..calls).map(|_| generator.next(&mut blanks)).collect();
        for i in 1..ids.len() {
            let rotates = i % k as usize == 0;
            prop_assert_eq!(ids[i] != ids[i - 1], rotates, "call {}", i);
        }
    }

    #[test]
    fn unbounded_identity_never_rotates(calls in 1usize..40) {
        let mut blanks = BlankAllocator::new();
        let mut generator = NodeGenerator::new(Repeat::Unbounded);
        let first = generator.next(&mut blanks);
        for _ in 1..calls {
            prop_assert_eq!(generator.next(&mut blanks), first.clone());
        }
        prop_assert_eq!(blanks.minted_count(), 1);
    }

    #[test]
    fn replayed_items_are_grouped_in_pairs(items in 0usize..16) {
        let schema = address_schema();
        let values = literals(items);
        let out = bucket_run(&schema, &values);
        let owners: Vec<_> = values.iter().map(|v| owner_of(&out, v)).collect();
        for i in 1..owners.len() {
            prop_assert_eq!(owners[i] != owners[i - 1], i % 2 == 0);
        }
        prop_assert_eq!(out.len(), items + items.div_ceil(2));
    }

    #[test]
    fn source_blanks_are_never_rerooted(kinds in prop::collection::vec(any::<bool>(), 1..12)) {
        // Source blanks reuse the `b{i}` labels a counter would mint.
        let values: Vec<Term> = kinds
            .iter()
            .enumerate()
            .map(|(i, is_blank)| if *is_blank { blank(&format!("b{i}")) } else { lit(&format!("v{i}")) })
            .collect();
        let schema = address_schema();
        let out = bucket_run(&schema, &values);
        let root = named(&format!("{EX}root"));

        prop_assert_eq!(out.len(), values.len() + values.len().div_ceil(2));
        prop_assert!(out.mentions(&root));
        for (i, value) in values.iter().enumerate() {
            let owners: Vec<_> = out
                .triples_with_object(value)
                .map(|t| subject_term(&t.subject))
                .collect();
            prop_assert_eq!(owners.len(), 1, "item {}", i);
            prop_assert!(owners[0].is_blank_node());
            prop_assert!(!values.contains(&owners[0]));
            if value.is_blank_node() {
                prop_assert_eq!(out.triples_with_subject(value).count(), 0);
            }
        }
    }

    #[test]
    fn replay_is_stable_under_repetition(items in 0usize..16) {
        let schema = address_schema();
        let values = literals(items);
        prop_assert_eq!(
            bucket_run(&schema, &values).canonical_hash(),
            bucket_run(&schema, &values).canonical_hash()
        );
    }

    #[test]
    fn non_edge_segments_pass_values_through(lexical in "[a-z]{0,12}") {
        let mut segment = PathSegment::new(NodeHandle(7), None);
        let mut graph = Graph::new();
        let mut blanks = BlankAllocator::new();
        let value = lit(&lexical);
        prop_assert_eq!(segment.fold(value.clone(), &mut graph, &mut blanks).unwrap(), value);
        prop_assert!(graph.is_empty());
        prop_assert_eq!(blanks.minted_count(), 0);
    }
}
