// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end lens behaviour: validate with the reference matcher, replay
//! into a destination schema, inspect the output graph.

use shexmap_core::{
    generate_from, map_extension, subject_term, BindingCollector, Graph, Lens, LensError,
    PrefixMap, TargetMap, Term,
};
use shexmap_dry_tests::{
    address_schema, blank, graph, init_tracing, iri, left_schema, lit, missing_tag_schema, named,
    right_schema, shared_shape_schema, triple, untyped_left_schema, EX, LEFT_SHAPE, RIGHT_SHAPE,
    UNTYPED_LEFT_SHAPE,
};
use shexmap_shapes::{Schema, Validator};

fn ex(local: &str) -> String {
    format!("{EX}{local}")
}

fn collect(schema: &Schema, source: &Graph, focus: &str, label: &str) -> BindingCollector {
    Validator::new(schema)
        .collect(source, &named(focus), &iri(label), map_extension())
        .expect("source graph must validate")
}

fn ex_prefixes() -> PrefixMap {
    PrefixMap::from_pairs([("ex", EX)]).unwrap()
}

fn blanks_in(graph: &Graph) -> usize {
    graph
        .iter()
        .flat_map(|t| [subject_term(&t.subject), t.object.clone()])
        .filter(Term::is_blank_node)
        .collect::<std::collections::HashSet<_>>()
        .len()
}

#[test]
fn single_tag_lands_on_target() {
    init_tracing();
    let source = graph([triple(named(&ex("foo")), &ex("x"), lit("P"))]);
    let mut bindings = collect(&left_schema(), &source, &ex("foo"), LEFT_SHAPE);
    assert_eq!(bindings.len(), 1);

    let target = TargetMap::new(iri(&ex("bar")), iri(RIGHT_SHAPE));
    let out = generate_from(&mut bindings, &right_schema(), &target).unwrap();

    assert_eq!(out, graph([triple(named(&ex("bar")), &ex("z"), lit("P"))]));
    assert!(bindings.is_empty(), "replay drains the collector");
}

#[test]
fn tag_absent_from_destination_is_a_lookup_error() {
    init_tracing();
    let source = graph([triple(named(&ex("foo")), &ex("x"), lit("P"))]);
    let mut bindings = collect(&left_schema(), &source, &ex("foo"), LEFT_SHAPE);
    let target = TargetMap::new(iri(&ex("bar")), iri(&ex("Other")));

    let err = generate_from(&mut bindings, &missing_tag_schema(), &target).unwrap_err();

    assert!(err.is_lookup());
    assert_eq!(err, LensError::MissingTag { tag: iri(&ex("a")) });
}

#[test]
fn unknown_destination_shape_is_a_lookup_error() {
    let mut bindings = BindingCollector::new(map_extension(), ex_prefixes());
    let target = TargetMap::new(iri(&ex("bar")), iri(&ex("Nope")));
    let err = generate_from(&mut bindings, &right_schema(), &target).unwrap_err();
    assert!(err.is_lookup());
    assert!(matches!(err, LensError::UnknownShape(shape) if shape == iri(&ex("Nope"))));
}

#[test]
fn tag_with_unknown_prefix_is_unresolved() {
    let mut bindings = BindingCollector::new(map_extension(), ex_prefixes());
    bindings.push("zz:a", lit("P"));
    let target = TargetMap::new(iri(&ex("bar")), iri(RIGHT_SHAPE));
    let err = generate_from(&mut bindings, &right_schema(), &target).unwrap_err();
    assert!(matches!(&err, LensError::UnresolvedTag { token, .. } if token == "zz:a"));
    assert!(err.is_lookup());
}

#[test]
fn nested_destination_is_rooted_at_target() {
    init_tracing();
    let alice = named(&ex("alice"));
    let source = graph([
        triple(alice.clone(), &ex("name"), lit("Alice")),
        triple(alice, &ex("street"), lit("Main St")),
    ]);
    let schema = address_schema();
    let mut bindings = collect(&schema, &source, &ex("alice"), &ex("Flat"));
    let target = TargetMap::new(iri(&ex("person")), iri(&ex("Nested")));

    let out = generate_from(&mut bindings, &schema, &target).unwrap();

    let person = named(&ex("person"));
    let expected = graph([
        triple(person.clone(), &ex("fullName"), lit("Alice")),
        triple(person, &ex("address"), blank("addr")),
        triple(blank("addr"), &ex("line"), lit("Main St")),
    ]);
    assert!(out.isomorphic(&expected), "got\n{}", out.to_ntriples());
    // The synthetic roots of both replays were renamed away.
    assert_eq!(blanks_in(&out), 1);
}

#[test]
fn tags_sharing_a_position_share_its_identity() {
    init_tracing();
    let schema = shared_shape_schema();
    let mut bindings = BindingCollector::new(map_extension(), ex_prefixes());
    bindings.push("ex:x", lit("X"));
    bindings.push("ex:y", lit("Y"));
    let target = TargetMap::new(iri(&ex("t")), iri(&ex("Outer")));

    let out = generate_from(&mut bindings, &schema, &target).unwrap();

    let t = named(&ex("t"));
    let expected = graph([
        triple(t, &ex("a"), blank("mid")),
        triple(blank("mid"), &ex("b"), blank("x")),
        triple(blank("mid"), &ex("b"), blank("y")),
        triple(blank("x"), &ex("x"), lit("X")),
        triple(blank("y"), &ex("y"), lit("Y")),
    ]);
    assert!(out.isomorphic(&expected), "got\n{}", out.to_ntriples());
}

#[test]
fn source_blank_value_is_not_rerooted() {
    init_tracing();
    let source = graph([triple(named(&ex("foo")), &ex("x"), blank("b0"))]);
    let mut bindings = collect(&untyped_left_schema(), &source, &ex("foo"), UNTYPED_LEFT_SHAPE);
    let target = TargetMap::new(iri(&ex("bar")), iri(RIGHT_SHAPE));

    let out = generate_from(&mut bindings, &right_schema(), &target).unwrap();

    assert_eq!(out, graph([triple(named(&ex("bar")), &ex("z"), blank("b0"))]));
}

#[test]
fn source_blanks_survive_beside_synthesized_nodes() {
    init_tracing();
    let alice = named(&ex("alice"));
    let source = graph([
        triple(alice.clone(), &ex("name"), blank("b1")),
        triple(alice, &ex("street"), blank("b0")),
    ]);
    let schema = address_schema();
    let mut bindings = collect(&schema, &source, &ex("alice"), &ex("Flat"));
    let target = TargetMap::new(iri(&ex("person")), iri(&ex("Nested")));

    let out = generate_from(&mut bindings, &schema, &target).unwrap();

    let person = named(&ex("person"));
    assert!(out.contains(&triple(person.clone(), &ex("fullName"), blank("b1"))));
    let address: Vec<Term> = out
        .triples_with_object(&blank("b0"))
        .map(|t| subject_term(&t.subject))
        .collect();
    assert_eq!(address.len(), 1);
    assert_ne!(address[0], blank("b0"));
    assert_ne!(address[0], blank("b1"));
    assert!(out.contains(&triple(person, &ex("address"), address[0].clone())));
    assert_eq!(out.len(), 3);
}

#[test]
fn literal_reaching_an_inverse_position_is_refused() {
    let schema = Schema::from_json(
        r#"{"prefixes": {"ex": "http://example/", "map": "http://shex.io/extensions/Map/"},
            "shapes": [{"id": "ex:Dst", "shape": {"type": "Shape", "expression": {
              "type": "TripleConstraint", "predicate": "ex:knownBy", "inverse": true,
              "semActs": [{"name": "map:", "code": "ex:a"}]}}}]}"#,
    )
    .unwrap();
    let mut bindings = BindingCollector::new(map_extension(), ex_prefixes());
    bindings.push("ex:a", lit("P"));
    let target = TargetMap::new(iri(&ex("t")), iri(&ex("Dst")));

    let err = generate_from(&mut bindings, &schema, &target).unwrap_err();

    assert!(matches!(err, LensError::LiteralSubject { ref value, .. } if *value == lit("P")));
    assert!(!err.is_lookup());
}

#[test]
fn paths_through_a_reference_reuse_segments() {
    let schema = shared_shape_schema();
    let target = TargetMap::new(iri(&ex("t")), iri(&ex("Outer")));
    let table = Lens::default().paths(&schema, &target).unwrap();

    let x = table.get(&iri(&ex("x"))).unwrap();
    let y = table.get(&iri(&ex("y"))).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(x.steps().len(), y.steps().len());
    let shared = x.steps().len() - 1;
    assert_eq!(x.steps()[..shared], y.steps()[..shared]);
    assert_ne!(x.steps()[shared], y.steps()[shared]);
    assert_eq!(table.arena().len(), shared + 2);
}

#[test]
fn replay_is_deterministic() {
    let run = || {
        let alice = named(&ex("alice"));
        let source = graph([
            triple(alice.clone(), &ex("name"), lit("Alice")),
            triple(alice, &ex("street"), lit("Main St")),
        ]);
        let schema = address_schema();
        let mut bindings = collect(&schema, &source, &ex("alice"), &ex("Flat"));
        let target = TargetMap::new(iri(&ex("person")), iri(&ex("Nested")));
        generate_from(&mut bindings, &schema, &target).unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.len(), second.len());
    assert_eq!(first.canonical_hash(), second.canonical_hash());
}

#[test]
fn value_reaching_the_root_unwrapped_is_not_rerooted() {
    // A shape-level tag has no edge step between the value and the root.
    let schema = Schema::from_json(
        r#"{"prefixes": {"ex": "http://example/", "map": "http://shex.io/extensions/Map/"},
            "shapes": [{"id": "ex:S", "shape": {"type": "Shape",
              "semActs": [{"name": "map:", "code": "ex:self"}]}}]}"#,
    )
    .unwrap();
    let mut bindings = BindingCollector::new(map_extension(), ex_prefixes());
    bindings.push("ex:self", lit("P"));
    let target = TargetMap::new(iri(&ex("t")), iri(&ex("S")));
    let out = generate_from(&mut bindings, &schema, &target).unwrap();
    assert!(out.is_empty());
}
