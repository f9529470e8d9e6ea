// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema fixtures, authored as YAML documents.
#![allow(clippy::expect_used)]

use shexmap_shapes::Schema;

/// Namespace shared by every fixture.
pub const EX: &str = "http://example/";

/// Label of the source shape in [`left_schema`].
pub const LEFT_SHAPE: &str = "http://a.example/S1";

/// Label of the source shape in [`untyped_left_schema`].
pub const UNTYPED_LEFT_SHAPE: &str = "http://a.example/S2";

/// Label of the destination shape in [`right_schema`].
pub const RIGHT_SHAPE: &str = "http://b.example/S1";

const PREAMBLE: &str = r#"
prefixes:
  ex: "http://example/"
  xsd: "http://www.w3.org/2001/XMLSchema#"
  map: "http://shex.io/extensions/Map/"
"#;

fn load(body: &str) -> Schema {
    Schema::from_yaml(&format!("{PREAMBLE}{body}")).expect("fixture schema must load")
}

/// `<S1> { ex:x xsd:string %map:{ ex:a %} }`
pub fn left_schema() -> Schema {
    load(
        r#"
shapes:
  - id: "<http://a.example/S1>"
    shape:
      type: Shape
      expression:
        type: TripleConstraint
        predicate: ex:x
        valueExpr: { type: NodeConstraint, datatype: "xsd:string" }
        semActs: [{ name: "map:", code: "ex:a" }]
"#,
    )
}

/// `<S2> { ex:x . %map:{ ex:a %} }`: [`left_schema`] without the datatype
/// test, so IRIs and blank nodes can be bound too.
pub fn untyped_left_schema() -> Schema {
    load(
        r#"
shapes:
  - id: "<http://a.example/S2>"
    shape:
      type: Shape
      expression:
        type: TripleConstraint
        predicate: ex:x
        semActs: [{ name: "map:", code: "ex:a" }]
"#,
    )
}

/// `<S1> { ex:z . + %map:{ ex:a %} }`
pub fn right_schema() -> Schema {
    load(
        r#"
shapes:
  - id: "<http://b.example/S1>"
    shape:
      type: Shape
      expression:
        type: TripleConstraint
        predicate: ex:z
        max: -1
        semActs: [{ name: "map:", code: "ex:a" }]
"#,
    )
}

/// Destination tagging only `ex:b`, so a binding for `ex:a` has nowhere to go.
pub fn missing_tag_schema() -> Schema {
    load(
        r#"
shapes:
  - id: "ex:Other"
    shape:
      type: Shape
      expression:
        type: TripleConstraint
        predicate: ex:z
        semActs: [{ name: "map:", code: "ex:b" }]
"#,
    )
}

/// Flat person (`ex:Flat`) and the same data nested under an address node
/// (`ex:Nested`), with `ex:item` values grouped in pairs under `ex:bucket`.
pub fn address_schema() -> Schema {
    load(
        r#"
shapes:
  - id: "ex:Flat"
    shape:
      type: Shape
      expression:
        type: EachOf
        expressions:
          - type: TripleConstraint
            predicate: ex:name
            semActs: [{ name: "map:", code: "ex:name" }]
          - type: TripleConstraint
            predicate: ex:street
            semActs: [{ name: "map:", code: "ex:street" }]
  - id: "ex:Nested"
    shape:
      type: Shape
      expression:
        type: EachOf
        expressions:
          - type: TripleConstraint
            predicate: ex:fullName
            semActs: [{ name: "map:", code: "ex:name" }]
          - type: TripleConstraint
            predicate: ex:address
            valueExpr:
              type: Shape
              expression:
                type: TripleConstraint
                predicate: ex:line
                semActs: [{ name: "map:", code: "ex:street" }]
  - id: "ex:Items"
    shape:
      type: Shape
      expression:
        type: TripleConstraint
        predicate: ex:item
        min: 0
        max: -1
        semActs: [{ name: "map:", code: "ex:item" }]
  - id: "ex:Buckets"
    shape:
      type: Shape
      expression:
        type: TripleConstraint
        predicate: ex:bucket
        min: 0
        max: -1
        valueExpr:
          type: Shape
          expression:
            type: TripleConstraint
            predicate: ex:item
            min: 0
            max: 2
            semActs: [{ name: "map:", code: "ex:item" }]
"#,
    )
}

/// `ex:Outer { ex:a { ex:b @ex:Inner * } }` where `ex:Inner` carries two
/// tags, so both tags pass through the same `ex:b` position.
pub fn shared_shape_schema() -> Schema {
    load(
        r#"
shapes:
  - id: "ex:Outer"
    shape:
      type: Shape
      expression:
        type: TripleConstraint
        predicate: ex:a
        valueExpr:
          type: Shape
          expression:
            type: TripleConstraint
            predicate: ex:b
            max: -1
            valueExpr: { type: ShapeRef, reference: "ex:Inner" }
  - id: "ex:Inner"
    shape:
      type: Shape
      expression:
        type: EachOf
        expressions:
          - type: TripleConstraint
            predicate: ex:x
            semActs: [{ name: "map:", code: "ex:x" }]
          - type: TripleConstraint
            predicate: ex:y
            semActs: [{ name: "map:", code: "ex:y" }]
"#,
    )
}
