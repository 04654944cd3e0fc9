//! End-to-end translation of operation trees.

use graph_translate::ast::filters::{FilterOperator, LogicalFilter, LogicalOperator, PropertyFilter};
use graph_translate::{
    parse_where, translate, AuthorizationFilters, AuthorizationMode, ConnectionReadOperation,
    ConnectionSort, CreateOperation, ErrorKind, Field, Pagination, QueryAst, ReadOperation, Schema,
    Sort, TranslateConfig, TranslateError, UpdateOperation,
};
use cypher_builder::Order;
use insta::assert_snapshot;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing_test::traced_test;

fn schema() -> Schema {
    Schema::from_json(json!({
        "entities": [
            {
                "name": "Movie",
                "attributes": [
                    { "name": "title", "type": "String" },
                    { "name": "released", "type": "Int" }
                ],
                "relationships": [
                    { "name": "actors", "type": "ACTED_IN", "direction": "IN",
                      "target": "Actor", "properties": "ActedIn" },
                    { "name": "director", "type": "DIRECTED", "direction": "IN",
                      "target": "Person", "cardinality": "required" }
                ]
            },
            {
                "name": "Actor",
                "attributes": [{ "name": "name", "type": "String" }]
            },
            {
                "name": "Person",
                "attributes": [{ "name": "name", "type": "String" }]
            },
            {
                "name": "User",
                "attributes": [{ "name": "id", "type": "ID" }]
            }
        ],
        "relationship_properties": [
            { "name": "ActedIn", "attributes": [{ "name": "screenTime", "type": "Int" }] }
        ]
    }))
    .unwrap()
}

fn no_validation() -> TranslateConfig {
    TranslateConfig {
        emit_relationship_validation: false,
        ..TranslateConfig::default()
    }
}

#[test]
fn test_connection_with_sort_and_limit() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let actor = schema.entity("Actor").unwrap().clone();
    let actors = movie.relationship("actors").unwrap().clone();
    let edge = schema.edge_properties(&actors).unwrap().unwrap().clone();

    let connection = ConnectionReadOperation::new(actors, actor.clone())
        .with_node_fields(vec![Field::attribute(&actor.attributes[0])])
        .with_edge_fields(vec![Field::attribute(&edge.attributes[0])])
        .with_pagination(Pagination::from_relay(Some(10), None).unwrap())
        .add_sort(ConnectionSort::new(
            vec![Sort::new(actor.attributes[0].clone(), Order::Asc)],
            Vec::new(),
        ));
    let read = ReadOperation::new(movie.clone()).with_fields(vec![
        Field::attribute(&movie.attributes[0]),
        Field::operation("actorsConnection", connection.into()),
    ]);

    let result = translate(read, schema, TranslateConfig::default()).unwrap();
    assert_snapshot!(result.cypher, @r"
    MATCH (this:Movie)
    CALL {
        WITH this
        MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
        WITH this0, this1
        ORDER BY this1.name ASC
        WITH { screenTime: this0.screenTime, node: { name: this1.name } } AS edge
        WITH collect(edge) AS edges
        WITH edges, size(edges) AS totalCount
        CALL {
            WITH edges
            UNWIND edges AS edge
            WITH edge
            ORDER BY edge.node.name ASC
            LIMIT $param0
            RETURN collect(edge) AS var2
        }
        WITH var2 AS edges, totalCount
        RETURN { edges: edges, totalCount: totalCount } AS var3
    }
    RETURN this { .title, actorsConnection: var3 } AS this
    ");
    assert_eq!(result.params["param0"], json!(10));
}

#[test]
fn test_connection_without_fields_projects_identity() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let actor = schema.entity("Actor").unwrap().clone();
    let actors = movie.relationship("actors").unwrap().clone();

    let read = ReadOperation::new(movie).with_fields(vec![Field::operation(
        "actorsConnection",
        ConnectionReadOperation::new(actors, actor).into(),
    )]);

    let result = translate(read, schema, TranslateConfig::default()).unwrap();
    assert!(result
        .cypher
        .contains(r#"WITH { node: { __resolveType: "Actor", __id: elementId(this1) } } AS edge"#));
    assert!(!result.cypher.contains("UNWIND edges"));
}

#[test]
fn test_top_level_connection_needs_a_parent() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let actor = schema.entity("Actor").unwrap().clone();
    let actors = movie.relationship("actors").unwrap().clone();

    let error = translate(
        ConnectionReadOperation::new(actors, actor),
        schema,
        TranslateConfig::default(),
    )
    .unwrap_err();
    assert_eq!(error, TranslateError::MissingContext("target node"));
    assert_eq!(error.kind(), ErrorKind::Defect);
}

#[test]
fn test_aggregate_filter_runs_before_where() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let filters = parse_where(
        &schema,
        &movie,
        &json!({ "actors_AGGREGATE": { "count_GT": 1 } }),
    )
    .unwrap();

    let result = translate(
        ReadOperation::new(movie.clone())
            .with_fields(vec![Field::attribute(&movie.attributes[0])])
            .with_filters(filters),
        schema,
        TranslateConfig::default(),
    )
    .unwrap();

    assert_snapshot!(result.cypher, @r"
    MATCH (this:Movie)
    CALL {
        WITH this
        MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
        RETURN count(this1) > $param0 AS var2
    }
    WITH *
    WHERE var2 = true
    RETURN this { .title } AS this
    ");
}

#[test]
fn test_single_relationship_filter_binds_node_before_where() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let mut filters = parse_where(&schema, &movie, &json!({ "director": { "name": "Ann" } })).unwrap();
    filters.extend(parse_where(&schema, &movie, &json!({ "title": "Up" })).unwrap());

    let result = translate(
        ReadOperation::new(movie.clone())
            .with_fields(vec![Field::attribute(&movie.attributes[0])])
            .with_filters(filters),
        schema,
        TranslateConfig::default(),
    )
    .unwrap();

    assert_snapshot!(result.cypher, @r"
    MATCH (this:Movie)
    OPTIONAL MATCH (this)<-[:DIRECTED]-(this0:Person)
    WITH *
    WHERE (this0.name = $param0 AND this.title = $param1)
    RETURN this { .title } AS this
    ");
    assert_eq!(result.params["param0"], json!("Ann"));
}

#[test]
fn test_where_and_validate_rules_share_one_boundary() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let where_rule = parse_where(&schema, &movie, &json!({ "actors_AGGREGATE": { "count_GT": 1 } })).unwrap();
    let validate_rule = parse_where(&schema, &movie, &json!({ "released_GT": 2000 })).unwrap();

    let read = ReadOperation::new(movie.clone())
        .with_fields(vec![Field::attribute(&movie.attributes[0])])
        .with_filters(parse_where(&schema, &movie, &json!({ "title": "Up" })).unwrap())
        .with_auth_filters(AuthorizationFilters::new(AuthorizationMode::Where, where_rule))
        .with_auth_filters(AuthorizationFilters::new(AuthorizationMode::Validate, validate_rule));

    let result = translate(read, schema, TranslateConfig::default()).unwrap();
    assert_snapshot!(result.cypher, @r#"
    MATCH (this:Movie)
    CALL {
        WITH this
        MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
        RETURN count(this1) > $param0 AS var2
    }
    CALL apoc.util.validate(NOT (this.released > $param1), "@neo4j/graphql/FORBIDDEN", [0])
    WITH *
    WHERE (this.title = $param2 AND var2 = true)
    RETURN this { .title } AS this
    "#);
}

#[test]
fn test_connection_validates_before_projecting_edges() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let actor = schema.entity("Actor").unwrap().clone();
    let actors = movie.relationship("actors").unwrap().clone();

    let connection = ConnectionReadOperation::new(actors, actor.clone())
        .with_node_fields(vec![Field::attribute(&actor.attributes[0])])
        .with_filters(parse_where(&schema, &actor, &json!({ "name": "Keanu" })).unwrap())
        .with_auth_filters(AuthorizationFilters::new(
            AuthorizationMode::Validate,
            parse_where(&schema, &actor, &json!({ "name_STARTS_WITH": "K" })).unwrap(),
        ));
    let read = ReadOperation::new(movie)
        .with_fields(vec![Field::operation("actorsConnection", connection.into())]);

    let result = translate(read, schema, TranslateConfig::default()).unwrap();
    let cypher = &result.cypher;
    let validate = cypher.find("CALL apoc.util.validate(NOT (this1.name STARTS WITH").unwrap();
    let boundary = cypher.find("WITH *\n    WHERE this1.name =").unwrap();
    let edge = cypher.find("AS edge").unwrap();
    assert!(validate < boundary);
    assert!(boundary < edge);
}

#[test]
fn test_empty_logical_filter_is_true() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let filters = parse_where(&schema, &movie, &json!({ "OR": [] })).unwrap();

    let result = translate(
        ReadOperation::new(movie).with_filters(filters),
        schema,
        TranslateConfig::default(),
    )
    .unwrap();
    assert!(result.cypher.starts_with("MATCH (this:Movie)\nWHERE true\n"));
}

#[test]
fn test_create_batch_size_is_independent_of_record_count() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let record = |i: usize| {
        json!({
            "title": format!("Movie {i}"),
            "actors": { "create": [
                { "node": { "name": format!("Actor {i}") }, "edge": { "screenTime": i } },
                { "node": { "name": "Extra" } }
            ] }
        })
    };

    let translate_n = |n: usize| {
        let records: Vec<Value> = (0..n).map(record).collect();
        let op = CreateOperation::new(movie.clone(), records)
            .with_fields(vec![Field::attribute(&movie.attributes[0])]);
        translate(op, schema.clone(), no_validation()).unwrap()
    };

    let one = translate_n(1);
    let many = translate_n(25);
    assert_eq!(one.cypher, many.cypher);
    assert_eq!(one.cypher.matches("CALL {").count(), 2);
    assert_eq!(many.params["create_param0"].as_array().unwrap().len(), 25);
}

#[test]
fn test_create_validates_required_relationship() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let op = CreateOperation::new(movie.clone(), vec![json!({ "title": "Up" })])
        .with_fields(vec![Field::attribute(&movie.attributes[0])]);

    let result = translate(op, schema, TranslateConfig::default()).unwrap();
    assert_snapshot!(result.cypher, @r#"
    UNWIND $create_param0 AS create_var0
    CALL {
        WITH create_var0
        CREATE (this1:Movie)
        SET this1.title = create_var0.title
        WITH this1
        CALL {
            WITH this1
            MATCH (this1)<-[this2:DIRECTED]-(:Person)
            WITH count(this2) AS var3
            CALL apoc.util.validate(NOT (var3 = 1), "@neo4j/graphql/RELATIONSHIP-REQUIREDMovie.director required exactly once", [0])
            RETURN var3 AS var4
        }
        RETURN this1
    }
    RETURN collect(this1 { .title }) AS data
    "#);
}

#[test]
fn test_create_validation_follows_nested_merge() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let record = json!({
        "title": "Heat",
        "actors": { "create": [
            { "node": { "name": "Al" } },
            { "node": { "name": "Robert" } }
        ] }
    });

    let result = translate(
        CreateOperation::new(movie, vec![record]),
        schema,
        TranslateConfig::default(),
    )
    .unwrap();

    let cypher = &result.cypher;
    assert_eq!(cypher.matches("RELATIONSHIP-REQUIRED").count(), 1);
    let merge = cypher.find("MERGE").unwrap();
    let validate = cypher.find("apoc.util.validate").unwrap();
    assert!(merge < validate);
}

#[test]
fn test_create_rejects_unknown_input() {
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();
    let error = translate(
        CreateOperation::new(movie, vec![json!({ "rating": 3 })]),
        schema,
        TranslateConfig::default(),
    )
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Input);
}

#[traced_test]
#[test]
fn test_update_with_bound_validation() {
    let schema = schema();
    let user = schema.entity("User").unwrap().clone();
    let id = user.attributes[0].clone();

    let bind = LogicalFilter::new(
        LogicalOperator::And,
        vec![
            PropertyFilter::new(id.clone(), FilterOperator::Eq, Value::Null)
                .negated()
                .into(),
            PropertyFilter::new(id.clone(), FilterOperator::Eq, json!("id-01")).into(),
        ],
    );
    let op = UpdateOperation::new(
        user.clone(),
        json!({ "id": "id-02" }).as_object().cloned().unwrap(),
    )
    .with_fields(vec![Field::attribute(&id)])
    .with_filters(parse_where(&schema, &user, &json!({ "id": "id-01" })).unwrap())
    .with_validate_after(AuthorizationFilters::new(
        AuthorizationMode::Validate,
        vec![bind.into()],
    ));

    let result = QueryAst::new(op.into())
        .build(Arc::new(schema), TranslateConfig::default())
        .unwrap();

    assert_snapshot!(result.cypher, @r#"
    MATCH (this:User)
    WHERE this.id = $param0
    SET this.id = $param1
    WITH this
    CALL apoc.util.validate(NOT ((this.id IS NOT NULL AND this.id = $param2)), "@neo4j/graphql/FORBIDDEN", [0])
    RETURN collect(DISTINCT this { .id }) AS data
    "#);
    assert_eq!(result.params["param0"], json!("id-01"));
    assert_eq!(result.params["param1"], json!("id-02"));
    assert_eq!(result.params["param2"], json!("id-01"));
    assert!(logs_contain("query translation complete"));
}

#[test]
fn test_configured_root_variable() {
    let config = TranslateConfig::from_toml_str(r#"root_variable = "n""#).unwrap();
    let schema = schema();
    let movie = schema.entity("Movie").unwrap().clone();

    let result = translate(
        ReadOperation::new(movie.clone()).with_fields(vec![Field::attribute(&movie.attributes[0])]),
        schema,
        config,
    )
    .unwrap();
    assert_eq!(result.cypher, "MATCH (n:Movie)\nRETURN n { .title } AS n");
}
