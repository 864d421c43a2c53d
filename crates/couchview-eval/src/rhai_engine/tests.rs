//! Tests for the `rhai` view engine.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;

const TITLE_MAP: &str = "|doc| emit(doc.title, 1)";
const COUNT_REDUCE: &str = "|keys, values, rereduce| values.len()";
const SUM_REREDUCE: &str = "|keys, values, rereduce| { if rereduce { let total = 0; for v in values { total += v; } total } else { values.len() } }";

#[fixture]
fn engine() -> RhaiEngine {
    RhaiEngine::default()
}

fn emitted(engine: &RhaiEngine, source: &str, document: &Value) -> Vec<EmitRecord> {
    engine
        .map_document(source, document)
        .expect("map succeeds")
        .value
}

#[rstest]
#[case::closure(TITLE_MAP)]
#[case::named_function("fn map(doc) { emit(doc.title, 1); }")]
#[case::unparsed_but_valid("let unused = 1;")]
fn validate_accepts_parseable_source(engine: RhaiEngine, #[case] source: &str) {
    assert!(engine.validate(source).is_ok());
}

#[rstest]
fn validate_rejects_syntax_errors(engine: RhaiEngine) {
    let error = engine.validate("|doc| emit(doc.title").expect_err("syntax error");
    assert!(!error.message().is_empty());
}

#[rstest]
fn map_closure_emits_key_and_value(engine: RhaiEngine) {
    let records = emitted(&engine, TITLE_MAP, &json!({"title": "A"}));
    assert_eq!(records, vec![EmitRecord::new(json!("A"), json!(1))]);
}

#[rstest]
fn map_named_function_is_invocable(engine: RhaiEngine) {
    let records = emitted(
        &engine,
        "fn map(doc) { emit(doc.title, doc.count); emit(doc.count, doc.title); }",
        &json!({"title": "B", "count": 3}),
    );
    assert_eq!(
        records,
        vec![
            EmitRecord::new(json!("B"), json!(3)),
            EmitRecord::new(json!(3), json!("B")),
        ]
    );
}

#[rstest]
fn emit_without_value_records_null(engine: RhaiEngine) {
    let records = emitted(&engine, "|doc| emit(doc.title)", &json!({"title": "C"}));
    assert_eq!(records, vec![EmitRecord::new(json!("C"), Value::Null)]);
}

#[rstest]
fn emit_converts_nested_values(engine: RhaiEngine) {
    let records = emitted(
        &engine,
        "|doc| emit([doc.title, 2], #{ tags: doc.tags })",
        &json!({"title": "D", "tags": ["x", "y"]}),
    );
    assert_eq!(
        records,
        vec![EmitRecord::new(json!(["D", 2]), json!({"tags": ["x", "y"]}))]
    );
}

#[rstest]
fn map_with_no_emits_returns_empty(engine: RhaiEngine) {
    let records = emitted(&engine, "|doc| ()", &json!({"title": "E"}));
    assert!(records.is_empty());
}

#[rstest]
fn each_call_starts_with_empty_accumulator(engine: RhaiEngine) {
    let first = emitted(&engine, TITLE_MAP, &json!({"title": "A"}));
    let second = emitted(&engine, TITLE_MAP, &json!({"title": "B"}));
    assert_eq!(first, vec![EmitRecord::new(json!("A"), json!(1))]);
    assert_eq!(second, vec![EmitRecord::new(json!("B"), json!(1))]);
}

#[rstest]
fn top_level_statements_do_not_leak_into_results(engine: RhaiEngine) {
    let source = "emit(\"top\", 0); log(\"top\"); |doc| emit(doc.title, 1)";
    for title in ["A", "B"] {
        let evaluated = engine
            .map_document(source, &json!({"title": title}))
            .expect("map succeeds");
        assert_eq!(evaluated.value, vec![EmitRecord::new(json!(title), json!(1))]);
        assert!(evaluated.logs.is_empty());
    }
}

#[rstest]
#[case::inner_closure("fn map(doc) { let f = |x| emit(x, 1); f.call(doc.title); }")]
#[case::closure_for_key("fn map(doc) { let key = |d| d.title; emit(key.call(doc), 1); }")]
fn named_function_may_contain_closures(engine: RhaiEngine, #[case] source: &str) {
    let records = emitted(&engine, source, &json!({"title": "A"}));
    assert_eq!(records, vec![EmitRecord::new(json!("A"), json!(1))]);
}

#[rstest]
fn logs_are_collected_in_order(engine: RhaiEngine) {
    let evaluated = engine
        .map_document(
            "|doc| { log(\"seen \" + doc.title); log(#{ n: 1 }); emit(doc.title, 1); }",
            &json!({"title": "A"}),
        )
        .expect("map succeeds");
    assert_eq!(
        evaluated.logs,
        vec![String::from("seen A"), String::from("{\"n\":1}")]
    );
    assert_eq!(evaluated.value.len(), 1);
}

#[rstest]
fn print_does_not_produce_log_lines(engine: RhaiEngine) {
    let evaluated = engine
        .map_document("|doc| { print(\"hello\"); emit(1, 2); }", &json!({}))
        .expect("map succeeds");
    assert!(evaluated.logs.is_empty());
    assert_eq!(evaluated.value, vec![EmitRecord::new(json!(1), json!(2))]);
}

#[rstest]
#[case::expression("42")]
#[case::string("\"map\"")]
#[case::two_functions("fn first(doc) { } fn second(doc) { }")]
fn non_function_sources_are_not_invocable(engine: RhaiEngine, #[case] source: &str) {
    let error = engine
        .map_document(source, &json!({}))
        .expect_err("not invocable");
    assert!(
        matches!(error, EvaluationError::NotInvocable { .. }),
        "unexpected error: {error:?}"
    );
}

#[rstest]
fn syntax_errors_surface_at_evaluation(engine: RhaiEngine) {
    let error = engine
        .map_document("|doc| emit(", &json!({}))
        .expect_err("syntax error");
    assert!(matches!(error, EvaluationError::Syntax(_)));
}

#[rstest]
#[case::thrown_string("|doc| { throw \"boom\"; }", "boom")]
#[case::missing_function("|doc| no_such_function(doc)", "no_such_function")]
fn runtime_failures_are_classified(
    engine: RhaiEngine,
    #[case] source: &str,
    #[case] fragment: &str,
) {
    let error = engine
        .map_document(source, &json!({}))
        .expect_err("runtime error");
    match error {
        EvaluationError::Runtime { message } => assert!(
            message.contains(fragment),
            "expected '{fragment}' in '{message}'"
        ),
        other => panic!("expected runtime error, got {other:?}"),
    }
}

#[rstest]
fn thrown_forbidden_map_is_a_control_event(engine: RhaiEngine) {
    let error = engine
        .map_document("|doc| { throw #{ forbidden: \"read only\" }; }", &json!({}))
        .expect_err("forbidden");
    assert_eq!(
        error,
        EvaluationError::Forbidden {
            reason: String::from("read only"),
        }
    );
}

#[rstest]
fn thrown_unauthorized_map_is_a_control_event(engine: RhaiEngine) {
    let error = engine
        .reduce(
            "|keys, values, rereduce| { throw #{ unauthorized: \"login\" }; }",
            &Value::Null,
            &[],
            true,
        )
        .expect_err("unauthorized");
    assert_eq!(
        error,
        EvaluationError::Unauthorized {
            reason: String::from("login"),
        }
    );
}

#[rstest]
fn eval_is_disabled(engine: RhaiEngine) {
    let result = engine.map_document("|doc| eval(\"emit(1, 1)\")", &json!({}));
    assert!(result.is_err());
}

#[rstest]
fn reduce_counts_values(engine: RhaiEngine) {
    let evaluated = engine
        .reduce(
            COUNT_REDUCE,
            &json!([["a", "d1"], ["b", "d2"]]),
            &[json!(1), json!(1)],
            false,
        )
        .expect("reduce succeeds");
    assert_eq!(evaluated.value, json!(2));
}

#[rstest]
fn rereduce_sums_values(engine: RhaiEngine) {
    let evaluated = engine
        .reduce(SUM_REREDUCE, &Value::Null, &[json!(2), json!(3)], true)
        .expect("rereduce succeeds");
    assert_eq!(evaluated.value, json!(5));
}

#[rstest]
#[case::reduce(false)]
#[case::rereduce(true)]
fn rereduce_flag_is_passed_unchanged(engine: RhaiEngine, #[case] flag: bool) {
    let evaluated = engine
        .reduce("|keys, values, rereduce| rereduce", &Value::Null, &[], flag)
        .expect("reduce succeeds");
    assert_eq!(evaluated.value, json!(flag));
}

#[rstest]
fn rereduce_keys_are_unit(engine: RhaiEngine) {
    let evaluated = engine
        .reduce("|keys, values, rereduce| type_of(keys)", &Value::Null, &[], true)
        .expect("reduce succeeds");
    assert_eq!(evaluated.value, json!("()"));
}

#[rstest]
fn reduce_receives_key_pairs(engine: RhaiEngine) {
    let evaluated = engine
        .reduce(
            "|keys, values, rereduce| keys[1][0]",
            &json!([["a", "d1"], ["b", "d2"]]),
            &[json!(1), json!(2)],
            false,
        )
        .expect("reduce succeeds");
    assert_eq!(evaluated.value, json!("b"));
}

#[rstest]
fn reduce_collects_logs(engine: RhaiEngine) {
    let evaluated = engine
        .reduce(
            "|keys, values, rereduce| { log(\"reducing\"); 0 }",
            &Value::Null,
            &[],
            false,
        )
        .expect("reduce succeeds");
    assert_eq!(evaluated.logs, vec![String::from("reducing")]);
}

#[rstest]
fn compiled_functions_are_cached_by_source(engine: RhaiEngine) {
    emitted(&engine, TITLE_MAP, &json!({"title": "A"}));
    emitted(&engine, TITLE_MAP, &json!({"title": "B"}));
    assert_eq!(engine.cached_functions(), 1);
}

#[test]
fn cache_capacity_is_bounded() {
    let engine = RhaiEngine::new(0);
    emitted(&engine, TITLE_MAP, &json!({"title": "A"}));
    emitted(&engine, "|doc| emit(doc.title)", &json!({"title": "A"}));
    assert_eq!(engine.cached_functions(), 1);
}
