//! Unit tests for response encoding.

use std::io;

use rstest::rstest;
use serde_json::{Value, json};

use super::*;

fn encode(response: &Response) -> String {
    let mut writer = ResponseWriter::new(Vec::new());
    writer.write(response).expect("write response");
    String::from_utf8(writer.into_inner()).expect("utf8 output")
}

#[rstest]
#[case::ok(Response::Ok, "true\n")]
#[case::empty_map(Response::Map(Vec::new()), "[]\n")]
#[case::map(
    Response::Map(vec![
        vec![EmitRecord::new(json!("A"), json!(1))],
        Vec::new(),
        vec![EmitRecord::new(json!(["x", 2]), Value::Null), EmitRecord::new(json!(null), json!({"n": 1}))],
    ]),
    "[[[\"A\",1]],[],[[[\"x\",2],null],[null,{\"n\":1}]]]\n"
)]
#[case::reduce(Response::Reduce(vec![json!(2), json!({"sum": 5})]), "[true,[2,{\"sum\":5}]]\n")]
#[case::log(Response::Log(String::from("hello")), "[\"log\",\"hello\"]\n")]
#[case::error(
    Response::error("unsupported_command", "'ddoc' command is not supported"),
    "{\"error\":\"unsupported_command\",\"reason\":\"'ddoc' command is not supported\"}\n"
)]
#[case::forbidden(Response::Forbidden(String::from("no")), "{\"forbidden\":\"no\"}\n")]
#[case::unauthorized(Response::Unauthorized(String::from("who")), "{\"unauthorized\":\"who\"}\n")]
fn encodes_wire_shapes(#[case] response: Response, #[case] expected: &str) {
    assert_eq!(encode(&response), expected);
}

#[test]
fn write_logs_emits_one_line_per_message() {
    let mut writer = ResponseWriter::new(Vec::new());
    writer
        .write_logs(&[String::from("first"), String::from("second")])
        .expect("write logs");
    let output = String::from_utf8(writer.into_inner()).expect("utf8 output");
    assert_eq!(output, "[\"log\",\"first\"]\n[\"log\",\"second\"]\n");
}

#[test]
fn emit_record_exposes_parts() {
    let record = EmitRecord::new(json!("k"), json!(3));
    assert_eq!(record.key(), &json!("k"));
    assert_eq!(record.value(), &json!(3));
}

struct BrokenPipe;

impl io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failures_are_output_failures() {
    let mut writer = ResponseWriter::new(BrokenPipe);
    let error = writer.write(&Response::Ok).expect_err("write must fail");
    assert!(error.is_output_failure());
}
