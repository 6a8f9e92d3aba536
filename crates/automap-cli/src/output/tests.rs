// Tests for output formatting
//
// These tests verify plan rendering and the format-dependent behavior of
// the output writer.

use super::*;
use automap_core::{AutoMapper, ClassShape, MemberDecl, ShapeCatalog, ShapeId, TypeDescriptor};
use std::sync::{Arc, Mutex};

/// Writer whose contents stay readable after the OutputWriter takes it
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, 0, Box::new(buffer.clone()));
    (writer, buffer)
}

fn person_plan() -> Arc<MappingPlan> {
    let shapes = ShapeCatalog::new()
        .with_class(
            ClassShape::new("Person")
                .member(MemberDecl::new("name", TypeDescriptor::string()))
                .member(MemberDecl::new("age", TypeDescriptor::int()))
                .member(MemberDecl::new("email", TypeDescriptor::string()).groups(["private"])),
        )
        .unwrap();
    let mapper = AutoMapper::new(shapes);
    mapper
        .plan(&ShapeId::class("Person"), &ShapeId::Map)
        .unwrap()
}

#[test]
fn test_plan_formatting_human() {
    let plan = person_plan();
    let formatted = OutputFormat::Human.format_plan(&plan).unwrap();

    assert!(formatted.contains("═══ Person -> map ═══"));
    assert!(formatted.contains(&format!("Mapper: {}", plan.mapper_name)));
    assert!(formatted.contains("Member"));
    assert!(formatted.contains("Transformer"));
    assert!(formatted.contains("age"));
    assert!(formatted.contains("groups: private"));
}

#[test]
fn test_plan_formatting_json_round_trips() {
    let plan = person_plan();
    let formatted = OutputFormat::Json.format_plan(&plan).unwrap();
    let parsed: MappingPlan = serde_json::from_str(&formatted).unwrap();
    assert_eq!(&parsed, plan.as_ref());
}

#[test]
fn test_plan_formatting_yaml() {
    let plan = person_plan();
    let formatted = OutputFormat::Yaml.format_plan(&plan).unwrap();
    assert!(formatted.contains("mapper_name:"));
    assert!(formatted.contains("members:"));
}

#[test]
fn test_render_table_pads_columns() {
    let lines = render_table(
        &["A", "Long header"],
        &[vec!["value".to_string(), "x".to_string()]],
    );
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "A     │ Long header");
    assert_eq!(lines[2], "value │ x");
}

#[test]
fn test_messages_only_in_human_format() {
    let (mut output, buffer) = writer(OutputFormat::Json, false);
    output.info("hello").unwrap();
    output.success("done").unwrap();
    output.section("Result").unwrap();
    output.data(&serde_json::json!({"a": 1})).unwrap();
    assert_eq!(buffer.contents(), "{\"a\":1}\n");

    let (mut output, buffer) = writer(OutputFormat::Human, false);
    output.info("hello").unwrap();
    output.success("done").unwrap();
    assert_eq!(buffer.contents(), "INFO: hello\ndone\n");
}

#[test]
fn test_quiet_suppresses_info_but_not_data() {
    let (mut output, buffer) = writer(OutputFormat::Human, true);
    output.info("hidden").unwrap();
    output.section("Hidden").unwrap();
    output.data(&serde_json::json!([1, 2])).unwrap();
    let contents = buffer.contents();
    assert!(!contents.contains("hidden"));
    assert!(!contents.contains("Hidden"));
    assert!(contents.contains('1'));
}

#[test]
fn test_debug_requires_verbosity() {
    let buffer = SharedBuffer::default();
    let mut output =
        OutputWriter::with_writer(OutputFormat::Human, false, false, 1, Box::new(buffer.clone()));
    output.debug("details").unwrap();
    assert_eq!(buffer.contents(), "DEBUG: details\n");

    let (mut output, buffer) = writer(OutputFormat::Human, false);
    output.debug("details").unwrap();
    assert!(buffer.contents().is_empty());
}
