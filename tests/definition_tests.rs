// tests/definition_tests.rs
use std::io::{Cursor, Write};

use msgpipe::definition::PredicateDefinition;
use msgpipe::{ConfigError, ErrorStrategy, InputFormat, Pipeline, PipelineDefinition};
use tempfile::NamedTempFile;

const MESSAGES: &str = "\
timestamp,from_addr,to_addr,direction,in_reply_to
2014-01-01 10:00:00,+27831,+27000,inbound,
2014-01-01 10:05:00,+27000,+27831,outbound,abc
2014-01-01 10:06:00,+27000,+27999,outbound,
";

fn run(definition: &PipelineDefinition, input: &str) -> String {
    let pipeline = definition.build().unwrap();
    let mut output = Vec::new();
    pipeline.run(Cursor::new(input), &mut output).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_filter_definition_from_yaml() {
    println!("=== Testing YAML filter definition ===");

    let definition = PipelineDefinition::from_yaml(
        r#"
filter:
  chains:
    - [{direction: inbound}, {address: {field: from_addr, value: "+27831"}}]
    - [{direction: outbound}, {address: {field: to_addr, value: "+27831"}}]
"#,
    )
    .unwrap();

    assert_eq!(definition.input_format, InputFormat::Csv);
    let chains = &definition.filter.as_ref().unwrap().chains;
    assert_eq!(chains.len(), 2);
    assert_eq!(
        chains[0][0],
        PredicateDefinition::Direction("inbound".to_string())
    );

    let output = run(&definition, MESSAGES);
    assert_eq!(
        output,
        "timestamp,from_addr,to_addr,direction,in_reply_to\n\
         2014-01-01 10:00:00,+27831,+27000,inbound,\n\
         2014-01-01 10:05:00,+27000,+27831,outbound,abc\n"
    );
    println!("✓ Both chains applied");
}

#[test]
fn test_unit_and_nullable_predicates_parse() {
    let definition = PipelineDefinition::from_yaml(
        r#"
fail_fast: true
filter:
  chains:
    - [is_reply]
    - [is_not_reply, {session_event: null}, {time_range: {start: "2014-01-01 10:06:00"}}]
"#,
    )
    .unwrap();

    assert_eq!(definition.config().error_strategy, ErrorStrategy::FailFast);
    let chains = &definition.filter.as_ref().unwrap().chains;
    assert_eq!(chains[0], vec![PredicateDefinition::IsReply]);
    assert_eq!(chains[1][1], PredicateDefinition::SessionEvent(None));

    let output = run(&definition, MESSAGES);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with("outbound,abc"));
    assert!(lines[2].starts_with("2014-01-01 10:06:00"));
}

#[test]
fn test_extract_definition() {
    let definition = PipelineDefinition::from_yaml(
        r#"
extract:
  chains:
    - - fields: [from_addr, to_addr]
        date_format: "%H:%M"
      - fields: [from_addr]
"#,
    )
    .unwrap();

    let pipeline = definition.build().unwrap();
    assert!(matches!(pipeline, Pipeline::Extract(_)));

    let output = run(&definition, MESSAGES);
    assert_eq!(
        output,
        "timestamp,from_addr,to_addr,timestamp,from_addr\n\
         10:00,+27831,,10:00,+27831\n\
         10:05,+27000,,10:05,+27000\n\
         10:06,+27000,,10:06,+27000\n"
    );
}

#[test]
fn test_aggregate_definition_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "input_format: csv").unwrap();
    writeln!(file, "aggregate:").unwrap();
    writeln!(file, "  kind: count").unwrap();
    writeln!(file, "  fields: [direction]").unwrap();

    let definition = PipelineDefinition::from_file(file.path()).unwrap();
    let output = run(&definition, MESSAGES);
    assert_eq!(
        output,
        "timestamp,direction\n\
         2014-01-01 10:00:00,1\n\
         2014-01-01 10:05:00,1\n\
         2014-01-01 10:06:00,1\n"
    );
}

#[test]
fn test_invalid_parameters_fail_before_processing() {
    let definition = PipelineDefinition::from_yaml(
        r#"
filter:
  chains:
    - [{time_range: {start: "2013-01-01", end: "2000-01-01"}}]
"#,
    )
    .unwrap();
    assert!(matches!(definition.build(), Err(ConfigError::InvalidRange)));

    let definition = PipelineDefinition::from_yaml(
        r#"
filter:
  chains:
    - [{address: {field: bcc, value: "+1"}}]
"#,
    )
    .unwrap();
    assert!(matches!(
        definition.build(),
        Err(ConfigError::UnsupportedAddressField(_))
    ));
}

#[test]
fn test_definition_needs_exactly_one_stage() {
    let none = PipelineDefinition::from_yaml("input_format: jsonl\n").unwrap();
    assert!(matches!(none.build(), Err(ConfigError::InvalidDefinition(_))));

    let two = PipelineDefinition::from_yaml(
        r#"
filter:
  chains: [[is_reply]]
aggregate:
  kind: uniques
  fields: [from_addr]
"#,
    )
    .unwrap();
    assert!(matches!(two.build(), Err(ConfigError::InvalidDefinition(_))));

    let empty_chain = PipelineDefinition::from_yaml("filter:\n  chains: [[]]\n").unwrap();
    assert!(matches!(
        empty_chain.build(),
        Err(ConfigError::InvalidDefinition(_))
    ));
}

#[test]
fn test_unknown_keys_are_rejected() {
    let result = PipelineDefinition::from_yaml("filterz:\n  chains: []\n");
    assert!(matches!(result, Err(ConfigError::InvalidDefinition(_))));

    let result = PipelineDefinition::from_yaml("filter:\n  chains: [[{color: red}]]\n");
    assert!(matches!(result, Err(ConfigError::InvalidDefinition(_))));
}
