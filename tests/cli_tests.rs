// tests/cli_tests.rs
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const MESSAGES: &str = "\
timestamp,from_addr,to_addr,direction,content
2014-01-01 10:00:00,+27831,+27000,inbound,hi
2014-01-02 10:00:00,+27000,+27831,outbound,hello
2014-02-01 10:00:00,+27832,+27000,inbound,bye
";

fn msgpipe() -> Command {
    Command::cargo_bin("msgpipe").unwrap()
}

#[test]
fn test_filter_by_direction_from_stdin() {
    msgpipe()
        .args(["filter", "-d", "inbound"])
        .write_stdin(MESSAGES)
        .assert()
        .success()
        .stdout(
            "timestamp,from_addr,to_addr,direction,content\n\
             2014-01-01 10:00:00,+27831,+27000,inbound,hi\n\
             2014-02-01 10:00:00,+27832,+27000,inbound,bye\n",
        );
}

#[test]
fn test_filter_msisdn_in_both_directions() {
    msgpipe()
        .args(["filter", "-m", "+27831", "-d", "all"])
        .write_stdin(MESSAGES)
        .assert()
        .success()
        .stdout(
            "timestamp,from_addr,to_addr,direction,content\n\
             2014-01-01 10:00:00,+27831,+27000,inbound,hi\n\
             2014-01-02 10:00:00,+27000,+27831,outbound,hello\n",
        );
}

#[test]
fn test_filter_time_range_and_regex() {
    msgpipe()
        .args(["filter", "-s", "2014-01-01", "-e", "2014-02-01"])
        .args(["--regex", "content=HEL", "--ignore-case"])
        .write_stdin(MESSAGES)
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("hi\n").not());
}

#[test]
fn test_extract_with_date_format() {
    msgpipe()
        .args(["extract", "-f", "from_addr,content", "--date-format", "%Y-%m"])
        .write_stdin(MESSAGES)
        .assert()
        .success()
        .stdout(
            "timestamp,from_addr,content\n\
             2014-01,+27831,hi\n\
             2014-01,+27000,hello\n\
             2014-02,+27832,bye\n",
        );
}

#[test]
fn test_aggregate_after_extract() {
    let monthly = "\
timestamp,from_addr,content
2014-01,+27831,hi
2014-01,+27000,hello
2014-01,+27831,again
2014-02,+27832,bye
";
    msgpipe()
        .args(["aggregate", "-f", "from_addr"])
        .write_stdin(monthly)
        .assert()
        .success()
        .stdout("timestamp,from_addr\n2014-01,2\n2014-02,1\n");

    msgpipe()
        .args(["aggregate", "-k", "count", "-f", "from_addr"])
        .write_stdin(monthly)
        .assert()
        .success()
        .stdout("timestamp,from_addr\n2014-01,3\n2014-02,1\n");
}

#[test]
fn test_run_pipeline_file_with_input_and_output_files() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "filter:").unwrap();
    writeln!(config, "  chains:").unwrap();
    writeln!(config, "    - [{{direction: outbound}}]").unwrap();

    let mut input = NamedTempFile::new().unwrap();
    input.write_all(MESSAGES.as_bytes()).unwrap();

    let output = NamedTempFile::new().unwrap();

    msgpipe()
        .arg("run")
        .arg("-c")
        .arg(config.path())
        .arg("-i")
        .arg(input.path())
        .arg("-o")
        .arg(output.path())
        .assert()
        .success()
        .stdout("");

    let written = std::fs::read_to_string(output.path()).unwrap();
    assert_eq!(
        written,
        "timestamp,from_addr,to_addr,direction,content\n\
         2014-01-02 10:00:00,+27000,+27831,outbound,hello\n"
    );
}

#[test]
fn test_malformed_lines_are_skipped_with_exit_code_1() {
    let input = concat!(
        "{\"direction\":\"inbound\",\"from_addr\":\"+1\"}\n",
        "{not json\n",
        "{\"direction\":\"outbound\",\"from_addr\":\"+2\"}\n",
    );
    msgpipe()
        .args(["--input-format", "jsonl", "filter", "-d", "inbound"])
        .write_stdin(input)
        .assert()
        .code(1)
        .stdout("{\"direction\":\"inbound\",\"from_addr\":\"+1\"}\n")
        .stderr(predicate::str::contains("1 record(s) skipped"));
}

#[test]
fn test_fail_fast_stops_on_malformed_line() {
    msgpipe()
        .args(["--input-format", "jsonl", "--fail-fast", "filter", "-d", "inbound"])
        .write_stdin("{not json\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("line 1"));
}

#[test]
fn test_invalid_range_is_rejected_before_reading() {
    msgpipe()
        .args(["filter", "-s", "2013-01-01", "-e", "2000-01-01"])
        .write_stdin(MESSAGES)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("End timestamp must come after"));
}

#[test]
fn test_filter_without_conditions_fails() {
    msgpipe()
        .arg("filter")
        .write_stdin(MESSAGES)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no filter conditions"));
}
