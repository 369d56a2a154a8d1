//! Unit tests for verdict rendering and exit codes

use xsdvalidate::output::{EXIT_INVALID, EXIT_SUCCESS, VALID_MESSAGE, exit_code};
use xsdvalidate::{ErrorEntry, ErrorSet, Output, OutputFormat, ValidationOutcome};

fn invalid_outcome() -> ValidationOutcome {
    ValidationOutcome::Invalid(
        ErrorSet::new(vec![
            ErrorEntry::normalize(5, "Element 'name1': This element is not expected. Expected is ( name )."),
            ErrorEntry::normalize(0, "Element 'shipto': Missing child element(s)."),
        ])
        .unwrap(),
    )
}

#[test]
fn test_human_output_for_valid_document() {
    let output = Output::new(OutputFormat::Human, ";");
    assert_eq!(output.format_outcome(&ValidationOutcome::Valid), VALID_MESSAGE);
}

#[test]
fn test_human_output_custom_delimiter() {
    let output = Output::new(OutputFormat::Human, " | ");
    assert_eq!(
        output.format_outcome(&invalid_outcome()),
        "Error Line 5: Element name1: This element is not expected. Expected is ( name ). | \
         Error Line 0: Element shipto: Missing child element(s)."
    );
}

#[test]
fn test_json_output_lists_entries() {
    let output = Output::new(OutputFormat::Json, ";");
    let rendered = output.format_outcome(&invalid_outcome());
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

    assert_eq!(value["valid"], false);
    assert_eq!(value["errors"][0]["line"], 5);
    assert_eq!(value["errors"][1]["line"], 0);
}

#[test]
fn test_json_failure() {
    let output = Output::new(OutputFormat::Json, ";");
    let value: serde_json::Value =
        serde_json::from_str(&output.format_failure("failed to parse schema missing.xsd")).unwrap();

    assert_eq!(value["valid"], false);
    assert_eq!(value["failure"], "failed to parse schema missing.xsd");
}

#[test]
fn test_outcome_serialization() {
    let value = serde_json::to_value(invalid_outcome()).unwrap();
    assert_eq!(value["status"], "invalid");
    assert_eq!(value["errors"].as_array().unwrap().len(), 2);

    let value = serde_json::to_value(ValidationOutcome::Valid).unwrap();
    assert_eq!(value["status"], "valid");
}

#[test]
fn test_exit_codes() {
    assert_eq!(exit_code(&ValidationOutcome::Valid), EXIT_SUCCESS);
    assert_eq!(exit_code(&invalid_outcome()), EXIT_INVALID);
}
