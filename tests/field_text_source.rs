use datafile::DataFileError;
use datafile::field_text::FIELD_TEXT_HEADINGS;
use datafile::source::field_text::field_text_source;
use datafile::source::{DataFileFormat, OpenOptions, RowSourceOptions, load_from_path, open_from_path};

#[test]
fn each_line_becomes_a_field_definition_row() {
    let mut source = field_text_source("tests/fixtures/questionnaire.ftx", RowSourceOptions::default()).unwrap();
    source.load().unwrap();

    assert_eq!(source.headings().unwrap(), FIELD_TEXT_HEADINGS);
    assert_eq!(source.row_count(), 5);

    let rows = source.data_items();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].get("Title"), Some("Smoking history"));
    assert_eq!(rows[0].get("Level"), Some("1"));
    assert_eq!(rows[1].get("Field"), Some("smoker"));
    assert_eq!(rows[1].get("Required"), Some("1"));
    assert_eq!(rows[2].get("Settings"), Some("min=0,max=100"));
    assert_eq!(rows[3].get("Level"), Some("DEL"));
    assert_eq!(rows[3].get("Field"), Some("pipe"));
}

#[test]
fn field_text_is_opened_by_extension() {
    let rows = load_from_path("tests/fixtures/questionnaire.ftx", &OpenOptions::default()).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2].get("Type"), Some("number"));
}

#[test]
fn field_text_can_be_forced_for_other_extensions() {
    let opts = OpenOptions {
        format: Some(DataFileFormat::FieldText),
        ..Default::default()
    };
    // a csv read as field text: every line is a title
    let rows = load_from_path("tests/fixtures/mrc_grade.csv", &opts).unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0].get("Title"), Some("grade,description"));
}

#[test]
fn limit_applies_to_lines() {
    let mut opts = OpenOptions::default();
    opts.row_source.limit = Some(2);
    let rows = load_from_path("tests/fixtures/questionnaire.ftx", &opts).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn an_overlong_field_stops_the_read() {
    let mut source = open_from_path("tests/fixtures/overlong.ftx", &OpenOptions::default()).unwrap();
    assert_eq!(source.next_row().unwrap().unwrap().get("Field"), Some("weight"));
    let err = source.next_row().unwrap_err();
    assert!(matches!(err, DataFileError::FieldTooLong { .. }));
    source.close().unwrap();
}

#[test]
fn load_closes_the_source_after_a_parse_error() {
    let mut source = field_text_source("tests/fixtures/overlong.ftx", RowSourceOptions::default()).unwrap();
    let err = source.load().unwrap_err();
    assert!(matches!(err, DataFileError::FieldTooLong { .. }));
    assert!(!source.is_opened());
    assert_eq!(source.data_items().len(), 1);
}

#[test]
fn missing_field_text_file() {
    let err = load_from_path("tests/fixtures/nothing-here.ftx", &OpenOptions::default()).unwrap_err();
    assert!(matches!(err, DataFileError::SourceNotFound { .. }));
}

#[test]
fn caller_options_apply_but_there_is_never_a_header_row() {
    let options = RowSourceOptions {
        has_header_row: true,
        limit: Some(1),
        ..Default::default()
    };
    let mut source = field_text_source("tests/fixtures/questionnaire.ftx", options).unwrap();
    assert!(!source.has_header_row());
    assert!(source.ignore_empty_headings());
    source.load().unwrap();
    assert_eq!(source.data_items().len(), 1);
    assert_eq!(source.data_items()[0].get("Title"), Some("Smoking history"));
}
