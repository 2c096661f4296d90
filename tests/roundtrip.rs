use std::fs;

use gbjson::formats::{
    convert_file, convert_file_with_options, is_same_path, read_input, write_output, FileFormat,
};
use gbjson::{from_json, parse_genbank, ConvertError, JsonStyle, Stage};
use tempfile::{tempdir, Builder};

const TWO_RECORDS: &str = "\
LOCUS       AB000001     120 bp    DNA     linear   PLN 01-JAN-2000
DEFINITION  Example record one.
KEYWORDS    .
REFERENCE   1  (bases 1 to 120)
  AUTHORS   Doe,J.
  JOURNAL   Unpublished
   PUBMED   12345
FEATURES             Location/Qualifiers
     source          1..120
                     /mol_type=\"genomic DNA\"
     misc_feature    10..20
                     /pseudo
ORIGIN
        1 acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt
       61 acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt
//
LOCUS       CONTIG01     500 bp    DNA     linear   CON 01-JAN-2000
DEFINITION  Example record two.
ORIGIN
CONTIG      join(AB000001.1:1..120,gap(380))
//
";

fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    fs::write(file.path(), content).expect("write temp file");
    file
}

#[test]
fn genbank_file_converts_to_json_and_back() {
    let input = write_temp(TWO_RECORDS, ".gb");

    let json = convert_file(input.path(), JsonStyle::Pretty).expect("convert GenBank");
    assert_eq!(json.from, FileFormat::GenBank);
    assert_eq!(
        from_json(&json.output).unwrap(),
        parse_genbank(TWO_RECORDS).unwrap()
    );

    let json_file = write_temp(&json.output, ".json");
    let back = convert_file(json_file.path(), JsonStyle::Pretty).expect("convert JSON");
    assert_eq!(back.from, FileFormat::Json);
    assert_eq!(back.output, TWO_RECORDS);
}

#[test]
fn records_keep_their_order() {
    let doc = parse_genbank(TWO_RECORDS).unwrap();
    assert_eq!(doc.record_count(), 2);
    assert!(doc.records[0].locus.starts_with("AB000001"));
    assert!(doc.records[1].locus.starts_with("CONTIG01"));
    assert!(doc.records[1].origin().is_some());
}

#[test]
fn content_detection_without_extension() {
    let input = write_temp(TWO_RECORDS, ".txt");
    let conversion = convert_file(input.path(), JsonStyle::Compact).unwrap();
    assert_eq!(conversion.from, FileFormat::GenBank);
    assert_eq!(conversion.output.lines().count(), 1);
}

#[test]
fn content_wins_over_a_wrong_extension() {
    let json = gbjson::gb_to_json(TWO_RECORDS, JsonStyle::Pretty).unwrap();
    let input = write_temp(&json, ".gb");
    let conversion = convert_file(input.path(), JsonStyle::Pretty).unwrap();
    assert_eq!(conversion.from, FileFormat::Json);
    assert_eq!(conversion.output, TWO_RECORDS);
}

#[test]
fn forced_format_is_not_second_guessed() {
    let input = write_temp(TWO_RECORDS, ".gb");
    let err = convert_file_with_options(input.path(), Some(FileFormat::Json), JsonStyle::Pretty)
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::MalformedInput {
            stage: Stage::Emit,
            ..
        }
    ));
}

#[test]
fn unknown_format_gives_a_hint() {
    let input = write_temp("just some notes\n", ".txt");
    let err = convert_file(input.path(), JsonStyle::Pretty).unwrap_err();
    assert!(matches!(err, ConvertError::UnknownFormat { .. }));
    assert!(err.to_string().contains("-f/--from"));
}

#[test]
fn unterminated_record_is_an_error() {
    let truncated = TWO_RECORDS.trim_end_matches("//\n");
    let input = write_temp(truncated, ".gb");
    let err = convert_file(input.path(), JsonStyle::Pretty).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Parse));
}

#[test]
fn invalid_utf8_is_read_lossily() {
    let file = Builder::new().suffix(".gb").tempfile().unwrap();
    fs::write(file.path(), b"LOCUS       X\xff 4 bp\n//\n").unwrap();
    let text = read_input(file.path()).unwrap();
    assert!(text.contains('\u{FFFD}'));
    assert_eq!(parse_genbank(&text).unwrap().record_count(), 1);
}

#[test]
fn write_output_creates_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.json");
    write_output(Some(&path), "[]\n").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "[]\n");
}

#[test]
fn write_output_reports_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("out.json");
    match write_output(Some(&path), "[]\n").unwrap_err() {
        ConvertError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn same_path_is_detected_through_aliases() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("record.gb");
    fs::write(&path, TWO_RECORDS).unwrap();

    let alias = dir.path().join(".").join("record.gb");
    assert!(is_same_path(&path, &alias));
    assert!(!is_same_path(&path, dir.path().join("record.json")));
}
