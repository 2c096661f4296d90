//! JSON encoding of GenBank documents.
//!
//! ## Layout
//!
//! A document is an array of records; a record is an array of single-key
//! objects, in input order:
//!
//! ```text
//! [
//!     [
//!         { "LOCUS": ["SCU49845 5028 bp DNA", []] },
//!         { "SOURCE": ["baker's yeast", [ { "ORGANISM": ["Saccharomyces", []] } ]] },
//!         { "FEATURES": [
//!             { "gene": [ { "Location": "1..50" }, { "gene": "\"abc\"" }, { "pseudo": null } ] }
//!         ] },
//!         { "ORIGIN": [null, []] },
//!         { "SEQUENCE": ["gatcctcc", []] }
//!     ]
//! ]
//! ```
//!
//! `LOCUS`, `ORIGIN`, `SEQUENCE` and `CONTIG` carry an empty child array so
//! that every entry has the same `[value, children]` shape as a keyword. The
//! decoder also accepts these four without the wrapper (`{"LOCUS": "..."}`).

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConvertError, ConvertResult, Stage};
use crate::model::{
    Document, Feature, FeatureTable, KeywordNode, Leaf, Origin, OriginBody, Qualifier, Record,
    Section, SubKeyword,
};

const LOCUS_KEY: &str = "LOCUS";
const FEATURES_KEY: &str = "FEATURES";
const ORIGIN_KEY: &str = "ORIGIN";
const SEQUENCE_KEY: &str = "SEQUENCE";
const CONTIG_KEY: &str = "CONTIG";
const LOCATION_KEY: &str = "Location";

/// Output style for JSON text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonStyle {
    /// Indented with four spaces
    #[default]
    Pretty,
    /// Single line
    Compact,
}

/// Serializes a document to JSON text.
pub fn to_json(doc: &Document, style: JsonStyle) -> ConvertResult<String> {
    let value = to_value(doc);
    let mut buf = Vec::new();

    let written = match style {
        JsonStyle::Pretty => {
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut ser)
        }
        JsonStyle::Compact => serde_json::to_writer(&mut buf, &value),
    };
    written.map_err(|e| ConvertError::validation(Stage::Parse, "", e.to_string()))?;
    buf.push(b'\n');

    String::from_utf8(buf).map_err(|e| ConvertError::validation(Stage::Parse, "", e.to_string()))
}

/// Parses JSON text into a document.
///
/// Invalid JSON is reported as malformed input; valid JSON that does not
/// describe GenBank records is reported as a validation error.
pub fn from_json(text: &str) -> ConvertResult<Document> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        ConvertError::malformed(Stage::Emit, Some(e.line()), format!("invalid JSON: {}", e))
    })?;
    let doc = from_value(&value)?;
    debug!(records = doc.record_count(), "Decoded JSON document");
    Ok(doc)
}

/// Builds the JSON value for a document.
pub fn to_value(doc: &Document) -> Value {
    Value::Array(doc.records.iter().map(encode_record).collect())
}

/// Reads a document from a JSON value.
pub fn from_value(value: &Value) -> ConvertResult<Document> {
    let records = as_array(value, "")?
        .iter()
        .enumerate()
        .map(|(index, record)| decode_record(record, &format!("/{}", index)))
        .collect::<ConvertResult<Vec<_>>>()?;
    Ok(Document::new(records))
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        from_value(&value).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn entry(key: &str, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn text_or_null(text: Option<&str>) -> Value {
    text.map_or(Value::Null, |t| Value::String(t.to_string()))
}

fn leaf(text: Option<&str>) -> Value {
    Value::Array(vec![text_or_null(text), Value::Array(Vec::new())])
}

fn encode_record(record: &Record) -> Value {
    let mut entries = Vec::with_capacity(record.sections.len() + 1);
    entries.push(entry(LOCUS_KEY, leaf(Some(&record.locus))));

    for section in &record.sections {
        match section {
            Section::Keyword(keyword) => entries.push(keyword.encode()),
            Section::Features(table) => entries.push(encode_features(table)),
            Section::Origin(origin) => {
                entries.push(entry(ORIGIN_KEY, leaf(origin.text.as_deref())));
                entries.push(match &origin.body {
                    OriginBody::Sequence(sequence) => entry(SEQUENCE_KEY, leaf(sequence.as_deref())),
                    OriginBody::Contig(contig) => entry(CONTIG_KEY, leaf(contig.as_deref())),
                });
            }
        }
    }

    Value::Array(entries)
}

fn encode_features(table: &FeatureTable) -> Value {
    let features = table
        .features
        .iter()
        .map(|feature| {
            let mut items = Vec::with_capacity(feature.qualifiers.len() + 1);
            items.push(entry(LOCATION_KEY, Value::String(feature.location.clone())));
            items.extend(
                feature
                    .qualifiers
                    .iter()
                    .map(|q| entry(&q.key, text_or_null(q.value.as_deref()))),
            );
            entry(&feature.name, Value::Array(items))
        })
        .collect();
    entry(FEATURES_KEY, Value::Array(features))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn invalid(path: &str, message: impl Into<String>) -> ConvertError {
    ConvertError::validation(Stage::Emit, path, message)
}

fn as_array<'v>(value: &'v Value, path: &str) -> ConvertResult<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| invalid(path, format!("expected an array, found {}", kind(value))))
}

fn as_text<'v>(value: &'v Value, path: &str) -> ConvertResult<&'v str> {
    value
        .as_str()
        .ok_or_else(|| invalid(path, format!("expected a string, found {}", kind(value))))
}

fn as_text_or_null<'v>(value: &'v Value, path: &str) -> ConvertResult<Option<&'v str>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        other => Err(invalid(
            path,
            format!("expected a string or null, found {}", kind(other)),
        )),
    }
}

/// Splits a single-key object into its key and value.
fn single_entry<'v>(value: &'v Value, path: &str) -> ConvertResult<(&'v str, &'v Value)> {
    let map = value
        .as_object()
        .ok_or_else(|| invalid(path, format!("expected an object, found {}", kind(value))))?;
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((key, value)), None) => Ok((key.as_str(), value)),
        _ => Err(invalid(
            path,
            format!("expected an object with exactly one key, found {}", map.len()),
        )),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads a `[value, []]` leaf entry, or the bare value.
fn decode_leaf<'v>(value: &'v Value, path: &str) -> ConvertResult<Option<&'v str>> {
    match value {
        Value::Array(items) => match items.as_slice() {
            [text, Value::Array(children)] if children.is_empty() => {
                as_text_or_null(text, &format!("{}/0", path))
            }
            [_, Value::Array(_)] => Err(invalid(
                &format!("{}/1", path),
                "this section cannot have children",
            )),
            _ => Err(invalid(path, "expected [value, []]")),
        },
        other => as_text_or_null(other, path),
    }
}

fn decode_record(value: &Value, path: &str) -> ConvertResult<Record> {
    let entries = as_array(value, path)?;
    let mut entries = entries.iter().enumerate();

    let locus = match entries.next() {
        Some((_, first)) => {
            let entry_path = format!("{}/0", path);
            let (key, value) = single_entry(first, &entry_path)?;
            if key != LOCUS_KEY {
                return Err(invalid(
                    &entry_path,
                    format!("record must start with LOCUS, found {}", key),
                ));
            }
            let locus_path = format!("{}/{}", entry_path, LOCUS_KEY);
            decode_leaf(value, &locus_path)?
                .ok_or_else(|| invalid(&locus_path, "LOCUS must have text"))?
                .to_string()
        }
        None => return Err(invalid(path, "record is empty, expected a LOCUS entry")),
    };

    let mut record = Record::new(locus);
    while let Some((index, item)) = entries.next() {
        let entry_path = format!("{}/{}", path, index);
        let (key, value) = single_entry(item, &entry_path)?;
        let value_path = format!("{}/{}", entry_path, key);

        let section = match key {
            FEATURES_KEY => Section::Features(decode_features(value, &value_path)?),
            ORIGIN_KEY => {
                let text = decode_leaf(value, &value_path)?.map(str::to_string);
                let (body_index, body_item) = entries.next().ok_or_else(|| {
                    invalid(&entry_path, "ORIGIN must be followed by SEQUENCE or CONTIG")
                })?;
                let body_path = format!("{}/{}", path, body_index);
                let (body_key, body_value) = single_entry(body_item, &body_path)?;
                let body_value_path = format!("{}/{}", body_path, body_key);
                let body_text = decode_leaf(body_value, &body_value_path)?.map(str::to_string);
                let body = match body_key {
                    SEQUENCE_KEY => OriginBody::Sequence(body_text),
                    CONTIG_KEY => OriginBody::Contig(body_text),
                    other => {
                        return Err(invalid(
                            &body_path,
                            format!("ORIGIN must be followed by SEQUENCE or CONTIG, found {}", other),
                        ))
                    }
                };
                Section::Origin(Origin { text, body })
            }
            _ => Section::Keyword(KeywordNode::<SubKeyword>::decode(key, value, &value_path)?),
        };
        record.sections.push(section);
    }

    Ok(record)
}

fn decode_features(value: &Value, path: &str) -> ConvertResult<FeatureTable> {
    let features = as_array(value, path)?
        .iter()
        .enumerate()
        .map(|(index, item)| decode_feature(item, &format!("{}/{}", path, index)))
        .collect::<ConvertResult<Vec<_>>>()?;
    Ok(FeatureTable::new(features))
}

fn decode_feature(value: &Value, path: &str) -> ConvertResult<Feature> {
    let (name, value) = single_entry(value, path)?;
    let items_path = format!("{}/{}", path, name);
    let items = as_array(value, &items_path)?;

    let (first, rest) = items
        .split_first()
        .ok_or_else(|| invalid(&items_path, "feature has no Location"))?;
    let location_path = format!("{}/0", items_path);
    let (key, location) = single_entry(first, &location_path)?;
    if key != LOCATION_KEY {
        return Err(invalid(
            &location_path,
            format!("feature must start with Location, found {}", key),
        ));
    }
    let location = as_text(location, &format!("{}/{}", location_path, LOCATION_KEY))?;

    let qualifiers = rest
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let item_path = format!("{}/{}", items_path, index + 1);
            let (key, value) = single_entry(item, &item_path)?;
            let value = as_text_or_null(value, &format!("{}/{}", item_path, key))?;
            Ok(Qualifier {
                key: key.to_string(),
                value: value.map(str::to_string),
            })
        })
        .collect::<ConvertResult<Vec<_>>>()?;

    Ok(Feature {
        name: name.to_string(),
        location: location.to_string(),
        qualifiers,
    })
}

/// Keyword levels the JSON codec can read and write.
trait JsonLevel: Sized {
    fn encode(&self) -> Value;
    fn decode(key: &str, value: &Value, path: &str) -> ConvertResult<Self>;
}

impl JsonLevel for Leaf {
    fn encode(&self) -> Value {
        match *self {}
    }

    fn decode(_key: &str, _value: &Value, path: &str) -> ConvertResult<Self> {
        Err(invalid(path, "keywords nest at most three levels deep"))
    }
}

impl<C: JsonLevel> JsonLevel for KeywordNode<C> {
    fn encode(&self) -> Value {
        let children = self.children.iter().map(JsonLevel::encode).collect();
        entry(
            &self.name,
            Value::Array(vec![Value::String(self.text.clone()), Value::Array(children)]),
        )
    }

    fn decode(key: &str, value: &Value, path: &str) -> ConvertResult<Self> {
        let (text, children) = match value.as_array().map(Vec::as_slice) {
            Some([text, Value::Array(children)]) => (text, children),
            _ => return Err(invalid(path, "expected [text, [children]]")),
        };
        let text = as_text(text, &format!("{}/0", path))?;

        let children = children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                let child_path = format!("{}/1/{}", path, index);
                let (child_key, child_value) = single_entry(child, &child_path)?;
                C::decode(child_key, child_value, &format!("{}/{}", child_path, child_key))
            })
            .collect::<ConvertResult<Vec<_>>>()?;

        Ok(KeywordNode {
            name: key.to_string(),
            text: text.to_string(),
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Keyword, SubSubKeyword};
    use serde_json::json;

    fn sample_document() -> Document {
        let mut record = Record::new("SCU49845     5028 bp    DNA");
        record.sections.push(Section::Keyword(
            Keyword::new("SOURCE", "baker's yeast").with_child(
                SubKeyword::new("ORGANISM", "Saccharomyces cerevisiae\nEukaryota; Fungi.")
                    .with_child(SubSubKeyword::new("DEEP", "x")),
            ),
        ));
        record.sections.push(Section::Features(FeatureTable::new(vec![Feature::new(
            "gene", "1..50",
        )
        .with_qualifier(Qualifier::new("gene", "\"abc\""))
        .with_qualifier(Qualifier::flag("pseudo"))])));
        record
            .sections
            .push(Section::Origin(Origin::sequence(None, Some("gatcctcc".into()))));
        Document::new(vec![record])
    }

    #[test]
    fn test_encode_layout() {
        let value = to_value(&sample_document());
        assert_eq!(
            value,
            json!([[
                { "LOCUS": ["SCU49845     5028 bp    DNA", []] },
                { "SOURCE": ["baker's yeast", [
                    { "ORGANISM": ["Saccharomyces cerevisiae\nEukaryota; Fungi.", [
                        { "DEEP": ["x", []] }
                    ]] }
                ]] },
                { "FEATURES": [
                    { "gene": [ { "Location": "1..50" }, { "gene": "\"abc\"" }, { "pseudo": null } ] }
                ] },
                { "ORIGIN": [null, []] },
                { "SEQUENCE": ["gatcctcc", []] }
            ]])
        );
    }

    #[test]
    fn test_json_text_round_trip() {
        let doc = sample_document();
        for style in [JsonStyle::Pretty, JsonStyle::Compact] {
            let text = to_json(&doc, style).unwrap();
            assert_eq!(from_json(&text).unwrap(), doc);
        }
    }

    #[test]
    fn test_pretty_uses_four_spaces() {
        let text = to_json(&sample_document(), JsonStyle::Pretty).unwrap();
        assert!(text.starts_with("[\n    [\n        {\n"));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn test_compact_is_one_line() {
        let text = to_json(&sample_document(), JsonStyle::Compact).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_decode_legacy_leaves() {
        let value = json!([[
            { "LOCUS": "X 4 bp" },
            { "ORIGIN": null },
            { "CONTIG": "join(A:1..4)" }
        ]]);
        let doc = from_value(&value).unwrap();
        let record = &doc.records[0];
        assert_eq!(record.locus, "X 4 bp");
        assert_eq!(
            record.sections,
            vec![Section::Origin(Origin::contig(None, Some("join(A:1..4)".into())))]
        );
    }

    #[test]
    fn test_keyword_named_like_a_leaf() {
        // Top-level CONTIG lines parse as keywords and must come back as such
        let value = json!([[
            { "LOCUS": ["X", []] },
            { "CONTIG": ["join(A:1..4)", []] }
        ]]);
        let doc = from_value(&value).unwrap();
        assert_eq!(doc.records[0].keyword("CONTIG").unwrap().text, "join(A:1..4)");
    }

    #[test]
    fn test_later_locus_is_a_keyword() {
        // Column 12 is blank, so this line is a keyword and not a new record
        let text = "LOCUS       A 0 bp\nLOCUS        not-a-locus-line\nORIGIN\n//\n";
        let doc = crate::formats::genbank::parse_genbank(text).unwrap();
        assert_eq!(doc.records[0].keyword("LOCUS").unwrap().text, " not-a-locus-line");

        let json = to_json(&doc, JsonStyle::Pretty).unwrap();
        assert_eq!(from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_later_bare_locus_is_rejected() {
        let value = json!([[ { "LOCUS": ["X", []] }, { "LOCUS": "Y" } ]]);
        match from_value(&value).unwrap_err() {
            ConvertError::Validation { path, .. } => assert_eq!(path, "/0/1/LOCUS"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = from_json("[[{\"LOCUS\": [\"X\", []]}]").unwrap_err();
        assert!(matches!(
            err,
            ConvertError::MalformedInput {
                stage: Stage::Emit,
                ..
            }
        ));
    }

    #[test]
    fn test_record_without_locus() {
        let err = from_value(&json!([[{ "DEFINITION": ["x", []] }]])).unwrap_err();
        match err {
            ConvertError::Validation { path, message, .. } => {
                assert_eq!(path, "/0/0");
                assert!(message.contains("LOCUS"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_null_locus_is_rejected() {
        assert!(from_value(&json!([[{ "LOCUS": [null, []] }]])).is_err());
    }

    #[test]
    fn test_multi_key_entry_is_rejected() {
        let value = json!([[{ "LOCUS": ["X", []], "DEFINITION": ["y", []] }]]);
        assert!(matches!(
            from_value(&value),
            Err(ConvertError::Validation { .. })
        ));
    }

    #[test]
    fn test_feature_without_location() {
        let value = json!([[
            { "LOCUS": ["X", []] },
            { "FEATURES": [ { "gene": [ { "gene": "\"abc\"" } ] } ] }
        ]]);
        let err = from_value(&value).unwrap_err();
        match err {
            ConvertError::Validation { path, .. } => assert_eq!(path, "/0/1/FEATURES/0/gene/0"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_origin_needs_body() {
        let value = json!([[ { "LOCUS": ["X", []] }, { "ORIGIN": [null, []] } ]]);
        assert!(from_value(&value).is_err());

        let value = json!([[
            { "LOCUS": ["X", []] },
            { "ORIGIN": [null, []] },
            { "DEFINITION": ["x", []] }
        ]]);
        assert!(from_value(&value).is_err());
    }

    #[test]
    fn test_sequence_without_origin() {
        // Outside an origin block SEQUENCE is an ordinary keyword
        let value = json!([[ { "LOCUS": ["X", []] }, { "SEQUENCE": ["acgt", []] } ]]);
        let doc = from_value(&value).unwrap();
        assert_eq!(doc.records[0].keyword("SEQUENCE").unwrap().text, "acgt");

        // which leaves no room for a bare or null value
        let value = json!([[ { "LOCUS": ["X", []] }, { "SEQUENCE": "acgt" } ]]);
        assert!(from_value(&value).is_err());
    }

    #[test]
    fn test_depth_cap() {
        let value = json!([[
            { "LOCUS": ["X", []] },
            { "A": ["a", [ { "B": ["b", [ { "C": ["c", [ { "D": ["d", []] } ]] } ]] } ]] }
        ]]);
        let err = from_value(&value).unwrap_err();
        assert!(err.to_string().contains("three levels"));
    }

    #[test]
    fn test_leaf_children_are_rejected() {
        let value = json!([[ { "LOCUS": ["X", [ { "A": ["a", []] } ]] } ]]);
        assert!(from_value(&value).is_err());
    }

    #[test]
    fn test_serde_integration() {
        let doc = sample_document();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, to_value(&doc));
        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }
}
