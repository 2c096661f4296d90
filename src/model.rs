//! Data model for GenBank documents.
//!
//! This module contains the tree that sits between the two text formats:
//! - `Document` and `Record`: ordered entries, each closed by `//`
//! - `Section`: keyword blocks, the feature table, and the origin
//! - `KeywordNode`: three-level keyword hierarchy with the depth fixed by type
//! - `Feature` and `Qualifier`: the annotated regions of a feature table
//!
//! Order is significant everywhere; every collection is a `Vec`.

use std::fmt;

/// Uninhabited child type for the deepest keyword level.
///
/// A `Vec<Leaf>` can only ever be empty, which makes a fourth nesting level
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {}

/// A keyword with its text and its children one level down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordNode<C> {
    /// Keyword name, e.g. `DEFINITION` or `ORGANISM`
    pub name: String,
    /// Keyword text; lines are separated by `\n`
    pub text: String,
    /// Nested keywords, in input order
    pub children: Vec<C>,
}

/// A top-level keyword (column 0).
pub type Keyword = KeywordNode<SubKeyword>;
/// A sub-keyword (column 2).
pub type SubKeyword = KeywordNode<SubSubKeyword>;
/// A sub-sub-keyword (column 3). Never has children.
pub type SubSubKeyword = KeywordNode<Leaf>;

impl<C> KeywordNode<C> {
    /// Creates a keyword without children.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// Adds a child keyword (builder style).
    pub fn with_child(mut self, child: C) -> Self {
        self.children.push(child);
        self
    }
}

/// Nesting level of a keyword line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Top,
    Sub,
    SubSub,
}

impl Depth {
    /// Number of spaces in front of the keyword name.
    pub fn indent(self) -> usize {
        match self {
            Depth::Top => 0,
            Depth::Sub => 2,
            Depth::SubSub => 3,
        }
    }

    /// The level below this one, if the hierarchy allows it.
    pub fn child(self) -> Option<Depth> {
        match self {
            Depth::Top => Some(Depth::Sub),
            Depth::Sub => Some(Depth::SubSub),
            Depth::SubSub => None,
        }
    }
}

/// A feature qualifier, `/key=value` or the flag form `/key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualifier {
    pub key: String,
    /// `None` for flag qualifiers such as `/pseudo`
    pub value: Option<String>,
}

impl Qualifier {
    /// Creates a `/key=value` qualifier.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a flag qualifier without a value.
    pub fn flag(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "/{}={}", self.key, value),
            None => write!(f, "/{}", self.key),
        }
    }
}

/// One entry of the feature table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Feature key, e.g. `gene`, `CDS`, `source`
    pub name: String,
    /// Location expression, e.g. `complement(join(1..10,20..30))`
    pub location: String,
    pub qualifiers: Vec<Qualifier>,
}

impl Feature {
    /// Creates a feature without qualifiers.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            qualifiers: Vec::new(),
        }
    }

    /// Adds a qualifier (builder style).
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Returns the value of the first qualifier with the given key.
    ///
    /// Flag qualifiers yield `Some(None)`.
    pub fn qualifier(&self, key: &str) -> Option<Option<&str>> {
        self.qualifiers
            .iter()
            .find(|q| q.key == key)
            .map(|q| q.value.as_deref())
    }
}

/// The feature table of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureTable {
    pub features: Vec<Feature>,
}

impl FeatureTable {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// What follows an `ORIGIN` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginBody {
    /// Residues, without coordinates or spacing
    Sequence(Option<String>),
    /// Free-text contig assembly instructions
    Contig(Option<String>),
}

/// The `ORIGIN` line and the block it introduces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Text after `ORIGIN` on the same line, if any
    pub text: Option<String>,
    pub body: OriginBody,
}

impl Origin {
    /// Creates an origin holding a sequence.
    pub fn sequence(text: Option<String>, sequence: Option<String>) -> Self {
        Self {
            text,
            body: OriginBody::Sequence(sequence),
        }
    }

    /// Creates an origin holding contig instructions.
    pub fn contig(text: Option<String>, contig: Option<String>) -> Self {
        Self {
            text,
            body: OriginBody::Contig(contig),
        }
    }
}

/// A section of a record, following the `LOCUS` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Keyword(Keyword),
    Features(FeatureTable),
    Origin(Origin),
}

/// One GenBank entry, from `LOCUS` to `//`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Everything after column 12 of the `LOCUS` line
    pub locus: String,
    pub sections: Vec<Section>,
}

impl Record {
    /// Creates a record with no sections.
    pub fn new(locus: impl Into<String>) -> Self {
        Self {
            locus: locus.into(),
            sections: Vec::new(),
        }
    }

    /// Returns the first top-level keyword with the given name.
    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.sections.iter().find_map(|section| match section {
            Section::Keyword(keyword) if keyword.name == name => Some(keyword),
            _ => None,
        })
    }

    /// Returns the record's first feature table.
    pub fn features(&self) -> Option<&FeatureTable> {
        self.sections.iter().find_map(|section| match section {
            Section::Features(table) => Some(table),
            _ => None,
        })
    }

    /// Returns the record's first origin block.
    pub fn origin(&self) -> Option<&Origin> {
        self.sections.iter().find_map(|section| match section {
            Section::Origin(origin) => Some(origin),
            _ => None,
        })
    }
}

/// An ordered collection of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub records: Vec<Record>,
}

impl Document {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Returns the number of records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the document holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Gets a record by index.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }
}
