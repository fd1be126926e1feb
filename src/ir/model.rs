//! IR graph types
//!
//! All data structures for the language-agnostic intermediate representation:
//! packages, classifiers, relations, and their member records. These are the
//! types the downstream diagram generator consumes, so field naming follows
//! the published JSON surface (camelCase keys, SCREAMING kind tags).

use serde::{Deserialize, Serialize};

/// Schema version stamped into every emitted model
pub const SCHEMA_VERSION: &str = "2.1.0";

/// The assembled IR model for one extraction run
///
/// Invariants (enforced by construction, checked in tests):
/// - every relation's `source_id`/`target_id` references an existing classifier
/// - every classifier's `package_id` references an existing package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IrModel {
    pub schema_version: String,
    pub packages: Vec<IrPackage>,
    pub classifiers: Vec<IrClassifier>,
    pub relations: Vec<IrRelation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<TaggedValue>,
}

impl IrModel {
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            packages: Vec::new(),
            classifiers: Vec::new(),
            relations: Vec::new(),
            tagged_values: Vec::new(),
        }
    }
}

impl Default for IrModel {
    fn default() -> Self {
        Self::new()
    }
}

/// A package mirroring one source directory
///
/// Packages form a tree; the project root maps to a package with an empty
/// relative path and no parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IrPackage {
    /// Content-hash id derived from the directory path
    pub id: String,
    pub name: String,
    /// Slash-joined ancestry relative to the project root ("" for the root)
    pub qualified_name: String,
    /// Immediate ancestor directory's package id (absent for root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// A named structural entity in the IR (class, interface, component, module)
///
/// Created exactly once per distinct declaration during the declaration pass
/// (or once per file for synthetic module classifiers), mutated by the member
/// pass and framework extractors, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IrClassifier {
    /// Content-hash id derived from qualified name + kind discriminator
    pub id: String,
    pub name: String,
    pub qualified_name: String,
    pub kind: ClassifierKind,
    /// Owning package (the file's containing directory)
    pub package_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stereotypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<TaggedValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<IrAttribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<IrOperation>,
}

/// Classifier kinds - closed tagged classification over declaration shapes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassifierKind {
    Class,
    Interface,
    Component,
    Module,
    Injectable,
    NgModule,
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierKind::Class => write!(f, "CLASS"),
            ClassifierKind::Interface => write!(f, "INTERFACE"),
            ClassifierKind::Component => write!(f, "COMPONENT"),
            ClassifierKind::Module => write!(f, "MODULE"),
            ClassifierKind::Injectable => write!(f, "INJECTABLE"),
            ClassifierKind::NgModule => write!(f, "NG_MODULE"),
        }
    }
}

/// A field/property on a classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IrAttribute {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stereotypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<TaggedValue>,
}

/// A method/function member on a classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IrOperation {
    pub name: String,
    pub return_type: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<IrParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stereotypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<TaggedValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IrParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// A type-reference descriptor
///
/// Either the `UNKNOWN` marker or a named reference, optionally resolved to a
/// declared classifier. Full semantic type inference is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier_id: Option<String>,
}

impl TypeRef {
    pub const UNKNOWN: &'static str = "UNKNOWN";

    /// The marker used whenever a type cannot be resolved to a declared classifier
    pub fn unknown() -> Self {
        Self {
            name: Self::UNKNOWN.to_string(),
            classifier_id: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classifier_id: None,
        }
    }

    pub fn resolved(name: impl Into<String>, classifier_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classifier_id: Some(classifier_id.into()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == Self::UNKNOWN
    }
}

/// A directed, kinded edge between two classifiers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IrRelation {
    /// Content-hash id over kind + endpoints + discriminator; dedups repeated edges
    pub id: String,
    pub kind: RelationKind,
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<TaggedValue>,
    /// File + 1-based line of the triggering syntax
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
}

/// Relation kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Inheritance,
    Implementation,
    Association,
    Dependency,
    Render,
    /// NgModule `declarations` wiring
    Declares,
    /// Component/NgModule `providers` wiring
    Provides,
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationKind::Inheritance => write!(f, "INHERITANCE"),
            RelationKind::Implementation => write!(f, "IMPLEMENTATION"),
            RelationKind::Association => write!(f, "ASSOCIATION"),
            RelationKind::Dependency => write!(f, "DEPENDENCY"),
            RelationKind::Render => write!(f, "RENDER"),
            RelationKind::Declares => write!(f, "DECLARES"),
            RelationKind::Provides => write!(f, "PROVIDES"),
        }
    }
}

/// Position of the syntax that triggered a relation or finding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub file: String,
    /// 1-based line number
    pub line: u32,
}

/// Free-form key/value annotation carried by model elements
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaggedValue {
    pub key: String,
    pub value: String,
}

impl TaggedValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
