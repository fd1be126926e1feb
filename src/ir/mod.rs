//! Intermediate representation: model types, id derivation, canonical ordering
//! and deterministic serialization.

pub mod canonical;
pub mod ids;
pub mod model;
pub mod serialize;

pub use model::{
    ClassifierKind, IrAttribute, IrClassifier, IrModel, IrOperation, IrPackage, IrParameter,
    IrRelation, RelationKind, SourceRef, TaggedValue, TypeRef, SCHEMA_VERSION,
};
