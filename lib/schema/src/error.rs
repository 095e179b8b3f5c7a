use thiserror::Error;

use crate::kind::FieldKind;

/// Errors raised while compiling a [`TypeDescriptor`](crate::TypeDescriptor).
///
/// Compilation errors are fatal: a descriptor that fails to compile is a
/// mapping bug, not a runtime condition, so none of these are recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{type_name}: missing doc id declaration")]
    MissingDocId { type_name: String },

    #[error("{type_name}: attribute name {attr:?} is not usable as a field path segment")]
    BadAttrName { type_name: String, attr: String },

    #[error("{type_name}: {kind} is only valid on a collection attribute: {attr}")]
    NotCollection {
        type_name: String,
        attr: String,
        kind: FieldKind,
    },

    #[error("{type_name}: {kind} field {attr} cannot be a sort key")]
    NotSortable {
        type_name: String,
        attr: String,
        kind: FieldKind,
    },

    #[error("{type_name}: tokenizer override on non-text field {attr}")]
    TokenizerNotAllowed { type_name: String, attr: String },

    #[error("{type_name}: duplicate field path {path}")]
    DuplicatePath { type_name: String, path: String },

    #[error("cyclic nested type graph at {type_name}")]
    CyclicType { type_name: String },
}

/// Errors raised while extracting values from a live instance.
///
/// A shape error means the serialized instance disagrees with the declared
/// attribute shape, which is a descriptor bug on the mapped type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("field path {path}: expected {expected} at step {attr}")]
    Shape {
        path: String,
        attr: String,
        expected: &'static str,
    },
}
