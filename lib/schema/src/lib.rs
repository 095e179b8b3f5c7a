//! # tantex-schema
//!
//! Engine-independent half of the tantex mapping layer:
//!
//! - [`FieldKind`] - the closed set of semantic field kinds
//! - [`TypeDescriptor`] - declarative, builder-constructed schema table
//!   for a mapped domain type (the explicit replacement for attribute
//!   reflection)
//! - [`CompiledSchema`] - immutable table of dotted field paths produced
//!   by [`CompiledSchema::compile`], with every fit check applied
//! - [`extract`] / [`extract_count`] - tree-walking value extraction with
//!   flat, deduplicated fan-out across multi-valued steps
//!
//! The tantivy binding lives in `tantex-core`; nothing in this crate talks
//! to the index engine.

pub mod compile;
pub mod descriptor;
pub mod error;
pub mod kind;
pub mod value;

pub use compile::{CompiledSchema, FieldPath, PathStep, SOURCE_FIELD};
pub use descriptor::{
    AttrSpec, AttrValue, DescriptorBuilder, DocIdSpec, LeafSpec, NestedRef, Shape, TypeDescriptor,
};
pub use error::{ExtractError, SchemaError};
pub use kind::FieldKind;
pub use value::{extract, extract_count, Extracted, ScalarValue};
