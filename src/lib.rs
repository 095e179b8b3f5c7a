//! # tantex
//!
//! Schema-driven object mapping for a [tantivy](https://docs.rs/tantivy)
//! inverted index: describe how a domain type maps to index fields once,
//! then index object graphs and get typed objects back from queries.
//!
//! A type declares its mapping with a [`TypeDescriptor`]: which attribute
//! is the document id, which attributes become searchable fields, and how
//! each terminal value is encoded. Nested types flatten into dotted field
//! paths (`review.author`), collections fan out into multi-valued fields,
//! and a `Size` field indexes a collection's element count.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::BTreeSet;
//! use serde::{Deserialize, Serialize};
//! use tantex::prelude::*;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Product {
//!     id: String,
//!     name: String,
//!     stock: i32,
//!     tags: BTreeSet<String>,
//! }
//!
//! impl Indexed for Product {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder("shop.Product")
//!             .doc_id("id")
//!             .field("name", Shape::Scalar, LeafSpec::new(FieldKind::Text))
//!             .field("stock", Shape::Scalar, LeafSpec::new(FieldKind::Int32).sorted())
//!             .field("tags", Shape::Set, LeafSpec::new(FieldKind::Keyword))
//!             .build()
//!     }
//! }
//!
//! # fn main() -> tantex::Result<()> {
//! let registry = SchemaRegistry::new();
//! let index: DocIndex<Product> = DocIndex::open(&registry, IndexConfig::in_ram())?;
//!
//! index.index_one(&Product {
//!     id: "42".into(),
//!     name: "blue kettle".into(),
//!     stock: 7,
//!     tags: ["kitchen".to_string()].into(),
//! })?;
//!
//! let query = index.exact("tags", "kitchen")?;
//! let page = index.search(query.as_ref(), Page::of(10))?;
//! assert_eq!(page.hits[0].entity.id, "42");
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - [`tantex-schema`](https://docs.rs/tantex-schema) - Type descriptors, schema compilation, value extraction
//! - [`tantex-core`](https://docs.rs/tantex-core) - Engine mapping, document building, queries, the typed index

// Re-export the schema model
pub use tantex_schema::{
    AttrSpec, AttrValue, CompiledSchema, DescriptorBuilder, DocIdSpec, ExtractError, Extracted,
    FieldKind, FieldPath, LeafSpec, ScalarValue, SchemaError, Shape, TypeDescriptor,
    SOURCE_FIELD,
};

// Re-export the index core
pub use tantex_core::{
    BoolBuilder, Cursor, DocIndex, Error, Hit, IndexConfig, Indexed, Page, QueryResult,
    QueryValue, Result, SchemaRegistry, SortOrder, SortSpec, SortValue, Storage, DEFAULT_ROOT,
};

// Engine types, for callers composing their own queries
pub use tantex_core::tantivy;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BoolBuilder, DocIndex, Error, FieldKind, Hit, IndexConfig, Indexed, LeafSpec, Page,
        QueryResult, QueryValue, Result, SchemaRegistry, Shape, SortSpec, TypeDescriptor,
    };
}
