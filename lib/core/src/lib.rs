//! Index core: engine field mapping, document construction, query
//! building, and the typed [`DocIndex`] handle tying them together.

pub mod codec;
mod doc;
pub mod error;
mod fields;
pub mod index;
pub mod query;
pub mod registry;
pub mod results;

pub use error::{Error, Result};
pub use index::{DocIndex, IndexConfig, Page, Storage, DEFAULT_ROOT};
pub use query::{BoolBuilder, QueryValue, SortOrder, SortSpec};
pub use registry::{Indexed, SchemaRegistry};
pub use results::{Cursor, Hit, QueryResult, SortValue};

// callers composing custom queries need the engine's types
pub use tantivy;
