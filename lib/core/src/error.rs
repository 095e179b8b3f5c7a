use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] tantex_schema::SchemaError),

    #[error(transparent)]
    Extract(#[from] tantex_schema::ExtractError),

    #[error("{type_name}: doc id is null, empty or not a string")]
    NullDocId { type_name: String },

    #[error("{type_name}: instance did not serialize to an object")]
    NotAnObject { type_name: String },

    #[error("descriptor name {type_name} is already registered for a different type")]
    TypeMismatch { type_name: String },

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {0} is not a sort key")]
    NotSortable(String),

    #[error("query value does not fit {kind} field {path}")]
    ValueKind {
        path: String,
        kind: tantex_schema::FieldKind,
    },

    #[error("unknown tokenizer: {0}")]
    UnknownTokenizer(String),

    #[error("boolean query needs at least one should, must or filter clause")]
    EmptyBool,

    #[error("engine error: {0}")]
    Engine(#[from] tantivy::TantivyError),

    #[error("directory error: {0}")]
    OpenDirectory(#[from] tantivy::directory::error::OpenDirectoryError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
