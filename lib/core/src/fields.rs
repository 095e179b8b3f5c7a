//! Engine field mapping.
//!
//! Realizes a [`CompiledSchema`] as a tantivy [`Schema`]: one engine field
//! per dotted path, with the path's flags translated to the engine's
//! INDEXED / STORED / FAST options and the per-path tokenizer name wired
//! into text indexing. The doc id field is always a raw exact-match term
//! and always stored; the serialized blob lives under the reserved
//! `_source` name when the descriptor asks for it.

use ahash::AHashMap;
use tantivy::schema::{
    BytesOptions, Field, IndexRecordOption, NumericOptions, Schema, TextFieldIndexing,
    TextOptions, STORED, STRING,
};

use tantex_schema::{CompiledSchema, FieldKind, SOURCE_FIELD};

pub(crate) struct FieldTable {
    pub schema: Schema,
    pub by_path: AHashMap<String, Field>,
    pub id_field: Field,
    pub source_field: Option<Field>,
}

impl FieldTable {
    pub fn field(&self, path: &str) -> Option<Field> {
        self.by_path.get(path).copied()
    }
}

pub(crate) fn build_field_table(cs: &CompiledSchema) -> FieldTable {
    let mut builder = Schema::builder();
    let mut by_path = AHashMap::with_capacity(cs.len());

    for path in cs.paths() {
        let leaf = &path.leaf;
        let field = match path.kind() {
            FieldKind::Int32 | FieldKind::Int64 | FieldKind::Size => {
                let mut opts = NumericOptions::default();
                if leaf.indexed {
                    opts = opts.set_indexed();
                }
                if leaf.stored {
                    opts = opts.set_stored();
                }
                if leaf.sorted {
                    opts = opts.set_fast();
                }
                builder.add_i64_field(&path.name, opts)
            }
            FieldKind::Float32 | FieldKind::Float64 => {
                let mut opts = NumericOptions::default();
                if leaf.indexed {
                    opts = opts.set_indexed();
                }
                if leaf.stored {
                    opts = opts.set_stored();
                }
                if leaf.sorted {
                    // the engine keeps a monotonic sortable integer column
                    opts = opts.set_fast();
                }
                builder.add_f64_field(&path.name, opts)
            }
            FieldKind::BigInt => {
                let mut opts = BytesOptions::default();
                if leaf.indexed {
                    opts = opts.set_indexed();
                }
                if leaf.stored {
                    opts = opts.set_stored();
                }
                builder.add_bytes_field(&path.name, opts)
            }
            FieldKind::Bool | FieldKind::Keyword => {
                let mut opts = TextOptions::default();
                if leaf.indexed {
                    opts = opts.set_indexing_options(
                        TextFieldIndexing::default()
                            .set_tokenizer("raw")
                            .set_index_option(IndexRecordOption::Basic),
                    );
                }
                if leaf.stored {
                    opts = opts.set_stored();
                }
                builder.add_text_field(&path.name, opts)
            }
            FieldKind::Text => {
                let tokenizer = leaf.tokenizer.as_deref().unwrap_or("default");
                let mut opts = TextOptions::default();
                if leaf.indexed {
                    opts = opts.set_indexing_options(
                        TextFieldIndexing::default()
                            .set_tokenizer(tokenizer)
                            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
                    );
                }
                if leaf.stored {
                    opts = opts.set_stored();
                }
                builder.add_text_field(&path.name, opts)
            }
        };
        by_path.insert(path.name.clone(), field);
    }

    let id_field = builder.add_text_field(&cs.doc_id().attr, STRING | STORED);
    let source_field = cs
        .store_source()
        .then(|| builder.add_bytes_field(SOURCE_FIELD, BytesOptions::default().set_stored()));

    FieldTable {
        schema: builder.build(),
        by_path,
        id_field,
        source_field,
    }
}
