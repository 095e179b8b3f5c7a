//! Typed index handle.
//!
//! A [`DocIndex`] owns one engine index for one registered type: the
//! compiled schema, the realized field table, a single writer behind a
//! lock, and a manually reloaded reader. Writes are visible to readers
//! only after the commit that follows each batch.

use std::marker::PhantomData;
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, RangeQuery, TermQuery};
use tantivy::schema::{IndexRecordOption, Value as _};
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{
    DocAddress, Index, IndexReader, IndexWriter, Order, ReloadPolicy, TantivyDocument, Term,
};

use tantex_schema::{CompiledSchema, FieldKind, FieldPath};

use crate::doc::build_document;
use crate::error::{Error, Result};
use crate::fields::{build_field_table, FieldTable};
use crate::query::{exact_term, text_exact, BoolBuilder, QueryValue, SortOrder, SortSpec};
use crate::registry::{Indexed, SchemaRegistry};
use crate::results::{Cursor, Hit, QueryResult, SortValue};

/// Base directory used when a durable config gives no path.
pub const DEFAULT_ROOT: &str = "./.indices";

const DELETE_SCAN_PAGE: usize = 1024;

/// Where an index keeps its segments.
#[derive(Debug, Clone)]
pub enum Storage {
    InRam,
    /// Base directory; the index lives under `<base>/<type name with
    /// dots as separators>/`.
    Durable(PathBuf),
}

/// Open-time settings for a [`DocIndex`].
pub struct IndexConfig {
    pub storage: Storage,
    pub writer_heap_bytes: usize,
    tokenizers: Vec<(String, TextAnalyzer)>,
}

impl IndexConfig {
    pub fn in_ram() -> Self {
        IndexConfig {
            storage: Storage::InRam,
            writer_heap_bytes: 50_000_000,
            tokenizers: Vec::new(),
        }
    }

    pub fn durable() -> Self {
        Self::durable_at(DEFAULT_ROOT)
    }

    pub fn durable_at(base: impl Into<PathBuf>) -> Self {
        IndexConfig {
            storage: Storage::Durable(base.into()),
            ..Self::in_ram()
        }
    }

    pub fn writer_heap_bytes(mut self, bytes: usize) -> Self {
        self.writer_heap_bytes = bytes;
        self
    }

    /// Register a named tokenizer before the schema is checked against
    /// the engine's tokenizer table.
    pub fn tokenizer(mut self, name: impl Into<String>, analyzer: TextAnalyzer) -> Self {
        self.tokenizers.push((name.into(), analyzer));
        self
    }
}

/// One page of a search.
#[derive(Debug, Clone)]
pub struct Page {
    pub limit: usize,
    pub after: Option<Cursor>,
    pub sort: Option<SortSpec>,
}

impl Page {
    pub fn of(limit: usize) -> Self {
        Page {
            limit,
            after: None,
            sort: None,
        }
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.after = Some(cursor);
        self
    }

    pub fn sorted(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

pub struct DocIndex<T> {
    schema: Arc<CompiledSchema>,
    fields: FieldTable,
    index: Index,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Indexed> DocIndex<T> {
    pub fn open(registry: &SchemaRegistry, config: IndexConfig) -> Result<Self> {
        let schema = registry.schema_of::<T>()?;
        let fields = build_field_table(&schema);

        let index = match &config.storage {
            Storage::InRam => Index::create_in_ram(fields.schema.clone()),
            Storage::Durable(base) => {
                let dir = base.join(schema.type_name().replace('.', "/"));
                std::fs::create_dir_all(&dir)?;
                Index::open_or_create(MmapDirectory::open(&dir)?, fields.schema.clone())?
            }
        };
        for (name, analyzer) in config.tokenizers {
            index.tokenizers().register(&name, analyzer);
        }
        for path in schema.paths() {
            if let Some(name) = path.leaf.tokenizer.as_deref() {
                if index.tokenizers().get(name).is_none() {
                    return Err(Error::UnknownTokenizer(name.to_string()));
                }
            }
        }

        let writer = index.writer(config.writer_heap_bytes)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        tracing::debug!(type_name = schema.type_name(), "opened index");

        Ok(DocIndex {
            schema,
            fields,
            index,
            writer: Mutex::new(writer),
            reader,
            _marker: PhantomData,
        })
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// Stage a batch of upserts without committing.
    ///
    /// Every instance is mapped before the writer is touched, so a bad
    /// instance aborts the whole batch without staging partial writes.
    /// Staged writes are invisible to readers until [`DocIndex::commit`].
    pub fn stage(&self, items: &[T]) -> Result<()> {
        let mut docs = Vec::with_capacity(items.len());
        for item in items {
            let value = serde_json::to_value(item)?;
            docs.push(build_document(&self.schema, &self.fields, &value)?);
        }
        let writer = self.writer.lock();
        for (id, doc) in docs {
            writer.delete_term(Term::from_field_text(self.fields.id_field, &id));
            writer.add_document(doc)?;
        }
        Ok(())
    }

    /// Commit staged writes and refresh the reader.
    pub fn commit(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.commit()?;
        drop(writer);
        self.reader.reload()?;
        Ok(())
    }

    /// Index a batch, replacing any existing document with the same id.
    /// Stages, commits, and refreshes in one step.
    pub fn index(&self, items: &[T]) -> Result<()> {
        self.stage(items)?;
        self.commit()
    }

    pub fn index_one(&self, item: &T) -> Result<()> {
        self.index(std::slice::from_ref(item))
    }

    /// Look up one document by id and rebuild the instance.
    ///
    /// Returns `None` when the id is unknown or the index keeps no
    /// serialized blob to rebuild from.
    pub fn get(&self, id: &str) -> Result<Option<T>> {
        let searcher = self.reader.searcher();
        let query = self.id_query(id);
        let top = searcher.search(&query, &TopDocs::with_limit(1))?;
        match top.first() {
            Some(&(_, addr)) => self.decode(&searcher, addr),
            None => Ok(None),
        }
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        let searcher = self.reader.searcher();
        Ok(searcher.search(&self.id_query(id), &Count)? > 0)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.writer
            .lock()
            .delete_term(Term::from_field_text(self.fields.id_field, id));
        self.commit()
    }

    /// Delete every document whose `field` exactly matches `value`,
    /// returning how many were removed.
    pub fn delete_by_field(&self, field: &str, value: impl Into<QueryValue>) -> Result<u64> {
        let query = self.exact(field, value)?;
        let searcher = self.reader.searcher();
        let mut ids = Vec::new();
        let mut offset = 0;
        loop {
            let page = searcher.search(
                query.as_ref(),
                &TopDocs::with_limit(DELETE_SCAN_PAGE).and_offset(offset),
            )?;
            if page.is_empty() {
                break;
            }
            offset += page.len();
            for (_, addr) in page {
                let doc: TantivyDocument = searcher.doc(addr)?;
                if let Some(id) = doc.get_first(self.fields.id_field).and_then(|v| v.as_str()) {
                    ids.push(id.to_string());
                }
            }
        }

        let removed = ids.len() as u64;
        let writer = self.writer.lock();
        for id in &ids {
            writer.delete_term(Term::from_field_text(self.fields.id_field, id));
        }
        drop(writer);
        self.commit()?;
        Ok(removed)
    }

    /// Exact-match query against one dotted field path.
    pub fn exact(&self, field: &str, value: impl Into<QueryValue>) -> Result<Box<dyn Query>> {
        let path = self
            .schema
            .path(field)
            .ok_or_else(|| Error::UnknownField(field.to_string()))?;
        let engine_field = self
            .fields
            .field(field)
            .ok_or_else(|| Error::UnknownField(field.to_string()))?;
        let value = value.into();

        if path.kind() == FieldKind::Text {
            let text = match value {
                QueryValue::Str(s) => s,
                _ => {
                    return Err(Error::ValueKind {
                        path: field.to_string(),
                        kind: path.kind(),
                    })
                }
            };
            let name = path.leaf.tokenizer.as_deref().unwrap_or("default");
            let mut analyzer = self
                .index
                .tokenizers()
                .get(name)
                .ok_or_else(|| Error::UnknownTokenizer(name.to_string()))?;
            return Ok(text_exact(engine_field, &text, &mut analyzer));
        }

        let term = exact_term(field, path.kind(), engine_field, value)?;
        Ok(Box::new(TermQuery::new(term, IndexRecordOption::Basic)))
    }

    pub fn bool(&self) -> BoolBuilder {
        BoolBuilder::new()
    }

    pub fn all(&self) -> Box<dyn Query> {
        Box::new(AllQuery)
    }

    /// Run one page of a search and rebuild the hit instances.
    ///
    /// Matches whose blob is missing or unreadable are skipped and
    /// counted; the returned cursor accounts for them, so resuming
    /// never revisits or loses a raw hit. A sorted page resumes by
    /// re-anchoring on the cursor's realized sort key, so documents
    /// deleted or inserted between pages shift the enumeration by sort
    /// order, never by position.
    pub fn search(&self, query: &dyn Query, page: Page) -> Result<QueryResult<T>> {
        let searcher = self.reader.searcher();
        match &page.sort {
            None => {
                let offset = page.after.map(|c| c.offset).unwrap_or(0);
                let collector = TopDocs::with_limit(page.limit).and_offset(offset);
                let (total, raw) = searcher.search(query, &(Count, collector))?;
                let (hits, skipped) =
                    self.decode_hits(&searcher, &raw, |score| (score, None))?;
                let next = raw
                    .last()
                    .filter(|_| offset + raw.len() < total)
                    .map(|&(score, addr)| Cursor {
                        offset: offset + raw.len(),
                        last_sort: None,
                        ties: 0,
                        last_doc: Some((addr.segment_ord, addr.doc_id)),
                        last_score: Some(score),
                    });
                Ok(QueryResult {
                    total,
                    hits,
                    skipped,
                    next,
                })
            }
            Some(sort) => self.search_sorted(&searcher, query, &page, sort),
        }
    }

    fn search_sorted(
        &self,
        searcher: &tantivy::Searcher,
        query: &dyn Query,
        page: &Page,
        sort: &SortSpec,
    ) -> Result<QueryResult<T>> {
        let path = self
            .schema
            .path(&sort.field)
            .ok_or_else(|| Error::UnknownField(sort.field.clone()))?;
        if !path.leaf.sorted {
            return Err(Error::NotSortable(sort.field.clone()));
        }
        let order = match sort.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        // resume restricts the query to keys at or past the anchor and
        // skips the raw hits already consumed at the anchor key itself
        let anchor = page
            .after
            .as_ref()
            .and_then(|c| c.last_sort.map(|key| (key, c.ties)));
        let (anchored, skip): (Box<dyn Query>, usize) = match anchor {
            Some((key, ties)) => (self.anchor_query(query, path, sort, key)?, ties),
            None => (query.box_clone(), 0),
        };
        let consumed_before = page.after.map(|c| c.offset).unwrap_or(0);
        let total = searcher.search(query, &Count)?;
        let collector = TopDocs::with_limit(page.limit).and_offset(skip);

        match path.kind() {
            FieldKind::Float32 | FieldKind::Float64 => {
                let collector = collector.order_by_fast_field::<f64>(&sort.field, order);
                let (remaining, raw) = searcher.search(anchored.as_ref(), &(Count, collector))?;
                self.finish_sorted(
                    searcher,
                    total,
                    remaining,
                    skip,
                    consumed_before,
                    raw,
                    anchor,
                    SortValue::F64,
                )
            }
            _ => {
                let collector = collector.order_by_fast_field::<i64>(&sort.field, order);
                let (remaining, raw) = searcher.search(anchored.as_ref(), &(Count, collector))?;
                self.finish_sorted(
                    searcher,
                    total,
                    remaining,
                    skip,
                    consumed_before,
                    raw,
                    anchor,
                    SortValue::I64,
                )
            }
        }
    }

    /// `query` restricted to sort keys at or past `key` in page order.
    /// The anchor key itself stays in range; equal-key hits already
    /// consumed are skipped by the cursor's tie count.
    fn anchor_query(
        &self,
        query: &dyn Query,
        path: &FieldPath,
        sort: &SortSpec,
        key: SortValue,
    ) -> Result<Box<dyn Query>> {
        let field = self
            .fields
            .field(&sort.field)
            .ok_or_else(|| Error::UnknownField(sort.field.clone()))?;
        let term = match (path.kind(), key) {
            (FieldKind::Float32 | FieldKind::Float64, SortValue::F64(v)) => {
                Term::from_field_f64(field, v)
            }
            (FieldKind::Float32 | FieldKind::Float64, SortValue::I64(_))
            | (_, SortValue::F64(_)) => {
                return Err(Error::ValueKind {
                    path: sort.field.clone(),
                    kind: path.kind(),
                })
            }
            (_, SortValue::I64(v)) => Term::from_field_i64(field, v),
        };
        let value_type = term.typ();
        let range = match sort.order {
            SortOrder::Asc => RangeQuery::new_term_bounds(
                sort.field.clone(),
                value_type,
                &Bound::Included(term),
                &Bound::Unbounded,
            ),
            SortOrder::Desc => RangeQuery::new_term_bounds(
                sort.field.clone(),
                value_type,
                &Bound::Unbounded,
                &Bound::Included(term),
            ),
        };
        Ok(Box::new(BooleanQuery::new(vec![
            (Occur::Must, query.box_clone()),
            (Occur::Must, Box::new(range)),
        ])))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_sorted<K: Copy + PartialEq>(
        &self,
        searcher: &tantivy::Searcher,
        total: usize,
        remaining: usize,
        skip: usize,
        consumed_before: usize,
        raw: Vec<(K, DocAddress)>,
        anchor: Option<(SortValue, usize)>,
        wrap: impl Fn(K) -> SortValue,
    ) -> Result<QueryResult<T>> {
        let (hits, skipped) = self.decode_hits(searcher, &raw, |key| (0.0, Some(wrap(key))))?;
        let next = raw
            .last()
            .filter(|_| skip + raw.len() < remaining)
            .map(|&(last_key, addr)| {
                let trailing = raw
                    .iter()
                    .rev()
                    .take_while(|(key, _)| *key == last_key)
                    .count();
                // an all-tie page continues the previous anchor's run
                let carried = match anchor {
                    Some((prev_key, prev_ties))
                        if trailing == raw.len() && prev_key == wrap(last_key) =>
                    {
                        prev_ties
                    }
                    _ => 0,
                };
                Cursor {
                    offset: consumed_before + raw.len(),
                    last_sort: Some(wrap(last_key)),
                    ties: carried + trailing,
                    last_doc: Some((addr.segment_ord, addr.doc_id)),
                    last_score: Some(0.0),
                }
            });
        Ok(QueryResult {
            total,
            hits,
            skipped,
            next,
        })
    }

    fn decode_hits<K: Copy>(
        &self,
        searcher: &tantivy::Searcher,
        raw: &[(K, DocAddress)],
        meta: impl Fn(K) -> (tantivy::Score, Option<SortValue>),
    ) -> Result<(Vec<Hit<T>>, usize)> {
        let mut hits = Vec::with_capacity(raw.len());
        let mut skipped = 0;
        for &(key, addr) in raw {
            let (score, sort_key) = meta(key);
            match self.decode(searcher, addr)? {
                Some(entity) => hits.push(Hit {
                    entity,
                    address: addr,
                    score,
                    sort_key,
                }),
                None => {
                    skipped += 1;
                    tracing::warn!(
                        type_name = self.schema.type_name(),
                        segment = addr.segment_ord,
                        doc = addr.doc_id,
                        "skipping hit without a readable source blob"
                    );
                }
            }
        }
        Ok((hits, skipped))
    }

    fn decode(&self, searcher: &tantivy::Searcher, addr: DocAddress) -> Result<Option<T>> {
        let Some(source_field) = self.fields.source_field else {
            return Ok(None);
        };
        let doc: TantivyDocument = searcher.doc(addr)?;
        let Some(bytes) = doc.get_first(source_field).and_then(|v| v.as_bytes()) else {
            return Ok(None);
        };
        match serde_json::from_slice(bytes) {
            Ok(entity) => Ok(Some(entity)),
            Err(err) => {
                tracing::warn!(
                    type_name = self.schema.type_name(),
                    error = %err,
                    "stored blob failed to decode"
                );
                Ok(None)
            }
        }
    }

    fn id_query(&self, id: &str) -> TermQuery {
        TermQuery::new(
            Term::from_field_text(self.fields.id_field, id),
            IndexRecordOption::Basic,
        )
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn refresh(&self) -> Result<()> {
        self.reader.reload()?;
        Ok(())
    }

    /// Tokens the type's default tokenizer produces for `text`.
    pub fn tokens(&self, text: &str) -> Result<Vec<String>> {
        let name = self.schema.default_tokenizer().to_string();
        self.tokens_with(&name, text)
    }

    pub fn tokens_with(&self, tokenizer: &str, text: &str) -> Result<Vec<String>> {
        let mut analyzer = self
            .index
            .tokenizers()
            .get(tokenizer)
            .ok_or_else(|| Error::UnknownTokenizer(tokenizer.to_string()))?;
        let mut out = Vec::new();
        let mut stream = analyzer.token_stream(text);
        while let Some(token) = stream.next() {
            out.push(token.text.clone());
        }
        Ok(out)
    }

    /// Merge all searchable segments into one.
    pub fn force_merge(&self) -> Result<()> {
        let segment_ids = self.index.searchable_segment_ids()?;
        if segment_ids.len() > 1 {
            let mut writer = self.writer.lock();
            writer.merge(&segment_ids).wait()?;
            drop(writer);
            self.reader.reload()?;
        }
        Ok(())
    }

    /// Verify stored file checksums, returning the damaged paths.
    /// An empty list means the index is healthy.
    pub fn validate(&self) -> Result<Vec<PathBuf>> {
        let damaged = self.index.validate_checksum()?;
        Ok(damaged.into_iter().collect())
    }
}
