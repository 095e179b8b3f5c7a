//! Query construction.
//!
//! Exact-match leaves are built per field kind from the same encodings
//! the document builder writes, so a query value always meets the stored
//! terms it targets. Tokenized fields analyze the probe text with the
//! field's own tokenizer and match the full token sequence in order.
//! Boolean composition mirrors the engine's occur model.

use tantivy::query::{
    BooleanQuery, ConstScoreQuery, EmptyQuery, Occur, PhraseQuery, Query, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::TextAnalyzer;
use tantivy::Term;

use tantex_schema::FieldKind;

use crate::codec::{bigint_to_bytes, bool_literal};
use crate::error::{Error, Result};

/// A probe value for an exact-match query, before kind coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    I64(i64),
    F64(f64),
    BigInt(i128),
    Bool(bool),
    Str(String),
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        QueryValue::I64(v as i64)
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        QueryValue::I64(v)
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        QueryValue::I64(v as i64)
    }
}

impl From<i128> for QueryValue {
    fn from(v: i128) -> Self {
        QueryValue::BigInt(v)
    }
}

impl From<f32> for QueryValue {
    fn from(v: f32) -> Self {
        QueryValue::F64(v as f64)
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        QueryValue::F64(v)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Str(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Str(v)
    }
}

/// Exact-match term for every kind except [`FieldKind::Text`], which
/// goes through [`text_exact`] instead.
pub(crate) fn exact_term(
    path_name: &str,
    kind: FieldKind,
    field: Field,
    value: QueryValue,
) -> Result<Term> {
    let mismatch = || Error::ValueKind {
        path: path_name.to_string(),
        kind,
    };
    let term = match kind {
        FieldKind::Int32 | FieldKind::Int64 | FieldKind::Size => match value {
            QueryValue::I64(n) => Term::from_field_i64(field, n),
            _ => return Err(mismatch()),
        },
        FieldKind::Float32 => match value {
            // queries meet the widened f64 encoding the builder writes
            QueryValue::F64(f) => Term::from_field_f64(field, f as f32 as f64),
            QueryValue::I64(n) => Term::from_field_f64(field, n as f32 as f64),
            _ => return Err(mismatch()),
        },
        FieldKind::Float64 => match value {
            QueryValue::F64(f) => Term::from_field_f64(field, f),
            QueryValue::I64(n) => Term::from_field_f64(field, n as f64),
            _ => return Err(mismatch()),
        },
        FieldKind::BigInt => match value {
            QueryValue::BigInt(n) => Term::from_field_bytes(field, &bigint_to_bytes(n)),
            QueryValue::I64(n) => Term::from_field_bytes(field, &bigint_to_bytes(n as i128)),
            _ => return Err(mismatch()),
        },
        FieldKind::Bool => match value {
            QueryValue::Bool(b) => Term::from_field_text(field, bool_literal(b)),
            _ => return Err(mismatch()),
        },
        FieldKind::Keyword => match value {
            QueryValue::Str(s) => Term::from_field_text(field, &s),
            _ => return Err(mismatch()),
        },
        FieldKind::Text => return Err(mismatch()),
    };
    Ok(term)
}

/// Exact match against a tokenized field: the probe text is analyzed
/// with the field's tokenizer and every token must appear in order.
/// Zero tokens match nothing.
pub(crate) fn text_exact(
    field: Field,
    text: &str,
    analyzer: &mut TextAnalyzer,
) -> Box<dyn Query> {
    let mut terms = Vec::new();
    let mut stream = analyzer.token_stream(text);
    while let Some(token) = stream.next() {
        terms.push(Term::from_field_text(field, &token.text));
    }
    if terms.is_empty() {
        return Box::new(EmptyQuery);
    }
    if terms.len() == 1 {
        let term = terms.remove(0);
        return Box::new(TermQuery::new(
            term,
            IndexRecordOption::WithFreqsAndPositions,
        ));
    }
    Box::new(PhraseQuery::new(terms))
}

/// Sort direction for ranked searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort a search by one sortable field instead of relevance.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Composes leaf queries with the engine's occur model.
///
/// `filter` clauses are required like `must` but never contribute to
/// the relevance score.
#[derive(Default)]
pub struct BoolBuilder {
    clauses: Vec<(Occur, Box<dyn Query>)>,
    has_positive: bool,
}

impl BoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should(mut self, q: Box<dyn Query>) -> Self {
        self.clauses.push((Occur::Should, q));
        self.has_positive = true;
        self
    }

    pub fn must(mut self, q: Box<dyn Query>) -> Self {
        self.clauses.push((Occur::Must, q));
        self.has_positive = true;
        self
    }

    pub fn must_not(mut self, q: Box<dyn Query>) -> Self {
        self.clauses.push((Occur::MustNot, q));
        self
    }

    pub fn filter(mut self, q: Box<dyn Query>) -> Self {
        self.clauses
            .push((Occur::Must, Box::new(ConstScoreQuery::new(q, 0.0))));
        self.has_positive = true;
        self
    }

    /// Exclusions alone select nothing; at least one `should`, `must`
    /// or `filter` clause is required.
    pub fn build(self) -> Result<Box<dyn Query>> {
        if !self.has_positive {
            return Err(Error::EmptyBool);
        }
        Ok(Box::new(BooleanQuery::new(self.clauses)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantivy::schema::{Schema, INDEXED, STRING, TEXT};
    use tantivy::tokenizer::{LowerCaser, SimpleTokenizer};

    fn fields() -> (Field, Field, Field) {
        let mut b = Schema::builder();
        let num = b.add_i64_field("n", INDEXED);
        let kw = b.add_text_field("k", STRING);
        let txt = b.add_text_field("t", TEXT);
        b.build();
        (num, kw, txt)
    }

    #[test]
    fn kind_mismatch_rejected() {
        let (num, kw, _) = fields();
        assert!(exact_term("n", FieldKind::Int64, num, QueryValue::Str("7".into())).is_err());
        assert!(exact_term("k", FieldKind::Keyword, kw, QueryValue::I64(7)).is_err());
        assert!(exact_term("k", FieldKind::Bool, kw, QueryValue::Str("true".into())).is_err());
    }

    #[test]
    fn numeric_widening() {
        let (num, _, _) = fields();
        assert!(exact_term("n", FieldKind::Float64, num, QueryValue::I64(3)).is_ok());
        assert!(exact_term("n", FieldKind::BigInt, num, QueryValue::I64(3)).is_ok());
    }

    #[test]
    fn query_value_conversions() {
        assert_eq!(QueryValue::from(7i32), QueryValue::I64(7));
        assert_eq!(QueryValue::from(7u32), QueryValue::I64(7));
        assert_eq!(QueryValue::from(1.5f64), QueryValue::F64(1.5));
        assert_eq!(QueryValue::from("a"), QueryValue::Str("a".into()));
        assert_eq!(QueryValue::from(true), QueryValue::Bool(true));
        assert_eq!(QueryValue::from(9i128), QueryValue::BigInt(9));
    }

    #[test]
    fn text_probe_token_arity() {
        let (_, _, txt) = fields();
        let mut analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .build();
        // zero, one, and many tokens all produce a usable query
        for probe in ["...", "Hello", "hello brave world"] {
            let _q = text_exact(txt, probe, &mut analyzer);
        }
    }

    #[test]
    fn empty_composition_rejected() {
        assert!(matches!(BoolBuilder::new().build(), Err(Error::EmptyBool)));
        let (num, _, _) = fields();
        let t = exact_term("n", FieldKind::Int64, num, QueryValue::I64(1)).unwrap();
        let q = Box::new(TermQuery::new(t, IndexRecordOption::Basic));
        assert!(BoolBuilder::new().must(q).build().is_ok());
    }

    #[test]
    fn exclusion_only_composition_rejected() {
        let (num, _, _) = fields();
        let t = exact_term("n", FieldKind::Int64, num, QueryValue::I64(1)).unwrap();
        let q = Box::new(TermQuery::new(t, IndexRecordOption::Basic));
        assert!(matches!(
            BoolBuilder::new().must_not(q).build(),
            Err(Error::EmptyBool)
        ));
        let t = exact_term("n", FieldKind::Int64, num, QueryValue::I64(2)).unwrap();
        let positive = Box::new(TermQuery::new(t, IndexRecordOption::Basic));
        let t = exact_term("n", FieldKind::Int64, num, QueryValue::I64(3)).unwrap();
        let negative = Box::new(TermQuery::new(t, IndexRecordOption::Basic));
        assert!(BoolBuilder::new()
            .filter(positive)
            .must_not(negative)
            .build()
            .is_ok());
    }
}
