//! Document construction.
//!
//! Turns one serialized instance into the flat multi-valued engine
//! document: every compiled path is extracted, fanned out, and emitted
//! under its dotted field name. Cardinality paths always emit their
//! count, including zero; every other absent path emits nothing. Blank
//! strings are dropped rather than indexed as empty terms.

use serde_json::Value;
use tantivy::TantivyDocument;

use tantex_schema::{extract, extract_count, CompiledSchema, Extracted, FieldKind, ScalarValue};

use crate::codec::{bigint_to_bytes, bool_literal};
use crate::error::{Error, Result};
use crate::fields::FieldTable;

/// Build the engine document for one instance, returning its id.
pub(crate) fn build_document(
    cs: &CompiledSchema,
    ft: &FieldTable,
    value: &Value,
) -> Result<(String, TantivyDocument)> {
    if !value.is_object() {
        return Err(Error::NotAnObject {
            type_name: cs.type_name().to_string(),
        });
    }
    let id = doc_id_of(cs, value)?;

    let mut doc = TantivyDocument::default();
    doc.add_text(ft.id_field, &id);
    if let Some(source_field) = ft.source_field {
        doc.add_bytes(source_field, serde_json::to_vec(value)?.as_slice());
    }

    for path in cs.paths() {
        let field = ft
            .field(&path.name)
            .ok_or_else(|| Error::UnknownField(path.name.clone()))?;
        if path.kind() == FieldKind::Size {
            let n = extract_count(path, value)?;
            doc.add_i64(field, n as i64);
            continue;
        }
        match extract(path, value)? {
            Extracted::Absent => {}
            Extracted::One(v) => add_scalar(&mut doc, field, v),
            Extracted::Many(vs) => {
                for v in vs {
                    add_scalar(&mut doc, field, v);
                }
            }
        }
    }
    Ok((id, doc))
}

/// The identifier is a scalar string; anything else, including a
/// numeric value, rejects the instance.
pub(crate) fn doc_id_of(cs: &CompiledSchema, value: &Value) -> Result<String> {
    match value.get(&cs.doc_id().attr) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(Error::NullDocId {
            type_name: cs.type_name().to_string(),
        }),
    }
}

fn add_scalar(doc: &mut TantivyDocument, field: tantivy::schema::Field, v: ScalarValue) {
    match v {
        ScalarValue::Int(n) => doc.add_i64(field, n),
        ScalarValue::BigInt(n) => doc.add_bytes(field, bigint_to_bytes(n).as_slice()),
        ScalarValue::F32(f) => doc.add_f64(field, f.0 as f64),
        ScalarValue::F64(f) => doc.add_f64(field, f.0),
        ScalarValue::Bool(b) => doc.add_text(field, bool_literal(b)),
        ScalarValue::Str(s) => {
            if !s.trim().is_empty() {
                doc.add_text(field, &s);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::build_field_table;
    use serde_json::json;
    use tantivy::schema::Value as _;
    use tantex_schema::{LeafSpec, Shape, TypeDescriptor};

    fn schema() -> CompiledSchema {
        let td = TypeDescriptor::builder("test.T")
            .doc_id("id")
            .field("x", Shape::Scalar, LeafSpec::new(FieldKind::Int32))
            .field("tags", Shape::Set, LeafSpec::new(FieldKind::Keyword))
            .field("tags", Shape::Set, LeafSpec::new(FieldKind::Size))
            .field("flag", Shape::Scalar, LeafSpec::new(FieldKind::Bool))
            .build();
        CompiledSchema::compile(&td).unwrap()
    }

    #[test]
    fn emits_each_distinct_value_once() {
        let cs = schema();
        let ft = build_field_table(&cs);
        let v = json!({"id": "42", "x": 7, "tags": ["b", "a", "b"], "flag": true});
        let (id, doc) = build_document(&cs, &ft, &v).unwrap();
        assert_eq!(id, "42");

        let tags = ft.field("tags").unwrap();
        let mut got: Vec<&str> = doc
            .get_all(tags)
            .filter_map(|v| v.as_str())
            .collect();
        got.sort_unstable();
        assert_eq!(got, vec!["a", "b"]);

        let size = ft.field("tags.size").unwrap();
        assert_eq!(doc.get_first(size).and_then(|v| v.as_i64()), Some(3));

        let flag = ft.field("flag").unwrap();
        assert_eq!(doc.get_first(flag).and_then(|v| v.as_str()), Some("true"));
    }

    #[test]
    fn absent_paths_emit_nothing_but_size_emits_zero() {
        let cs = schema();
        let ft = build_field_table(&cs);
        let v = json!({"id": "1"});
        let (_, doc) = build_document(&cs, &ft, &v).unwrap();
        assert!(doc.get_first(ft.field("x").unwrap()).is_none());
        assert!(doc.get_first(ft.field("tags").unwrap()).is_none());
        assert_eq!(
            doc.get_first(ft.field("tags.size").unwrap())
                .and_then(|v| v.as_i64()),
            Some(0)
        );
    }

    #[test]
    fn blank_strings_skipped() {
        let cs = schema();
        let ft = build_field_table(&cs);
        let v = json!({"id": "1", "tags": ["  ", "", "a"]});
        let (_, doc) = build_document(&cs, &ft, &v).unwrap();
        let got: Vec<&str> = doc
            .get_all(ft.field("tags").unwrap())
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(got, vec!["a"]);
        // the raw count still sees the blanks
        assert_eq!(
            doc.get_first(ft.field("tags.size").unwrap())
                .and_then(|v| v.as_i64()),
            Some(3)
        );
    }

    #[test]
    fn missing_id_rejected() {
        let cs = schema();
        let ft = build_field_table(&cs);
        for v in [
            json!({"x": 1}),
            json!({"id": null, "x": 1}),
            json!({"id": ""}),
            json!({"id": 42, "x": 1}),
        ] {
            assert!(matches!(
                build_document(&cs, &ft, &v),
                Err(Error::NullDocId { .. })
            ));
        }
        assert!(matches!(
            build_document(&cs, &ft, &json!([1, 2])),
            Err(Error::NotAnObject { .. })
        ));
    }
}
