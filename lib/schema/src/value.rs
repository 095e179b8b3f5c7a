//! Value extraction.
//!
//! Walks a serialized instance (its `serde_json::Value` tree) along a
//! compiled [`FieldPath`], fanning out at multi-valued steps and unioning
//! every branch into one flat, deduplicated scalar set. Two collection
//! levels on a path still yield a single flat set, never a set of sets,
//! and "no elements" is indistinguishable from "null": both are absence.

use std::collections::BTreeSet;

use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::compile::FieldPath;
use crate::error::ExtractError;
use crate::kind::FieldKind;

/// A totally ordered terminal scalar.
///
/// Total order (floats via `ordered-float`) is what lets a flattened
/// multi-valued branch live in a `BTreeSet`: canonical iteration order and
/// dedup at every join point for free.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarValue {
    Int(i64),
    BigInt(i128),
    F32(OrderedFloat<f32>),
    F64(OrderedFloat<f64>),
    Bool(bool),
    Str(String),
}

impl ScalarValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::F32(v) => Some(v.0 as f64),
            ScalarValue::F64(v) => Some(v.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Result of extracting one field path from one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// The path is absent for this instance; nothing is emitted.
    Absent,
    /// A single-valued path with a present value.
    One(ScalarValue),
    /// A path crossing at least one collection: the flat deduplicated
    /// union of every reachable terminal value.
    Many(BTreeSet<ScalarValue>),
}

impl Extracted {
    pub fn is_absent(&self) -> bool {
        matches!(self, Extracted::Absent)
    }
}

/// Extract the value set of `path` from a serialized instance.
///
/// Absence (null, missing attribute, empty collection) at any step
/// short-circuits the whole path: there are no partial results.
pub fn extract(path: &FieldPath, root: &Value) -> Result<Extracted, ExtractError> {
    debug_assert_ne!(path.kind(), FieldKind::Size, "size paths use extract_count");
    collect(path, 0, root)
}

fn collect(path: &FieldPath, step_idx: usize, node: &Value) -> Result<Extracted, ExtractError> {
    let step = &path.steps[step_idx];
    let obj = node
        .as_object()
        .ok_or_else(|| shape_err(path, &step.attr, "object"))?;
    let child = match obj.get(&step.attr) {
        None => return Ok(Extracted::Absent),
        Some(Value::Null) => return Ok(Extracted::Absent),
        Some(v) => v,
    };
    let terminal = step_idx + 1 == path.steps.len();

    if step.multi {
        let items = child
            .as_array()
            .ok_or_else(|| shape_err(path, &step.attr, "array"))?;
        let mut set = BTreeSet::new();
        for item in items {
            if item.is_null() {
                continue;
            }
            if terminal {
                set.insert(to_scalar(path, &step.attr, item)?);
            } else {
                match collect(path, step_idx + 1, item)? {
                    Extracted::Absent => {}
                    Extracted::One(v) => {
                        set.insert(v);
                    }
                    Extracted::Many(vs) => set.extend(vs),
                }
            }
        }
        if set.is_empty() {
            Ok(Extracted::Absent)
        } else {
            Ok(Extracted::Many(set))
        }
    } else if terminal {
        Ok(Extracted::One(to_scalar(path, &step.attr, child)?))
    } else {
        collect(path, step_idx + 1, child)
    }
}

/// Element count for a cardinality (`.size`) path.
///
/// Counts the raw, non-flattened collection: an absent branch counts 0,
/// and a path crossing an earlier collection sums the counts of every
/// reached terminal collection.
pub fn extract_count(path: &FieldPath, root: &Value) -> Result<u64, ExtractError> {
    count(path, 0, root)
}

fn count(path: &FieldPath, step_idx: usize, node: &Value) -> Result<u64, ExtractError> {
    let step = &path.steps[step_idx];
    let obj = node
        .as_object()
        .ok_or_else(|| shape_err(path, &step.attr, "object"))?;
    let child = match obj.get(&step.attr) {
        None | Some(Value::Null) => return Ok(0),
        Some(v) => v,
    };
    let terminal = step_idx + 1 == path.steps.len();

    if terminal {
        let items = child
            .as_array()
            .ok_or_else(|| shape_err(path, &step.attr, "array"))?;
        Ok(items.len() as u64)
    } else if step.multi {
        let items = child
            .as_array()
            .ok_or_else(|| shape_err(path, &step.attr, "array"))?;
        let mut total = 0;
        for item in items {
            if !item.is_null() {
                total += count(path, step_idx + 1, item)?;
            }
        }
        Ok(total)
    } else {
        count(path, step_idx + 1, child)
    }
}

fn to_scalar(path: &FieldPath, attr: &str, v: &Value) -> Result<ScalarValue, ExtractError> {
    let out = match path.kind() {
        FieldKind::Int32 => v
            .as_i64()
            .filter(|n| i32::try_from(*n).is_ok())
            .map(ScalarValue::Int),
        FieldKind::Int64 => v.as_i64().map(ScalarValue::Int),
        FieldKind::BigInt => bigint_from_json(v).map(ScalarValue::BigInt),
        FieldKind::Float32 => v
            .as_f64()
            .map(|f| ScalarValue::F32(OrderedFloat(f as f32))),
        FieldKind::Float64 => v.as_f64().map(|f| ScalarValue::F64(OrderedFloat(f))),
        FieldKind::Bool => v.as_bool().map(ScalarValue::Bool),
        FieldKind::Keyword | FieldKind::Text => {
            v.as_str().map(|s| ScalarValue::Str(s.to_string()))
        }
        FieldKind::Size => None,
    };
    out.ok_or_else(|| shape_err(path, attr, path.kind().name()))
}

fn bigint_from_json(v: &Value) -> Option<i128> {
    if let Some(n) = v.as_i64() {
        return Some(n as i128);
    }
    if let Some(n) = v.as_u64() {
        return Some(n as i128);
    }
    // types modelling big integers as decimal strings
    v.as_str().and_then(|s| s.parse().ok())
}

fn shape_err(path: &FieldPath, attr: &str, expected: &'static str) -> ExtractError {
    ExtractError::Shape {
        path: path.name.clone(),
        attr: attr.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::CompiledSchema;
    use crate::descriptor::{LeafSpec, Shape, TypeDescriptor};
    use serde_json::json;

    fn leaf_descriptor() -> TypeDescriptor {
        TypeDescriptor::builder("test.Leaf")
            .field("nums", Shape::List, LeafSpec::new(FieldKind::Int32))
            .build()
    }

    fn mid_descriptor() -> TypeDescriptor {
        TypeDescriptor::builder("test.Mid")
            .nested("leaves", Shape::List, leaf_descriptor)
            .build()
    }

    fn schema() -> CompiledSchema {
        let td = TypeDescriptor::builder("test.Root")
            .doc_id("id")
            .field("x", Shape::Scalar, LeafSpec::new(FieldKind::Int32))
            .field("price", Shape::Scalar, LeafSpec::new(FieldKind::Float64))
            .field("tags", Shape::Set, LeafSpec::new(FieldKind::Keyword))
            .field("tags", Shape::Set, LeafSpec::new(FieldKind::Size))
            .nested("mid", Shape::Scalar, mid_descriptor)
            .nested("mids", Shape::List, mid_descriptor)
            .build();
        CompiledSchema::compile(&td).unwrap()
    }

    #[test]
    fn scalar_path() {
        let cs = schema();
        let v = json!({"id": "1", "x": 7});
        assert_eq!(
            extract(cs.path("x").unwrap(), &v).unwrap(),
            Extracted::One(ScalarValue::Int(7))
        );
    }

    #[test]
    fn absence_short_circuits() {
        let cs = schema();
        for v in [
            json!({}),
            json!({"x": null}),
            json!({"tags": []}),
            json!({"mids": []}),
            json!({"mids": [{"leaves": []}]}),
            json!({"mids": [{"leaves": [{"nums": []}]}]}),
        ] {
            for name in ["x", "tags", "mids.leaves.nums"] {
                let p = cs.path(name).unwrap();
                if p.kind() != FieldKind::Size {
                    assert_eq!(
                        extract(p, &v).unwrap(),
                        Extracted::Absent,
                        "path {name} in {v}"
                    );
                }
            }
        }
    }

    #[test]
    fn terminal_collection_dedups() {
        let cs = schema();
        let v = json!({"tags": ["b", "a", "b"]});
        let got = extract(cs.path("tags").unwrap(), &v).unwrap();
        let want: BTreeSet<_> = ["a", "b"]
            .into_iter()
            .map(|s| ScalarValue::Str(s.to_string()))
            .collect();
        assert_eq!(got, Extracted::Many(want));
    }

    #[test]
    fn two_collection_levels_flatten_to_one_set() {
        let cs = schema();
        // mids x leaves x nums: three collection levels, overlapping values
        let v = json!({"mids": [
            {"leaves": [{"nums": [1, 2, 3]}, {"nums": [3, 4]}]},
            {"leaves": [{"nums": [4, 5]}]}
        ]});
        let got = extract(cs.path("mids.leaves.nums").unwrap(), &v).unwrap();
        let want: BTreeSet<_> = (1..=5).map(ScalarValue::Int).collect();
        assert_eq!(got, Extracted::Many(want));
    }

    #[test]
    fn single_valued_prefix_recurses_directly() {
        let cs = schema();
        let v = json!({"mid": {"leaves": [{"nums": [2, 1, 2]}]}});
        let got = extract(cs.path("mid.leaves.nums").unwrap(), &v).unwrap();
        let want: BTreeSet<_> = [1, 2].map(ScalarValue::Int).into_iter().collect();
        assert_eq!(got, Extracted::Many(want));
    }

    #[test]
    fn null_elements_skipped() {
        let cs = schema();
        let v = json!({"tags": [null, "a", null]});
        let got = extract(cs.path("tags").unwrap(), &v).unwrap();
        assert_eq!(
            got,
            Extracted::Many([ScalarValue::Str("a".into())].into_iter().collect())
        );
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let cs = schema();
        let v = json!({"tags": "not-an-array"});
        assert!(extract(cs.path("tags").unwrap(), &v).is_err());
        let v = json!({"x": "seven"});
        assert!(extract(cs.path("x").unwrap(), &v).is_err());
    }

    #[test]
    fn count_of_raw_collection() {
        let cs = schema();
        let p = cs.path("tags.size").unwrap();
        assert_eq!(extract_count(p, &json!({"tags": ["a", "b", "a"]})).unwrap(), 3);
        assert_eq!(extract_count(p, &json!({"tags": []})).unwrap(), 0);
        assert_eq!(extract_count(p, &json!({})).unwrap(), 0);
        assert_eq!(extract_count(p, &json!({"tags": null})).unwrap(), 0);
    }

    #[test]
    fn float_total_order_in_sets() {
        let a = ScalarValue::F64(OrderedFloat(-1.5));
        let b = ScalarValue::F64(OrderedFloat(0.0));
        let c = ScalarValue::F64(OrderedFloat(2.25));
        let set: BTreeSet<_> = [c.clone(), a.clone(), b.clone()].into_iter().collect();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn int32_range_enforced() {
        let cs = schema();
        let v = json!({"x": i64::from(i32::MAX) + 1});
        assert!(extract(cs.path("x").unwrap(), &v).is_err());
    }
}
