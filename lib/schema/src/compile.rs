//! Schema compilation.
//!
//! Compiling a [`TypeDescriptor`] flattens its nested-type graph into an
//! immutable table of dotted field paths (`a.b.c`), each carrying its
//! terminal encoding metadata. Compilation also runs every fit check the
//! declarative model still needs: flag/kind combinations, path name
//! hygiene, duplicate detection, and cycle rejection.

use ahash::AHashMap;

use crate::descriptor::{AttrValue, DocIdSpec, Shape, TypeDescriptor};
use crate::error::SchemaError;
use crate::kind::FieldKind;
use crate::LeafSpec;

/// Reserved field name for the serialized instance blob.
pub const SOURCE_FIELD: &str = "_source";

/// One step along a field path: the attribute to read, and whether the
/// value at that step is a collection that must be fanned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub attr: String,
    pub multi: bool,
}

/// An ordered, non-empty walk from the type root to one terminal
/// attribute, keyed by its dotted name.
#[derive(Debug, Clone)]
pub struct FieldPath {
    /// Step names joined with `.`; cardinality paths end in `.size`.
    pub name: String,
    pub steps: Vec<PathStep>,
    pub leaf: LeafSpec,
}

impl FieldPath {
    pub fn kind(&self) -> FieldKind {
        self.leaf.kind
    }

    /// True when any step of the path crosses a collection.
    pub fn is_multi(&self) -> bool {
        self.steps.iter().any(|s| s.multi)
    }
}

/// Immutable compiled form of a [`TypeDescriptor`].
///
/// Built once per domain type and shared for the process lifetime; a
/// dotted name resolves to exactly one [`FieldPath`].
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    type_name: String,
    doc_id: DocIdSpec,
    paths: Vec<FieldPath>,
    by_name: AHashMap<String, usize>,
    store_source: bool,
    default_tokenizer: String,
}

impl CompiledSchema {
    pub fn compile(td: &TypeDescriptor) -> Result<Self, SchemaError> {
        let doc_id = td.doc_id.clone().ok_or_else(|| SchemaError::MissingDocId {
            type_name: td.name.clone(),
        })?;
        check_attr_name(&td.name, &doc_id.attr)?;

        let mut paths = Vec::new();
        let mut visiting = vec![td.name.clone()];
        walk(td, &mut Vec::new(), &mut visiting, &mut paths)?;

        let mut by_name = AHashMap::with_capacity(paths.len());
        for (i, p) in paths.iter().enumerate() {
            if p.name == doc_id.attr || by_name.insert(p.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicatePath {
                    type_name: td.name.clone(),
                    path: p.name.clone(),
                });
            }
        }

        Ok(Self {
            type_name: td.name.clone(),
            doc_id,
            paths,
            by_name,
            store_source: td.store_source,
            default_tokenizer: td.default_tokenizer.clone(),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn doc_id(&self) -> &DocIdSpec {
        &self.doc_id
    }

    pub fn store_source(&self) -> bool {
        self.store_source
    }

    pub fn default_tokenizer(&self) -> &str {
        &self.default_tokenizer
    }

    /// Resolve a dotted name to its compiled path.
    pub fn path(&self, name: &str) -> Option<&FieldPath> {
        self.by_name.get(name).map(|&i| &self.paths[i])
    }

    /// All compiled paths, in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn check_attr_name(type_name: &str, attr: &str) -> Result<(), SchemaError> {
    if attr.is_empty() || attr.contains('.') || attr == SOURCE_FIELD {
        return Err(SchemaError::BadAttrName {
            type_name: type_name.to_string(),
            attr: attr.to_string(),
        });
    }
    Ok(())
}

/// Depth-first walk over the descriptor graph, prefixing nested leaves
/// with their ancestors' attribute names. Text leaves without an
/// override inherit the default tokenizer of the descriptor that
/// declares them. `visiting` is the stack of descriptor names on the
/// current branch; revisiting one is a cycle.
fn walk(
    td: &TypeDescriptor,
    prefix: &mut Vec<PathStep>,
    visiting: &mut Vec<String>,
    out: &mut Vec<FieldPath>,
) -> Result<(), SchemaError> {
    for attr in &td.attrs {
        check_attr_name(&td.name, &attr.name)?;
        match &attr.value {
            AttrValue::Leaf(spec) => {
                fit_check(&td.name, &attr.name, attr.shape, spec)?;
                let mut steps = prefix.clone();
                steps.push(PathStep {
                    attr: attr.name.clone(),
                    multi: attr.shape.is_multi(),
                });
                let mut name = steps
                    .iter()
                    .map(|s| s.attr.as_str())
                    .collect::<Vec<_>>()
                    .join(".");
                if spec.kind == FieldKind::Size {
                    name.push_str(".size");
                }
                let mut leaf = spec.clone();
                if leaf.kind == FieldKind::Text && leaf.tokenizer.is_none() {
                    leaf.tokenizer = Some(td.default_tokenizer.clone());
                }
                out.push(FieldPath { name, steps, leaf });
            }
            AttrValue::Nested(nested) => {
                let nested = nested();
                if visiting.contains(&nested.name) {
                    return Err(SchemaError::CyclicType {
                        type_name: nested.name,
                    });
                }
                visiting.push(nested.name.clone());
                prefix.push(PathStep {
                    attr: attr.name.clone(),
                    multi: attr.shape.is_multi(),
                });
                walk(&nested, prefix, visiting, out)?;
                prefix.pop();
                visiting.pop();
            }
        }
    }
    Ok(())
}

fn fit_check(
    type_name: &str,
    attr: &str,
    shape: Shape,
    spec: &LeafSpec,
) -> Result<(), SchemaError> {
    if spec.kind == FieldKind::Size && !shape.is_multi() {
        return Err(SchemaError::NotCollection {
            type_name: type_name.to_string(),
            attr: attr.to_string(),
            kind: spec.kind,
        });
    }
    if spec.sorted && !spec.kind.sortable() {
        return Err(SchemaError::NotSortable {
            type_name: type_name.to_string(),
            attr: attr.to_string(),
            kind: spec.kind,
        });
    }
    if spec.tokenizer.is_some() && !spec.kind.tokenized() {
        return Err(SchemaError::TokenizerNotAllowed {
            type_name: type_name.to_string(),
            attr: attr.to_string(),
        });
    }
    Ok(())
}
