//! Declarative type descriptors.
//!
//! A [`TypeDescriptor`] is the startup-built replacement for runtime
//! attribute reflection: the mapped type states, once, which attributes it
//! exposes, their container shape, and the semantic kind of every leaf.
//! Nested object attributes reference the nested type's own descriptor
//! through a `fn() -> TypeDescriptor`, so type graphs can be declared
//! without ordering constraints. Validation happens when the descriptor is
//! compiled, not here.

use crate::kind::FieldKind;

/// Container shape of an attribute as it appears in the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    List,
    Set,
}

impl Shape {
    /// List and set attributes are multi-valued; everything else is not.
    pub fn is_multi(self) -> bool {
        !matches!(self, Shape::Scalar)
    }
}

/// Encoding metadata for a terminal (leaf) attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSpec {
    pub kind: FieldKind,
    /// Value retrievable verbatim from the engine.
    pub stored: bool,
    /// Usable as a sort key (numeric kinds only).
    pub sorted: bool,
    /// Searchable. Defaults to true.
    pub indexed: bool,
    /// Tokenizer override for `Text` leaves. `None` falls back to the
    /// descriptor's default tokenizer at compile time.
    pub tokenizer: Option<String>,
}

impl LeafSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            stored: false,
            sorted: false,
            indexed: true,
            tokenizer: None,
        }
    }

    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }

    pub fn sorted(mut self) -> Self {
        self.sorted = true;
        self
    }

    pub fn not_indexed(mut self) -> Self {
        self.indexed = false;
        self
    }

    pub fn tokenizer(mut self, name: impl Into<String>) -> Self {
        self.tokenizer = Some(name.into());
        self
    }
}

/// Lazily resolved reference to a nested type's descriptor.
pub type NestedRef = fn() -> TypeDescriptor;

/// What an attribute holds: a terminal leaf or a nested mapped object.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Leaf(LeafSpec),
    Nested(NestedRef),
}

/// One declared attribute of a mapped type.
#[derive(Debug, Clone)]
pub struct AttrSpec {
    pub name: String,
    pub shape: Shape,
    pub value: AttrValue,
}

/// The identifier attribute. Always a scalar string, always indexed as an
/// exact-match term and stored verbatim so deletes can resolve ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocIdSpec {
    pub attr: String,
}

/// Declarative schema table for one mapped domain type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Qualified type name; in durable mode it also derives the index
    /// directory (dots become path separators).
    pub name: String,
    pub doc_id: Option<DocIdSpec>,
    pub attrs: Vec<AttrSpec>,
    /// Persist the serialized instance blob alongside the flat fields.
    pub store_source: bool,
    /// Tokenizer for `Text` leaves without a per-field override.
    pub default_tokenizer: String,
}

impl TypeDescriptor {
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            inner: TypeDescriptor {
                name: name.into(),
                doc_id: None,
                attrs: Vec::new(),
                store_source: true,
                default_tokenizer: "default".to_string(),
            },
        }
    }
}

/// Builder for [`TypeDescriptor`].
///
/// ```
/// use tantex_schema::{FieldKind, LeafSpec, Shape, TypeDescriptor};
///
/// let td = TypeDescriptor::builder("shop.Product")
///     .doc_id("id")
///     .field("price", Shape::Scalar, LeafSpec::new(FieldKind::Float64).sorted().stored())
///     .field("tags", Shape::Set, LeafSpec::new(FieldKind::Keyword))
///     .field("tags", Shape::Set, LeafSpec::new(FieldKind::Size).stored())
///     .build();
/// assert_eq!(td.attrs.len(), 3);
/// ```
pub struct DescriptorBuilder {
    inner: TypeDescriptor,
}

impl DescriptorBuilder {
    pub fn doc_id(mut self, attr: impl Into<String>) -> Self {
        self.inner.doc_id = Some(DocIdSpec { attr: attr.into() });
        self
    }

    /// Declare a leaf attribute. The same attribute name may appear twice
    /// when one declaration is a [`FieldKind::Size`] cardinality record.
    pub fn field(mut self, name: impl Into<String>, shape: Shape, spec: LeafSpec) -> Self {
        self.inner.attrs.push(AttrSpec {
            name: name.into(),
            shape,
            value: AttrValue::Leaf(spec),
        });
        self
    }

    /// Declare a nested object attribute mapped by its own descriptor.
    pub fn nested(mut self, name: impl Into<String>, shape: Shape, nested: NestedRef) -> Self {
        self.inner.attrs.push(AttrSpec {
            name: name.into(),
            shape,
            value: AttrValue::Nested(nested),
        });
        self
    }

    /// Skip persisting the serialized instance blob.
    pub fn no_source(mut self) -> Self {
        self.inner.store_source = false;
        self
    }

    pub fn default_tokenizer(mut self, name: impl Into<String>) -> Self {
        self.inner.default_tokenizer = name.into();
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.inner
    }
}
