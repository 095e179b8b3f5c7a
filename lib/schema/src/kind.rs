use std::fmt;

/// The closed set of semantic field kinds.
///
/// Every terminal field path carries exactly one kind, fixed at compile
/// time. The kind decides how values are encoded at index time and how
/// exact-match predicates are built at query time:
///
/// - `Int32` / `Int64` / `Size` - range-comparable integer point encoding
/// - `Float32` / `Float64` - float point encoding; when the path is a sort
///   key the engine additionally keeps a monotonic sortable integer column
/// - `BigInt` - 16-byte order-preserving big-endian encoding
/// - `Bool` - the two-literal exact strings `"true"` / `"false"`
/// - `Keyword` - verbatim literal-match string
/// - `Text` - tokenized string, routed through the path's tokenizer
///
/// `Size` is the cardinality-count kind: it records the element count of a
/// collection attribute, not its elements, under a `.size`-suffixed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int32,
    Int64,
    BigInt,
    Float32,
    Float64,
    Bool,
    Keyword,
    Text,
    Size,
}

impl FieldKind {
    /// Kinds that may carry the `sorted` flag.
    pub fn sortable(self) -> bool {
        matches!(
            self,
            FieldKind::Int32
                | FieldKind::Int64
                | FieldKind::Float32
                | FieldKind::Float64
                | FieldKind::Size
        )
    }

    /// Kinds whose values are strings.
    pub fn is_string(self) -> bool {
        matches!(self, FieldKind::Keyword | FieldKind::Text)
    }

    /// Only tokenized text accepts a tokenizer override.
    pub fn tokenized(self) -> bool {
        matches!(self, FieldKind::Text)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::BigInt => "bigint",
            FieldKind::Float32 => "float32",
            FieldKind::Float64 => "float64",
            FieldKind::Bool => "bool",
            FieldKind::Keyword => "keyword",
            FieldKind::Text => "text",
            FieldKind::Size => "size",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sortable_kinds() {
        assert!(FieldKind::Int32.sortable());
        assert!(FieldKind::Float64.sortable());
        assert!(FieldKind::Size.sortable());
        assert!(!FieldKind::BigInt.sortable());
        assert!(!FieldKind::Bool.sortable());
        assert!(!FieldKind::Keyword.sortable());
        assert!(!FieldKind::Text.sortable());
    }

    #[test]
    fn tokenizer_only_on_text() {
        assert!(FieldKind::Text.tokenized());
        assert!(!FieldKind::Keyword.tokenized());
    }
}
