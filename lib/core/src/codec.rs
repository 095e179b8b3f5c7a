//! Point encodings that tantivy does not provide natively.
//!
//! Big integers index as 16-byte big-endian terms with the sign bit
//! flipped, so unsigned byte order equals signed numeric order and an
//! exact-match bytes term hits the same encoding written at index time.

/// Order-preserving encoding of an `i128`.
pub fn bigint_to_bytes(v: i128) -> [u8; 16] {
    ((v as u128) ^ (1u128 << 127)).to_be_bytes()
}

/// Inverse of [`bigint_to_bytes`].
pub fn bigint_from_bytes(b: [u8; 16]) -> i128 {
    (u128::from_be_bytes(b) ^ (1u128 << 127)) as i128
}

/// The two-literal exact-string encoding for booleans.
pub fn bool_literal(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bigint_roundtrip() {
        for v in [i128::MIN, -1, 0, 1, i128::MAX, 42, -99999999999999999999999999] {
            assert_eq!(bigint_from_bytes(bigint_to_bytes(v)), v);
        }
    }

    #[test]
    fn bigint_encoding_preserves_order() {
        let mut samples = [
            i128::MIN,
            -170141183460469231731687303715884105727,
            -1_000_000_000_000_000_000_000,
            -2,
            -1,
            0,
            1,
            7,
            1_000_000_000_000_000_000_000,
            i128::MAX,
        ];
        samples.sort_unstable();
        for w in samples.windows(2) {
            assert!(bigint_to_bytes(w[0]) < bigint_to_bytes(w[1]), "{} vs {}", w[0], w[1]);
        }
    }

    #[test]
    fn bool_literals() {
        assert_eq!(bool_literal(true), "true");
        assert_eq!(bool_literal(false), "false");
    }
}
