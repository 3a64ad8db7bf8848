use std::hint::black_box;

/// Compare two byte strings without short-circuiting.
///
/// Every byte of the longer input is inspected and the differences are
/// OR-accumulated, so running time depends only on the input lengths and not
/// on where (or whether) the inputs differ.
///
/// # Returns
/// True if both inputs have the same length and contents
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    black_box(diff(a, b)) == 0
}

/// OR of `a[i] ^ b[i]` over the longer input, with the length XOR folded in.
fn diff(a: &[u8], b: &[u8]) -> u64 {
    let len = a.len().max(b.len());
    let mut acc = (a.len() ^ b.len()) as u64;

    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        acc |= u64::from(black_box(x ^ y));
    }

    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_inputs() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(constant_time_eq(&[0u8; 32], &[0u8; 32]));
    }

    #[test]
    fn test_difference_at_any_position() {
        let reference = [7u8; 32];
        for position in 0..reference.len() {
            let mut other = reference;
            other[position] ^= 0x01;
            assert!(!constant_time_eq(&reference, &other));
        }
    }

    #[test]
    fn test_every_byte_reaches_the_accumulator() {
        let a = [0u8; 4];

        // Differences after the first mismatch are still OR-ed in
        assert_eq!(diff(&a, &[0x01, 0x02, 0x04, 0x08]), 0x0F);
        assert_eq!(diff(&a, &[0x01, 0x00, 0x00, 0x80]), 0x81);
        assert_eq!(diff(&a, &[0x00, 0x00, 0x00, 0x40]), 0x40);

        // Trailing bytes of the longer input count too
        assert_eq!(diff(b"ab", b"ab\x10"), 0x10 | (2 ^ 3));
        assert_eq!(diff(b"ab\x20\x01", b"ab"), 0x21 | (4 ^ 2));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abc"));
        assert!(!constant_time_eq(b"", b"\0"));
    }

    #[test]
    fn test_zero_padding_does_not_match() {
        // Missing bytes are read as zero, the length term must still fail it.
        assert!(!constant_time_eq(b"ab\0", b"ab"));
    }
}
