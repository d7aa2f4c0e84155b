//! Binary witness output.
//!
//! The writer produces version 2 witness files: a 12-byte file header
//! (`"wtns"`, version, section count), a header section carrying the field
//! size in bytes, the prime and the witness length, and a data section with
//! the values, each little-endian and zero-padded to the field size.

use num_bigint::BigUint;

use crate::field::Felt;

pub const WTNS_MAGIC: [u8; 4] = *b"wtns";
pub const WTNS_VERSION: u32 = 2;

const HEADER_SECTION: u32 = 1;
const DATA_SECTION: u32 = 2;

/// Serialized size of one field element: the prime's width rounded up to
/// whole 64-bit words.
pub fn field_size(prime: &BigUint) -> usize {
    (prime.bits().div_ceil(64) * 8) as usize
}

/// Exact size in bytes of the encoded file for `n_witness` values.
pub fn encoded_len(prime: &BigUint, n_witness: usize) -> usize {
    // 12-byte file header plus two 12-byte section headers plus the header
    // section payload (4 + fs + 4) plus the values.
    let fs = field_size(prime);
    44 + fs * (n_witness + 1)
}

/// Encodes a witness vector over `prime`.
pub fn encode(prime: &BigUint, witness: &[Felt]) -> Vec<u8> {
    let fs = field_size(prime);
    let mut out = Vec::with_capacity(encoded_len(prime, witness.len()));

    out.extend_from_slice(&WTNS_MAGIC);
    push_u32(&mut out, WTNS_VERSION);
    push_u32(&mut out, 2);

    push_u32(&mut out, HEADER_SECTION);
    push_u64(&mut out, (8 + fs) as u64);
    push_u32(&mut out, fs as u32);
    push_padded(&mut out, prime, fs);
    push_u32(&mut out, witness.len() as u32);

    push_u32(&mut out, DATA_SECTION);
    push_u64(&mut out, (witness.len() * fs) as u64);
    for value in witness {
        push_padded(&mut out, value.as_biguint(), fs);
    }

    out
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_padded(out: &mut Vec<u8>, v: &BigUint, fs: usize) {
    let bytes = v.to_bytes_le();
    out.extend_from_slice(&bytes);
    out.resize(out.len() + (fs - bytes.len()), 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Cursor<'a>(&'a [u8]);

    impl<'a> Cursor<'a> {
        fn u32(&mut self) -> u32 {
            let (head, rest) = self.0.split_at(4);
            self.0 = rest;
            u32::from_le_bytes(head.try_into().unwrap())
        }

        fn u64(&mut self) -> u64 {
            let (head, rest) = self.0.split_at(8);
            self.0 = rest;
            u64::from_le_bytes(head.try_into().unwrap())
        }

        fn bytes(&mut self, n: usize) -> &'a [u8] {
            let (head, rest) = self.0.split_at(n);
            self.0 = rest;
            head
        }
    }

    #[rstest]
    #[case(97usize, 8)]
    #[case(257, 8)]
    fn field_sizes_round_to_words(#[case] prime: usize, #[case] fs: usize) {
        assert_eq!(field_size(&BigUint::from(prime)), fs);
    }

    #[test]
    fn bn254_encodes_32_byte_elements() {
        let prime = BigUint::parse_bytes(
            b"21888242871839275222246405745257275088548364400416034343698204186575808495617",
            10,
        )
        .unwrap();
        assert_eq!(prime.bits(), 254);
        assert_eq!(field_size(&prime), 32);
    }

    #[test]
    fn layout_matches_the_format() {
        let prime = BigUint::from(97usize);
        let witness: Vec<Felt> = [1u64, 12, 3, 4].into_iter().map(Felt::from).collect();
        let out = encode(&prime, &witness);
        assert_eq!(out.len(), encoded_len(&prime, witness.len()));

        assert_eq!(&out[..4], &WTNS_MAGIC);
        let mut c = Cursor(&out[4..]);
        assert_eq!(c.u32(), WTNS_VERSION);
        assert_eq!(c.u32(), 2);

        assert_eq!(c.u32(), HEADER_SECTION);
        assert_eq!(c.u64(), 16);
        assert_eq!(c.u32(), 8);
        assert_eq!(c.bytes(8), &[97, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(c.u32(), 4);

        assert_eq!(c.u32(), DATA_SECTION);
        assert_eq!(c.u64(), 32);
        for expected in [1u64, 12, 3, 4] {
            assert_eq!(c.bytes(8), expected.to_le_bytes());
        }
        assert!(c.0.is_empty());
    }

    #[test]
    fn empty_witness_still_carries_both_sections() {
        let prime = BigUint::from((1u128 << 89) - 1);
        let out = encode(&prime, &[]);
        assert_eq!(out.len(), encoded_len(&prime, 0));
        assert_eq!(out.len(), 44 + 16);
        let mut c = Cursor(&out[4..]);
        c.u32();
        assert_eq!(c.u32(), 2);
    }
}
