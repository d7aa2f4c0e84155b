//! Prime field arithmetic for witness evaluation.
//!
//! [`Felt`] is a canonical residue (always `< p`); it does not carry its
//! modulus. All arithmetic goes through a [`Field`], which holds the prime
//! of the graph being evaluated and keeps results canonical.

use std::{cmp::Ordering, fmt};

use num_bigint::{BigInt, BigUint, Sign};

//===----------------------------------------------------------------------===//
// Felt
//===----------------------------------------------------------------------===//

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Felt(BigUint);

impl Felt {
    pub fn is_zero(&self) -> bool {
        self.0 == 0usize.into()
    }

    pub fn is_one(&self) -> bool {
        self.0 == 1usize.into()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Low 64 bits of the canonical residue.
    pub fn low_u64(&self) -> u64 {
        self.0.iter_u64_digits().next().unwrap_or(0)
    }
}

impl From<BigUint> for Felt {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl From<u64> for Felt {
    fn from(value: u64) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//===----------------------------------------------------------------------===//
// Field
//===----------------------------------------------------------------------===//

/// Arithmetic context for one prime modulus.
///
/// Comparison and shift operators follow the signed-value convention used by
/// circuit compilers: a residue above `(p - 1) / 2` stands for the negative
/// value `residue - p`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    prime: BigUint,
    half: BigUint,
}

/// Shift counts at or above this many bits always produce zero.
///
/// Keeps a hostile graph from requesting a multi-gigabyte left shift; no
/// supported prime is anywhere near 2^256 wide.
const MAX_SHIFT_BITS: u64 = 256;

impl Field {
    /// Builds the context for a prime `p >= 2`. The caller is responsible for
    /// primality; the graph decoder only rejects 0 and 1.
    pub fn new(prime: BigUint) -> Self {
        let half = (&prime - 1usize) >> 1;
        Self { prime, half }
    }

    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    pub fn zero(&self) -> Felt {
        Felt(BigUint::from(0usize))
    }

    pub fn one(&self) -> Felt {
        Felt(BigUint::from(1usize))
    }

    /// Canonical residue of an arbitrary unsigned integer.
    pub fn felt(&self, v: BigUint) -> Felt {
        Felt(v % &self.prime)
    }

    /// Canonical residue of a signed integer; `-v` maps to `p - (v mod p)`.
    pub fn felt_from_signed(&self, v: &BigInt) -> Felt {
        let reduced = v.magnitude() % &self.prime;
        match v.sign() {
            Sign::Minus if reduced != 0usize.into() => Felt(&self.prime - reduced),
            _ => Felt(reduced),
        }
    }

    pub fn add(&self, a: &Felt, b: &Felt) -> Felt {
        Felt((&a.0 + &b.0) % &self.prime)
    }

    pub fn sub(&self, a: &Felt, b: &Felt) -> Felt {
        // Stay in unsigned arithmetic: BigUint subtraction underflows.
        Felt((&a.0 + &self.prime - &b.0) % &self.prime)
    }

    pub fn neg(&self, a: &Felt) -> Felt {
        if a.is_zero() {
            self.zero()
        } else {
            Felt(&self.prime - &a.0)
        }
    }

    pub fn mul(&self, a: &Felt, b: &Felt) -> Felt {
        Felt((&a.0 * &b.0) % &self.prime)
    }

    /// `a^b` with the exponent taken as the canonical residue. `0^0 = 1`.
    pub fn pow(&self, a: &Felt, b: &Felt) -> Felt {
        Felt(a.0.modpow(&b.0, &self.prime))
    }

    /// Multiplicative inverse, `None` for zero.
    pub fn inv(&self, a: &Felt) -> Option<Felt> {
        a.0.modinv(&self.prime).map(Felt)
    }

    /// Field division `a * b^-1`, `None` for a zero divisor.
    pub fn div(&self, a: &Felt, b: &Felt) -> Option<Felt> {
        self.inv(b).map(|inv| self.mul(a, &inv))
    }

    /// Integer quotient of the canonical residues, `None` for a zero divisor.
    pub fn int_div(&self, a: &Felt, b: &Felt) -> Option<Felt> {
        if b.is_zero() {
            None
        } else {
            Some(Felt(&a.0 / &b.0))
        }
    }

    /// Integer remainder of the canonical residues, `None` for a zero divisor.
    pub fn rem(&self, a: &Felt, b: &Felt) -> Option<Felt> {
        if b.is_zero() {
            None
        } else {
            Some(Felt(&a.0 % &b.0))
        }
    }

    /// Compares `a` and `b` as signed values.
    pub fn cmp_signed(&self, a: &Felt, b: &Felt) -> Ordering {
        match (a.0 > self.half, b.0 > self.half) {
            // Same sign: residue order is value order, also for two
            // negatives since both are offset by the same `- p`.
            (false, false) | (true, true) => a.0.cmp(&b.0),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
        }
    }

    /// Encodes a boolean as `0` or `1`.
    pub fn bool_felt(&self, b: bool) -> Felt {
        if b { self.one() } else { self.zero() }
    }

    /// Boolean interpretation: any nonzero residue is true.
    pub fn is_true(&self, a: &Felt) -> bool {
        !a.is_zero()
    }

    pub fn band(&self, a: &Felt, b: &Felt) -> Felt {
        Felt(&a.0 & &b.0)
    }

    pub fn bor(&self, a: &Felt, b: &Felt) -> Felt {
        Felt((&a.0 | &b.0) % &self.prime)
    }

    pub fn bxor(&self, a: &Felt, b: &Felt) -> Felt {
        Felt((&a.0 ^ &b.0) % &self.prime)
    }

    /// `a << b`, reduced. Counts of [`MAX_SHIFT_BITS`] or more yield zero.
    pub fn shl(&self, a: &Felt, b: &Felt) -> Felt {
        match self.shift_count(b) {
            Some(k) => Felt((&a.0 << k) % &self.prime),
            None => self.zero(),
        }
    }

    /// `a >> b` on the canonical residue. Large counts yield zero.
    pub fn shr(&self, a: &Felt, b: &Felt) -> Felt {
        match self.shift_count(b) {
            Some(k) => Felt(&a.0 >> k),
            None => self.zero(),
        }
    }

    fn shift_count(&self, b: &Felt) -> Option<u64> {
        if b.0.bits() > 64 {
            return None;
        }
        let k = b.low_u64();
        (k < MAX_SHIFT_BITS).then_some(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn f97() -> Field {
        Field::new(BigUint::from(97usize))
    }

    fn felt(v: u64) -> Felt {
        Felt::from(v)
    }

    #[rstest]
    #[case(3, 4, 7)]
    #[case(96, 1, 0)]
    #[case(96, 96, 95)]
    fn add(f97: Field, #[case] a: u64, #[case] b: u64, #[case] expected: u64) {
        assert_eq!(f97.add(&felt(a), &felt(b)), felt(expected));
    }

    #[rstest]
    #[case(3, 4, 96)]
    #[case(4, 3, 1)]
    #[case(0, 1, 96)]
    fn sub_wraps(f97: Field, #[case] a: u64, #[case] b: u64, #[case] expected: u64) {
        assert_eq!(f97.sub(&felt(a), &felt(b)), felt(expected));
    }

    #[rstest]
    fn neg_zero_is_zero(f97: Field) {
        assert_eq!(f97.neg(&f97.zero()), f97.zero());
        assert_eq!(f97.neg(&felt(1)), felt(96));
    }

    #[rstest]
    #[case(0, 0, 1)]
    #[case(5, 0, 1)]
    #[case(2, 10, 1024 % 97)]
    fn pow(f97: Field, #[case] a: u64, #[case] b: u64, #[case] expected: u64) {
        assert_eq!(f97.pow(&felt(a), &felt(b)), felt(expected));
    }

    #[rstest]
    fn div_roundtrips(f97: Field) {
        let a = felt(17);
        let b = felt(23);
        let q = f97.div(&a, &b).unwrap();
        assert_eq!(f97.mul(&q, &b), a);
    }

    #[rstest]
    fn zero_divisors_are_rejected(f97: Field) {
        assert!(f97.div(&felt(1), &f97.zero()).is_none());
        assert!(f97.int_div(&felt(1), &f97.zero()).is_none());
        assert!(f97.rem(&felt(1), &f97.zero()).is_none());
        assert!(f97.inv(&f97.zero()).is_none());
    }

    #[rstest]
    #[case(7, 2, 3, 1)]
    #[case(96, 5, 19, 1)]
    fn integer_ops(
        f97: Field,
        #[case] a: u64,
        #[case] b: u64,
        #[case] quot: u64,
        #[case] rem: u64,
    ) {
        assert_eq!(f97.int_div(&felt(a), &felt(b)).unwrap(), felt(quot));
        assert_eq!(f97.rem(&felt(a), &felt(b)).unwrap(), felt(rem));
    }

    // 96 is -1 and 49 is -48 mod 97; residue order and signed order differ.
    #[rstest]
    #[case(96, 0, Ordering::Less)]
    #[case(0, 96, Ordering::Greater)]
    #[case(96, 49, Ordering::Greater)]
    #[case(3, 4, Ordering::Less)]
    #[case(48, 48, Ordering::Equal)]
    fn signed_compare(f97: Field, #[case] a: u64, #[case] b: u64, #[case] expected: Ordering) {
        assert_eq!(f97.cmp_signed(&felt(a), &felt(b)), expected);
    }

    #[rstest]
    fn signed_parsing(f97: Field) {
        let minus_one: BigInt = (-1).into();
        assert_eq!(f97.felt_from_signed(&minus_one), felt(96));
        let zero: BigInt = 0.into();
        assert_eq!(f97.felt_from_signed(&zero), f97.zero());
        let positive: BigInt = 100.into();
        assert_eq!(f97.felt_from_signed(&positive), felt(3));
    }

    #[rstest]
    #[case(0b1100, 0b1010, 0b1000, 0b1110 % 97, 0b0110)]
    fn bitwise(
        f97: Field,
        #[case] a: u64,
        #[case] b: u64,
        #[case] and: u64,
        #[case] or: u64,
        #[case] xor: u64,
    ) {
        assert_eq!(f97.band(&felt(a), &felt(b)), felt(and));
        assert_eq!(f97.bor(&felt(a), &felt(b)), felt(or));
        assert_eq!(f97.bxor(&felt(a), &felt(b)), felt(xor));
    }

    #[rstest]
    fn shifts(f97: Field) {
        assert_eq!(f97.shl(&felt(3), &felt(4)), felt(48 % 97));
        assert_eq!(f97.shr(&felt(48), &felt(4)), felt(3));
    }

    // Residues of a small prime never reach the cap, so use a wide one.
    #[rstest]
    fn oversized_shift_counts() {
        let wide = Field::new((BigUint::from(1usize) << 255) - 19usize);
        assert_eq!(wide.shl(&felt(3), &felt(256)), wide.zero());
        assert_eq!(wide.shr(&felt(3), &felt(256)), wide.zero());
        // 2^255 = 19 mod p, so 3 << 255 lands on 57.
        assert_eq!(wide.shl(&felt(3), &felt(255)), felt(57));
    }

    #[rstest]
    fn booleans(f97: Field) {
        assert!(f97.is_true(&felt(42)));
        assert!(!f97.is_true(&f97.zero()));
        assert_eq!(f97.bool_felt(true), f97.one());
        assert_eq!(f97.bool_felt(false), f97.zero());
    }
}
