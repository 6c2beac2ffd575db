use plonky2::field::secp256k1_scalar::Secp256K1Scalar;
use plonky2::field::types::{Field, PrimeField};

/// The prime field memory values, addresses and witnesses live in.
///
/// It is 256 bits wide, so every `U128` value, every 64-bit global address
/// and every timestamp embeds without wrapping.
pub type FieldElement = Secp256K1Scalar;

#[must_use]
pub fn fe_from_u128(n: u128) -> FieldElement { FieldElement::from_noncanonical_u128(n) }

#[must_use]
pub fn fe_from_u64(n: u64) -> FieldElement { FieldElement::from_canonical_u64(n) }

/// Canonical representative of `x` as a `u128`, if it fits.
#[must_use]
pub fn fe_to_u128(x: FieldElement) -> Option<u128> {
    match x.to_canonical_biguint().to_u64_digits()[..] {
        [] => Some(0),
        [lo] => Some(u128::from(lo)),
        [lo, hi] => Some(u128::from(lo) | (u128::from(hi) << 64)),
        _ => None,
    }
}

/// The low 128 bits of the canonical representative of `x`.
#[must_use]
pub fn fe_low_u128(x: FieldElement) -> u128 {
    let digits = x.to_canonical_biguint().to_u64_digits();
    let lo = digits.first().copied().unwrap_or_default();
    let hi = digits.get(1).copied().unwrap_or_default();
    u128::from(lo) | (u128::from(hi) << 64)
}

/// Mask selecting the low `bits` bits of a `u128`.
#[must_use]
pub fn low_mask(bits: u32) -> u128 {
    if bits >= u128::BITS {
        u128::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Split a `u128` into its low and high 64-bit halves.
#[must_use]
pub fn split_u128(x: u128) -> (u128, u128) { (x & low_mask(64), x >> 64) }

/// Full 256-bit product of two `u128`s, as `(lo, hi)` 128-bit words.
#[must_use]
pub fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_lo, a_hi) = split_u128(a);
    let (b_lo, b_hi) = split_u128(b);

    // Each partial product is below 2^128.
    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    let (mid, mid_carry) = lo_hi.overflowing_add(hi_lo);
    let (lo, lo_carry) = lo_lo.overflowing_add(mid << 64);
    let hi = hi_hi + (mid >> 64) + (u128::from(mid_carry) << 64) + u128::from(lo_carry);
    (lo, hi)
}
