use std::mem;

use num::{BigInt, Signed, Zero};

use crate::error::{Error, Result};

/// Euclidean greatest common divisor of the absolute values, `gcd(0, b) == |b|`.
pub fn gcd(a: &BigInt, b: &BigInt) -> BigInt {
    let mut u = a.abs();
    let mut v = b.abs();
    while !u.is_zero() {
        v %= &u;
        mem::swap(&mut u, &mut v);
    }
    v
}

pub fn lcm(a: &BigInt, b: &BigInt) -> BigInt {
    if a == b {
        return a.abs();
    }
    let gcd = gcd(a, b);
    if gcd.is_zero() {
        return BigInt::zero();
    }
    (a * b).abs() / gcd
}

/// Folds [`lcm`] left to right over the list.
pub fn lcm_all<'a>(values: impl IntoIterator<Item = &'a BigInt>) -> Result<BigInt> {
    let mut iter = values.into_iter();
    let first = iter.next().ok_or(Error::EmptyList)?.abs();
    Ok(iter.fold(first, |acc, v| lcm(&acc, v)))
}
