use std::{
    cmp, fmt,
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use num::{BigInt, FromPrimitive, One, Signed, ToPrimitive, Zero};

use crate::{
    error::{Error, Result},
    math::{gcd, lcm},
    PRECISION,
};

/// Exact fraction kept in lowest terms with the sign on the numerator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rational {
    numer: BigInt,
    denom: BigInt,
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl Rational {
    fn normalize(&mut self) {
        if self.numer.is_zero() {
            self.denom = BigInt::one();
            return;
        }
        loop {
            let gcd = gcd(&self.numer, &self.denom);
            if gcd.is_one() {
                break;
            }
            self.numer /= &gcd;
            self.denom /= &gcd;
        }
        if self.denom.is_negative() {
            self.numer = -std::mem::take(&mut self.numer);
            self.denom = -std::mem::take(&mut self.denom);
        }
    }

    /// Caller guarantees a nonzero denominator.
    fn canonical(numer: BigInt, denom: BigInt) -> Self {
        let mut r = Self { numer, denom };
        r.normalize();
        r
    }

    pub fn zero() -> Self {
        Self {
            numer: BigInt::zero(),
            denom: BigInt::one(),
        }
    }

    pub fn one() -> Self {
        Self::from_integer(1)
    }

    pub fn from_integer(n: impl Into<BigInt>) -> Self {
        Self {
            numer: n.into(),
            denom: BigInt::one(),
        }
    }

    pub fn new(numer: impl Into<BigInt>, denom: impl Into<BigInt>) -> Result<Self> {
        let denom = denom.into();
        if denom.is_zero() {
            return Err(Error::ZeroDenominator);
        }
        Ok(Self::canonical(numer.into(), denom))
    }

    /// Scales by 10 until the remainder drops below 1e-8, so at most 8 decimal digits survive.
    pub fn from_decimal(mut value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::InvalidNumber(value.to_string()));
        }
        let mut denom = BigInt::one();
        while (value - value.round()).abs() > 1e-8 {
            value *= 10.0;
            denom *= 10;
        }
        let numer =
            BigInt::from_f64(value.round()).ok_or_else(|| Error::InvalidNumber(value.to_string()))?;
        Ok(Self::canonical(numer, denom))
    }

    pub fn numer(&self) -> &BigInt {
        &self.numer
    }

    pub fn denom(&self) -> &BigInt {
        &self.denom
    }

    pub fn is_zero(&self) -> bool {
        self.numer.is_zero()
    }

    pub fn flip(&self) -> Result<Self> {
        if self.is_zero() {
            return Err(Error::FlipZero);
        }
        Ok(Self::canonical(self.denom.clone(), self.numer.clone()))
    }

    pub fn try_div(&self, rhs: &Rational) -> Result<Self> {
        if rhs.is_zero() {
            return Err(Error::DivideByZero);
        }
        Ok(self.div_nonzero(rhs))
    }

    /// Caller guarantees `rhs` is nonzero.
    pub(crate) fn div_nonzero(&self, rhs: &Rational) -> Self {
        debug_assert!(!rhs.is_zero());
        Self::canonical(&self.numer * &rhs.denom, &self.denom * &rhs.numer)
    }

    pub fn try_div_int(&self, rhs: i64) -> Result<Self> {
        self.try_div(&Rational::from_integer(rhs))
    }

    /// Raises numerator and denominator independently. Negative exponents flip first.
    pub fn pow(&self, exp: i32) -> Result<Self> {
        let base = if exp < 0 { self.flip()? } else { self.clone() };
        let exp = exp.unsigned_abs();
        Ok(Self::canonical(base.numer.pow(exp), base.denom.pow(exp)))
    }

    /// Display-only view truncated toward zero at [`PRECISION`] fractional digits.
    pub fn decimal(&self) -> Decimal {
        let scale = BigInt::from(10u32).pow(PRECISION as u32);
        Decimal {
            scaled: &self.numer * &scale / &self.denom,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match (self.numer.to_f64(), self.denom.to_f64()) {
            (Some(n), Some(d)) => n / d,
            _ => f64::NAN,
        }
    }

    fn add_impl(&self, rhs: &Rational) -> Rational {
        let denom = lcm(&self.denom, &rhs.denom);
        let a = &self.numer * (&denom / &self.denom);
        let b = &rhs.numer * (&denom / &rhs.denom);
        Self::canonical(a + b, denom)
    }

    fn sub_impl(&self, rhs: &Rational) -> Rational {
        let denom = lcm(&self.denom, &rhs.denom);
        let a = &self.numer * (&denom / &self.denom);
        let b = &rhs.numer * (&denom / &rhs.denom);
        Self::canonical(a - b, denom)
    }

    fn mul_impl(&self, rhs: &Rational) -> Rational {
        Self::canonical(&self.numer * &rhs.numer, &self.denom * &rhs.denom)
    }
}

/// Truncated decimal rendering of a [`Rational`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    scaled: BigInt,
}

impl Decimal {
    pub fn to_f64(&self) -> f64 {
        self.scaled.to_f64().unwrap_or(f64::NAN) / 10f64.powi(PRECISION as i32)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = BigInt::from(10u32).pow(PRECISION as u32);
        let abs = self.scaled.abs();
        if self.scaled.is_negative() {
            write!(f, "-")?;
        }
        write!(
            f,
            "{}.{:0>width$}",
            &abs / &scale,
            (&abs % &scale).to_string(),
            width = PRECISION
        )
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        let lcm = lcm(&self.denom, &other.denom);
        let a = &self.numer * (&lcm / &self.denom);
        let b = &other.numer * (&lcm / &other.denom);
        a.cmp(&b)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom.is_one() {
            write!(f, "{}", self.numer)
        } else {
            write!(f, "{}/{}", self.numer, self.denom)
        }
    }
}

/// Parses the literal forms accepted in equations: `7`, `-7`, `3/4`, `3\4`, `1.5`, `1,5`.
impl FromStr for Rational {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                ',' => '.',
                '\\' => '/',
                c => c,
            })
            .collect();
        let invalid = || Error::InvalidNumber(s.to_string());
        if let Some((numer, denom)) = text.split_once('/') {
            let numer = BigInt::from_str(numer).map_err(|_| invalid())?;
            let denom = BigInt::from_str(denom).map_err(|_| invalid())?;
            Rational::new(numer, denom)
        } else if text.contains('.') {
            let value = f64::from_str(&text).map_err(|_| invalid())?;
            Rational::from_decimal(value)
        } else {
            BigInt::from_str(&text)
                .map(Rational::from_integer)
                .map_err(|_| invalid())
        }
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Rational::from_integer(n)
    }
}

impl From<BigInt> for Rational {
    fn from(n: BigInt) -> Self {
        Rational::from_integer(n)
    }
}

impl From<i32> for Rational {
    fn from(n: i32) -> Self {
        Rational::from_integer(n)
    }
}

impl From<usize> for Rational {
    fn from(n: usize) -> Self {
        Rational::from_integer(n)
    }
}

impl Neg for Rational {
    type Output = Rational;
    fn neg(self) -> Rational {
        Rational {
            numer: -self.numer,
            denom: self.denom,
        }
    }
}

impl Neg for &Rational {
    type Output = Rational;
    fn neg(self) -> Rational {
        Rational {
            numer: -&self.numer,
            denom: self.denom.clone(),
        }
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident, $inner:ident, $assign:ident, $assign_method:ident) => {
        impl $imp<Rational> for Rational {
            type Output = Rational;
            fn $method(self, rhs: Rational) -> Rational {
                self.$inner(&rhs)
            }
        }
        impl $imp<&Rational> for Rational {
            type Output = Rational;
            fn $method(self, rhs: &Rational) -> Rational {
                self.$inner(rhs)
            }
        }
        impl $imp<Rational> for &Rational {
            type Output = Rational;
            fn $method(self, rhs: Rational) -> Rational {
                self.$inner(&rhs)
            }
        }
        impl $imp<&Rational> for &Rational {
            type Output = Rational;
            fn $method(self, rhs: &Rational) -> Rational {
                self.$inner(rhs)
            }
        }
        impl $imp<i64> for Rational {
            type Output = Rational;
            fn $method(self, rhs: i64) -> Rational {
                self.$inner(&Rational::from_integer(rhs))
            }
        }
        impl $imp<i64> for &Rational {
            type Output = Rational;
            fn $method(self, rhs: i64) -> Rational {
                self.$inner(&Rational::from_integer(rhs))
            }
        }
        impl $imp<Rational> for i64 {
            type Output = Rational;
            fn $method(self, rhs: Rational) -> Rational {
                Rational::from_integer(self).$inner(&rhs)
            }
        }
        impl $assign<Rational> for Rational {
            fn $assign_method(&mut self, rhs: Rational) {
                *self = self.$inner(&rhs);
            }
        }
        impl $assign<&Rational> for Rational {
            fn $assign_method(&mut self, rhs: &Rational) {
                *self = self.$inner(rhs);
            }
        }
    };
}

forward_binop!(Add, add, add_impl, AddAssign, add_assign);
forward_binop!(Sub, sub, sub_impl, SubAssign, sub_assign);
forward_binop!(Mul, mul, mul_impl, MulAssign, mul_assign);

#[macro_export]
macro_rules! rat {
    (- $a:literal / $b:literal) => {
        match $crate::Rational::new(-$a, $b) {
            Ok(r) => r,
            Err(e) => panic!("{}", e),
        }
    };
    ($a:literal / $b:literal) => {
        match $crate::Rational::new($a, $b) {
            Ok(r) => r,
            Err(e) => panic!("{}", e),
        }
    };
    (- $c:literal) => {
        $crate::Rational::from_integer(-$c)
    };
    ($c:literal) => {
        $crate::Rational::from_integer($c)
    };
    () => {
        $crate::Rational::zero()
    };
}
