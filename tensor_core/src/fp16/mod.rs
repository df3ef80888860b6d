//! `Half`: an IEEE 754 binary16 value (1 sign, 5 exponent, 10 mantissa bits).
//!
//! Every conversion and arithmetic operator has two bodies, chosen when the
//! crate is compiled:
//!
//! - `host` (default): operands are widened to f32 with `half`'s portable
//!   software routines, the operation runs in f32, and the result is narrowed
//!   back with round-to-nearest-even.
//! - `native` (`target_arch = "nvptx64"` or the `native-f16` feature): storage
//!   is reinterpreted as the platform half type and its own conversion and
//!   arithmetic are used, so rounding and special values follow that unit.
//!
//! The two paths are each deterministic but are not promised to agree bit for
//! bit on every input. No operation here can fail: NaN stays NaN and values
//! outside the half range saturate to infinity.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use half::f16;
use num_traits::{One, Zero};

#[cfg(not(any(target_arch = "nvptx64", feature = "native-f16")))]
mod host;
#[cfg(not(any(target_arch = "nvptx64", feature = "native-f16")))]
use host as backend;

#[cfg(any(target_arch = "nvptx64", feature = "native-f16"))]
mod native;
#[cfg(any(target_arch = "nvptx64", feature = "native-f16"))]
use native as backend;

const SIGN_MASK: u16 = 0x8000;
const EXP_MASK: u16 = 0x7C00;
const ABS_MASK: u16 = 0x7FFF;

/// Half-precision float with opaque 16-bit storage.
///
/// Construction from and conversion to `f32` are explicit (`from_f32`,
/// `to_f32`); there is no `From<f32>` so narrowing never happens silently.
/// Equality compares the stored bits: `+0.0 != -0.0` and a NaN equals itself
/// when the payloads match.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Half(u16);

impl Half {
    pub const ZERO: Half = Half(0x0000);
    pub const NEG_ZERO: Half = Half(0x8000);
    pub const ONE: Half = Half(0x3C00);
    pub const NEG_ONE: Half = Half(0xBC00);
    /// Largest finite value, 65504.
    pub const MAX: Half = Half(0x7BFF);
    /// Smallest positive subnormal, 2^-24.
    pub const MIN_POSITIVE_SUBNORMAL: Half = Half(0x0001);
    /// Difference between 1.0 and the next representable value, 2^-10.
    pub const EPSILON: Half = Half(0x1400);
    pub const INFINITY: Half = Half(0x7C00);
    pub const NEG_INFINITY: Half = Half(0xFC00);
    pub const NAN: Half = Half(0x7E00);

    /// Name of the arithmetic backend compiled into this build.
    pub const BACKEND: &'static str = backend::NAME;

    /// Narrows an f32 with round-to-nearest-even.
    #[inline]
    pub fn from_f32(value: f32) -> Half {
        backend::from_f32(value)
    }

    /// Widens to f32. Exact for every half value.
    #[inline]
    pub fn to_f32(self) -> f32 {
        backend::to_f32(self)
    }

    #[inline]
    pub const fn from_bits(bits: u16) -> Half {
        Half(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Reinterprets a platform half value as `Half`.
    ///
    /// This pair is the only place storage bits cross into or out of
    /// `half::f16`; both backends go through it.
    #[inline(always)]
    pub const fn from_native(value: f16) -> Half {
        Half(value.to_bits())
    }

    #[inline(always)]
    pub const fn to_native(self) -> f16 {
        f16::from_bits(self.0)
    }

    #[inline]
    pub const fn is_nan(self) -> bool {
        self.0 & ABS_MASK > EXP_MASK
    }

    #[inline]
    pub const fn is_infinite(self) -> bool {
        self.0 & ABS_MASK == EXP_MASK
    }

    #[inline]
    pub const fn is_finite(self) -> bool {
        self.0 & EXP_MASK != EXP_MASK
    }

    #[inline]
    pub const fn is_sign_negative(self) -> bool {
        self.0 & SIGN_MASK != 0
    }
}

impl From<Half> for f32 {
    #[inline]
    fn from(value: Half) -> f32 {
        value.to_f32()
    }
}

impl From<f16> for Half {
    #[inline]
    fn from(value: f16) -> Half {
        Half::from_native(value)
    }
}

impl From<Half> for f16 {
    #[inline]
    fn from(value: Half) -> f16 {
        value.to_native()
    }
}

impl Add for Half {
    type Output = Half;

    #[inline]
    fn add(self, rhs: Half) -> Half {
        backend::add(self, rhs)
    }
}

impl Sub for Half {
    type Output = Half;

    #[inline]
    fn sub(self, rhs: Half) -> Half {
        backend::sub(self, rhs)
    }
}

impl Mul for Half {
    type Output = Half;

    #[inline]
    fn mul(self, rhs: Half) -> Half {
        backend::mul(self, rhs)
    }
}

impl Div for Half {
    type Output = Half;

    #[inline]
    fn div(self, rhs: Half) -> Half {
        backend::div(self, rhs)
    }
}

impl AddAssign for Half {
    #[inline]
    fn add_assign(&mut self, rhs: Half) {
        *self = *self + rhs;
    }
}

impl SubAssign for Half {
    #[inline]
    fn sub_assign(&mut self, rhs: Half) {
        *self = *self - rhs;
    }
}

impl MulAssign for Half {
    #[inline]
    fn mul_assign(&mut self, rhs: Half) {
        *self = *self * rhs;
    }
}

impl DivAssign for Half {
    #[inline]
    fn div_assign(&mut self, rhs: Half) {
        *self = *self / rhs;
    }
}

impl Neg for Half {
    type Output = Half;

    // Sign flip, identical on both backends.
    #[inline]
    fn neg(self) -> Half {
        Half(self.0 ^ SIGN_MASK)
    }
}

impl Zero for Half {
    fn zero() -> Half {
        Half::ZERO
    }

    fn is_zero(&self) -> bool {
        self.0 & ABS_MASK == 0
    }
}

impl One for Half {
    fn one() -> Half {
        Half::ONE
    }
}

impl fmt::Debug for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Half({:?} = {:#06x})", self.to_f32(), self.0)
    }
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f32(), f)
    }
}
