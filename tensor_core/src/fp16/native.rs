//! Native path: hand the operands to the platform half type.
//!
//! Conversions and operators are whatever `half::f16` provides for the
//! target. It uses F16C conversions on x86 and FP16 arithmetic on aarch64
//! when those target features are enabled; elsewhere `half` itself widens to
//! f32, so results then match the host path.

use half::f16;

use super::Half;

pub(super) const NAME: &str = "native";

#[inline]
pub(super) fn from_f32(value: f32) -> Half {
    Half::from_native(f16::from_f32(value))
}

#[inline]
pub(super) fn to_f32(value: Half) -> f32 {
    value.to_native().to_f32()
}

#[inline]
pub(super) fn add(a: Half, b: Half) -> Half {
    Half::from_native(a.to_native() + b.to_native())
}

#[inline]
pub(super) fn sub(a: Half, b: Half) -> Half {
    Half::from_native(a.to_native() - b.to_native())
}

#[inline]
pub(super) fn mul(a: Half, b: Half) -> Half {
    Half::from_native(a.to_native() * b.to_native())
}

#[inline]
pub(super) fn div(a: Half, b: Half) -> Half {
    Half::from_native(a.to_native() / b.to_native())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name() {
        assert_eq!(Half::BACKEND, "native");
    }

    #[test]
    fn test_native_ops_known_results() {
        let two = Half::from_f32(2.0);
        assert_eq!(add(Half::ONE, Half::ONE), two);
        assert_eq!(sub(Half::ONE, Half::from_f32(3.0)), Half::from_f32(-2.0));
        assert_eq!(mul(Half::from_f32(1.5), Half::from_f32(-0.75)).to_bits(), 0xBC80);
        assert_eq!(div(Half::NEG_ONE, Half::from_f32(4.0)).to_bits(), 0xB400);
    }

    #[test]
    fn test_native_ops_saturate_and_underflow() {
        assert_eq!(mul(Half::MAX, Half::from_f32(2.0)), Half::INFINITY);
        assert_eq!(add(Half::MAX, Half::MAX), Half::INFINITY);
        // 2^-25 is a tie between 0 and the smallest subnormal; ties go to even.
        assert_eq!(div(Half::MIN_POSITIVE_SUBNORMAL, Half::from_f32(2.0)), Half::ZERO);
        let sub_product = mul(Half::from_f32(2.0f32.powi(-12)), Half::from_f32(2.0f32.powi(-10)));
        assert_eq!(sub_product.to_bits(), 0x0004);
    }
}
