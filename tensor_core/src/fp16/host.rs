//! f32 emulation: widen, compute in single precision, narrow.
//!
//! Uses `half`'s const (pure software) conversions so the result does not
//! depend on which conversion instructions the host CPU happens to have.

use half::f16;

use super::Half;

pub(super) const NAME: &str = "host";

#[inline]
pub(super) fn from_f32(value: f32) -> Half {
    Half::from_native(f16::from_f32_const(value))
}

#[inline]
pub(super) fn to_f32(value: Half) -> f32 {
    value.to_native().to_f32_const()
}

#[inline]
pub(super) fn add(a: Half, b: Half) -> Half {
    from_f32(to_f32(a) + to_f32(b))
}

#[inline]
pub(super) fn sub(a: Half, b: Half) -> Half {
    from_f32(to_f32(a) - to_f32(b))
}

#[inline]
pub(super) fn mul(a: Half, b: Half) -> Half {
    from_f32(to_f32(a) * to_f32(b))
}

#[inline]
pub(super) fn div(a: Half, b: Half) -> Half {
    from_f32(to_f32(a) / to_f32(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name() {
        assert_eq!(Half::BACKEND, "host");
    }

    #[test]
    fn test_emulation_rounds_once_after_f32_op() {
        // 1 + 2^-11 is exact in f32 and a tie in half, so it narrows to 1.0.
        let one = Half::ONE;
        let half_ulp = Half::from_f32(2.0f32.powi(-11));
        assert_eq!(add(one, half_ulp), Half::ONE);
        // Three quarters of an ulp rounds up to the next half value.
        let three_quarter_ulp = Half::from_f32(1.5 * 2.0f32.powi(-11));
        assert_eq!(add(one, three_quarter_ulp).to_f32(), 1.0 + 2.0f32.powi(-10));
    }

    #[test]
    fn test_conversions_agree_with_runtime_conversion() {
        for bits in (0u16..=u16::MAX).step_by(97) {
            let h = Half::from_bits(bits);
            if h.is_nan() {
                continue;
            }
            assert_eq!(to_f32(h), f16::from_bits(bits).to_f32());
            assert_eq!(from_f32(to_f32(h)), h);
        }
    }
}
