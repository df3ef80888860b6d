use half::f16;
use proptest::prelude::*;
use tensor_core::Half;

/// Reference result: widen both operands, operate in f32, narrow once.
#[cfg_attr(feature = "native-f16", allow(dead_code))]
fn widened(a: Half, b: Half, op: fn(f32, f32) -> f32) -> Half {
    Half::from_native(f16::from_f32(op(a.to_f32(), b.to_f32())))
}

#[cfg_attr(feature = "native-f16", allow(dead_code))]
fn same_value(got: Half, want: Half) -> bool {
    got == want || (got.is_nan() && want.is_nan())
}

// The native backend may round differently from the f32 emulation, so the
// exact agreement properties only hold for the host path.
#[cfg(not(feature = "native-f16"))]
proptest! {
    #[test]
    fn add_matches_widened_f32(a in any::<u16>(), b in any::<u16>()) {
        let (a, b) = (Half::from_bits(a), Half::from_bits(b));
        prop_assert!(same_value(a + b, widened(a, b, |x, y| x + y)));
    }

    #[test]
    fn sub_matches_widened_f32(a in any::<u16>(), b in any::<u16>()) {
        let (a, b) = (Half::from_bits(a), Half::from_bits(b));
        prop_assert!(same_value(a - b, widened(a, b, |x, y| x - y)));
    }

    #[test]
    fn mul_matches_widened_f32(a in any::<u16>(), b in any::<u16>()) {
        let (a, b) = (Half::from_bits(a), Half::from_bits(b));
        prop_assert!(same_value(a * b, widened(a, b, |x, y| x * y)));
    }

    #[test]
    fn div_matches_widened_f32(a in any::<u16>(), b in any::<u16>()) {
        let (a, b) = (Half::from_bits(a), Half::from_bits(b));
        prop_assert!(same_value(a / b, widened(a, b, |x, y| x / y)));
    }
}

proptest! {
    #[test]
    fn widening_then_narrowing_is_exact(bits in any::<u16>()) {
        let h = Half::from_bits(bits);
        prop_assume!(!h.is_nan());
        prop_assert_eq!(Half::from_f32(h.to_f32()).to_bits(), bits);
    }

    #[test]
    fn add_assign_stores_same_bits_as_add(f in -1.0e4f32..1.0e4, g in -1.0e4f32..1.0e4) {
        let (a, b) = (Half::from_f32(f), Half::from_f32(g));
        let mut acc = a;
        acc += b;
        prop_assert_eq!(acc.to_bits(), (a + b).to_bits());
    }

    #[test]
    fn from_f32_rounds_to_nearest_half(f in -6.0e4f32..6.0e4) {
        let h = Half::from_f32(f);
        prop_assert_eq!(h.to_bits(), f16::from_f32(f).to_bits());
    }
}
