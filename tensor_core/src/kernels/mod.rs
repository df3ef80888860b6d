//! Device-generic elementwise primitives.
//!
//! Each primitive takes device-tagged spans and dispatches on the tag: host
//! spans run the loops in `cpu`, accelerator spans (feature `cuda`) launch the
//! kernels in `cuda`. Callers never branch on the device themselves.

mod cpu;
#[cfg(feature = "cuda")]
pub(crate) mod cuda;

use crate::error::TensorError;
use crate::tensor::{Element, Span, SpanMut};

/// Additive bias for a masked-out position when none is configured.
pub const DEFAULT_MASKED_BIAS: f32 = -10000.0;

/// Writes `0, 1, .., len - 1` into `dst`.
pub fn sequence(dst: SpanMut<'_, i64>) -> Result<(), TensorError> {
    match dst {
        SpanMut::Host(out) => {
            cpu::sequence(out);
            Ok(())
        }
        #[cfg(feature = "cuda")]
        SpanMut::Cuda(out) => cuda::sequence(out),
    }
}

/// Writes `value` into every element of `dst`.
pub fn fill<T: Element>(dst: SpanMut<'_, T>, value: T) -> Result<(), TensorError> {
    match dst {
        SpanMut::Host(out) => {
            cpu::fill(out, value);
            Ok(())
        }
        #[cfg(feature = "cuda")]
        SpanMut::Cuda(out) => cuda::fill(out, value),
    }
}

/// Maps a 0/1 attention mask to an additive bias:
/// `dst[i] = (1 - src[i]) * masked_bias`.
///
/// A 1 ("attend") becomes 0.0 and a 0 ("padding") becomes `masked_bias`.
/// Both spans must have the same length and live on the same device.
pub fn transform(src: Span<'_, i64>, dst: SpanMut<'_, f32>, masked_bias: f32) -> Result<(), TensorError> {
    if src.len() != dst.len() {
        return Err(TensorError::DimensionMismatch(format!(
            "transform source has {} elements, destination has {}",
            src.len(),
            dst.len()
        )));
    }
    if src.device() != dst.device() {
        return Err(TensorError::DeviceMismatch(format!(
            "transform source is on {}, destination on {}",
            src.device(),
            dst.device()
        )));
    }
    match (src, dst) {
        (Span::Host(input), SpanMut::Host(output)) => {
            cpu::transform(input, output, masked_bias);
            Ok(())
        }
        #[cfg(feature = "cuda")]
        (Span::Cuda(input), SpanMut::Cuda(output)) => cuda::transform(input, output, masked_bias),
        #[cfg(feature = "cuda")]
        _ => unreachable!("device equality checked above"),
    }
}

/// Bias `transform` produces for a single mask value.
pub fn mask_bias(mask_value: i64, masked_bias: f32) -> f32 {
    cpu::bias(mask_value, masked_bias)
}
