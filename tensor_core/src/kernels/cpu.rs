pub(super) fn sequence(out: &mut [i64]) {
    for (i, v) in out.iter_mut().enumerate() {
        *v = i as i64;
    }
}

pub(super) fn fill<T: Copy>(out: &mut [T], value: T) {
    out.fill(value);
}

#[inline]
pub(super) fn bias(mask_value: i64, masked_bias: f32) -> f32 {
    (1 - mask_value) as f32 * masked_bias
}

pub(super) fn transform(src: &[i64], dst: &mut [f32], masked_bias: f32) {
    for (out, &m) in dst.iter_mut().zip(src.iter()) {
        *out = bias(m, masked_bias);
    }
}
