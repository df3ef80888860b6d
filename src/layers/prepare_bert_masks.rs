use log::debug;
use tensor_core::{kernels, DType, Device, Tensor, TensorError};

use crate::config::MaskConfig;
use crate::error::MaskError;

/// Builds the auxiliary inputs of a BERT encoder from the token ids tensor.
///
/// `position_ids`, `seq_type` and `att_mask` are only derived when their slot
/// is null; caller-supplied tensors are left untouched. The extended attention
/// mask is rebuilt from the final `att_mask` on every call.
#[derive(Debug, Clone, Default)]
pub struct PrepareBertMasks {
    config: MaskConfig,
}

/// Optional caller-supplied tensors for [`PrepareBertMasks::forward`].
#[derive(Debug, Default)]
pub struct MaskInputs {
    pub att_mask: Option<Tensor>,
    pub seq_type: Option<Tensor>,
    pub position_ids: Option<Tensor>,
}

#[derive(Debug)]
pub struct PreparedMasks {
    pub att_mask: Tensor,
    pub seq_type: Tensor,
    pub position_ids: Tensor,
    /// Shape `(batch, 1, 1, seq_len)`, f32.
    pub extended_attention_mask: Tensor,
}

impl PrepareBertMasks {
    pub fn new(config: MaskConfig) -> Result<Self, MaskError> {
        config.validate()?;
        Ok(PrepareBertMasks { config })
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// Additive bias the extended mask holds for a given attention mask value.
    pub fn bias_for(&self, mask_value: i64) -> f32 {
        kernels::mask_bias(mask_value, self.config.masked_bias)
    }

    /// Fills the null slots and rebuilds `extended_attention_mask`.
    ///
    /// Batch size and sequence length are the first two dimensions of
    /// `inputs`; every derived tensor is placed on the device of `inputs`.
    /// A supplied `att_mask` is checked first, so a rejected call leaves all
    /// four slots as they were.
    pub fn prepare(
        &self,
        inputs: &Tensor,
        att_mask: &mut Tensor,
        seq_type: &mut Tensor,
        position_ids: &mut Tensor,
        extended_attention_mask: &mut Tensor,
    ) -> Result<(), MaskError> {
        let batch = inputs.dim(0)?;
        let seq_len = inputs.dim(1)?;
        let device = inputs.device();
        check_att_mask(att_mask, batch * seq_len, device)?;

        if position_ids.is_null() {
            debug!("deriving position_ids ({}, {}) on {}", batch, seq_len, device);
            position_ids.reshape::<i64>(&[batch, seq_len], device)?;
            for row in 0..batch {
                let start = row * seq_len;
                kernels::sequence(position_ids.span_mut::<i64>(start..start + seq_len)?)?;
            }
        }

        if seq_type.is_null() {
            debug!("deriving seq_type ({}, {}) on {}", batch, seq_len, device);
            seq_type.reshape::<i64>(&[batch, seq_len], device)?;
            let n = seq_type.numel();
            kernels::fill(seq_type.span_mut::<i64>(0..n)?, 0)?;
        }

        if att_mask.is_null() {
            debug!("deriving att_mask ({}, {}) on {}", batch, seq_len, device);
            att_mask.reshape::<i64>(&[batch, seq_len], device)?;
            let n = att_mask.numel();
            kernels::fill(att_mask.span_mut::<i64>(0..n)?, 1)?;
        }

        debug!(
            "building extended_attention_mask ({}, 1, 1, {}) with bias {}",
            batch, seq_len, self.config.masked_bias
        );
        extended_attention_mask.reshape::<f32>(&[batch, 1, 1, seq_len], device)?;
        let n = extended_attention_mask.numel();
        kernels::transform(
            att_mask.span::<i64>(0..att_mask.numel())?,
            extended_attention_mask.span_mut::<f32>(0..n)?,
            self.config.masked_bias,
        )?;
        Ok(())
    }

    /// Owned-value form of [`prepare`](Self::prepare).
    pub fn forward(&self, inputs: &Tensor, supplied: MaskInputs) -> Result<PreparedMasks, MaskError> {
        let mut att_mask = supplied.att_mask.unwrap_or_default();
        let mut seq_type = supplied.seq_type.unwrap_or_default();
        let mut position_ids = supplied.position_ids.unwrap_or_default();
        let mut extended_attention_mask = Tensor::null();
        self.prepare(
            inputs,
            &mut att_mask,
            &mut seq_type,
            &mut position_ids,
            &mut extended_attention_mask,
        )?;
        Ok(PreparedMasks { att_mask, seq_type, position_ids, extended_attention_mask })
    }
}

/// A caller mask must be readable by `transform` into a (batch, seq_len) bias.
fn check_att_mask(att_mask: &Tensor, numel: usize, device: Device) -> Result<(), TensorError> {
    let Some(dtype) = att_mask.dtype() else {
        return Ok(());
    };
    if dtype != DType::I64 {
        return Err(TensorError::UnsupportedType(format!("att_mask holds {} but i64 is required", dtype)));
    }
    if att_mask.device() != device {
        return Err(TensorError::DeviceMismatch(format!(
            "att_mask is on {} but inputs are on {}",
            att_mask.device(),
            device
        )));
    }
    if att_mask.numel() != numel {
        return Err(TensorError::DimensionMismatch(format!(
            "att_mask has {} elements, inputs need {}",
            att_mask.numel(),
            numel
        )));
    }
    Ok(())
}
