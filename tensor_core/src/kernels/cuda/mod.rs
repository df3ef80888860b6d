//! Accelerator backend: NVRTC-compiled kernels launched through `cudarc`.
//!
//! Device handles are created lazily, one per ordinal, and the mask kernels
//! are loaded onto each device the first time it is opened.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use cudarc::driver::{CudaDevice, CudaFunction, LaunchAsync, LaunchConfig};
use log::trace;
use parking_lot::Mutex;

use crate::device::Device;
use crate::error::TensorError;
use crate::tensor::{CudaSpan, CudaSpanMut, Element};

const MODULE: &str = "transformer_masks";
const KERNELS: &[&str] = &["sequence_i64", "fill_i64", "fill_f32", "fill_f16", "mask_to_bias"];
const SOURCE: &str = include_str!("masks.cu");
const BLOCK_SIZE: u32 = 256;

static DEVICES: OnceLock<Mutex<HashMap<usize, Arc<CudaDevice>>>> = OnceLock::new();

fn devices() -> &'static Mutex<HashMap<usize, Arc<CudaDevice>>> {
    DEVICES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Opens (or reuses) the device handle for `ordinal` with the kernels loaded.
pub(crate) fn get_device(ordinal: usize) -> Result<Arc<CudaDevice>, TensorError> {
    let mut map = devices().lock();
    if let Some(dev) = map.get(&ordinal) {
        return Ok(Arc::clone(dev));
    }
    let dev = CudaDevice::new(ordinal).map_err(|e| {
        trace!("cuda device {} unavailable: {}", ordinal, e);
        TensorError::DeviceUnavailable(Device::Cuda(ordinal))
    })?;
    let ptx = cudarc::nvrtc::compile_ptx(SOURCE)
        .map_err(|e| TensorError::Device(format!("compiling {} kernels: {}", MODULE, e)))?;
    dev.load_ptx(ptx, MODULE, KERNELS)
        .map_err(|e| TensorError::Device(format!("loading {} on cuda:{}: {}", MODULE, ordinal, e)))?;
    trace!("opened cuda:{} and loaded {} kernels", ordinal, KERNELS.len());
    map.insert(ordinal, Arc::clone(&dev));
    Ok(dev)
}

fn func(device: &Arc<CudaDevice>, name: &str) -> Result<CudaFunction, TensorError> {
    device
        .get_func(MODULE, name)
        .ok_or_else(|| TensorError::Device(format!("kernel {} not found in {}", name, MODULE)))
}

fn grid_1d(n: usize) -> LaunchConfig {
    let blocks = u32::try_from(n.div_ceil(BLOCK_SIZE as usize)).unwrap_or(u32::MAX);
    LaunchConfig {
        grid_dim: (blocks.max(1), 1, 1),
        block_dim: (BLOCK_SIZE, 1, 1),
        shared_mem_bytes: 0,
    }
}

/// Kernel arguments are 32-bit; larger windows are rejected.
fn window(offset: usize, len: usize) -> Result<(u32, u32), TensorError> {
    let end = offset.checked_add(len).and_then(|end| u32::try_from(end).ok());
    match (u32::try_from(offset), u32::try_from(len), end) {
        (Ok(offset), Ok(len), Some(_)) => Ok((offset, len)),
        _ => Err(TensorError::OutOfBounds(format!(
            "span [{}..+{}] exceeds the 32-bit kernel index range",
            offset, len
        ))),
    }
}

fn launch_error(name: &str, e: cudarc::driver::DriverError) -> TensorError {
    TensorError::Device(format!("launching {}: {}", name, e))
}

pub(super) fn sequence(out: CudaSpanMut<'_, i64>) -> Result<(), TensorError> {
    if out.len == 0 {
        return Ok(());
    }
    let (offset, n) = window(out.offset, out.len)?;
    let f = func(&out.device, "sequence_i64")?;
    trace!("sequence_i64 on cuda:{} [{}..+{}]", out.ordinal, offset, n);
    unsafe { f.launch(grid_1d(out.len), (out.buf, offset, n)) }
        .map_err(|e| launch_error("sequence_i64", e))
}

pub(super) fn fill<T: Element>(out: CudaSpanMut<'_, T>, value: T) -> Result<(), TensorError> {
    if out.len == 0 {
        return Ok(());
    }
    let (offset, n) = window(out.offset, out.len)?;
    let f = func(&out.device, T::FILL_KERNEL)?;
    trace!("{} on cuda:{} [{}..+{}]", T::FILL_KERNEL, out.ordinal, offset, n);
    unsafe { f.launch(grid_1d(out.len), (out.buf, offset, n, value)) }
        .map_err(|e| launch_error(T::FILL_KERNEL, e))
}

pub(super) fn transform(src: CudaSpan<'_, i64>, out: CudaSpanMut<'_, f32>, masked_bias: f32) -> Result<(), TensorError> {
    if out.len == 0 {
        return Ok(());
    }
    if src.ordinal != out.ordinal {
        return Err(TensorError::DeviceMismatch(format!(
            "mask_to_bias reads cuda:{} and writes cuda:{}",
            src.ordinal, out.ordinal
        )));
    }
    let (src_offset, _) = window(src.offset, src.len)?;
    let (out_offset, n) = window(out.offset, out.len)?;
    let f = func(&out.device, "mask_to_bias")?;
    trace!("mask_to_bias on cuda:{} [{}..+{}]", out.ordinal, out_offset, n);
    let params = (src.buf, src_offset, out.buf, out_offset, n, masked_bias);
    unsafe { f.launch(grid_1d(out.len), params) }.map_err(|e| launch_error("mask_to_bias", e))
}
