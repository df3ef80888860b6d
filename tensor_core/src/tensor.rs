use std::fmt;
use std::ops::Range;

#[cfg(feature = "cuda")]
use std::sync::Arc;

#[cfg(feature = "cuda")]
use cudarc::driver::{CudaDevice, CudaSlice};
use log::trace;

use crate::device::{DType, Device, DeviceType};
use crate::error::TensorError;
use crate::fp16::Half;
use crate::storage::{HostBuffer, Storable};

#[cfg(feature = "cuda")]
use crate::storage::CudaData;

/// Element types a [`Tensor`] can store: `i64`, `f32` and [`Half`].
pub trait Element: Storable + Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl Element for i64 {}
impl Element for f32 {}
impl Element for Half {}

enum Buffer {
    Host(HostBuffer),
    #[cfg(feature = "cuda")]
    Cuda(CudaBuffer),
}

#[cfg(feature = "cuda")]
struct CudaBuffer {
    device: Arc<CudaDevice>,
    ordinal: usize,
    data: CudaData,
}

impl Buffer {
    fn zeros<T: Element>(numel: usize, device: Device) -> Result<Buffer, TensorError> {
        match device {
            Device::Cpu => Ok(Buffer::Host(T::wrap_host(vec![T::default(); numel]))),
            #[cfg(feature = "cuda")]
            Device::Cuda(ordinal) => {
                let dev = crate::kernels::cuda::get_device(ordinal)?;
                let data = dev.alloc_zeros::<T>(numel).map_err(|e| {
                    TensorError::Device(format!("alloc_zeros({} x {}) on {}: {}", numel, T::DTYPE, device, e))
                })?;
                Ok(Buffer::Cuda(CudaBuffer { device: dev, ordinal, data: T::wrap_cuda(data) }))
            }
            #[cfg(not(feature = "cuda"))]
            Device::Cuda(_) => Err(TensorError::DeviceUnavailable(device)),
        }
    }

    fn upload<T: Element>(data: Vec<T>, device: Device) -> Result<Buffer, TensorError> {
        match device {
            Device::Cpu => Ok(Buffer::Host(T::wrap_host(data))),
            #[cfg(feature = "cuda")]
            Device::Cuda(ordinal) => {
                let dev = crate::kernels::cuda::get_device(ordinal)?;
                let len = data.len();
                let slice = dev.htod_copy(data).map_err(|e| {
                    TensorError::Device(format!("htod_copy({} x {}) to {}: {}", len, T::DTYPE, device, e))
                })?;
                Ok(Buffer::Cuda(CudaBuffer { device: dev, ordinal, data: T::wrap_cuda(slice) }))
            }
            #[cfg(not(feature = "cuda"))]
            Device::Cuda(_) => Err(TensorError::DeviceUnavailable(device)),
        }
    }

    fn dtype(&self) -> DType {
        match self {
            Buffer::Host(h) => h.dtype(),
            #[cfg(feature = "cuda")]
            Buffer::Cuda(c) => c.data.dtype(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Buffer::Host(h) => h.len(),
            #[cfg(feature = "cuda")]
            Buffer::Cuda(c) => c.data.len(),
        }
    }
}

/// Read-only contiguous run of a tensor's elements, tagged with where they live.
pub enum Span<'a, T> {
    Host(&'a [T]),
    #[cfg(feature = "cuda")]
    Cuda(CudaSpan<'a, T>),
}

/// Mutable counterpart of [`Span`].
pub enum SpanMut<'a, T> {
    Host(&'a mut [T]),
    #[cfg(feature = "cuda")]
    Cuda(CudaSpanMut<'a, T>),
}

#[cfg(feature = "cuda")]
pub struct CudaSpan<'a, T> {
    pub(crate) ordinal: usize,
    pub(crate) buf: &'a CudaSlice<T>,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

#[cfg(feature = "cuda")]
pub struct CudaSpanMut<'a, T> {
    pub(crate) device: Arc<CudaDevice>,
    pub(crate) ordinal: usize,
    pub(crate) buf: &'a mut CudaSlice<T>,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl<T> Span<'_, T> {
    pub fn len(&self) -> usize {
        match self {
            Span::Host(s) => s.len(),
            #[cfg(feature = "cuda")]
            Span::Cuda(s) => s.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn device(&self) -> Device {
        match self {
            Span::Host(_) => Device::Cpu,
            #[cfg(feature = "cuda")]
            Span::Cuda(s) => Device::Cuda(s.ordinal),
        }
    }
}

impl<T> SpanMut<'_, T> {
    pub fn len(&self) -> usize {
        match self {
            SpanMut::Host(s) => s.len(),
            #[cfg(feature = "cuda")]
            SpanMut::Cuda(s) => s.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn device(&self) -> Device {
        match self {
            SpanMut::Host(_) => Device::Cpu,
            #[cfg(feature = "cuda")]
            SpanMut::Cuda(s) => Device::Cuda(s.ordinal),
        }
    }
}

/// A device-placed, dtype-tagged, possibly unallocated n-d array.
///
/// A tensor starts out *null* (no buffer). [`Tensor::reshape`] gives it a
/// shape, an element type and a device, allocating only when the current
/// buffer cannot be reused.
#[derive(Default)]
pub struct Tensor {
    shape: Vec<usize>,
    device: Device,
    buffer: Option<Buffer>,
}

impl Tensor {
    pub fn null() -> Tensor {
        Tensor::default()
    }

    /// Builds a tensor from host data, copying it to `device`.
    pub fn from_vec<T: Element>(data: Vec<T>, shape: Vec<usize>, device: Device) -> Result<Tensor, TensorError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(TensorError::DimensionMismatch(format!(
                "Data length {} does not match product of shape dimensions {:?}",
                data.len(),
                shape
            )));
        }
        let buffer = Buffer::upload(data, device)?;
        Ok(Tensor { shape, device, buffer: Some(buffer) })
    }

    pub fn is_null(&self) -> bool {
        self.buffer.is_none()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size of dimension `axis`.
    pub fn dim(&self, axis: usize) -> Result<usize, TensorError> {
        self.shape.get(axis).copied().ok_or_else(|| {
            TensorError::InvalidShape(format!(
                "Dimension {} requested from a tensor of rank {} (shape {:?})",
                axis,
                self.rank(),
                self.shape
            ))
        })
    }

    /// Number of elements; 0 for a null tensor.
    pub fn numel(&self) -> usize {
        match &self.buffer {
            Some(buf) => buf.len(),
            None => 0,
        }
    }

    pub fn dtype(&self) -> Option<DType> {
        self.buffer.as_ref().map(Buffer::dtype)
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn device_type(&self) -> DeviceType {
        self.device.device_type()
    }

    pub fn device_id(&self) -> usize {
        self.device.device_id()
    }

    /// Gives the tensor `shape`, element type `T` and placement `device`.
    ///
    /// The existing buffer is kept (contents untouched) when it already has
    /// the same dtype, device and element count; otherwise a zeroed buffer is
    /// allocated.
    pub fn reshape<T: Element>(&mut self, shape: &[usize], device: Device) -> Result<&mut Tensor, TensorError> {
        let numel: usize = shape.iter().product();
        let reusable = self.device == device
            && matches!(&self.buffer, Some(buf) if buf.dtype() == T::DTYPE && buf.len() == numel);
        if reusable {
            trace!("reusing {} buffer of {} elements on {} for shape {:?}", T::DTYPE, numel, device, shape);
        } else {
            trace!(
                "allocating {} buffer of {} elements ({} bytes) on {} for shape {:?}",
                T::DTYPE,
                numel,
                numel * T::DTYPE.size_in_bytes(),
                device,
                shape
            );
            self.buffer = Some(Buffer::zeros::<T>(numel, device)?);
            self.device = device;
        }
        self.shape = shape.to_vec();
        Ok(self)
    }

    /// Host view of the elements.
    pub fn data<T: Element>(&self) -> Result<&[T], TensorError> {
        match self.buffer.as_ref() {
            None => Err(null_error()),
            Some(Buffer::Host(h)) => T::host(h).ok_or_else(|| dtype_error::<T>(self.dtype())),
            #[cfg(feature = "cuda")]
            Some(Buffer::Cuda(_)) => Err(not_host_error(self.device)),
        }
    }

    pub fn data_mut<T: Element>(&mut self) -> Result<&mut [T], TensorError> {
        let held = self.dtype();
        match self.buffer.as_mut() {
            None => Err(null_error()),
            Some(Buffer::Host(h)) => T::host_mut(h).ok_or_else(|| dtype_error::<T>(held)),
            #[cfg(feature = "cuda")]
            Some(Buffer::Cuda(_)) => Err(not_host_error(self.device)),
        }
    }

    /// Contiguous run `range` of the flat element order, on whatever device
    /// holds it.
    pub fn span<T: Element>(&self, range: Range<usize>) -> Result<Span<'_, T>, TensorError> {
        self.check_range(&range)?;
        match self.buffer.as_ref() {
            None => Err(null_error()),
            Some(Buffer::Host(h)) => {
                let slice = T::host(h).ok_or_else(|| dtype_error::<T>(self.dtype()))?;
                Ok(Span::Host(&slice[range]))
            }
            #[cfg(feature = "cuda")]
            Some(Buffer::Cuda(c)) => {
                let buf = T::cuda(&c.data).ok_or_else(|| dtype_error::<T>(self.dtype()))?;
                Ok(Span::Cuda(CudaSpan {
                    ordinal: c.ordinal,
                    buf,
                    offset: range.start,
                    len: range.len(),
                }))
            }
        }
    }

    pub fn span_mut<T: Element>(&mut self, range: Range<usize>) -> Result<SpanMut<'_, T>, TensorError> {
        self.check_range(&range)?;
        let held = self.dtype();
        match self.buffer.as_mut() {
            None => Err(null_error()),
            Some(Buffer::Host(h)) => {
                let slice = T::host_mut(h).ok_or_else(|| dtype_error::<T>(held))?;
                Ok(SpanMut::Host(&mut slice[range]))
            }
            #[cfg(feature = "cuda")]
            Some(Buffer::Cuda(CudaBuffer { device, ordinal, data })) => {
                let buf = T::cuda_mut(data).ok_or_else(|| dtype_error::<T>(held))?;
                Ok(SpanMut::Cuda(CudaSpanMut {
                    device: Arc::clone(device),
                    ordinal: *ordinal,
                    buf,
                    offset: range.start,
                    len: range.len(),
                }))
            }
        }
    }

    /// Copies every element to a host `Vec`, from any device.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, TensorError> {
        match self.buffer.as_ref() {
            None => Err(null_error()),
            Some(Buffer::Host(h)) => T::host(h).map(<[T]>::to_vec).ok_or_else(|| dtype_error::<T>(self.dtype())),
            #[cfg(feature = "cuda")]
            Some(Buffer::Cuda(c)) => {
                let buf = T::cuda(&c.data).ok_or_else(|| dtype_error::<T>(self.dtype()))?;
                c.device
                    .dtoh_sync_copy(buf)
                    .map_err(|e| TensorError::Device(format!("dtoh_sync_copy from {}: {}", self.device, e)))
            }
        }
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), TensorError> {
        if range.start > range.end || range.end > self.numel() {
            return Err(TensorError::OutOfBounds(format!(
                "Span {:?} out of bounds for tensor with {} elements",
                range,
                self.numel()
            )));
        }
        Ok(())
    }
}

fn null_error() -> TensorError {
    TensorError::NullTensor("tensor has no buffer; reshape it first".to_string())
}

fn dtype_error<T: Element>(held: Option<DType>) -> TensorError {
    let held = held.map_or_else(|| "nothing".to_string(), |d| d.to_string());
    TensorError::UnsupportedType(format!("tensor holds {} but {} was requested", held, T::DTYPE))
}

#[cfg(feature = "cuda")]
fn not_host_error(device: Device) -> TensorError {
    TensorError::DeviceMismatch(format!("tensor lives on {}, host access needs cpu (use to_vec)", device))
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("dtype", &self.dtype())
            .field("device", &self.device)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_tensor() {
        let t = Tensor::null();
        assert!(t.is_null());
        assert_eq!(t.numel(), 0);
        assert_eq!(t.dtype(), None);
        assert_eq!(t.device(), Device::Cpu);
        assert!(matches!(t.data::<i64>(), Err(TensorError::NullTensor(_))));
        assert!(matches!(t.to_vec::<f32>(), Err(TensorError::NullTensor(_))));
    }

    #[test]
    fn test_from_vec() -> Result<(), TensorError> {
        let t = Tensor::from_vec(vec![1i64, 2, 3, 4, 5, 6], vec![2, 3], Device::Cpu)?;
        assert_eq!(t.rank(), 2);
        assert_eq!(t.numel(), 6);
        assert_eq!(t.dim(0)?, 2);
        assert_eq!(t.dim(1)?, 3);
        assert_eq!(t.dtype(), Some(DType::I64));
        assert_eq!(t.data::<i64>()?, &[1, 2, 3, 4, 5, 6]);
        Ok(())
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let res = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], vec![2, 2], Device::Cpu);
        assert!(matches!(res, Err(TensorError::DimensionMismatch(_))));
    }

    #[test]
    fn test_dim_out_of_rank() -> Result<(), TensorError> {
        let t = Tensor::from_vec(vec![1i64, 2], vec![2], Device::Cpu)?;
        assert!(matches!(t.dim(1), Err(TensorError::InvalidShape(_))));
        Ok(())
    }

    #[test]
    fn test_reshape_allocates_zeroed() -> Result<(), TensorError> {
        let mut t = Tensor::null();
        t.reshape::<f32>(&[2, 1, 1, 3], Device::Cpu)?;
        assert!(!t.is_null());
        assert_eq!(t.shape(), &[2, 1, 1, 3]);
        assert_eq!(t.dtype(), Some(DType::F32));
        assert_eq!(t.data::<f32>()?, &[0.0; 6]);
        Ok(())
    }

    #[test]
    fn test_reshape_reuses_matching_buffer() -> Result<(), TensorError> {
        let mut t = Tensor::from_vec(vec![7i64, 8, 9, 10], vec![4], Device::Cpu)?;
        t.reshape::<i64>(&[2, 2], Device::Cpu)?;
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.data::<i64>()?, &[7, 8, 9, 10]);

        // Different dtype: fresh buffer.
        t.reshape::<f32>(&[2, 2], Device::Cpu)?;
        assert_eq!(t.data::<f32>()?, &[0.0; 4]);

        // Different element count: fresh buffer.
        t.reshape::<f32>(&[3], Device::Cpu)?;
        assert_eq!(t.numel(), 3);
        Ok(())
    }

    #[test]
    fn test_data_mut_writes_through() -> Result<(), TensorError> {
        let mut t = Tensor::null();
        t.reshape::<i64>(&[2, 2], Device::Cpu)?;
        t.data_mut::<i64>()?[3] = 42;
        assert_eq!(t.data::<i64>()?, &[0, 0, 0, 42]);
        assert!(matches!(t.data_mut::<f32>(), Err(TensorError::UnsupportedType(_))));
        Ok(())
    }

    #[test]
    fn test_zero_sized_shape() -> Result<(), TensorError> {
        let mut t = Tensor::null();
        t.reshape::<i64>(&[0, 5], Device::Cpu)?;
        assert!(!t.is_null());
        assert_eq!(t.numel(), 0);
        assert!(t.data::<i64>()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_dtype_mismatch() -> Result<(), TensorError> {
        let t = Tensor::from_vec(vec![1.0f32], vec![1], Device::Cpu)?;
        match t.data::<i64>() {
            Err(TensorError::UnsupportedType(msg)) => assert!(msg.contains("holds f32")),
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_spans() -> Result<(), TensorError> {
        let mut t = Tensor::from_vec(vec![Half::ZERO; 6], vec![2, 3], Device::Cpu)?;
        {
            let span = t.span_mut::<Half>(3..6)?;
            assert_eq!(span.len(), 3);
            assert_eq!(span.device(), Device::Cpu);
            match span {
                SpanMut::Host(s) => s.fill(Half::ONE),
                #[cfg(feature = "cuda")]
                _ => unreachable!("host tensor"),
            }
        }
        assert_eq!(t.data::<Half>()?, &[Half::ZERO, Half::ZERO, Half::ZERO, Half::ONE, Half::ONE, Half::ONE]);
        assert!(t.span::<Half>(4..7).is_err());
        assert!(t.span::<Half>(2..2)?.is_empty());
        Ok(())
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_cuda_unavailable_without_feature() {
        let mut t = Tensor::null();
        let res = t.reshape::<i64>(&[2, 2], Device::Cuda(0));
        assert!(matches!(res, Err(TensorError::DeviceUnavailable(Device::Cuda(0)))));
        assert!(t.is_null());
    }
}
