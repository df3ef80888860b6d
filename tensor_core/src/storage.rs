//! Typed backing buffers behind `Tensor`. Hidden from docs; not a supported API.

use crate::device::DType;
use crate::fp16::Half;

#[cfg(feature = "cuda")]
use cudarc::driver::CudaSlice;

#[derive(Debug, Clone)]
pub enum HostBuffer {
    I64(Vec<i64>),
    F32(Vec<f32>),
    F16(Vec<Half>),
}

impl HostBuffer {
    pub fn dtype(&self) -> DType {
        match self {
            HostBuffer::I64(_) => DType::I64,
            HostBuffer::F32(_) => DType::F32,
            HostBuffer::F16(_) => DType::F16,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HostBuffer::I64(v) => v.len(),
            HostBuffer::F32(v) => v.len(),
            HostBuffer::F16(v) => v.len(),
        }
    }
}

#[cfg(feature = "cuda")]
pub enum CudaData {
    I64(CudaSlice<i64>),
    F32(CudaSlice<f32>),
    F16(CudaSlice<Half>),
}

#[cfg(feature = "cuda")]
impl CudaData {
    pub fn dtype(&self) -> DType {
        match self {
            CudaData::I64(_) => DType::I64,
            CudaData::F32(_) => DType::F32,
            CudaData::F16(_) => DType::F16,
        }
    }

    pub fn len(&self) -> usize {
        use cudarc::driver::DeviceSlice;
        match self {
            CudaData::I64(s) => s.len(),
            CudaData::F32(s) => s.len(),
            CudaData::F16(s) => s.len(),
        }
    }
}

#[cfg(feature = "cuda")]
unsafe impl cudarc::driver::DeviceRepr for Half {}
#[cfg(feature = "cuda")]
unsafe impl cudarc::driver::ValidAsZeroBits for Half {}

/// Extra bounds an element needs when the accelerator backend is compiled in.
#[cfg(feature = "cuda")]
pub trait DeviceBound: cudarc::driver::DeviceRepr + cudarc::driver::ValidAsZeroBits + Unpin {}
#[cfg(feature = "cuda")]
impl<T: cudarc::driver::DeviceRepr + cudarc::driver::ValidAsZeroBits + Unpin> DeviceBound for T {}

#[cfg(not(feature = "cuda"))]
pub trait DeviceBound {}
#[cfg(not(feature = "cuda"))]
impl<T> DeviceBound for T {}

/// Binds an element type to the buffer variant that stores it.
pub trait Storable: DeviceBound + Sized {
    const DTYPE: DType;
    /// Name of the accelerator fill kernel for this element type.
    const FILL_KERNEL: &'static str;

    fn wrap_host(data: Vec<Self>) -> HostBuffer;
    fn host(buf: &HostBuffer) -> Option<&[Self]>;
    fn host_mut(buf: &mut HostBuffer) -> Option<&mut [Self]>;

    #[cfg(feature = "cuda")]
    fn wrap_cuda(data: CudaSlice<Self>) -> CudaData;
    #[cfg(feature = "cuda")]
    fn cuda(buf: &CudaData) -> Option<&CudaSlice<Self>>;
    #[cfg(feature = "cuda")]
    fn cuda_mut(buf: &mut CudaData) -> Option<&mut CudaSlice<Self>>;
}

macro_rules! impl_storable {
    ($ty:ty, $variant:ident, $dtype:expr, $kernel:literal) => {
        impl Storable for $ty {
            const DTYPE: DType = $dtype;
            const FILL_KERNEL: &'static str = $kernel;

            fn wrap_host(data: Vec<Self>) -> HostBuffer {
                HostBuffer::$variant(data)
            }

            fn host(buf: &HostBuffer) -> Option<&[Self]> {
                match buf {
                    HostBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn host_mut(buf: &mut HostBuffer) -> Option<&mut [Self]> {
                match buf {
                    HostBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            #[cfg(feature = "cuda")]
            fn wrap_cuda(data: CudaSlice<Self>) -> CudaData {
                CudaData::$variant(data)
            }

            #[cfg(feature = "cuda")]
            fn cuda(buf: &CudaData) -> Option<&CudaSlice<Self>> {
                match buf {
                    CudaData::$variant(s) => Some(s),
                    _ => None,
                }
            }

            #[cfg(feature = "cuda")]
            fn cuda_mut(buf: &mut CudaData) -> Option<&mut CudaSlice<Self>> {
                match buf {
                    CudaData::$variant(s) => Some(s),
                    _ => None,
                }
            }
        }
    };
}

impl_storable!(i64, I64, DType::I64, "fill_i64");
impl_storable!(f32, F32, DType::F32, "fill_f32");
impl_storable!(Half, F16, DType::F16, "fill_f16");
