//! Numeric building blocks for transformer inference: a 16-bit `Half` float,
//! a nullable device-placed `Tensor`, and device-generic elementwise kernels.

pub mod device;
pub mod error;
pub mod fp16;
pub mod kernels;
#[doc(hidden)]
pub mod storage;
pub mod tensor;

pub use device::{DType, Device, DeviceType};
pub use error::TensorError;
pub use fp16::Half;
pub use tensor::{Element, Span, SpanMut, Tensor};
