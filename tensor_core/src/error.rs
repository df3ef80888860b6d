use crate::device::Device;

#[derive(Debug, Clone, PartialEq)]
pub enum TensorError {
    DimensionMismatch(String),
    OutOfBounds(String),
    InvalidShape(String),
    UnsupportedType(String),
    NullTensor(String),
    DeviceMismatch(String),
    DeviceUnavailable(Device),
    Device(String),
}

impl std::fmt::Display for TensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TensorError::DimensionMismatch(s) => write!(f, "Dimension mismatch: {}", s),
            TensorError::OutOfBounds(s) => write!(f, "Out of bounds: {}", s),
            TensorError::InvalidShape(s) => write!(f, "Invalid shape: {}", s),
            TensorError::UnsupportedType(s) => write!(f, "Unsupported type: {}", s),
            TensorError::NullTensor(s) => write!(f, "Null tensor: {}", s),
            TensorError::DeviceMismatch(s) => write!(f, "Device mismatch: {}", s),
            TensorError::DeviceUnavailable(d) => {
                write!(f, "Device {} is not available", d)
            }
            TensorError::Device(s) => write!(f, "Device error: {}", s),
        }
    }
}

impl std::error::Error for TensorError {}
