use std::fmt;

/// Where a tensor's buffer lives: the device type plus its numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Device {
    #[default]
    Cpu,
    /// CUDA GPU with device ordinal
    Cuda(usize),
}

/// The device type tag without the id, used to pick host or accelerator kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Cpu,
    Cuda,
}

impl Device {
    pub fn device_type(&self) -> DeviceType {
        match self {
            Device::Cpu => DeviceType::Cpu,
            Device::Cuda(_) => DeviceType::Cuda,
        }
    }

    /// Numeric id of the device. The host is always id 0.
    pub fn device_id(&self) -> usize {
        match self {
            Device::Cpu => 0,
            Device::Cuda(idx) => *idx,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(idx) => write!(f, "cuda:{idx}"),
        }
    }
}

/// Element types a tensor buffer can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    I64,
    F32,
    /// IEEE 754 binary16, stored as [`crate::Half`]
    F16,
}

impl DType {
    /// Width of one element in a buffer of this type.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::I64 => 8,
            DType::F32 => 4,
            DType::F16 => 2,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F16 => "f16",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_and_id() {
        assert_eq!(Device::Cpu.device_type(), DeviceType::Cpu);
        assert_eq!(Device::Cpu.device_id(), 0);
        assert_eq!(Device::Cuda(3).device_type(), DeviceType::Cuda);
        assert_eq!(Device::Cuda(3).device_id(), 3);
        assert_eq!(Device::default(), Device::Cpu);
    }

    #[test]
    fn test_display() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Cuda(1).to_string(), "cuda:1");
        assert_eq!(DType::F16.to_string(), "f16");
        assert_eq!(DType::I64.size_in_bytes(), 8);
    }
}
