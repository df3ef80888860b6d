use tensor_core::TensorError;

#[derive(Debug)]
pub enum MaskError {
    Tensor(TensorError),
    Config(String),
}

impl std::fmt::Display for MaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaskError::Tensor(e) => write!(f, "Tensor error: {}", e),
            MaskError::Config(s) => write!(f, "Configuration error: {}", s),
        }
    }
}

impl std::error::Error for MaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MaskError::Tensor(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<TensorError> for MaskError {
    fn from(err: TensorError) -> MaskError {
        MaskError::Tensor(err)
    }
}
