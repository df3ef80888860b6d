use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tensor_core::kernels::DEFAULT_MASKED_BIAS;

use crate::error::MaskError;

fn default_masked_bias() -> f32 {
    DEFAULT_MASKED_BIAS
}

/// Settings for [`PrepareBertMasks`](crate::PrepareBertMasks).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskConfig {
    /// Additive bias written for masked-out (0) positions.
    #[serde(default = "default_masked_bias")]
    pub masked_bias: f32,
}

impl Default for MaskConfig {
    fn default() -> Self {
        MaskConfig { masked_bias: DEFAULT_MASKED_BIAS }
    }
}

impl MaskConfig {
    pub fn from_json_str(json: &str) -> Result<Self, MaskError> {
        let config: MaskConfig =
            serde_json::from_str(json).map_err(|e| MaskError::Config(format!("invalid mask config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MaskError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| MaskError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// The bias must push masked scores towards -inf after softmax.
    pub fn validate(&self) -> Result<(), MaskError> {
        if !self.masked_bias.is_finite() || self.masked_bias >= 0.0 {
            return Err(MaskError::Config(format!(
                "masked_bias must be finite and negative, got {}",
                self.masked_bias
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_bias() {
        assert_eq!(MaskConfig::default().masked_bias, -10000.0);
        assert!(MaskConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_field_takes_default() -> Result<(), MaskError> {
        assert_eq!(MaskConfig::from_json_str("{}")?, MaskConfig::default());
        Ok(())
    }

    #[test]
    fn test_custom_bias() -> Result<(), MaskError> {
        let config = MaskConfig::from_json_str(r#"{ "masked_bias": -1e9 }"#)?;
        assert_eq!(config.masked_bias, -1.0e9);
        Ok(())
    }

    #[test]
    fn test_rejects_non_negative_bias() {
        for json in [r#"{ "masked_bias": 0.0 }"#, r#"{ "masked_bias": 5.0 }"#] {
            match MaskConfig::from_json_str(json) {
                Err(MaskError::Config(msg)) => assert!(msg.contains("negative"), "unexpected message: {}", msg),
                other => panic!("expected config error for {}, got {:?}", json, other),
            }
        }
    }

    #[test]
    fn test_rejects_non_finite_bias() {
        let config = MaskConfig { masked_bias: f32::NEG_INFINITY };
        assert!(matches!(config.validate(), Err(MaskError::Config(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(MaskConfig::from_json_str("{ masked_bias"), Err(MaskError::Config(_))));
    }

    #[test]
    fn test_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{ "masked_bias": -30000.0 }}"#)?;
        let config = MaskConfig::from_file(file.path())?;
        assert_eq!(config.masked_bias, -30000.0);
        Ok(())
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = MaskConfig::from_file(dir.path().join("absent.json"));
        assert!(matches!(res, Err(MaskError::Config(_))));
    }

    #[test]
    fn test_serialize_roundtrip_through_json() -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(&MaskConfig { masked_bias: -5.0e4 })?;
        assert_eq!(MaskConfig::from_json_str(&json)?.masked_bias, -5.0e4);
        Ok(())
    }
}
