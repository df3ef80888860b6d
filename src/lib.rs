//! BERT-style attention mask preparation on top of `tensor_core`.
//!
//! [`PrepareBertMasks`] derives the auxiliary tensors an encoder needs
//! (position ids, token-type ids, attention mask) when the caller has not
//! supplied them, and always rebuilds the additive extended attention mask.

pub mod config;
pub mod error;
pub mod layers;

pub use config::MaskConfig;
pub use error::MaskError;
pub use layers::{MaskInputs, PrepareBertMasks, PreparedMasks};
pub use tensor_core;
