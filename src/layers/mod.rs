mod prepare_bert_masks;

pub use prepare_bert_masks::{MaskInputs, PrepareBertMasks, PreparedMasks};
