pub mod backend;
pub mod classifier;
pub mod label;
pub mod manager;
pub mod tensor;

pub use backend::{InferenceBackend, OnnxBackend};
pub use classifier::{Classifier, Prediction};
pub use label::ClassLabel;
pub use manager::{ModelManager, ModelStats};
pub use tensor::{NormalizedTensor, PixelRange, TensorSpec};

// Re-export convenience functions from manager
pub use manager::{classify, classify_detailed, get_classifier, get_model_stats, health_check};
