pub mod analysis;
pub mod config;
pub mod ecg;
pub mod image;
pub mod models;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use crate::image::{preprocess, ImagePreprocessor};
pub use analysis::{analyze, AnalysisResult, RiskMapper, RiskScore};
pub use config::Config;
pub use ecg::EcgPipeline;
pub use models::{classify, ClassLabel, Classifier, NormalizedTensor};
pub use utils::error::EcgError;

pub type Result<T> = std::result::Result<T, EcgError>;
