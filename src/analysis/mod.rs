pub mod mapper;
pub mod tables;

pub use mapper::{AnalysisResult, RiskMapper, RiskScore};
pub use tables::{validate_tables, FALLBACK_CONCLUSION};

use crate::models::ClassLabel;

/// 便捷函数：标签 -> 分析结果，永不失败
pub fn analyze(label: ClassLabel) -> AnalysisResult {
    RiskMapper::analyze(label)
}
