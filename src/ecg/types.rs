use crate::analysis::AnalysisResult;
use crate::models::Prediction;
use serde::Serialize;
use std::time::Duration;

/// 单次分析的耗时统计
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PipelineStats {
    /// 解码 + 预处理耗时（毫秒）
    pub preprocess_time_ms: u64,
    /// 推理耗时（毫秒）
    pub inference_time_ms: u64,
    /// 总耗时（毫秒）
    pub total_time_ms: u64,
}

impl PipelineStats {
    pub fn new(preprocess: Duration, inference: Duration, total: Duration) -> Self {
        Self {
            preprocess_time_ms: preprocess.as_millis() as u64,
            inference_time_ms: inference.as_millis() as u64,
            total_time_ms: total.as_millis() as u64,
        }
    }
}

/// 完整的流水线输出
#[derive(Debug, Clone, Serialize)]
pub struct EcgReport {
    pub prediction: Prediction,
    pub analysis: AnalysisResult,
    pub stats: PipelineStats,
}
