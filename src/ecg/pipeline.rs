use crate::{
    analysis::{AnalysisResult, RiskMapper},
    ecg::{EcgReport, PipelineStats},
    image::ImagePreprocessor,
    models::{Classifier, ModelManager, NormalizedTensor},
    Result,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// 心电图分析流水线：预处理 -> 分类 -> 风险映射
///
/// 不持有可变状态，可以在线程间共享。
#[derive(Clone)]
pub struct EcgPipeline {
    preprocessor: ImagePreprocessor,
    classifier: Arc<Classifier>,
}

impl EcgPipeline {
    pub fn new(preprocessor: ImagePreprocessor, classifier: Arc<Classifier>) -> Self {
        Self { preprocessor, classifier }
    }

    pub fn from_manager(manager: &ModelManager) -> Self {
        Self::new(
            ImagePreprocessor::new(&manager.config().input_config),
            manager.classifier(),
        )
    }

    /// 基于全局模型管理器构建；模型未加载时返回 ModelLoad 错误
    pub fn global() -> Result<Self> {
        let manager = ModelManager::instance()?;
        Ok(Self::from_manager(&manager))
    }

    /// 处理字节流图像，只返回对外的分析结果
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisResult> {
        Ok(self.process_bytes(bytes)?.analysis)
    }

    /// 处理base64图像
    pub fn analyze_base64(&self, data: &str) -> Result<AnalysisResult> {
        let start_time = Instant::now();
        let tensor = self.preprocessor.preprocess_base64(data)?;
        Ok(self.finish(tensor, start_time)?.analysis)
    }

    /// 处理本地图像文件
    pub fn process_path(&self, path: &Path) -> Result<EcgReport> {
        let start_time = Instant::now();
        let tensor = self.preprocessor.preprocess_path(path)?;
        self.finish(tensor, start_time)
    }

    /// 处理字节流图像，返回包含概率和耗时的完整报告
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<EcgReport> {
        let start_time = Instant::now();
        let tensor = self.preprocessor.preprocess(bytes)?;
        self.finish(tensor, start_time)
    }

    fn finish(&self, tensor: NormalizedTensor, start_time: Instant) -> Result<EcgReport> {
        let preprocess_time = start_time.elapsed();

        let inference_start = Instant::now();
        let prediction = self.classifier.predict_detailed(&tensor)?;
        let inference_time = inference_start.elapsed();

        let analysis = RiskMapper::analyze(prediction.label);
        let stats = PipelineStats::new(preprocess_time, inference_time, start_time.elapsed());

        tracing::info!(
            "ECG analysis completed: label='{}', confidence={:.3}, risk={:?}, time={}ms",
            prediction.label,
            prediction.confidence(),
            analysis.risk_score.value(),
            stats.total_time_ms
        );

        Ok(EcgReport {
            prediction,
            analysis,
            stats,
        })
    }
}
