use crate::analysis;
use crate::models::{ClassLabel, Classifier, NormalizedTensor, Prediction};
use crate::utils::error::EcgError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// 全局模型管理器
///
/// 初始化后只读，不需要额外加锁。
pub struct ModelManager {
    classifier: Arc<Classifier>,
    config: Config,
}

static MODEL_MANAGER: OnceCell<Arc<ModelManager>> = OnceCell::new();

impl ModelManager {
    /// 初始化全局模型管理器
    ///
    /// 并发调用时模型只会加载一次；已初始化时直接返回现有实例。
    pub fn init(config: Config) -> Result<Arc<ModelManager>> {
        MODEL_MANAGER
            .get_or_try_init(|| -> Result<Arc<ModelManager>> {
                tracing::info!("Initializing model manager...");
                let classifier = Classifier::new(&config)?;
                let manager = ModelManager::from_classifier(config, classifier)?;
                tracing::info!("Model manager initialized successfully");
                Ok(Arc::new(manager))
            })
            .map(Arc::clone)
    }

    /// 用已加载的分类器构建管理器：校验风险表并做一次预热推理
    pub fn from_classifier(config: Config, classifier: Classifier) -> Result<Self> {
        analysis::validate_tables()?;

        let warmup = NormalizedTensor::zeros(classifier.spec());
        classifier.predict(&warmup).map_err(|e| {
            EcgError::ModelLoad(format!(
                "Warm-up inference failed for input shape {:?}: {}",
                classifier.spec().shape(),
                e
            ))
        })?;
        tracing::debug!("Warm-up inference passed ({})", classifier.backend_description());

        Ok(Self {
            classifier: Arc::new(classifier),
            config,
        })
    }

    /// 获取全局模型管理器实例
    pub fn instance() -> Result<Arc<ModelManager>> {
        MODEL_MANAGER
            .get()
            .cloned()
            .ok_or_else(|| EcgError::ModelLoad("Model manager not initialized".to_string()))
    }

    /// 获取分类器引用
    pub fn classifier(&self) -> Arc<Classifier> {
        Arc::clone(&self.classifier)
    }

    /// 获取配置引用
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 模型健康检查：重新跑一次零张量推理
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");
        self.classifier
            .predict(&NormalizedTensor::zeros(self.classifier.spec()))?;
        tracing::debug!("Model health check passed");
        Ok(())
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        let spec = self.classifier.spec();
        ModelStats {
            model_path: self.config.model_path.display().to_string(),
            backend: self.classifier.backend_description(),
            input_shape: spec.shape(),
            pixel_range: self.config.input_config.pixel_range.to_string(),
            labels: ClassLabel::ALL.iter().map(|l| l.name()).collect(),
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub model_path: String,
    pub backend: String,
    pub input_shape: [usize; 4],
    pub pixel_range: String,
    pub labels: Vec<&'static str>,
    pub intra_threads: usize,
    pub optimization_level: i32,
}

/// 便捷函数：获取分类器
pub fn get_classifier() -> Result<Arc<Classifier>> {
    Ok(ModelManager::instance()?.classifier())
}

/// 便捷函数：用全局模型分类；模型未加载时返回 ModelLoad 错误
pub fn classify(tensor: &NormalizedTensor) -> Result<ClassLabel> {
    get_classifier()?.predict(tensor)
}

/// 便捷函数：分类并返回概率分布
pub fn classify_detailed(tensor: &NormalizedTensor) -> Result<Prediction> {
    get_classifier()?.predict_detailed(tensor)
}

/// 便捷函数：检查模型健康状态
pub fn health_check() -> Result<()> {
    ModelManager::instance()?.health_check()
}

/// 便捷函数：获取模型统计信息
pub fn get_model_stats() -> Result<ModelStats> {
    Ok(ModelManager::instance()?.get_stats())
}
