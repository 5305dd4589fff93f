use crate::config::Config;
use crate::models::backend::{InferenceBackend, OnnxBackend};
use crate::models::label::ClassLabel;
use crate::models::tensor::{NormalizedTensor, TensorSpec};
use crate::utils::error::EcgError;
use crate::Result;
use serde::Serialize;

/// 单次分类的详细结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: ClassLabel,
    /// 按 `ClassLabel::ALL` 顺序排列的概率分布
    pub probabilities: [f32; ClassLabel::COUNT],
}

impl Prediction {
    pub fn confidence(&self) -> f32 {
        self.probabilities[self.label.index()]
    }
}

/// 心律失常分类器
///
/// 加载后只读；`predict` 可以从任意线程并发调用。
pub struct Classifier {
    backend: Box<dyn InferenceBackend>,
    spec: TensorSpec,
}

impl Classifier {
    /// 从配置加载 ONNX 模型
    pub fn new(config: &Config) -> Result<Self> {
        let backend = OnnxBackend::load(&config.model_path, &config.onnx_config)?;
        Ok(Self::with_backend(Box::new(backend), config.input_config.spec))
    }

    /// 使用自定义推理后端
    pub fn with_backend(backend: Box<dyn InferenceBackend>, spec: TensorSpec) -> Self {
        Self { backend, spec }
    }

    pub fn spec(&self) -> TensorSpec {
        self.spec
    }

    pub fn backend_description(&self) -> String {
        self.backend.describe()
    }

    pub fn predict(&self, tensor: &NormalizedTensor) -> Result<ClassLabel> {
        Ok(self.predict_detailed(tensor)?.label)
    }

    pub fn predict_detailed(&self, tensor: &NormalizedTensor) -> Result<Prediction> {
        tensor.ensure_matches(&self.spec)?;

        let scores = self.backend.run(tensor.view())?;
        let probabilities = to_distribution(&scores)?;
        let label = select_label(&probabilities)?;

        tracing::debug!(
            "Predicted '{}' with probability {:.4}",
            label,
            probabilities[label.index()]
        );

        Ok(Prediction { label, probabilities })
    }
}

/// 将模型输出整理为概率分布；已经是分布时原样返回，否则做 softmax
///
/// NaN 保持为 NaN；`-inf` 的概率为 0；出现 `+inf` 时全部概率平分给这些位置。
fn to_distribution(scores: &[f32]) -> Result<[f32; ClassLabel::COUNT]> {
    let mut probabilities: [f32; ClassLabel::COUNT] = scores.try_into().map_err(|_| {
        EcgError::Inference(format!(
            "Expected {} class scores, model returned {}",
            ClassLabel::COUNT,
            scores.len()
        ))
    })?;

    let unbounded = probabilities.iter().filter(|&&p| p == f32::INFINITY).count();
    if unbounded > 0 {
        let share = 1.0 / unbounded as f32;
        for p in probabilities.iter_mut().filter(|p| !p.is_nan()) {
            *p = if *p == f32::INFINITY { share } else { 0.0 };
        }
        return Ok(probabilities);
    }

    let usable = probabilities.iter().filter(|p| !p.is_nan());
    let is_distribution = usable.clone().all(|&p| p.is_finite() && p >= 0.0)
        && (usable.sum::<f32>() - 1.0).abs() <= 1e-3;

    if !is_distribution {
        let max = probabilities
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0;
        for p in probabilities.iter_mut().filter(|p| !p.is_nan()) {
            // 余下的非有限值只可能是 -inf
            *p = if max.is_finite() { (*p - max).exp() } else { 0.0 };
            sum += *p;
        }
        if sum > 0.0 {
            for p in probabilities.iter_mut().filter(|p| !p.is_nan()) {
                *p /= sum;
            }
        }
    }

    Ok(probabilities)
}

/// 取概率最大的类别；并列时取下标最小者，NaN 永远不会被选中
pub(crate) fn select_label(probabilities: &[f32; ClassLabel::COUNT]) -> Result<ClassLabel> {
    let mut best: Option<(usize, f32)> = None;

    for (i, &p) in probabilities.iter().enumerate() {
        if p.is_nan() {
            continue;
        }
        match best {
            Some((_, best_p)) if p <= best_p => {}
            _ => best = Some((i, p)),
        }
    }

    best.and_then(|(i, _)| ClassLabel::from_index(i))
        .ok_or_else(|| EcgError::Inference("Model returned no usable scores".to_string()))
}
