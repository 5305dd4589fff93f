use crate::config::OnnxConfig;
use crate::utils::error::EcgError;
use crate::Result;
use ndarray::ArrayView4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// 推理后端：输入 NHWC 张量，输出每个类别的原始分数
///
/// 实现必须可以被多个线程同时调用。
pub trait InferenceBackend: Send + Sync {
    fn run(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>>;

    /// 后端描述，用于日志和 /api/info
    fn describe(&self) -> String;
}

/// 基于 ONNX Runtime 的后端
pub struct OnnxBackend {
    // Session::run 需要 &mut，推理在锁内串行执行
    session: Mutex<Session>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
}

impl OnnxBackend {
    pub fn load(model_path: &Path, onnx_config: &OnnxConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(EcgError::ModelLoad(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading ECG model from: {}", model_path.display());

        let session = Session::builder()
            .map_err(|e| EcgError::ModelLoad(e.to_string()))?
            .with_optimization_level(optimization_level(onnx_config.optimization_level))
            .map_err(|e| EcgError::ModelLoad(e.to_string()))?
            .with_intra_threads(onnx_config.intra_threads)
            .map_err(|e| EcgError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| EcgError::ModelLoad(format!("{}: {}", model_path.display(), e)))?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(EcgError::ModelLoad("Model has no inputs".to_string()));
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(EcgError::ModelLoad("Model has no outputs".to_string()));
            }
        };

        tracing::info!("Model input: '{}', output: '{}'", input_name, output_name);
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Model output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl InferenceBackend for OnnxBackend {
    fn run(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input.to_owned())
            .map_err(|e| EcgError::Inference(format!("Failed to build input tensor: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| EcgError::Inference(e.to_string()))?;

        match outputs.get(&self.output_name) {
            Some(output) => {
                let scores = output
                    .try_extract_array::<f32>()
                    .map_err(|e| EcgError::Inference(e.to_string()))?;
                Ok(scores.iter().copied().collect())
            }
            None => {
                let available_outputs: Vec<String> =
                    outputs.keys().map(|s| s.to_string()).collect();
                Err(EcgError::Inference(format!(
                    "Output '{}' not found. Available outputs: {:?}",
                    self.output_name, available_outputs
                )))
            }
        }
    }

    fn describe(&self) -> String {
        format!("onnxruntime ({} -> {})", self.input_name, self.output_name)
    }
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    type ScoreFn = dyn Fn(ArrayView4<'_, f32>) -> Vec<f32> + Send + Sync;

    /// 用闭包模拟模型输出的测试后端
    pub(crate) struct FnBackend {
        score: Box<ScoreFn>,
    }

    impl FnBackend {
        pub(crate) fn new<F>(score: F) -> Self
        where
            F: Fn(ArrayView4<'_, f32>) -> Vec<f32> + Send + Sync + 'static,
        {
            Self { score: Box::new(score) }
        }

        /// 无论输入如何都返回同一组分数
        pub(crate) fn fixed(scores: Vec<f32>) -> Self {
            Self::new(move |_| scores.clone())
        }
    }

    impl InferenceBackend for FnBackend {
        fn run(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>> {
            Ok((self.score)(input))
        }

        fn describe(&self) -> String {
            "test backend".to_string()
        }
    }
}
