use crate::utils::error::EcgError;
use crate::Result;
use ndarray::{Array4, ArrayView4};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// 模型输入签名 (H, W, C)，batch 固定为 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TensorSpec {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl TensorSpec {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self { height, width, channels }
    }

    /// NHWC 形状
    pub fn shape(&self) -> [usize; 4] {
        [1, self.height, self.width, self.channels]
    }
}

impl Default for TensorSpec {
    fn default() -> Self {
        Self::new(224, 224, 3)
    }
}

/// 像素值归一化区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PixelRange {
    /// v / 255
    ZeroToOne,
    /// v / 127.5 - 1
    MinusOneToOne,
}

impl PixelRange {
    /// 把 [0, 255] 的像素值映射到目标区间
    pub fn normalize(self, value: f32) -> f32 {
        let value = value.clamp(0.0, 255.0);
        match self {
            PixelRange::ZeroToOne => value / 255.0,
            PixelRange::MinusOneToOne => value / 127.5 - 1.0,
        }
    }

    pub fn bounds(self) -> (f32, f32) {
        match self {
            PixelRange::ZeroToOne => (0.0, 1.0),
            PixelRange::MinusOneToOne => (-1.0, 1.0),
        }
    }
}

impl fmt::Display for PixelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelRange::ZeroToOne => f.write_str("zero-to-one"),
            PixelRange::MinusOneToOne => f.write_str("minus-one-to-one"),
        }
    }
}

impl FromStr for PixelRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "zero-to-one" | "0..1" => Ok(PixelRange::ZeroToOne),
            "minus-one-to-one" | "-1..1" => Ok(PixelRange::MinusOneToOne),
            other => Err(format!(
                "unknown pixel range '{}', expected 'zero-to-one' or 'minus-one-to-one'",
                other
            )),
        }
    }
}

/// 送入分类器的归一化张量，NHWC 布局
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    data: Array4<f32>,
}

impl NormalizedTensor {
    /// 包装任意四维数组；形状是否符合模型签名在推理时检查
    pub fn from_array(data: Array4<f32>) -> Self {
        Self { data }
    }

    /// 按签名构造全零张量（用于模型预热）
    pub fn zeros(spec: TensorSpec) -> Self {
        Self::from_array(Array4::zeros((1, spec.height, spec.width, spec.channels)))
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    pub fn into_array(self) -> Array4<f32> {
        self.data
    }

    pub fn ensure_matches(&self, spec: &TensorSpec) -> Result<()> {
        let expected = spec.shape();
        if self.shape() != expected {
            return Err(EcgError::ShapeMismatch {
                expected,
                actual: self.shape().to_vec(),
            });
        }
        Ok(())
    }
}
