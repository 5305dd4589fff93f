use crate::config::InputConfig;
use crate::image::{ImageLoader, ImageTransforms};
use crate::models::{NormalizedTensor, PixelRange, TensorSpec};
use crate::Result;
use image::DynamicImage;
use ndarray::Axis;
use std::path::Path;

/// 原始图像字节 -> 模型输入张量
///
/// 输出形状恒为 `[1, H, W, C]`，与源图尺寸和编码无关。
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    spec: TensorSpec,
    pixel_range: PixelRange,
    max_image_bytes: usize,
}

impl ImagePreprocessor {
    pub fn new(input_config: &InputConfig) -> Self {
        Self {
            spec: input_config.spec,
            pixel_range: input_config.pixel_range,
            max_image_bytes: input_config.max_image_bytes,
        }
    }

    pub fn spec(&self) -> TensorSpec {
        self.spec
    }

    pub fn preprocess(&self, bytes: &[u8]) -> Result<NormalizedTensor> {
        let image = ImageLoader::from_bytes(bytes, self.max_image_bytes)?;
        self.preprocess_image(&image)
    }

    pub fn preprocess_base64(&self, data: &str) -> Result<NormalizedTensor> {
        let image = ImageLoader::from_base64(data, self.max_image_bytes)?;
        self.preprocess_image(&image)
    }

    pub fn preprocess_path(&self, path: &Path) -> Result<NormalizedTensor> {
        let image = ImageLoader::from_path(path, self.max_image_bytes)?;
        self.preprocess_image(&image)
    }

    /// 通道转换 -> 双线性缩放 -> 归一化 -> 添加batch维度
    pub fn preprocess_image(&self, image: &DynamicImage) -> Result<NormalizedTensor> {
        ImageLoader::validate_dimensions(image)?;

        let pixels = ImageLoader::to_array3(image, self.spec.channels)?;
        let mut resized =
            ImageTransforms::resize_bilinear(&pixels, self.spec.height, self.spec.width)?;

        let range = self.pixel_range;
        resized.mapv_inplace(|v| range.normalize(v));

        let tensor = NormalizedTensor::from_array(resized.insert_axis(Axis(0)));
        tensor.ensure_matches(&self.spec)?;
        Ok(tensor)
    }
}

/// 便捷函数：按输入配置预处理图像字节
pub fn preprocess(bytes: &[u8], input_config: &InputConfig) -> Result<NormalizedTensor> {
    ImagePreprocessor::new(input_config).preprocess(bytes)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::utils::error::EcgError;
    use image::{ImageFormat, Rgb, RgbImage};

    fn preprocessor(height: usize, width: usize, channels: usize, range: PixelRange) -> ImagePreprocessor {
        ImagePreprocessor::new(&InputConfig {
            spec: TensorSpec::new(height, width, channels),
            pixel_range: range,
            ..InputConfig::default()
        })
    }

    #[test]
    fn output_shape_is_invariant() {
        let preprocessor = preprocessor(32, 48, 3, PixelRange::ZeroToOne);
        let inputs = vec![
            encode(flat_line(640, 240), ImageFormat::Png),
            encode(flat_line(17, 9), ImageFormat::Png),
            encode(flat_line(300, 1000), ImageFormat::Jpeg),
            encode(chaotic_trace(128, 128), ImageFormat::Bmp),
            encode(flat_line(1, 1), ImageFormat::Png),
        ];

        for bytes in inputs {
            let tensor = preprocessor.preprocess(&bytes).unwrap();
            assert_eq!(tensor.shape(), &[1, 32, 48, 3]);
        }
    }

    #[test]
    fn values_stay_in_range() {
        let bytes = encode(chaotic_trace(200, 100), ImageFormat::Png);

        let tensor = preprocessor(24, 24, 3, PixelRange::ZeroToOne)
            .preprocess(&bytes)
            .unwrap();
        assert!(tensor.view().iter().all(|v| (0.0..=1.0).contains(v)));

        let tensor = preprocessor(24, 24, 3, PixelRange::MinusOneToOne)
            .preprocess(&bytes)
            .unwrap();
        assert!(tensor.view().iter().all(|v| (-1.0..=1.0).contains(v)));
        assert!(tensor.view().iter().any(|v| *v < 0.0));
    }

    #[test]
    fn white_pixels_map_to_upper_bound() {
        let bytes = encode(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])), ImageFormat::Png);
        let tensor = preprocessor(4, 4, 3, PixelRange::ZeroToOne)
            .preprocess(&bytes)
            .unwrap();
        assert!(tensor.view().iter().all(|v| (*v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn grayscale_spec_has_one_channel() {
        let bytes = encode(flat_line(64, 64), ImageFormat::Png);
        let tensor = preprocessor(16, 16, 1, PixelRange::ZeroToOne)
            .preprocess(&bytes)
            .unwrap();
        assert_eq!(tensor.shape(), &[1, 16, 16, 1]);
    }

    #[test]
    fn malformed_input_fails_with_decode_error() {
        let preprocessor = preprocessor(16, 16, 3, PixelRange::ZeroToOne);
        for bytes in [&b""[..], &b"\x00\x01\x02\x03"[..], &b"GIF89a-but-not-really"[..]] {
            assert!(matches!(
                preprocessor.preprocess(bytes),
                Err(EcgError::Decode(_))
            ));
        }
    }

    #[test]
    fn base64_and_bytes_agree() {
        use base64::Engine;
        let bytes = encode(flat_line(50, 30), ImageFormat::Png);
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let preprocessor = preprocessor(8, 8, 3, PixelRange::ZeroToOne);
        assert_eq!(
            preprocessor.preprocess(&bytes).unwrap(),
            preprocessor.preprocess_base64(&encoded).unwrap()
        );
    }
}
