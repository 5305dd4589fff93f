use crate::utils::error::EcgError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};
use ndarray::Array3;
use std::path::Path;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str, max_bytes: usize) -> Result<DynamicImage> {
        // 检测并移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = match base64_data.trim().strip_prefix("data:") {
            Some(rest) => rest
                .split_once(',')
                .map(|(_, payload)| payload)
                .ok_or_else(|| EcgError::Decode("malformed data URL".to_string()))?,
            None => base64_data.trim(),
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean)?;

        Self::from_bytes(&image_bytes, max_bytes)
    }

    /// 从字节加载图像
    pub fn from_bytes(bytes: &[u8], max_bytes: usize) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(EcgError::Decode("empty image payload".to_string()));
        }

        if bytes.len() > max_bytes {
            return Err(EcgError::FileTooLarge(bytes.len(), max_bytes));
        }

        let format = Self::detect_format(bytes)
            .ok_or_else(|| EcgError::Decode("unrecognized image encoding".to_string()))?;
        if !Self::is_supported_format(format) {
            return Err(EcgError::Decode(format!(
                "unsupported image encoding: {:?}",
                format
            )));
        }

        let image = image::load_from_memory_with_format(bytes, format)?;
        Self::validate_dimensions(&image)?;

        tracing::debug!(
            "Decoded {:?} image: {}x{}",
            format,
            image.width(),
            image.height()
        );

        Ok(image)
    }

    /// 从文件路径加载图像
    pub fn from_path(path: &Path, max_bytes: usize) -> Result<DynamicImage> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, max_bytes)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::Tiff
                | ImageFormat::WebP
                | ImageFormat::Gif
        )
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(EcgError::Decode(format!(
                "image has zero spatial extent: {}x{}",
                width, height
            )));
        }
        Ok(())
    }

    /// 转换为 ndarray::Array3<f32> (HWC格式)，值域 [0, 255]
    ///
    /// `channels` 为 3 时输出 RGB，为 1 时输出灰度。
    pub fn to_array3(image: &DynamicImage, channels: usize) -> Result<Array3<f32>> {
        let (width, height) = image.dimensions();
        let raw_data = match channels {
            1 => image.to_luma8().into_raw(),
            3 => image.to_rgb8().into_raw(),
            other => {
                return Err(EcgError::Config(format!(
                    "unsupported channel count: {}",
                    other
                )));
            }
        };

        Array3::from_shape_vec(
            (height as usize, width as usize, channels),
            raw_data.into_iter().map(f32::from).collect(),
        )
        .map_err(|e| EcgError::Internal(format!("pixel buffer shape error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    const MAX: usize = 50 * 1024 * 1024;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png() {
        let image = ImageLoader::from_bytes(&png_bytes(12, 7), MAX).unwrap();
        assert_eq!(image.dimensions(), (12, 7));
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(matches!(
            ImageLoader::from_bytes(&[], MAX),
            Err(EcgError::Decode(_))
        ));
        assert!(matches!(
            ImageLoader::from_bytes(b"hello, this is not an image", MAX),
            Err(EcgError::Decode(_))
        ));

        // PNG 魔数后面跟着损坏的数据
        let mut truncated = png_bytes(12, 7);
        truncated.truncate(20);
        assert!(matches!(
            ImageLoader::from_bytes(&truncated, MAX),
            Err(EcgError::Decode(_))
        ));
    }

    #[test]
    fn rejects_oversized_payload() {
        let bytes = png_bytes(12, 7);
        match ImageLoader::from_bytes(&bytes, 16) {
            Err(EcgError::FileTooLarge(size, max)) => {
                assert_eq!(size, bytes.len());
                assert_eq!(max, 16);
            }
            other => panic!("expected FileTooLarge, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn decodes_base64_with_and_without_data_url() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(5, 5));
        let plain = ImageLoader::from_base64(&encoded, MAX).unwrap();
        let data_url = format!("data:image/png;base64,{}", encoded);
        let prefixed = ImageLoader::from_base64(&data_url, MAX).unwrap();
        assert_eq!(plain.dimensions(), prefixed.dimensions());

        assert!(matches!(
            ImageLoader::from_base64("!!!not base64!!!", MAX),
            Err(EcgError::Decode(_))
        ));
    }

    #[test]
    fn converts_to_hwc_array() {
        let image = ImageLoader::from_bytes(&png_bytes(4, 3), MAX).unwrap();

        let rgb = ImageLoader::to_array3(&image, 3).unwrap();
        assert_eq!(rgb.dim(), (3, 4, 3));
        assert_eq!(rgb[[2, 3, 0]], 10.0);
        assert_eq!(rgb[[2, 3, 1]], 20.0);
        assert_eq!(rgb[[2, 3, 2]], 30.0);

        let gray = ImageLoader::to_array3(&image, 1).unwrap();
        assert_eq!(gray.dim(), (3, 4, 1));
    }

    #[test]
    fn reads_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.png");
        std::fs::write(&path, png_bytes(9, 9)).unwrap();
        assert!(ImageLoader::from_path(&path, MAX).is_ok());
        assert!(matches!(
            ImageLoader::from_path(&dir.path().join("missing.png"), MAX),
            Err(EcgError::Io(_))
        ));
    }
}
