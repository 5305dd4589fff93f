use crate::models::tensor::{PixelRange, TensorSpec};
use crate::utils::error::EcgError;
use crate::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件路径（ONNX）
    pub model_path: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// 模型输入配置
    pub input_config: InputConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别 (0-3)
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

#[derive(Debug, Clone)]
pub struct InputConfig {
    /// 模型期望的输入尺寸 (H, W, C)
    pub spec: TensorSpec,

    /// 像素值缩放区间
    pub pixel_range: PixelRange,

    /// 单张图片的最大字节数
    pub max_image_bytes: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            spec: TensorSpec::default(),
            pixel_range: PixelRange::ZeroToOne,
            max_image_bytes: 50 * 1024 * 1024,
        }
    }
}

impl InputConfig {
    /// 把以 MiB 表示的上传上限换算成字节
    pub fn max_image_bytes_from_mib(mib: usize) -> Result<usize> {
        mib.checked_mul(1024 * 1024).ok_or_else(|| {
            EcgError::Config(format!("Upload limit of {} MiB is too large", mib))
        })
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: String,
        workers: Option<usize>,
        dev_mode: bool,
        input_config: InputConfig,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        if workers == 0 {
            return Err(EcgError::Config("workers must be at least 1".to_string()));
        }

        let spec = input_config.spec;
        if spec.height == 0 || spec.width == 0 {
            return Err(EcgError::Config(format!(
                "Input size must be non-zero, got {}x{}",
                spec.height, spec.width
            )));
        }
        if spec.channels != 1 && spec.channels != 3 {
            return Err(EcgError::Config(format!(
                "Input channels must be 1 or 3, got {}",
                spec.channels
            )));
        }

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        // multipart 包装会多出一些字节
        let max_request_size = input_config
            .max_image_bytes
            .checked_add(64 * 1024)
            .ok_or_else(|| {
                EcgError::Config(format!(
                    "Upload limit of {} bytes is too large",
                    input_config.max_image_bytes
                ))
            })?;

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size,
        };

        Ok(Self {
            bind_addr,
            model_path: PathBuf::from(model_path),
            workers,
            dev_mode,
            onnx_config,
            server_config,
            input_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(height: usize, width: usize, channels: usize) -> InputConfig {
        InputConfig {
            spec: TensorSpec::new(height, width, channels),
            ..InputConfig::default()
        }
    }

    #[test]
    fn defaults_are_derived_from_cpu_count() {
        let config = Config::new(
            "127.0.0.1:8000".to_string(),
            "models/ecg_model.onnx".to_string(),
            None,
            false,
            InputConfig::default(),
        )
        .unwrap();

        assert_eq!(config.workers, num_cpus::get());
        assert!(config.onnx_config.intra_threads >= 1);
        assert_eq!(config.server_config.request_timeout, 60);
        assert!(config.server_config.max_request_size > config.input_config.max_image_bytes);
    }

    #[test]
    fn dev_mode_extends_timeout() {
        let config = Config::new(
            "127.0.0.1:8000".to_string(),
            "m.onnx".to_string(),
            Some(2),
            true,
            InputConfig::default(),
        )
        .unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.server_config.request_timeout, 300);
    }

    #[test]
    fn rejects_bad_input_spec() {
        for bad in [input(0, 224, 3), input(224, 224, 4)] {
            let err = Config::new("a".to_string(), "m".to_string(), Some(1), false, bad)
                .unwrap_err();
            assert!(matches!(err, EcgError::Config(_)));
        }
    }

    #[test]
    fn upload_limit_conversion_rejects_overflow() {
        assert_eq!(InputConfig::max_image_bytes_from_mib(50).unwrap(), 50 * 1024 * 1024);
        assert!(matches!(
            InputConfig::max_image_bytes_from_mib(usize::MAX),
            Err(EcgError::Config(_))
        ));

        let huge = InputConfig {
            max_image_bytes: usize::MAX,
            ..InputConfig::default()
        };
        let err = Config::new("a".to_string(), "m".to_string(), Some(1), false, huge)
            .unwrap_err();
        assert!(matches!(err, EcgError::Config(_)));
    }
}
