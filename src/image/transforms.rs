use crate::utils::error::EcgError;
use crate::Result;
use ndarray::Array3;

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 双线性插值缩放到固定尺寸（不保持宽高比，不填充）
    ///
    /// 采样点按像素中心对齐，越界坐标夹取到边缘。
    pub fn resize_bilinear(
        image: &Array3<f32>,
        target_height: usize,
        target_width: usize,
    ) -> Result<Array3<f32>> {
        let (orig_h, orig_w, channels) = image.dim();
        if orig_h == 0 || orig_w == 0 {
            return Err(EcgError::Decode(format!(
                "cannot resize image with zero extent: {}x{}",
                orig_w, orig_h
            )));
        }
        if target_height == 0 || target_width == 0 {
            return Err(EcgError::Config(format!(
                "invalid resize target: {}x{}",
                target_width, target_height
            )));
        }

        if (orig_h, orig_w) == (target_height, target_width) {
            return Ok(image.clone());
        }

        let scale_h = orig_h as f32 / target_height as f32;
        let scale_w = orig_w as f32 / target_width as f32;

        let mut resized = Array3::<f32>::zeros((target_height, target_width, channels));

        for h in 0..target_height {
            let src_h = ((h as f32 + 0.5) * scale_h - 0.5).clamp(0.0, (orig_h - 1) as f32);
            let h1 = src_h.floor() as usize;
            let h2 = (h1 + 1).min(orig_h - 1);
            let dh = src_h - h1 as f32;

            for w in 0..target_width {
                let src_w = ((w as f32 + 0.5) * scale_w - 0.5).clamp(0.0, (orig_w - 1) as f32);
                let w1 = src_w.floor() as usize;
                let w2 = (w1 + 1).min(orig_w - 1);
                let dw = src_w - w1 as f32;

                for c in 0..channels {
                    let v11 = image[[h1, w1, c]];
                    let v12 = image[[h1, w2, c]];
                    let v21 = image[[h2, w1, c]];
                    let v22 = image[[h2, w2, c]];

                    resized[[h, w, c]] = v11 * (1.0 - dh) * (1.0 - dw)
                        + v12 * (1.0 - dh) * dw
                        + v21 * dh * (1.0 - dw)
                        + v22 * dh * dw;
                }
            }
        }

        Ok(resized)
    }
}
