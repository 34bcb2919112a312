use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::BufReader;
use std::path::Path;
use utoipa::ToSchema;

use crate::services::thumbnail::ImageError;

pub const DEFAULT_SAMPLES: u32 = 10;

/// 求平均值时使用的除数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleDivisor {
    /// 实际采样次数
    #[default]
    SampleCount,
    /// 采样次数 + 1，与旧版输出逐位一致
    LegacyPlusOne,
}

/// 明暗判断结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Light,
    Dark,
}

impl Tone {
    pub fn from_luminance(luminance: f64) -> Self {
        if luminance >= 127.5 {
            Self::Light
        } else {
            Self::Dark
        }
    }
}

/// 在 x/y 两个方向各取约 `num_samples` 个点，计算平均亮度 `(2r + 3g + b) / 6`
pub fn sample_luminance(img: &RgbaImage, num_samples: u32, divisor: SampleDivisor) -> f64 {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let num_samples = num_samples.max(1);
    let x_step = (width / num_samples).max(1) as usize;
    let y_step = (height / num_samples).max(1) as usize;

    let mut total = 0.0;
    let mut samples = 0u64;
    for x in (0..width).step_by(x_step) {
        for y in (0..height).step_by(y_step) {
            let [r, g, b, _] = img.get_pixel(x, y).0;
            let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
            total += (r + r + b + g + g + g) / 6.0;
            samples += 1;
        }
    }

    let count = match divisor {
        SampleDivisor::SampleCount => samples,
        SampleDivisor::LegacyPlusOne => samples + 1,
    };
    total / count as f64
}

/// 读取 PNG 文件并计算平均亮度
pub fn average_luminance(
    path: &Path,
    num_samples: u32,
    divisor: SampleDivisor,
) -> Result<f64, ImageError> {
    let file = std::fs::File::open(path)?;
    let img = image::load(BufReader::new(file), ImageFormat::Png).map_err(ImageError::Decode)?;
    Ok(sample_luminance(&img.to_rgba8(), num_samples, divisor))
}
