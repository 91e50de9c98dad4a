//! # 图像处理能力（后端）
//!
//! ## 设计思路
//!
//! 流水线不直接实现滤镜算法，而是通过 `FilterBackend` 创建滤镜对象，
//! 再向滤镜对象绑定输入图片与参数、索取输出。滤镜对象自己保存各参数的默认值，
//! 未被转发的参数保持滤镜自身的默认值或上一次的值。
//!
//! ## 实现思路
//!
//! - `BuiltinBackend` 把七种滤镜分派到 `effects`，其中借助 `photon_rs`、`imageproc` 与 `image::imageops`。
//! - 参数非有限值（NaN / 无穷）、输入缺失或尺寸为空时，`output_image` 返回 `None`，
//!   与平台图像框架“拿不到输出图”的行为一致。
//! - 所有算子都是确定性的，同一状态重复渲染结果逐像素一致。

use std::collections::HashMap;

use image::RgbaImage;

use super::{FilterKind, ParameterKey, SourceImage, effects};

/// 单个滤镜对象。
pub trait ImageFilter: Send {
    fn kind(&self) -> FilterKind;

    /// 绑定（或清除）输入图片。
    fn set_input_image(&mut self, image: Option<SourceImage>);

    /// 写入一个参数值。
    fn set_value(&mut self, key: ParameterKey, value: f64);

    /// 读取当前生效的参数值。
    fn value(&self, key: ParameterKey) -> Option<f64>;

    /// 以输入图片的完整范围渲染输出。
    fn output_image(&self) -> Option<RgbaImage>;
}

/// 图像处理能力：按种类创建滤镜对象。
///
/// 渲染上下文在所有渲染之间串行复用。
pub trait FilterBackend: Send {
    fn create_filter(&self, kind: FilterKind) -> Box<dyn ImageFilter>;
}

/// 内置后端。
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinBackend;

impl FilterBackend for BuiltinBackend {
    fn create_filter(&self, kind: FilterKind) -> Box<dyn ImageFilter> {
        Box::new(BuiltinFilter::new(kind))
    }
}

/// 内置滤镜对象。
#[derive(Debug, Clone)]
pub struct BuiltinFilter {
    kind: FilterKind,
    input: Option<SourceImage>,
    values: HashMap<ParameterKey, f64>,
}

impl BuiltinFilter {
    pub fn new(kind: FilterKind) -> Self {
        let values = Self::default_values(kind).iter().copied().collect();
        Self {
            kind,
            input: None,
            values,
        }
    }

    /// 各滤镜自带的默认参数。
    fn default_values(kind: FilterKind) -> &'static [(ParameterKey, f64)] {
        use ParameterKey::*;
        match kind {
            FilterKind::Crystallize => &[(Radius, 20.0)],
            FilterKind::Edges => &[(Intensity, 1.0)],
            FilterKind::GaussianBlur => &[(Radius, 10.0)],
            FilterKind::Pixellate => &[(Scale, 8.0)],
            FilterKind::SepiaTone => &[(Intensity, 1.0)],
            FilterKind::UnsharpMask => &[(Intensity, 0.5), (Radius, 2.5)],
            FilterKind::Vignette => &[(Intensity, 0.0), (Radius, 100.0)],
        }
    }

    fn param(&self, key: ParameterKey) -> Option<f32> {
        let value = *self.values.get(&key)?;
        if !value.is_finite() {
            log::debug!("⚠️ {} 参数 {} 非有限值：{}", self.kind, key, value);
            return None;
        }
        Some(value as f32)
    }
}

impl ImageFilter for BuiltinFilter {
    fn kind(&self) -> FilterKind {
        self.kind
    }

    fn set_input_image(&mut self, image: Option<SourceImage>) {
        self.input = image;
    }

    fn set_value(&mut self, key: ParameterKey, value: f64) {
        if !self.kind.accepts(key) {
            log::debug!("{} 不接受参数 {}，忽略", self.kind, key);
            return;
        }
        self.values.insert(key, value);
    }

    fn value(&self, key: ParameterKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    fn output_image(&self) -> Option<RgbaImage> {
        let input = self.input.as_ref()?;
        let src = input.as_rgba();
        if src.width() == 0 || src.height() == 0 {
            return None;
        }

        use ParameterKey::*;
        let output = match self.kind {
            FilterKind::Crystallize => effects::crystallize(src, self.param(Radius)?),
            FilterKind::Edges => effects::edges(src, self.param(Intensity)?),
            FilterKind::GaussianBlur => effects::gaussian_blur(src, self.param(Radius)?),
            FilterKind::Pixellate => effects::pixellate(src, self.param(Scale)?)?,
            FilterKind::SepiaTone => effects::sepia_tone(src, self.param(Intensity)?)?,
            FilterKind::UnsharpMask => {
                effects::unsharp_mask(src, self.param(Radius)?, self.param(Intensity)?)
            }
            FilterKind::Vignette => {
                effects::vignette(src, self.param(Radius)?, self.param(Intensity)?)
            }
        };
        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn source() -> SourceImage {
        SourceImage::new(RgbaImage::from_fn(8, 8, |x, y| {
            Rgba([(x * 30) as u8, (y * 30) as u8, 90, 255])
        }))
    }

    #[test]
    fn no_input_yields_no_output() {
        for kind in FilterKind::ALL {
            let filter = BuiltinBackend.create_filter(kind);
            assert!(filter.output_image().is_none(), "{kind} rendered without input");
        }
    }

    #[test]
    fn every_kind_renders_full_extent() {
        for kind in FilterKind::ALL {
            let mut filter = BuiltinBackend.create_filter(kind);
            filter.set_input_image(Some(source()));
            let output = filter.output_image().expect("output expected");
            assert_eq!(output.dimensions(), (8, 8), "{kind} changed extent");
        }
    }

    #[test]
    fn unsupported_keys_are_ignored() {
        let mut filter = BuiltinFilter::new(FilterKind::SepiaTone);
        filter.set_value(ParameterKey::Radius, 3.0);
        assert_eq!(filter.value(ParameterKey::Radius), None);
        filter.set_value(ParameterKey::Intensity, 0.25);
        assert_eq!(filter.value(ParameterKey::Intensity), Some(0.25));
    }

    #[test]
    fn keeps_own_defaults_until_forwarded() {
        let filter = BuiltinFilter::new(FilterKind::UnsharpMask);
        assert_eq!(filter.value(ParameterKey::Radius), Some(2.5));
        assert_eq!(filter.value(ParameterKey::Intensity), Some(0.5));
    }

    #[test]
    fn non_finite_parameter_yields_no_output() {
        let mut filter = BuiltinFilter::new(FilterKind::GaussianBlur);
        filter.set_input_image(Some(source()));
        filter.set_value(ParameterKey::Radius, f64::NAN);
        assert!(filter.output_image().is_none());
    }

    #[test]
    fn empty_extent_yields_no_output() {
        let mut filter = BuiltinFilter::new(FilterKind::SepiaTone);
        filter.set_input_image(Some(SourceImage::new(RgbaImage::new(0, 0))));
        assert!(filter.output_image().is_none());
    }
}
