//! # 滤镜种类与参数键
//!
//! ## 设计思路
//!
//! 滤镜集合是封闭的，每种滤镜接受哪些参数在编译期以 `match` 穷举给出，
//! 不在运行时反射查询滤镜对象的输入键。新增滤镜时编译器会强制补全映射表。

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::FilterError;

/// 可调数值参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKey {
    Intensity,
    Radius,
    Scale,
}

impl ParameterKey {
    /// 渲染时按此顺序转发参数。
    pub const ALL: [ParameterKey; 3] = [Self::Intensity, Self::Radius, Self::Scale];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intensity => "intensity",
            Self::Radius => "radius",
            Self::Scale => "scale",
        }
    }

    /// 输入控件的取值范围。
    ///
    /// 流水线本身不校验范围，仅供调用侧（滑块 / CLI）钳制输入。
    pub fn range(self) -> (f64, f64) {
        match self {
            Self::Intensity => (0.0, 1.0),
            Self::Radius => (0.0, 200.0),
            Self::Scale => (0.0, 100.0),
        }
    }

    /// 将数值钳制到输入控件范围内。
    pub fn clamp(self, value: f64) -> f64 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 内置滤镜种类。
///
/// 默认滤镜为 `SepiaTone`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    Crystallize,
    Edges,
    GaussianBlur,
    Pixellate,
    #[default]
    SepiaTone,
    UnsharpMask,
    Vignette,
}

static KIND_LOOKUP: Lazy<HashMap<&'static str, FilterKind>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for kind in FilterKind::ALL {
        map.insert(kind.as_str(), kind);
    }
    map
});

impl FilterKind {
    /// 菜单展示顺序。
    pub const ALL: [FilterKind; 7] = [
        Self::Crystallize,
        Self::Edges,
        Self::GaussianBlur,
        Self::Pixellate,
        Self::SepiaTone,
        Self::UnsharpMask,
        Self::Vignette,
    ];

    /// 该滤镜接受的参数键。
    pub fn accepted_keys(self) -> &'static [ParameterKey] {
        use ParameterKey::*;
        match self {
            Self::Crystallize => &[Radius],
            Self::Edges => &[Intensity],
            Self::GaussianBlur => &[Radius],
            Self::Pixellate => &[Scale],
            Self::SepiaTone => &[Intensity],
            Self::UnsharpMask => &[Intensity, Radius],
            Self::Vignette => &[Intensity, Radius],
        }
    }

    pub fn accepts(self, key: ParameterKey) -> bool {
        self.accepted_keys().contains(&key)
    }

    /// 稳定标识，用于持久化与命令行。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crystallize => "crystallize",
            Self::Edges => "edges",
            Self::GaussianBlur => "gaussian-blur",
            Self::Pixellate => "pixellate",
            Self::SepiaTone => "sepia-tone",
            Self::UnsharpMask => "unsharp-mask",
            Self::Vignette => "vignette",
        }
    }

    /// 面向用户的名称。
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Crystallize => "Crystallize",
            Self::Edges => "Edges",
            Self::GaussianBlur => "Gaussian Blur",
            Self::Pixellate => "Pixellate",
            Self::SepiaTone => "Sepia Tone",
            Self::UnsharpMask => "Unsharp Mask",
            Self::Vignette => "Vignette",
        }
    }

    /// 从外部字符串解析滤镜。
    ///
    /// 同时接受稳定标识（`sepia-tone`）、下划线写法与展示名（`Sepia Tone`）。
    ///
    /// # 示例
    /// ```rust
    /// use instafilter::filter::FilterKind;
    ///
    /// let kind = FilterKind::from_str("Gaussian Blur")?;
    /// assert_eq!(kind, FilterKind::GaussianBlur);
    /// # Ok::<(), instafilter::filter::FilterError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Result<Self, FilterError> {
        let normalized = name.trim().to_lowercase().replace([' ', '_'], "-");
        KIND_LOOKUP.get(normalized.as_str()).copied().ok_or_else(|| {
            FilterError::InvalidFormat(format!(
                "未知滤镜：{}（可选：{}）",
                name,
                FilterKind::ALL.map(FilterKind::as_str).join(" / ")
            ))
        })
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
