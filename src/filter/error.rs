//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载滤镜链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 错误分为三个阶段：
//! - `acquire`：读取 / 识别 / 解码源图片
//! - `render`：滤镜未产出图像
//! - `export`：编码或写出结果

/// 滤镜处理统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("尚未绑定源图片")]
    NoSourceImage,

    #[error("渲染失败：{0}")]
    Render(String),

    #[error("编码错误：{0}")]
    Encode(String),
}

impl FilterError {
    /// 稳定的错误码，供调用侧做分支判断或埋点。
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileSystem(_) => "file_system",
            Self::InvalidFormat(_) => "invalid_format",
            Self::Decode(_) => "decode",
            Self::ResourceLimit(_) => "resource_limit",
            Self::NoSourceImage => "no_source_image",
            Self::Render(_) => "render",
            Self::Encode(_) => "encode",
        }
    }

    /// 错误所属阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FileSystem(_) | Self::InvalidFormat(_) | Self::Decode(_) | Self::ResourceLimit(_) => {
                "acquire"
            }
            Self::NoSourceImage | Self::Render(_) => "render",
            Self::Encode(_) => "export",
        }
    }

    /// 是否属于图片获取失败（AcquisitionFailure）。
    pub fn is_acquisition_failure(&self) -> bool {
        self.stage() == "acquire"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_group_variants() {
        assert_eq!(FilterError::Decode("x".into()).stage(), "acquire");
        assert_eq!(FilterError::ResourceLimit("x".into()).stage(), "acquire");
        assert_eq!(FilterError::NoSourceImage.stage(), "render");
        assert_eq!(FilterError::Render("x".into()).stage(), "render");
        assert_eq!(FilterError::Encode("x".into()).stage(), "export");
    }

    #[test]
    fn acquisition_failures_are_distinguishable() {
        assert!(FilterError::InvalidFormat("x".into()).is_acquisition_failure());
        assert!(!FilterError::Render("x".into()).is_acquisition_failure());
        assert_eq!(FilterError::Render("x".into()).code(), "render");
    }
}
