//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `SourceImage` 表示已解码、可绑定到滤镜的 RGBA 位图
//! - `RenderedOutput` 表示一次渲染的结果，后续渲染只会替换，不会修改它
//!
//! 两种位图都以 `Arc` 持有，克隆与通知观察者时不复制像素。

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use super::FilterError;

/// 图片输入来源。
pub enum ImageSource {
    /// 本地文件路径来源。
    FilePath(String),
    /// 内存中的编码字节（例如系统相册选择器返回的数据）。
    Bytes(Vec<u8>),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
}

impl ImageSource {
    /// 日志用的来源提示。
    pub(crate) fn hint(&self) -> &'static str {
        match self {
            Self::FilePath(_) => "file",
            Self::Bytes(_) => "bytes",
            Self::Base64(_) => "base64",
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 已解码的源图片。
#[derive(Clone, PartialEq)]
pub struct SourceImage(Arc<RgbaImage>);

impl SourceImage {
    pub fn new(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.0
    }

    /// 两个句柄是否指向同一份像素。
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<RgbaImage> for SourceImage {
    fn from(image: RgbaImage) -> Self {
        Self::new(image)
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceImage({}x{})", self.width(), self.height())
    }
}

/// 一次渲染产出的位图。
#[derive(Clone, PartialEq)]
pub struct RenderedOutput(Arc<RgbaImage>);

impl RenderedOutput {
    pub(crate) fn new(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.0
    }

    /// 原始 RGBA 字节（`width * height * 4`）。
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_raw()
    }

    /// 编码为指定格式，供分享使用。
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<u8>, FilterError> {
        let mut cursor = Cursor::new(Vec::new());
        let encoded = if format == ImageFormat::Jpeg {
            // JPEG 不支持透明通道
            image::DynamicImage::ImageRgba8((*self.0).clone())
                .to_rgb8()
                .write_to(&mut cursor, format)
        } else {
            self.0.write_to(&mut cursor, format)
        };
        encoded.map_err(|e| FilterError::Encode(format!("图片编码失败：{}", e)))?;
        Ok(cursor.into_inner())
    }

    /// 按扩展名推断格式并写入文件。
    pub fn save(&self, path: &Path) -> Result<(), FilterError> {
        let format = ImageFormat::from_path(path)
            .map_err(|e| FilterError::Encode(format!("无法从扩展名推断格式：{}", e)))?;
        let bytes = self.encode(format)?;
        std::fs::write(path, bytes)
            .map_err(|e| FilterError::FileSystem(format!("写入输出文件失败：{}", e)))?;

        log::info!(
            "💾 已导出滤镜结果 - 路径: {} 尺寸: {}x{}",
            path.display(),
            self.width(),
            self.height()
        );
        Ok(())
    }
}

impl fmt::Debug for RenderedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderedOutput({}x{})", self.width(), self.height())
    }
}
