//! # 加载与解码模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（本地文件 / 内存字节 / Base64）的原始字节加载，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! 1. 按来源读取原始字节，并做体积限制
//! 2. 通过文件签名确认是图片
//! 3. 读取 header 尺寸，按像素与内存上限快速拒绝
//! 4. 完整解码并转换为 RGBA

use base64::{Engine as _, engine::general_purpose};
use image::GenericImageView;
use std::io::Cursor;
use std::path::Path;

use super::source::RawImageData;
use super::{FilterError, ImageSource, PipelineConfig, SourceImage};

/// 源图片加载器。
///
/// 只读持有配置快照，可在阻塞线程池中独立运行。
#[derive(Debug, Clone)]
pub struct ImageLoader {
    config: PipelineConfig,
}

impl ImageLoader {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// 加载并解码图片。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use instafilter::filter::{ImageLoader, ImageSource, PipelineConfig};
    ///
    /// let loader = ImageLoader::new(PipelineConfig::default());
    /// let image = loader.load(ImageSource::FilePath("photo.jpg".into()))?;
    /// println!("{}x{}", image.width(), image.height());
    /// # Ok::<(), instafilter::filter::FilterError>(())
    /// ```
    pub fn load(&self, source: ImageSource) -> Result<SourceImage, FilterError> {
        let raw = match source {
            ImageSource::FilePath(path) => self.load_from_file(&path)?,
            ImageSource::Bytes(bytes) => self.load_from_bytes(bytes)?,
            ImageSource::Base64(data) => self.load_from_base64(&data)?,
        };
        self.decode(raw)
    }

    /// 从本地路径加载图片原始字节。
    fn load_from_file(&self, path: &str) -> Result<RawImageData, FilterError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path);

        let file_path = Path::new(path);
        if !file_path.exists() {
            return Err(FilterError::FileSystem(format!("文件不存在：{}", path)));
        }

        let metadata = std::fs::metadata(file_path)
            .map_err(|e| FilterError::FileSystem(format!("无法读取文件信息：{}", e)))?;
        self.validate_file_size(metadata.len())?;

        let bytes = std::fs::read(file_path)
            .map_err(|e| FilterError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    fn load_from_bytes(&self, bytes: Vec<u8>) -> Result<RawImageData, FilterError> {
        self.validate_file_size(bytes.len() as u64)?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "bytes",
        })
    }

    /// 从 Base64 字符串加载图片原始字节。
    fn load_from_base64(&self, data: &str) -> Result<RawImageData, FilterError> {
        log::info!("📝 开始处理 base64 图片");

        let bytes = Self::parse_base64_with_limit(data, self.config.max_file_size)?;
        self.validate_file_size(bytes.len() as u64)?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    fn validate_file_size(&self, len: u64) -> Result<(), FilterError> {
        if len > self.config.max_file_size {
            return Err(FilterError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                len as f64 / 1024.0 / 1024.0,
                self.config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Ok(())
    }

    fn validate_image_signature(bytes: &[u8]) -> Result<(), FilterError> {
        if bytes.is_empty() {
            return Err(FilterError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| FilterError::InvalidFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(FilterError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, FilterError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| FilterError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| FilterError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, FilterError> {
        let normalized = data.trim();

        let base64_data = if normalized.starts_with("data:image/") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| FilterError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(base64_data)?;
        if estimated_len > max_file_size {
            return Err(FilterError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(base64_data)
            .map_err(|e| FilterError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 将原始字节解码为 RGBA 源图片。
    fn decode(&self, raw: RawImageData) -> Result<SourceImage, FilterError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        self.validate_pixel_limits(header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| FilterError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        self.validate_pixel_limits(width, height)?;
        if width == 0 || height == 0 {
            return Err(FilterError::Decode("图片尺寸为空".to_string()));
        }

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(SourceImage::new(decoded.to_rgba8()))
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), FilterError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| FilterError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| FilterError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量与预计解码内存是否超过配置上限。
    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), FilterError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| FilterError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > self.config.max_decoded_pixels {
            return Err(FilterError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.config.max_decoded_pixels
            )));
        }

        let estimated = pixels
            .checked_mul(4)
            .ok_or_else(|| FilterError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > self.config.max_decoded_bytes {
            return Err(FilterError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                self.config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x % 255) as u8;
            let g = (y % 255) as u8;
            let b = ((x + y) % 255) as u8;
            Rgba([r, g, b, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn loads_png_bytes() {
        let loader = ImageLoader::new(PipelineConfig::default());
        let image = loader
            .load(ImageSource::Bytes(create_png_bytes(64, 32)))
            .expect("png should load");
        assert_eq!((image.width(), image.height()), (64, 32));
        assert_eq!(image.as_rgba().get_pixel(3, 5).0, [3, 5, 8, 255]);
    }

    #[test]
    fn loads_data_url() {
        let loader = ImageLoader::new(PipelineConfig::default());
        let encoded = general_purpose::STANDARD.encode(create_png_bytes(4, 4));
        let image = loader
            .load(ImageSource::Base64(format!("data:image/png;base64,{}", encoded)))
            .expect("data url should load");
        assert_eq!(image.width(), 4);
    }

    #[test]
    fn rejects_non_image_bytes() {
        let loader = ImageLoader::new(PipelineConfig::default());
        let result = loader.load(ImageSource::Bytes(b"%PDF-1.7 not a picture".to_vec()));
        assert!(matches!(result, Err(FilterError::InvalidFormat(_))));

        let empty = loader.load(ImageSource::Bytes(Vec::new()));
        assert!(matches!(empty, Err(FilterError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_too_many_pixels() {
        let config = PipelineConfig {
            max_decoded_pixels: 1_000,
            ..PipelineConfig::default()
        };
        let loader = ImageLoader::new(config);
        let result = loader.load(ImageSource::Bytes(create_png_bytes(100, 100)));
        assert!(matches!(result, Err(FilterError::ResourceLimit(_))));
    }

    #[test]
    fn rejects_oversized_file() {
        let config = PipelineConfig {
            max_file_size: 16,
            ..PipelineConfig::default()
        };
        let loader = ImageLoader::new(config);
        let result = loader.load(ImageSource::Bytes(create_png_bytes(8, 8)));
        assert!(matches!(result, Err(FilterError::ResourceLimit(_))));
    }

    #[test]
    fn missing_file_is_file_system_error() {
        let loader = ImageLoader::new(PipelineConfig::default());
        let result = loader.load(ImageSource::FilePath("/definitely/not/here.png".into()));
        assert!(matches!(result, Err(FilterError::FileSystem(_))));
    }

    #[test]
    fn parse_base64_with_limit_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = ImageLoader::parse_base64_with_limit(&huge, 32);
        assert!(matches!(result, Err(FilterError::ResourceLimit(_))));
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let loader = ImageLoader::new(PipelineConfig::default());
        let mut bytes = create_png_bytes(32, 32);
        bytes.truncate(bytes.len() / 2);
        let result = loader.load(ImageSource::Bytes(bytes));
        assert!(matches!(result, Err(FilterError::Decode(_))));
    }
}
