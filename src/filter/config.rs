//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `PipelineConfig`，保证运行时行为可观测、可调整、可测试。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置。
//! - 支持从 JSON 文件加载，缺失字段回退默认值。
//! - `validate` 在构建服务前拒绝明显无效的组合。

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FilterError, FilterKind, ParameterSet};

/// 使用计数在偏好存储中的键名。
pub const USAGE_COUNTER_KEY: &str = "filterCount";

/// 滤镜流水线配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 启动时选中的滤镜。
    pub default_filter: FilterKind,
    /// 启动时的参数。
    pub default_parameters: ParameterSet,
    /// 切换滤镜多少次后请求评分。
    pub review_threshold: u32,
    /// 使用计数的持久化键名。
    pub usage_counter_key: String,
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_filter: FilterKind::SepiaTone,
            default_parameters: ParameterSet::default(),
            review_threshold: 20,
            usage_counter_key: USAGE_COUNTER_KEY.to_string(),
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
        }
    }
}

impl PipelineConfig {
    /// 从 JSON 文件加载配置。
    pub fn load(path: &Path) -> Result<Self, FilterError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FilterError::FileSystem(format!("读取配置文件失败：{}", e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| FilterError::InvalidFormat(format!("解析配置文件失败：{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.review_threshold == 0 {
            return Err(FilterError::InvalidFormat("review_threshold 必须大于 0".to_string()));
        }
        if self.usage_counter_key.trim().is_empty() {
            return Err(FilterError::InvalidFormat("usage_counter_key 不能为空".to_string()));
        }
        if self.max_file_size == 0 || self.max_decoded_pixels == 0 {
            return Err(FilterError::InvalidFormat(
                "max_file_size 与 max_decoded_pixels 必须大于 0".to_string(),
            ));
        }
        if self.max_decoded_bytes < 4 * 1024 * 1024 {
            return Err(FilterError::InvalidFormat("max_decoded_bytes 不能小于 4MB".to_string()));
        }
        Ok(())
    }
}
