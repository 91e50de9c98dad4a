//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，替代各模块中分散的
//! `.map_err(|e| e.to_string())`、`format!(...)`、`expect()` 等不一致模式。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `FilterError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。

use crate::filter::FilterError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 滤镜流水线错误（获取 / 渲染 / 导出）
    #[error("{0}")]
    Filter(#[from] FilterError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 偏好存储不可用
    #[error("偏好存储不可用: {0}")]
    Storage(String),

    /// 配置或命令行参数无效
    #[error("配置无效: {0}")]
    Config(String),
}
