//! # 滤镜处理模块（filter）
//!
//! ## 设计思路
//!
//! 该模块将“图片获取 → 绑定 → 参数转发 → 渲染 → 导出”按职责拆分为多个子模块，
//! 避免单文件膨胀与耦合。
//!
//! - `kind`：滤镜种类与参数键，以及两者之间的静态映射表
//! - `params`：参数集合与流水线状态
//! - `pipeline`：核心编排，每次变更都完整重算
//! - `backend` / `effects`：图像处理能力与内置算子
//! - `usage`：滤镜切换计数与评分请求
//! - `loader`：文件 / 字节 / Base64 加载与安全校验、解码
//! - `service`：异步获取 + 加锁访问流水线
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! 调用方（UI / CLI）
//!    ↓
//! service.rs（异步获取、加锁）
//!    ├─ loader.rs（来源加载 + 签名/体积/像素校验 + 解码）
//!    ↓
//! pipeline.rs（状态变更 → 渲染 → 通知观察者）
//!    ├─ kind.rs（滤镜接受哪些参数）
//!    ├─ backend.rs（创建滤镜对象、索取输出）
//!    │    └─ effects.rs（内置算子）
//!    └─ usage.rs（切换计数 → 评分请求）
//!    ↓
//! RenderedOutput（显示 / 导出）
//! ```

mod backend;
mod config;
mod effects;
mod error;
mod kind;
mod loader;
mod params;
mod pipeline;
mod service;
mod source;
mod usage;

pub use backend::{BuiltinBackend, BuiltinFilter, FilterBackend, ImageFilter};
pub use config::{PipelineConfig, USAGE_COUNTER_KEY};
pub use error::FilterError;
pub use kind::{FilterKind, ParameterKey};
pub use loader::ImageLoader;
pub use params::{ParameterSet, PipelineState};
pub use pipeline::{FilterPipeline, PipelineObserver};
pub use service::FilterService;
pub use source::{ImageSource, RenderedOutput, SourceImage};
pub use usage::UsageCounter;
