//! # InstaFilter — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │          调用方（移动端 UI / 命令行 / 测试）               │
//! │                                                          │
//! │  相册选择器 ── 滑块 ── 滤镜菜单 ── 分享 ── 评分弹窗        │
//! │       │          │        │         ↑         ↑          │
//! └───────┼──────────┼────────┼─────────┼─────────┼──────────┘
//!         ↓          ↓        ↓         │         │
//! ┌───────┼──────────┼────────┼─────────┼─────────┼──────────┐
//! │       ↓          ↓        ↓         │         │          │
//! │  ┌─ filter ───── FilterService / FilterPipeline           │
//! │  │   ├─ loader      图片获取·校验·解码                     │
//! │  │   ├─ pipeline    状态变更 → 渲染 → 通知观察者           │
//! │  │   ├─ backend     图像处理能力（内置七种滤镜）           │
//! │  │   └─ usage       切换计数 → 评分请求                    │
//! │  │                                                       │
//! │  ├─ settings ──── 偏好存储（settings.json / 内存）         │
//! │  └─ error ─────── AppError (统一错误类型)                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`filter`] | 滤镜种类、参数绑定、渲染流水线、图片获取与导出 |
//! | [`settings`] | 跨重启保留的键值偏好（使用计数） |

pub mod error;
pub mod filter;
pub mod settings;
