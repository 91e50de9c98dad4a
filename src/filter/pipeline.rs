//! # 滤镜流水线（核心编排）
//!
//! ## 设计思路
//!
//! `FilterPipeline` 显式持有 `PipelineState`，变更方法是唯一写入口。
//! 每次变更（绑定图片 / 切换滤镜 / 调整参数）都立即触发一次完整重算，
//! 不做增量更新，也不做内部合并；需要防抖的调用方应在自己一侧处理。
//!
//! ## 实现思路
//!
//! 渲染固定为：
//! 1. 未绑定源图片 → 不产出
//! 2. 通过 `ParameterSet::relevant_to` 只把当前滤镜接受的参数转发给滤镜对象
//! 3. 以输入图片完整范围索取输出
//! 4. 滤镜未产出 → 记录渲染失败，不产出
//! 5. 否则包装为 `RenderedOutput` 返回
//!
//! 每次渲染尝试（包括未产出的情况）之后都会通知观察者。
//! 流水线本身不加锁，要求单线程串行调用；跨线程使用见 `FilterService`。

use std::time::Instant;

use super::backend::{BuiltinBackend, FilterBackend, ImageFilter};
use super::usage::UsageCounter;
use super::{
    FilterError, FilterKind, ParameterKey, ParameterSet, PipelineConfig, PipelineState,
    RenderedOutput, SourceImage,
};
use crate::settings::{MemoryStore, PreferenceStore};

/// 流水线事件观察者。
pub trait PipelineObserver: Send {
    /// 每次渲染尝试之后调用；`None` 表示无新输出，显示内容保持不变。
    fn output_changed(&mut self, output: Option<&RenderedOutput>);

    /// 滤镜切换次数达到阈值时调用，调用方应弹出平台评分请求。
    fn review_requested(&mut self) {}
}

/// 滤镜流水线。
pub struct FilterPipeline {
    backend: Box<dyn FilterBackend>,
    filter: Box<dyn ImageFilter>,
    state: PipelineState,
    usage: UsageCounter,
    last_output: Option<RenderedOutput>,
    observers: Vec<Box<dyn PipelineObserver>>,
}

impl FilterPipeline {
    /// 使用内置后端与进程内偏好存储创建流水线。
    ///
    /// # 示例
    /// ```rust
    /// use instafilter::filter::{FilterKind, FilterPipeline, PipelineConfig};
    ///
    /// let pipeline = FilterPipeline::new(PipelineConfig::default());
    /// assert_eq!(pipeline.filter_kind(), FilterKind::SepiaTone);
    /// assert!(pipeline.last_output().is_none());
    /// ```
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_parts(config, Box::new(BuiltinBackend), Box::new(MemoryStore::new()))
    }

    /// 注入后端与偏好存储。
    pub fn with_parts(
        config: PipelineConfig,
        backend: Box<dyn FilterBackend>,
        store: Box<dyn PreferenceStore>,
    ) -> Self {
        let usage = UsageCounter::load(store, config.usage_counter_key.clone(), config.review_threshold);
        let filter = backend.create_filter(config.default_filter);

        log::info!(
            "🎛️ 滤镜流水线已创建 - 默认滤镜: {} 使用计数: {}",
            config.default_filter,
            usage.count()
        );

        Self {
            backend,
            filter,
            state: PipelineState::new(config.default_filter, config.default_parameters),
            usage,
            last_output: None,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn PipelineObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn filter_kind(&self) -> FilterKind {
        self.state.kind
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.state.parameters
    }

    /// 最近一次成功渲染的结果。
    pub fn last_output(&self) -> Option<&RenderedOutput> {
        self.last_output.as_ref()
    }

    pub fn usage_count(&self) -> u32 {
        self.usage.count()
    }

    /// 绑定新的源图片并立即渲染。
    pub fn bind_image(&mut self, image: SourceImage) -> Option<RenderedOutput> {
        log::debug!("绑定源图片 {}x{}", image.width(), image.height());
        self.filter.set_input_image(Some(image.clone()));
        self.state.source = Some(image);
        self.render()
    }

    /// 解除源图片绑定，之前的输出对调用方保持不变。
    pub fn clear_image(&mut self) {
        self.filter.set_input_image(None);
        self.state.source = None;
    }

    /// 切换滤镜：参数保持不变，重新绑定当前源图片并渲染。
    ///
    /// 同时累加使用计数，达到阈值时通知观察者请求评分。
    pub fn set_filter(&mut self, kind: FilterKind) -> Option<RenderedOutput> {
        log::info!("🔀 切换滤镜：{} -> {}", self.state.kind, kind);

        self.state.kind = kind;
        self.filter = self.backend.create_filter(kind);
        self.filter.set_input_image(self.state.source.clone());

        if self.usage.record() {
            for observer in &mut self.observers {
                observer.review_requested();
            }
        }

        self.render()
    }

    /// 更新单个参数，并以完整参数集重新渲染。
    pub fn set_parameter(&mut self, key: ParameterKey, value: f64) -> Option<RenderedOutput> {
        log::debug!("调整参数 {} = {}", key, value);
        self.state.parameters.set(key, value);
        self.render()
    }

    /// 渲染当前状态并通知观察者。
    ///
    /// 所有失败都降级为“无输出”：记录日志，不修改流水线状态。
    pub fn render(&mut self) -> Option<RenderedOutput> {
        let output = match self.try_render() {
            Ok(output) => {
                self.last_output = Some(output.clone());
                Some(output)
            }
            Err(FilterError::NoSourceImage) => {
                log::debug!("未绑定源图片，跳过渲染");
                None
            }
            Err(err) => {
                log::warn!("⚠️ {} 渲染未产出图像（{}）: {}", self.state.kind, err.code(), err);
                None
            }
        };

        for observer in &mut self.observers {
            observer.output_changed(output.as_ref());
        }

        output
    }

    /// 与 `render` 相同的算法，但返回具体失败原因且不通知观察者。
    pub fn try_render(&mut self) -> Result<RenderedOutput, FilterError> {
        let source = self.state.source.as_ref().ok_or(FilterError::NoSourceImage)?;
        let kind = self.state.kind;
        let start = Instant::now();

        for (key, value) in self.state.parameters.relevant_to(kind) {
            self.filter.set_value(key, value);
        }

        let image = self.filter.output_image().ok_or_else(|| {
            FilterError::Render(format!(
                "{} 未产出图像（参数：{:?}）",
                kind, self.state.parameters
            ))
        })?;

        if image.width() == 0 || image.height() == 0 {
            return Err(FilterError::Render(format!("{} 输出范围为空", kind)));
        }

        log::debug!(
            "✅ 渲染完成 - 滤镜: {} 尺寸: {}x{} 耗时: {}ms",
            kind,
            source.width(),
            source.height(),
            start.elapsed().as_millis()
        );

        Ok(RenderedOutput::new(image))
    }
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("state", &self.state)
            .field("usage", &self.usage)
            .field("last_output", &self.last_output)
            .field("observers", &self.observers.len())
            .finish()
    }
}
