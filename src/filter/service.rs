//! # 服务层
//!
//! ## 设计思路
//!
//! `FilterPipeline` 要求单线程串行调用；`FilterService` 在其外层提供同步与异步获取：
//! 1. 图片获取（读取 + 解码）是唯一有明显延迟的操作，放到 tokio 阻塞线程池执行
//! 2. 获取完成后再持锁进入流水线，绑定并渲染
//! 3. 其余操作直接持锁调用流水线
//!
//! ## 实现思路
//!
//! - 获取失败不修改流水线状态，记录日志并把错误返回给调用方。
//! - 锁中毒统一映射为 `FilterError::Render`，不 panic。

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use super::{
    FilterError, FilterKind, FilterPipeline, ImageLoader, ImageSource, ParameterKey, PipelineConfig,
    PipelineObserver, RenderedOutput,
};
use crate::settings::PreferenceStore;

/// 滤镜服务。
pub struct FilterService {
    loader: ImageLoader,
    pipeline: Mutex<FilterPipeline>,
}

impl FilterService {
    /// 使用默认配置与进程内偏好存储创建服务。
    pub fn new() -> Result<Self, FilterError> {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self, FilterError> {
        config.validate()?;
        let loader = ImageLoader::new(config.clone());
        Ok(Self {
            loader,
            pipeline: Mutex::new(FilterPipeline::new(config)),
        })
    }

    /// 注入偏好存储（使用计数跨重启保留）。
    pub fn with_store(config: PipelineConfig, store: Box<dyn PreferenceStore>) -> Result<Self, FilterError> {
        config.validate()?;
        let loader = ImageLoader::new(config.clone());
        let pipeline = FilterPipeline::with_parts(config, Box::new(super::BuiltinBackend), store);
        Ok(Self {
            loader,
            pipeline: Mutex::new(pipeline),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, FilterPipeline>, FilterError> {
        self.pipeline
            .lock()
            .map_err(|_| FilterError::Render("流水线锁已中毒".to_string()))
    }

    pub fn subscribe(&self, observer: Box<dyn PipelineObserver>) -> Result<(), FilterError> {
        self.lock()?.subscribe(observer);
        Ok(())
    }

    /// 获取并绑定图片：加载 → 解码 → 绑定 → 渲染。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use instafilter::filter::{FilterService, ImageSource};
    ///
    /// # async fn demo() -> Result<(), instafilter::filter::FilterError> {
    /// let service = FilterService::new()?;
    /// let output = service
    ///     .open(ImageSource::FilePath("photo.jpg".into()))
    ///     .await?;
    /// assert!(output.is_some());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(&self, source: ImageSource) -> Result<Option<RenderedOutput>, FilterError> {
        let hint = source.hint();
        let start = Instant::now();
        let loader = self.loader.clone();

        let acquired = tokio::task::spawn_blocking(move || loader.load(source))
            .await
            .map_err(|e| FilterError::Decode(format!("图片获取任务异常终止：{}", e)))
            .and_then(|result| result);

        let image = match acquired {
            Ok(image) => image,
            Err(err) => {
                log::warn!("⚠️ 图片获取失败 - 来源: {} 原因({}): {}", hint, err.code(), err);
                return Err(err);
            }
        };

        log::info!(
            "📷 图片获取完成 - 来源: {} 耗时: {}ms",
            hint,
            start.elapsed().as_millis()
        );

        Ok(self.lock()?.bind_image(image))
    }

    /// 同步版本，供不在异步运行时中的调用方使用。
    pub fn open_blocking(&self, source: ImageSource) -> Result<Option<RenderedOutput>, FilterError> {
        let image = self.loader.load(source)?;
        Ok(self.lock()?.bind_image(image))
    }

    pub fn select_filter(&self, kind: FilterKind) -> Result<Option<RenderedOutput>, FilterError> {
        Ok(self.lock()?.set_filter(kind))
    }

    pub fn adjust(&self, key: ParameterKey, value: f64) -> Result<Option<RenderedOutput>, FilterError> {
        Ok(self.lock()?.set_parameter(key, value))
    }

    pub fn render(&self) -> Result<Option<RenderedOutput>, FilterError> {
        Ok(self.lock()?.render())
    }

    pub fn current_filter(&self) -> Result<FilterKind, FilterError> {
        Ok(self.lock()?.filter_kind())
    }

    pub fn usage_count(&self) -> Result<u32, FilterError> {
        Ok(self.lock()?.usage_count())
    }

    /// 导出最近一次渲染结果（分享）。
    pub fn export(&self, path: &Path) -> Result<(), FilterError> {
        let output = self
            .lock()?
            .last_output()
            .cloned()
            .ok_or(FilterError::NoSourceImage)?;
        output.save(path)
    }
}
