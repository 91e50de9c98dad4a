//! # 使用计数
//!
//! ## 设计思路
//!
//! 每次切换滤镜计数加一，达到阈值时通知调用方弹出评分请求，并立即归零。
//! 计数值通过 `PreferenceStore` 持久化：启动时读取，每次加一与归零都写回。
//!
//! 持久化失败只记录日志，不影响流水线状态。

use crate::settings::PreferenceStore;

pub struct UsageCounter {
    count: u32,
    threshold: u32,
    key: String,
    store: Box<dyn PreferenceStore>,
}

impl UsageCounter {
    /// 从存储中恢复计数；缺失、损坏或为负值时从 0 开始。
    pub fn load(store: Box<dyn PreferenceStore>, key: impl Into<String>, threshold: u32) -> Self {
        let key = key.into();
        let count = match store.get_i64(&key) {
            Ok(Some(value)) => u32::try_from(value).unwrap_or_else(|_| {
                log::warn!("使用计数值异常（{}），重置为 0", value);
                0
            }),
            Ok(None) => 0,
            Err(err) => {
                log::warn!("读取使用计数失败，从 0 开始: {err}");
                0
            }
        };

        log::debug!("使用计数已加载：{}（阈值 {}）", count, threshold);

        Self {
            count,
            threshold: threshold.max(1),
            key,
            store,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// 记录一次滤镜切换。
    ///
    /// 返回 `true` 表示本次达到阈值，计数已归零。
    pub fn record(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.persist();

        if self.count >= self.threshold {
            log::info!("⭐ 滤镜切换次数达到 {}，请求评分", self.count);
            self.count = 0;
            self.persist();
            return true;
        }

        false
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.set_i64(&self.key, i64::from(self.count)) {
            log::warn!("写入使用计数失败: {err}");
        }
    }
}

impl std::fmt::Debug for UsageCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageCounter")
            .field("count", &self.count)
            .field("threshold", &self.threshold)
            .field("key", &self.key)
            .finish()
    }
}
