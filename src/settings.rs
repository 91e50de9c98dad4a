//! 应用偏好存储模块
//!
//! # 设计思路
//!
//! 使用计数等少量偏好需要跨进程重启保留。流水线只依赖 `PreferenceStore` 抽象，
//! 具体存储方式由调用方注入：
//! - `JsonFileStore`：应用数据目录下的 `settings.json`（JSON 对象，键值平铺）
//! - `MemoryStore`：仅存在于进程内，用于测试或不需要持久化的场景
//!
//! # 实现思路
//!
//! - 读取时文件不存在视为空；文件损坏返回 `AppError::Storage`，由调用方决定是否回退。
//! - 写入时保留其他键，只替换目标键，输出使用 pretty JSON 便于人工查看。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::AppError;

/// 偏好文件名。
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// 键值偏好存储。
pub trait PreferenceStore: Send {
    fn get_i64(&self, key: &str) -> Result<Option<i64>, AppError>;

    fn set_i64(&mut self, key: &str, value: i64) -> Result<(), AppError>;
}

/// 进程内偏好存储。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_i64(&self, key: &str) -> Result<Option<i64>, AppError> {
        Ok(self.values.get(key).copied())
    }

    fn set_i64(&mut self, key: &str, value: i64) -> Result<(), AppError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// 基于 JSON 文件的偏好存储。
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 在指定目录下使用默认文件名，目录不存在时自动创建。
    pub fn in_dir(dir: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::Storage(format!("创建偏好目录 '{}' 失败: {}", dir.display(), e)))?;
        Ok(Self::new(dir.join(SETTINGS_FILE_NAME)))
    }

    /// 系统配置目录下的默认位置（`<config_dir>/instafilter/settings.json`）。
    pub fn default_location() -> Result<Self, AppError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::Storage("无法定位系统配置目录".to_string()))?;
        Self::in_dir(&config_dir.join("instafilter"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, AppError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::Storage("设置文件不是 JSON 对象".to_string())),
            Err(e) => Err(AppError::Storage(format!("解析设置文件失败: {}", e))),
        }
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_i64(&self, key: &str) -> Result<Option<i64>, AppError> {
        Ok(self.read_all()?.get(key).and_then(Value::as_i64))
    }

    fn set_i64(&mut self, key: &str, value: i64) -> Result<(), AppError> {
        // 已损坏的文件直接覆盖，避免计数永远写不进去
        let mut settings = self.read_all().unwrap_or_else(|err| {
            log::warn!("设置文件不可读，将重新写入: {err}");
            Map::new()
        });
        settings.insert(key.to_string(), Value::from(value));

        let content = serde_json::to_string_pretty(&Value::Object(settings))
            .map_err(|e| AppError::Storage(format!("序列化设置失败: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("instafilter-settings-test-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_i64("filterCount").expect("get"), None);
        store.set_i64("filterCount", 3).expect("set");
        assert_eq!(store.get_i64("filterCount").expect("get"), Some(3));
    }

    #[test]
    fn json_store_persists_across_instances() {
        let dir = unique_temp_dir();
        let mut store = JsonFileStore::in_dir(&dir).expect("store");
        store.set_i64("filterCount", 7).expect("set");

        let reopened = JsonFileStore::in_dir(&dir).expect("reopen");
        assert_eq!(reopened.get_i64("filterCount").expect("get"), Some(7));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn json_store_keeps_other_keys() {
        let dir = unique_temp_dir();
        let path = dir.join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{"theme": "dark", "filterCount": 1}"#).expect("seed settings");

        let mut store = JsonFileStore::new(&path);
        store.set_i64("filterCount", 2).expect("set");

        let content = fs::read_to_string(&path).expect("read back");
        let parsed: Value = serde_json::from_str(&content).expect("valid json");
        assert_eq!(parsed["theme"], "dark");
        assert_eq!(parsed["filterCount"], 2);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn json_store_reports_corrupt_file_then_overwrites() {
        let dir = unique_temp_dir();
        let path = dir.join(SETTINGS_FILE_NAME);
        fs::write(&path, "not-json").expect("write invalid settings");

        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.get_i64("filterCount"), Err(AppError::Storage(_))));

        store.set_i64("filterCount", 4).expect("overwrite");
        assert_eq!(store.get_i64("filterCount").expect("get"), Some(4));

        let _ = fs::remove_dir_all(dir);
    }
}
