//! # 参数集合与流水线状态

use serde::{Deserialize, Serialize};

use super::{FilterKind, ParameterKey, SourceImage};

/// 三个相互独立的可调参数。
///
/// 数值不做范围校验，范围由调用侧的输入控件保证。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub intensity: f64,
    pub radius: f64,
    pub scale: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            radius: 100.0,
            scale: 50.0,
        }
    }
}

impl ParameterSet {
    pub fn get(&self, key: ParameterKey) -> f64 {
        match key {
            ParameterKey::Intensity => self.intensity,
            ParameterKey::Radius => self.radius,
            ParameterKey::Scale => self.scale,
        }
    }

    /// 仅更新一个参数。
    pub fn set(&mut self, key: ParameterKey, value: f64) {
        match key {
            ParameterKey::Intensity => self.intensity = value,
            ParameterKey::Radius => self.radius = value,
            ParameterKey::Scale => self.scale = value,
        }
    }

    /// 当前滤镜实际会转发的参数。
    pub fn relevant_to(&self, kind: FilterKind) -> impl Iterator<Item = (ParameterKey, f64)> + '_ {
        kind.accepted_keys().iter().map(move |key| (*key, self.get(*key)))
    }
}

/// 流水线状态：滤镜种类 + 参数 + 源图片绑定。
///
/// 只能通过 `FilterPipeline` 的变更方法写入。
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub(super) kind: FilterKind,
    pub(super) parameters: ParameterSet,
    pub(super) source: Option<SourceImage>,
}

impl PipelineState {
    pub fn new(kind: FilterKind, parameters: ParameterSet) -> Self {
        Self {
            kind,
            parameters,
            source: None,
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_input_surface() {
        let params = ParameterSet::default();
        assert_eq!(params.get(ParameterKey::Intensity), 0.5);
        assert_eq!(params.get(ParameterKey::Radius), 100.0);
        assert_eq!(params.get(ParameterKey::Scale), 50.0);
    }

    #[test]
    fn set_touches_exactly_one_entry() {
        let mut params = ParameterSet::default();
        params.set(ParameterKey::Scale, 7.0);
        assert_eq!(
            params,
            ParameterSet {
                intensity: 0.5,
                radius: 100.0,
                scale: 7.0
            }
        );
    }

    #[test]
    fn out_of_range_values_are_kept() {
        let mut params = ParameterSet::default();
        params.set(ParameterKey::Intensity, 4.0);
        assert_eq!(params.intensity, 4.0);
    }

    #[test]
    fn relevant_to_filters_by_kind() {
        let params = ParameterSet::default();
        let forwarded: Vec<_> = params.relevant_to(FilterKind::Vignette).collect();
        assert_eq!(
            forwarded,
            vec![(ParameterKey::Intensity, 0.5), (ParameterKey::Radius, 100.0)]
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let params: ParameterSet = serde_json::from_str(r#"{"radius": 12}"#).expect("parse");
        assert_eq!(params.radius, 12.0);
        assert_eq!(params.intensity, 0.5);
    }

    #[test]
    fn fresh_state_is_unbound_sepia() {
        let state = PipelineState::default();
        assert_eq!(state.kind(), FilterKind::SepiaTone);
        assert!(!state.is_bound());
    }
}
