//! Expression playback entries and fade-weight timing.
//!
//! Lifecycle: `NotStarted -> Started -> Finished`. Starting happens on the
//! first blend call; finishing happens when the owner observes the end time
//! passing or stops the entry. An entry without an end time never finishes
//! on its own.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::FadeCurve;
use crate::expression::{BlendOp, ExpressionAsset};
use crate::ids::{EntryId, ParamIndex};
use crate::model::ModelState;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    NotStarted,
    Started,
    Finished,
}

/// One asset parameter resolved against a model.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Binding {
    pub index: ParamIndex,
    pub blend: BlendOp,
    pub value: f32,
}

/// Fade weight at `now`: a ramp up over `fade_in` from `fade_in_start`,
/// times a ramp down over `fade_out` ending at `end_time`. Zero-length
/// ramps and a missing end time contribute 1.
pub fn fade_weight(
    curve: FadeCurve,
    now: f32,
    fade_in_start: f32,
    fade_in: f32,
    end_time: Option<f32>,
    fade_out: f32,
) -> f32 {
    let fade_in_w = if fade_in <= 0.0 {
        1.0
    } else {
        curve.ease((now - fade_in_start) / fade_in)
    };
    let fade_out_w = match end_time {
        Some(end) if fade_out > 0.0 => curve.ease((end - now) / fade_out),
        _ => 1.0,
    };
    fade_in_w * fade_out_w
}

#[derive(Clone, Debug)]
pub struct ExpressionEntry {
    id: EntryId,
    asset: Arc<ExpressionAsset>,
    bindings: Vec<Binding>,
    state: PlaybackState,
    start_time: f32,
    fade_in_start_time: f32,
    end_time: Option<f32>,
    fade_out_seconds: f32,
    offset_seconds: f32,
    fade_weight: f32,
    fade_out_triggered: bool,
}

impl ExpressionEntry {
    /// Resolve the asset's identifiers against `model`. Identifiers the model
    /// lacks get shadow slots, so every asset parameter yields a binding.
    pub fn new(id: EntryId, asset: Arc<ExpressionAsset>, model: &mut ModelState) -> Self {
        let bindings = asset
            .parameters
            .iter()
            .map(|p| Binding {
                index: model.parameter_index(&p.id),
                blend: p.blend,
                value: p.value,
            })
            .collect();
        let fade_out_seconds = asset.fade_out_seconds;
        Self {
            id,
            asset,
            bindings,
            state: PlaybackState::NotStarted,
            start_time: 0.0,
            fade_in_start_time: 0.0,
            end_time: None,
            fade_out_seconds,
            offset_seconds: 0.0,
            fade_weight: 0.0,
            fade_out_triggered: false,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn asset(&self) -> &ExpressionAsset {
        &self.asset
    }

    pub fn name(&self) -> &str {
        &self.asset.name
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// First binding targeting `index`, if the asset references it.
    pub fn binding(&self, index: ParamIndex) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.index == index)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.state != PlaybackState::Finished
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.state != PlaybackState::NotStarted
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    pub fn fade_in_start_time(&self) -> f32 {
        self.fade_in_start_time
    }

    pub fn end_time(&self) -> Option<f32> {
        self.end_time
    }

    /// Set an end time before the first blend to override the asset duration.
    pub fn set_end_time(&mut self, end_time: Option<f32>) {
        self.end_time = end_time;
    }

    pub fn offset_seconds(&self) -> f32 {
        self.offset_seconds
    }

    /// Shift the entry's own clock back by `seconds` without moving wall time.
    pub fn set_offset_seconds(&mut self, seconds: f32) {
        self.offset_seconds = seconds;
    }

    /// Fade weight computed by the last blend call.
    pub fn fade_weight(&self) -> f32 {
        self.fade_weight
    }

    pub fn is_fade_out_triggered(&self) -> bool {
        self.fade_out_triggered
    }

    /// Enter `Started` at `now`. No-op once started.
    pub fn start(&mut self, now: f32) {
        if self.is_started() {
            return;
        }
        self.state = PlaybackState::Started;
        self.start_time = now - self.offset_seconds;
        self.fade_in_start_time = now;
        if self.end_time.is_none() {
            let duration = self.asset.duration_seconds;
            self.end_time = if duration <= 0.0 {
                None
            } else {
                Some(self.start_time + duration)
            };
        }
    }

    /// Begin fading out over `seconds` from `now`, unless already ending sooner.
    pub fn start_fade_out(&mut self, now: f32, seconds: f32) {
        let seconds = seconds.max(0.0);
        let new_end = now + seconds;
        self.fade_out_triggered = true;
        match self.end_time {
            Some(end) if end <= new_end => {}
            _ => {
                self.end_time = Some(new_end);
                self.fade_out_seconds = seconds;
            }
        }
    }

    pub fn finish(&mut self) {
        self.state = PlaybackState::Finished;
    }

    /// True once `now` is past a finite end time.
    pub fn has_ended(&self, now: f32) -> bool {
        self.end_time.is_some_and(|end| end < now)
    }

    /// Compute and cache the fade weight for `now`.
    pub fn update_fade_weight(&mut self, curve: FadeCurve, now: f32) -> f32 {
        self.fade_weight = fade_weight(
            curve,
            now,
            self.fade_in_start_time,
            self.asset.fade_in_seconds,
            self.end_time,
            self.fade_out_seconds,
        );
        self.fade_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ModelLayout, ParameterEntry};
    use crate::config::Config;

    fn model() -> ModelState {
        let layout = ModelLayout {
            parameters: vec![ParameterEntry {
                id: "ParamA".into(),
                value: 0.0,
                min: -1.0,
                max: 1.0,
                default: 0.0,
            }],
            ..ModelLayout::default()
        };
        ModelState::from_layout(&layout, &Config::default())
    }

    fn entry(asset: ExpressionAsset) -> (ExpressionEntry, ModelState) {
        let mut m = model();
        let e = ExpressionEntry::new(EntryId(0), Arc::new(asset), &mut m);
        (e, m)
    }

    #[test]
    fn bindings_resolve_known_and_shadow() {
        let asset = ExpressionAsset::new("e", &Config::default())
            .with_parameter("ParamA", BlendOp::Additive, 1.0)
            .with_parameter("ParamGhost", BlendOp::Overwrite, 2.0);
        let (e, m) = entry(asset);
        assert_eq!(e.bindings()[0].index, ParamIndex(0));
        assert_eq!(e.bindings()[1].index, ParamIndex(1));
        assert_eq!(m.parameters().shadow_len(), 1);
    }

    #[test]
    fn start_computes_times() {
        let asset = ExpressionAsset::new("e", &Config::default()).with_duration(2.0);
        let (mut e, _) = entry(asset);
        e.set_offset_seconds(0.5);
        e.start(10.0);
        assert_eq!(e.state(), PlaybackState::Started);
        assert_eq!(e.start_time(), 9.5);
        assert_eq!(e.fade_in_start_time(), 10.0);
        assert_eq!(e.end_time(), Some(11.5));
        e.start(20.0);
        assert_eq!(e.start_time(), 9.5);
    }

    #[test]
    fn external_end_time_is_kept() {
        let asset = ExpressionAsset::new("e", &Config::default()).with_duration(2.0);
        let (mut e, _) = entry(asset);
        e.set_end_time(Some(3.0));
        e.start(0.0);
        assert_eq!(e.end_time(), Some(3.0));
    }

    #[test]
    fn looping_never_ends_from_time() {
        let asset = ExpressionAsset::new("e", &Config::default());
        let (mut e, _) = entry(asset);
        e.start(0.0);
        assert_eq!(e.end_time(), None);
        assert!(!e.has_ended(1.0e6));
        assert!(e.is_available());
    }

    #[test]
    fn fade_weight_ramps() {
        let w = |now| fade_weight(FadeCurve::Linear, now, 0.0, 1.0, Some(10.0), 2.0);
        assert_eq!(w(0.0), 0.0);
        assert_eq!(w(0.5), 0.5);
        assert_eq!(w(5.0), 1.0);
        assert_eq!(w(9.0), 0.5);
        assert_eq!(w(10.0), 0.0);
        assert_eq!(fade_weight(FadeCurve::Linear, 0.0, 0.0, 0.0, None, 1.0), 1.0);
    }

    #[test]
    fn fade_out_only_shortens() {
        let asset = ExpressionAsset::new("e", &Config::default()).with_duration(1.0);
        let (mut e, _) = entry(asset);
        e.start(0.0);
        e.start_fade_out(0.5, 5.0);
        assert_eq!(e.end_time(), Some(1.0));
        assert!(e.is_fade_out_triggered());
        e.start_fade_out(0.2, 0.3);
        assert!((e.end_time().unwrap() - 0.5).abs() < 1e-6);
    }
}
