//! ExpressionManager: owns active expression entries and runs the per-frame
//! composition (reset -> blend each entry in order -> apply).
//!
//! Entries are kept oldest first. Once the newest entry is fully faded in,
//! older entries no longer influence the result and are dropped.

use std::sync::Arc;

use log::debug;

use crate::accumulate::BlendAccumulator;
use crate::blend::blend_expression;
use crate::config::Config;
use crate::expression::ExpressionAsset;
use crate::ids::{EntryId, IdAllocator};
use crate::model::ModelState;
use crate::outputs::{ExpressionEvent, Outputs};
use crate::playback::ExpressionEntry;

#[derive(Debug)]
pub struct ExpressionManager {
    cfg: Config,
    ids: IdAllocator,
    entries: Vec<ExpressionEntry>,
    accum: BlendAccumulator,
    time: f32,
    outputs: Outputs,
}

impl ExpressionManager {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            entries: Vec::new(),
            accum: BlendAccumulator::new(),
            time: 0.0,
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Accumulated manager time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Queue `asset` as the newest expression. Its parameter identifiers are
    /// resolved against `model` now; unknown ones get shadow slots.
    pub fn start_expression(
        &mut self,
        model: &mut ModelState,
        asset: Arc<ExpressionAsset>,
    ) -> EntryId {
        let id = self.ids.alloc_entry();
        let entry = ExpressionEntry::new(id, asset, model);
        for b in entry.bindings() {
            self.accum.track(b.index, model.parameter_value(b.index));
        }
        debug!(
            "queued expression '{}' as {:?} ({} parameters)",
            entry.name(),
            id,
            entry.bindings().len()
        );
        self.entries.push(entry);
        id
    }

    /// Fade out every active entry over `fade_out_seconds`.
    pub fn stop_all(&mut self, fade_out_seconds: f32) {
        let now = self.time;
        for e in &mut self.entries {
            e.start_fade_out(now, fade_out_seconds);
        }
    }

    /// Fade out one entry. Returns false if it is not active.
    pub fn stop(&mut self, id: EntryId, fade_out_seconds: f32) -> bool {
        let now = self.time;
        match self.entry_mut(id) {
            Some(e) => {
                e.start_fade_out(now, fade_out_seconds);
                true
            }
            None => false,
        }
    }

    pub fn entry(&self, id: EntryId) -> Option<&ExpressionEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Mutable access for scheduling tweaks (offset, end time) before start.
    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut ExpressionEntry> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    pub fn entries(&self) -> &[ExpressionEntry] {
        &self.entries
    }

    pub fn accumulator(&self) -> &BlendAccumulator {
        &self.accum
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_finished(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fade weight computed for `id` by the last update.
    pub fn fade_weight(&self, id: EntryId) -> Option<f32> {
        self.entry(id).map(ExpressionEntry::fade_weight)
    }

    /// Drop every entry immediately without fading.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.accum.clear();
    }

    /// Advance by `dt` seconds and apply the composed expressions to `model`.
    pub fn update(&mut self, model: &mut ModelState, dt: f32) -> &Outputs {
        self.outputs.clear();
        self.time += dt;
        let now = self.time;
        let cap = self.cfg.max_events_per_tick;

        // 1) Reset, then fold every available entry in order.
        self.accum.reset(model);
        let mut expression_index = 0;
        for entry in &mut self.entries {
            let was_started = entry.is_started();
            let contributed = blend_expression(
                entry,
                model,
                now,
                self.cfg.fade_curve,
                &mut self.accum,
                expression_index,
            );
            if contributed.is_none() {
                continue;
            }
            if !was_started {
                self.outputs.push_event(
                    ExpressionEvent::Started {
                        entry: entry.id(),
                        name: entry.name().to_string(),
                    },
                    cap,
                );
            }
            expression_index += 1;
        }

        // 2) Single apply of the composed channels.
        if expression_index > 0 {
            self.accum.apply(model);
            self.outputs.applied = true;
        }

        // 3) Retire entries whose end time has passed.
        for entry in &mut self.entries {
            if entry.is_started() && !entry.is_finished() && entry.has_ended(now) {
                entry.finish();
                debug!("expression '{}' finished at {now}", entry.name());
                self.outputs.push_event(
                    ExpressionEvent::Finished {
                        entry: entry.id(),
                        name: entry.name().to_string(),
                    },
                    cap,
                );
            }
        }
        let before = self.entries.len();
        self.entries.retain(|e| !e.is_finished());
        let mut removed = before != self.entries.len();

        // 4) A fully faded-in newest entry supersedes everything older.
        let superseding = match self.entries.last() {
            Some(newest)
                if self.entries.len() > 1 && newest.is_started() && newest.fade_weight() >= 1.0 =>
            {
                Some(newest.id())
            }
            _ => None,
        };
        if let Some(by) = superseding {
            let older = self.entries.len() - 1;
            for e in self.entries.drain(..older) {
                debug!("expression '{}' superseded by {:?}", e.name(), by);
                self.outputs.push_event(
                    ExpressionEvent::Superseded {
                        entry: e.id(),
                        name: e.name().to_string(),
                        by,
                    },
                    cap,
                );
            }
            removed = true;
        }

        if removed {
            self.prune_untracked();
        }
        &self.outputs
    }

    /// Keep only slots still referenced by a remaining entry.
    fn prune_untracked(&mut self) {
        let entries = &self.entries;
        self.accum
            .retain(|index| entries.iter().any(|e| e.binding(index).is_some()));
    }
}

impl Default for ExpressionManager {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
