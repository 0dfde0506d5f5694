//! Temporal stabilization of per-frame gesture labels.
//!
//! Raw classification flickers at camera frame rates. The stabilizer
//! resolves two-hand composites, detects horizontal palm swipes, and
//! otherwise runs a sliding-window majority vote that only adopts a new
//! label once it holds a confident share of the window.

use std::collections::VecDeque;

use glam::Vec3;
use tracing::debug;

use super::classifier::{GestureLabel, HandAnalysis};

// ── Config ─────────────────────────────────────────────────

/// Configuration for gesture stabilization.
#[derive(Debug, Clone)]
pub struct StabilizerConfig {
    /// Majority-vote window length (frames).
    pub history_len: usize,
    /// Share of the window the most frequent label needs to be adopted.
    pub confidence: f64,
    /// Palm-center samples compared for swipe detection.
    pub swipe_window: usize,
    /// Minimum horizontal palm travel across the window (normalized units).
    pub swipe_min_dx: f32,
    /// Horizontal travel must exceed vertical travel by this factor.
    pub swipe_axis_ratio: f32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            history_len: 10,
            confidence: 0.6,
            swipe_window: 15,
            swipe_min_dx: 0.05,
            swipe_axis_ratio: 2.0,
        }
    }
}

// ── Stabilizer ─────────────────────────────────────────────

/// Multi-stage temporal filter over classifier output.
#[derive(Debug, Clone)]
pub struct GestureStabilizer {
    pub config: StabilizerConfig,
    history: VecDeque<GestureLabel>,
    swipe_history: VecDeque<Vec3>,
    stable: GestureLabel,
}

impl GestureStabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_len),
            swipe_history: VecDeque::with_capacity(config.swipe_window),
            stable: GestureLabel::None,
            config,
        }
    }

    /// Resolve this frame's gesture from 0, 1 or 2 analyzed hands.
    pub fn update(&mut self, hands: &[HandAnalysis]) -> GestureLabel {
        let primary = match hands {
            [] => {
                self.swipe_history.clear();
                return GestureLabel::None;
            }
            [only] => {
                if let Some(swipe) = self.detect_swipe(only) {
                    return swipe;
                }
                only
            }
            [first, second, ..] => {
                // Slot order is not stable across hand counts.
                self.swipe_history.clear();
                if let Some(composite) = composite_gesture(first, second) {
                    return composite;
                }
                first
            }
        };
        self.vote(primary.gesture)
    }

    /// Push a raw label into the window and return the stable label.
    pub fn vote(&mut self, raw: GestureLabel) -> GestureLabel {
        self.history.push_back(raw);
        while self.history.len() > self.config.history_len.max(1) {
            self.history.pop_front();
        }

        if let Some((label, count)) = self.most_frequent() {
            let share = count as f64 / self.history.len() as f64;
            if share >= self.config.confidence && label != self.stable {
                debug!(
                    "Stable gesture {} -> {} ({}/{})",
                    self.stable.as_str(),
                    label.as_str(),
                    count,
                    self.history.len()
                );
                self.stable = label;
            }
        }
        self.stable
    }

    /// Most frequent label in the window; ties go to the label seen first.
    fn most_frequent(&self) -> Option<(GestureLabel, usize)> {
        let mut best: Option<(GestureLabel, usize)> = None;
        for (i, label) in self.history.iter().enumerate() {
            if self.history.iter().take(i).any(|l| l == label) {
                continue;
            }
            let count = self.history.iter().filter(|l| *l == label).count();
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((*label, count));
            }
        }
        best
    }

    /// Track the palm center and report a horizontal swipe once the
    /// window is full.
    fn detect_swipe(&mut self, hand: &HandAnalysis) -> Option<GestureLabel> {
        let window = self.config.swipe_window.max(2);
        self.swipe_history.push_back(hand.center);
        while self.swipe_history.len() > window {
            self.swipe_history.pop_front();
        }
        if self.swipe_history.len() < window || hand.gesture != GestureLabel::OpenPalm {
            return None;
        }

        let first = *self.swipe_history.front()?;
        let last = *self.swipe_history.back()?;
        let dx = last.x - first.x;
        let dy = last.y - first.y;

        if dx.abs() > self.config.swipe_min_dx && dx.abs() > self.config.swipe_axis_ratio * dy.abs() {
            let label = if dx > 0.0 {
                GestureLabel::SwipeRight
            } else {
                GestureLabel::SwipeLeft
            };
            self.swipe_history.clear();
            debug!("Swipe detected: {} (dx={:.3}, dy={:.3})", label.as_str(), dx, dy);
            return Some(label);
        }
        None
    }

    /// Current stable label.
    pub fn stable(&self) -> GestureLabel {
        self.stable
    }

    /// Number of labels in the vote window.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.history.clear();
        self.swipe_history.clear();
        self.stable = GestureLabel::None;
    }
}

impl Default for GestureStabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}

/// Two-hand composite: both fists zoom in, a fist with an open palm zooms out.
fn composite_gesture(a: &HandAnalysis, b: &HandAnalysis) -> Option<GestureLabel> {
    let a_open = a.gesture == GestureLabel::OpenPalm;
    let b_open = b.gesture == GestureLabel::OpenPalm;
    if a.is_fist && b.is_fist {
        Some(GestureLabel::ZoomIn)
    } else if (a.is_fist && b_open) || (b.is_fist && a_open) {
        Some(GestureLabel::ZoomOut)
    } else {
        None
    }
}

// ── Tests ──────────────────────────────────────────────────
