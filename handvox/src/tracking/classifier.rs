//! Per-frame hand pose classification.
//!
//! Turns one hand's 21 landmarks into a single gesture label using
//! scale-invariant distance ratios (tip-to-wrist against a scaled
//! knuckle-to-wrist distance), plus the derived points the interaction
//! layer needs: palm center and a jitter-damped pinch center.

use std::collections::VecDeque;

use tracing::trace;

use super::hand_landmarks::{Finger, HandLandmark, HandLandmarks};
use super::personalization::ThresholdProvider;
use glam::Vec3;

// ── Gesture labels ─────────────────────────────────────────

/// Every gesture the pipeline can emit. Single-hand poses come from the
/// classifier; swipes and zooms are produced by the stabilizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    None,
    Unknown,
    OpenPalm,
    Closed,
    Pinch,
    Victory,
    ThumbsUp,
    SwipeLeft,
    SwipeRight,
    ZoomIn,
    ZoomOut,
}

impl GestureLabel {
    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Unknown => "unknown",
            Self::OpenPalm => "open-palm",
            Self::Closed => "closed",
            Self::Pinch => "pinch",
            Self::Victory => "victory",
            Self::ThumbsUp => "thumbs-up",
            Self::SwipeLeft => "swipe-left",
            Self::SwipeRight => "swipe-right",
            Self::ZoomIn => "zoom-in",
            Self::ZoomOut => "zoom-out",
        }
    }

    /// Key used by the personalization collaborator.
    pub fn threshold_key(&self) -> &'static str {
        self.as_str()
    }
}

// ── Analysis ───────────────────────────────────────────────

/// Derived, per-frame view of one hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandAnalysis {
    /// Highest-priority matching pose.
    pub gesture: GestureLabel,
    /// Raw pinch test result (independent of priority).
    pub is_pinching: bool,
    /// Raw fist test result (independent of priority).
    pub is_fist: bool,
    /// Palm center.
    pub center: Vec3,
    /// Moving-average pinch midpoint.
    pub pinch_center: Vec3,
    /// Index fingertip position.
    pub index_tip: Vec3,
}

impl HandAnalysis {
    /// The point that drives the on-screen pointer: the smoothed pinch
    /// center while pinching, else the index fingertip.
    pub fn pointer(&self) -> Vec3 {
        if self.is_pinching {
            self.pinch_center
        } else {
            self.index_tip
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Ratios and thresholds for pose classification.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Maximum thumb-tip to index-tip distance for a pinch (normalized units).
    pub pinch_threshold: f32,
    /// Middle/ring/pinky must reach this multiple of their knuckle distance during a pinch.
    pub pinch_extend_ratio: f32,
    /// A finger is curled when its tip is within this multiple of its knuckle distance.
    pub curl_ratio: f32,
    /// The thumb is curled when its tip is within this multiple of the thumb MCP distance.
    pub thumb_curl_ratio: f32,
    /// Thumb extension required for thumbs-up.
    pub thumbs_up_extend_ratio: f32,
    /// A finger counts as open beyond this multiple of its knuckle distance.
    pub open_extend_ratio: f32,
    /// Open fingers (of four) required for an open palm.
    pub min_open_fingers: usize,
    /// Samples in the pinch-center moving average.
    pub position_window: usize,
    /// Label for a pose that matches no rule.
    pub unmatched: GestureLabel,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.05,
            pinch_extend_ratio: 1.1,
            curl_ratio: 1.3,
            thumb_curl_ratio: 1.4,
            thumbs_up_extend_ratio: 1.5,
            open_extend_ratio: 1.05,
            min_open_fingers: 3,
            position_window: 5,
            unmatched: GestureLabel::OpenPalm,
        }
    }
}

impl ClassifierConfig {
    /// Apply a personalized pinch threshold when the collaborator has one.
    pub fn with_personalization(mut self, provider: &dyn ThresholdProvider) -> Self {
        if let Some(t) = provider.personalized_threshold(GestureLabel::Pinch) {
            if t.is_finite() && t > 0.0 {
                self.pinch_threshold = t;
            }
        }
        self
    }
}

// ── Position smoothing ─────────────────────────────────────

/// Fixed-capacity FIFO of recent points with an arithmetic-mean readout.
#[derive(Debug, Clone)]
pub struct PositionBuffer {
    samples: VecDeque<Vec3>,
    capacity: usize,
}

impl PositionBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a sample, evicting the oldest once full, and return the mean.
    pub fn push(&mut self, p: Vec3) -> Vec3 {
        self.samples.push_back(p);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.mean()
    }

    /// Mean of the buffered samples. Zero when empty.
    pub fn mean(&self) -> Vec3 {
        if self.samples.is_empty() {
            return Vec3::ZERO;
        }
        self.samples.iter().sum::<Vec3>() / self.samples.len() as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

// ── Classifier ─────────────────────────────────────────────

/// Stateful single-hand classifier. The only state is the pinch-center
/// smoothing buffer, so use one instance per tracked hand slot.
#[derive(Debug, Clone)]
pub struct HandPoseClassifier {
    pub config: ClassifierConfig,
    positions: PositionBuffer,
}

impl HandPoseClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let positions = PositionBuffer::new(config.position_window);
        Self { config, positions }
    }

    /// Classify one hand and advance the pinch-center average.
    pub fn analyze(&mut self, hand: &HandLandmarks) -> HandAnalysis {
        let is_pinching = self.is_pinch(hand);
        let is_fist = self.is_fist(hand);

        let gesture = if is_pinching {
            GestureLabel::Pinch
        } else if self.is_thumbs_up(hand) {
            GestureLabel::ThumbsUp
        } else if self.is_victory(hand) {
            GestureLabel::Victory
        } else if is_fist {
            GestureLabel::Closed
        } else if self.is_open_palm(hand) {
            GestureLabel::OpenPalm
        } else {
            self.config.unmatched
        };

        let pinch_center = self.positions.push(hand.pinch_midpoint());
        trace!(gesture = gesture.as_str(), is_pinching, is_fist, "classified hand");

        HandAnalysis {
            gesture,
            is_pinching,
            is_fist,
            center: hand.palm_center(),
            pinch_center,
            index_tip: hand.get(HandLandmark::IndexTip),
        }
    }

    /// Drop smoothing history (hand lost or re-acquired in another slot).
    pub fn reset(&mut self) {
        self.positions.clear();
    }

    fn finger_ratio(hand: &HandLandmarks, finger: Finger) -> f32 {
        let knuckle = hand.wrist_distance(finger.knuckle());
        if knuckle <= f32::EPSILON {
            return 0.0;
        }
        hand.wrist_distance(finger.tip()) / knuckle
    }

    fn thumb_ratio(hand: &HandLandmarks) -> f32 {
        let base = hand.wrist_distance(HandLandmark::ThumbMcp);
        if base <= f32::EPSILON {
            return 0.0;
        }
        hand.wrist_distance(HandLandmark::ThumbTip) / base
    }

    fn is_curled(&self, hand: &HandLandmarks, finger: Finger) -> bool {
        Self::finger_ratio(hand, finger) < self.config.curl_ratio
    }

    fn thumb_curled(&self, hand: &HandLandmarks) -> bool {
        Self::thumb_ratio(hand) < self.config.thumb_curl_ratio
    }

    fn all_curled(&self, hand: &HandLandmarks) -> bool {
        Finger::ALL.iter().all(|f| self.is_curled(hand, *f))
    }

    fn is_pinch(&self, hand: &HandLandmarks) -> bool {
        let gap = hand.distance(HandLandmark::ThumbTip, HandLandmark::IndexTip);
        gap < self.config.pinch_threshold
            && [Finger::Middle, Finger::Ring, Finger::Pinky]
                .iter()
                .all(|f| Self::finger_ratio(hand, *f) > self.config.pinch_extend_ratio)
    }

    fn is_fist(&self, hand: &HandLandmarks) -> bool {
        self.all_curled(hand) && self.thumb_curled(hand)
    }

    fn is_victory(&self, hand: &HandLandmarks) -> bool {
        !self.is_curled(hand, Finger::Index)
            && !self.is_curled(hand, Finger::Middle)
            && self.is_curled(hand, Finger::Ring)
            && self.is_curled(hand, Finger::Pinky)
            && !self.thumb_curled(hand)
    }

    fn is_thumbs_up(&self, hand: &HandLandmarks) -> bool {
        let thumb_tip = hand.get(HandLandmark::ThumbTip);
        let index_knuckle = hand.get(HandLandmark::IndexMcp);
        thumb_tip.y < index_knuckle.y
            && Self::thumb_ratio(hand) > self.config.thumbs_up_extend_ratio
            && self.all_curled(hand)
    }

    fn is_open_palm(&self, hand: &HandLandmarks) -> bool {
        let open = Finger::ALL
            .iter()
            .filter(|f| Self::finger_ratio(hand, **f) > self.config.open_extend_ratio)
            .count();
        open >= self.config.min_open_fingers
    }
}

impl Default for HandPoseClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

// ── Tests ──────────────────────────────────────────────────
