//! Hand landmark data model.
//!
//! Models the 21 landmarks per hand produced by the detection collaborator,
//! in normalized image space (x, y in [0, 1], z camera-relative depth).
//! Provides flat-array parsing and the derived points the classifier and
//! pointer logic rely on.

use glam::Vec3;
use tracing::warn;

// ── Landmark definitions ───────────────────────────────────

/// The 21 anatomical landmarks of a detected hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Maximum number of hands reported per frame.
pub const MAX_HANDS: usize = 2;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// One of the four non-thumb fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// Knuckle (MCP) landmark of this finger.
    pub fn knuckle(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexMcp,
            Self::Middle => HandLandmark::MiddleMcp,
            Self::Ring => HandLandmark::RingMcp,
            Self::Pinky => HandLandmark::PinkyMcp,
        }
    }

    /// Tip landmark of this finger.
    pub fn tip(&self) -> HandLandmark {
        match self {
            Self::Index => HandLandmark::IndexTip,
            Self::Middle => HandLandmark::MiddleTip,
            Self::Ring => HandLandmark::RingTip,
            Self::Pinky => HandLandmark::PinkyTip,
        }
    }
}

// ── Hand landmarks ─────────────────────────────────────────

/// The 21 landmark positions of one detected hand for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [Vec3; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Vec3; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a slice of `[x, y, z]` triples. Returns None unless
    /// exactly 21 triples are supplied.
    pub fn from_triples(triples: &[[f32; 3]]) -> Option<Self> {
        if triples.len() != LANDMARK_COUNT {
            warn!(
                "Hand landmarks: expected {} points, got {}",
                LANDMARK_COUNT,
                triples.len()
            );
            return None;
        }
        let mut points = [Vec3::ZERO; LANDMARK_COUNT];
        for (p, t) in points.iter_mut().zip(triples) {
            *p = Vec3::new(t[0], t[1], t[2]);
        }
        Some(Self { points })
    }

    /// Parse up to two hands from a flat `[x, y, z, x, y, z, ...]` buffer
    /// (63 floats per hand). Trailing partial hands are dropped.
    pub fn from_flat(flat: &[f32], num_hands: usize) -> Vec<HandLandmarks> {
        let stride = LANDMARK_COUNT * 3;
        let hands = num_hands.min(MAX_HANDS);
        let mut out = Vec::with_capacity(hands);
        for h in 0..hands {
            let base = h * stride;
            let Some(chunk) = flat.get(base..base + stride) else {
                warn!("Hand landmarks: flat buffer too short for hand {}", h);
                break;
            };
            let mut points = [Vec3::ZERO; LANDMARK_COUNT];
            for (i, p) in points.iter_mut().enumerate() {
                *p = Vec3::new(chunk[i * 3], chunk[i * 3 + 1], chunk[i * 3 + 2]);
            }
            out.push(Self { points });
        }
        out
    }

    /// Position of a landmark.
    pub fn get(&self, landmark: HandLandmark) -> Vec3 {
        self.points[landmark.index()]
    }

    /// Euclidean distance between two landmarks.
    pub fn distance(&self, a: HandLandmark, b: HandLandmark) -> f32 {
        self.get(a).distance(self.get(b))
    }

    /// Distance from the wrist to a landmark.
    pub fn wrist_distance(&self, landmark: HandLandmark) -> f32 {
        self.distance(HandLandmark::Wrist, landmark)
    }

    /// Palm center: mean of the wrist and the four finger knuckles.
    pub fn palm_center(&self) -> Vec3 {
        let pts = [
            self.get(HandLandmark::Wrist),
            self.get(HandLandmark::IndexMcp),
            self.get(HandLandmark::MiddleMcp),
            self.get(HandLandmark::RingMcp),
            self.get(HandLandmark::PinkyMcp),
        ];
        pts.iter().sum::<Vec3>() / pts.len() as f32
    }

    /// Midpoint between the thumb tip and the index tip.
    pub fn pinch_midpoint(&self) -> Vec3 {
        (self.get(HandLandmark::ThumbTip) + self.get(HandLandmark::IndexTip)) * 0.5
    }

    /// Uniformly scale every landmark about the origin.
    pub fn scaled(&self, factor: f32) -> HandLandmarks {
        let mut points = self.points;
        for p in points.iter_mut() {
            *p = *p * factor;
        }
        Self { points }
    }

    /// All points in index order.
    pub fn points(&self) -> &[Vec3; LANDMARK_COUNT] {
        &self.points
    }
}

// ── Test builders ──────────────────────────────────────────


// ── Tests ──────────────────────────────────────────────────
