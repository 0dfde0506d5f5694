//! Interaction state machine.
//!
//! Converts one stabilized gesture per frame into a next state plus a list
//! of commands for the controller. Gesture rules run first (zoom, rotate,
//! pinch, victory, everything else), then the hold timers of the resulting
//! state are checked. The transition itself is a pure function over
//! `(state, gesture, timers, now)`; world side effects happen in the
//! controller, which reports a successful placement back through
//! [`InteractionMachine::placement_committed`].

use tracing::{debug, info};

use crate::tracking::GestureLabel;

// ── State ──────────────────────────────────────────────────

/// Active interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Rotating,
    Zooming,
    DrawWait,
    BlockPlaced,
    UndoWait,
    UndoComplete,
}

impl InteractionState {
    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Rotating => "rotating",
            Self::Zooming => "zooming",
            Self::DrawWait => "draw-wait",
            Self::BlockPlaced => "block-placed",
            Self::UndoWait => "undo-wait",
            Self::UndoComplete => "undo-complete",
        }
    }

    fn is_manipulating(&self) -> bool {
        matches!(self, Self::Rotating | Self::Zooming)
    }
}

// ── Config ─────────────────────────────────────────────────

/// Timing and camera-manipulation parameters.
#[derive(Debug, Clone)]
pub struct InteractionConfig {
    /// Hold time (ms) before a pinch places or a victory undoes.
    pub hold_delay_ms: f64,
    /// Quiet time (ms) after the last rotate/zoom frame before a pinch counts.
    pub rotate_debounce_ms: f64,
    /// Radians of scene rotation per unit of NDC pointer movement.
    pub rotate_sensitivity: f32,
    /// Camera distance change per zoom frame.
    pub zoom_step: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hold_delay_ms: 2000.0,
            rotate_debounce_ms: 300.0,
            rotate_sensitivity: 3.5,
            zoom_step: 0.2,
            min_distance: 2.0,
            max_distance: 20.0,
        }
    }
}

// ── Timers and commands ────────────────────────────────────

/// Hold-to-confirm bookkeeping carried between frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HoldTimers {
    /// When the current pinch hold started.
    pub pinch_start_ms: Option<f64>,
    /// When the current victory hold started.
    pub undo_start_ms: Option<f64>,
    /// Last frame spent rotating or zooming.
    pub last_manipulation_ms: Option<f64>,
    /// A block has already been placed during this pinch hold.
    pub placed_this_hold: bool,
}

impl HoldTimers {
    fn elapsed_since(start: Option<f64>, now_ms: f64) -> f64 {
        start.map_or(0.0, |t| now_ms - t)
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Change camera distance by `delta` (clamped by the camera).
    Zoom { delta: f32 },
    /// Record the current pointer as the rotation anchor.
    BeginRotation,
    /// Rotate the scene by the pointer delta since the previous frame.
    Rotate,
    /// Try to place a voxel at the cursor.
    AttemptPlace,
    /// Pop and invert the newest undo action.
    CommitUndo,
    /// Step through the build palette.
    CycleColor { step: i32 },
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: InteractionState,
    pub timers: HoldTimers,
    pub commands: Vec<Command>,
}

/// Advance the machine by one frame.
pub fn transition(
    state: InteractionState,
    gesture: GestureLabel,
    timers: HoldTimers,
    now_ms: f64,
    config: &InteractionConfig,
) -> Transition {
    use InteractionState as S;

    let mut next = state;
    let mut timers = timers;
    let mut commands = Vec::new();

    match gesture {
        GestureLabel::ZoomIn | GestureLabel::ZoomOut => {
            let delta = if gesture == GestureLabel::ZoomOut {
                config.zoom_step
            } else {
                -config.zoom_step
            };
            timers.last_manipulation_ms = Some(now_ms);
            return Transition {
                state: S::Zooming,
                timers,
                commands: vec![Command::Zoom { delta }],
            };
        }
        GestureLabel::Closed => {
            if state != S::Rotating {
                commands.push(Command::BeginRotation);
            } else {
                commands.push(Command::Rotate);
            }
            timers.last_manipulation_ms = Some(now_ms);
            next = S::Rotating;
        }
        GestureLabel::Pinch => {
            let debouncing = state.is_manipulating()
                && HoldTimers::elapsed_since(timers.last_manipulation_ms, now_ms)
                    < config.rotate_debounce_ms;
            if debouncing {
                debug!("Pinch ignored during {} debounce", state.as_str());
            } else if !matches!(state, S::DrawWait | S::BlockPlaced) {
                next = S::DrawWait;
                timers.pinch_start_ms = Some(now_ms);
                timers.placed_this_hold = false;
            }
        }
        GestureLabel::Victory => {
            if !matches!(state, S::UndoWait | S::UndoComplete) {
                next = S::UndoWait;
                timers.undo_start_ms = Some(now_ms);
            }
        }
        GestureLabel::SwipeLeft | GestureLabel::SwipeRight => {
            let step = if gesture == GestureLabel::SwipeRight { 1 } else { -1 };
            commands.push(Command::CycleColor { step });
            next = S::Idle;
            timers.placed_this_hold = false;
        }
        GestureLabel::None
        | GestureLabel::Unknown
        | GestureLabel::OpenPalm
        | GestureLabel::ThumbsUp => {
            next = S::Idle;
            timers.placed_this_hold = false;
        }
    }

    match next {
        S::DrawWait => {
            let elapsed = HoldTimers::elapsed_since(timers.pinch_start_ms, now_ms);
            if elapsed > config.hold_delay_ms && !timers.placed_this_hold {
                commands.push(Command::AttemptPlace);
            }
        }
        S::UndoWait => {
            let elapsed = HoldTimers::elapsed_since(timers.undo_start_ms, now_ms);
            if elapsed > config.hold_delay_ms {
                commands.push(Command::CommitUndo);
                next = S::UndoComplete;
            }
        }
        S::Idle | S::Rotating | S::Zooming | S::BlockPlaced | S::UndoComplete => {}
    }

    Transition {
        state: next,
        timers,
        commands,
    }
}

/// Human-readable status line for the presentation layer.
pub fn status_text(
    state: InteractionState,
    timers: &HoldTimers,
    now_ms: f64,
    config: &InteractionConfig,
) -> String {
    let remaining = |start: Option<f64>| {
        (config.hold_delay_ms - HoldTimers::elapsed_since(start, now_ms)).max(0.0) / 1000.0
    };
    match state {
        InteractionState::Idle => "Pinch to build, hold victory to undo".to_string(),
        InteractionState::Rotating => "Rotating".to_string(),
        InteractionState::Zooming => "Zooming".to_string(),
        InteractionState::DrawWait => {
            let secs = remaining(timers.pinch_start_ms);
            if secs > 0.0 {
                format!("Building in {:.1}s", secs)
            } else {
                "Aim at a cell to build".to_string()
            }
        }
        InteractionState::BlockPlaced => "Block placed, release to continue".to_string(),
        InteractionState::UndoWait => format!("Undo in {:.1}s", remaining(timers.undo_start_ms)),
        InteractionState::UndoComplete => "Undone, release to continue".to_string(),
    }
}

// ── Machine ────────────────────────────────────────────────

/// Owner of the current state and timers.
#[derive(Debug, Default)]
pub struct InteractionMachine {
    pub config: InteractionConfig,
    state: InteractionState,
    timers: HoldTimers,
}

impl InteractionMachine {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            state: InteractionState::Idle,
            timers: HoldTimers::default(),
        }
    }

    /// Run one transition and return the commands it requested.
    pub fn step(&mut self, gesture: GestureLabel, now_ms: f64) -> Vec<Command> {
        let t = transition(self.state, gesture, self.timers, now_ms, &self.config);
        if t.state != self.state {
            info!(
                "Interaction {} -> {} ({})",
                self.state.as_str(),
                t.state.as_str(),
                gesture.as_str()
            );
        }
        self.state = t.state;
        self.timers = t.timers;
        t.commands
    }

    /// The controller placed a block for the current hold.
    pub fn placement_committed(&mut self) {
        if self.state == InteractionState::DrawWait {
            self.timers.placed_this_hold = true;
            self.state = InteractionState::BlockPlaced;
            info!("Interaction draw-wait -> block-placed");
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn timers(&self) -> &HoldTimers {
        &self.timers
    }

    pub fn status(&self, now_ms: f64) -> String {
        status_text(self.state, &self.timers, now_ms, &self.config)
    }

    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
        self.timers = HoldTimers::default();
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_GESTURES: [GestureLabel; 11] = [
        GestureLabel::None,
        GestureLabel::Unknown,
        GestureLabel::OpenPalm,
        GestureLabel::Closed,
        GestureLabel::Pinch,
        GestureLabel::Victory,
        GestureLabel::ThumbsUp,
        GestureLabel::SwipeLeft,
        GestureLabel::SwipeRight,
        GestureLabel::ZoomIn,
        GestureLabel::ZoomOut,
    ];

    const ALL_STATES: [InteractionState; 7] = [
        InteractionState::Idle,
        InteractionState::Rotating,
        InteractionState::Zooming,
        InteractionState::DrawWait,
        InteractionState::BlockPlaced,
        InteractionState::UndoWait,
        InteractionState::UndoComplete,
    ];

    fn run(m: &mut InteractionMachine, gesture: GestureLabel, from: f64, to: f64, dt: f64) -> Vec<Command> {
        let mut out = Vec::new();
        let mut t = from;
        while t <= to {
            out.extend(m.step(gesture, t));
            t += dt;
        }
        out
    }

    #[test]
    fn test_zoom_wins_from_every_state() {
        let cfg = InteractionConfig::default();
        for state in ALL_STATES {
            let t = transition(state, GestureLabel::ZoomOut, HoldTimers::default(), 0.0, &cfg);
            assert_eq!(t.state, InteractionState::Zooming, "from {:?}", state);
            assert_eq!(t.commands, vec![Command::Zoom { delta: 0.2 }]);
        }
        let t = transition(InteractionState::Idle, GestureLabel::ZoomIn, HoldTimers::default(), 0.0, &cfg);
        assert_eq!(t.commands, vec![Command::Zoom { delta: -0.2 }]);
    }

    #[test]
    fn test_every_pair_yields_a_state() {
        let cfg = InteractionConfig::default();
        for state in ALL_STATES {
            for gesture in ALL_GESTURES {
                let t = transition(state, gesture, HoldTimers::default(), 10_000.0, &cfg);
                assert!(ALL_STATES.contains(&t.state));
            }
        }
    }

    #[test]
    fn test_closed_anchors_then_rotates() {
        let mut m = InteractionMachine::default();
        assert_eq!(m.step(GestureLabel::Closed, 0.0), vec![Command::BeginRotation]);
        assert_eq!(m.state(), InteractionState::Rotating);
        assert_eq!(m.step(GestureLabel::Closed, 33.0), vec![Command::Rotate]);
    }

    #[test]
    fn test_pinch_hold_places_once() {
        let mut m = InteractionMachine::default();
        let cmds = run(&mut m, GestureLabel::Pinch, 0.0, 1990.0, 33.0);
        assert!(cmds.is_empty(), "nothing before the hold delay");
        assert_eq!(m.state(), InteractionState::DrawWait);

        assert_eq!(m.step(GestureLabel::Pinch, 2001.0), vec![Command::AttemptPlace]);
        m.placement_committed();
        assert_eq!(m.state(), InteractionState::BlockPlaced);
        assert!(m.timers().placed_this_hold);

        let cmds = run(&mut m, GestureLabel::Pinch, 2034.0, 6000.0, 33.0);
        assert!(cmds.is_empty(), "held pinch must not place again");
        assert_eq!(m.state(), InteractionState::BlockPlaced);
    }

    #[test]
    fn test_failed_placement_retries() {
        let mut m = InteractionMachine::default();
        m.step(GestureLabel::Pinch, 0.0);
        assert_eq!(m.step(GestureLabel::Pinch, 2100.0), vec![Command::AttemptPlace]);
        assert_eq!(m.step(GestureLabel::Pinch, 2133.0), vec![Command::AttemptPlace]);
        assert_eq!(m.state(), InteractionState::DrawWait);
    }

    #[test]
    fn test_release_returns_to_idle_and_rearms() {
        let mut m = InteractionMachine::default();
        m.step(GestureLabel::Pinch, 0.0);
        m.step(GestureLabel::Pinch, 2100.0);
        m.placement_committed();
        m.step(GestureLabel::OpenPalm, 2133.0);
        assert_eq!(m.state(), InteractionState::Idle);
        assert!(!m.timers().placed_this_hold);

        m.step(GestureLabel::Pinch, 3000.0);
        assert_eq!(m.timers().pinch_start_ms, Some(3000.0));
    }

    #[test]
    fn test_pinch_debounced_after_rotation() {
        let mut m = InteractionMachine::default();
        m.step(GestureLabel::Closed, 0.0);
        m.step(GestureLabel::Closed, 100.0);
        m.step(GestureLabel::Pinch, 200.0);
        assert_eq!(m.state(), InteractionState::Rotating, "pinch within 300 ms ignored");
        m.step(GestureLabel::Pinch, 399.0);
        assert_eq!(m.state(), InteractionState::Rotating);
        m.step(GestureLabel::Pinch, 401.0);
        assert_eq!(m.state(), InteractionState::DrawWait);
        assert_eq!(m.timers().pinch_start_ms, Some(401.0));
    }

    #[test]
    fn test_pinch_debounced_after_zoom() {
        let mut m = InteractionMachine::default();
        m.step(GestureLabel::ZoomIn, 0.0);
        m.step(GestureLabel::Pinch, 50.0);
        assert_eq!(m.state(), InteractionState::Zooming);
        m.step(GestureLabel::Pinch, 350.0);
        assert_eq!(m.state(), InteractionState::DrawWait);
    }

    #[test]
    fn test_victory_hold_undoes_once() {
        let mut m = InteractionMachine::default();
        let cmds = run(&mut m, GestureLabel::Victory, 0.0, 1999.0, 33.0);
        assert!(cmds.is_empty());
        assert_eq!(m.state(), InteractionState::UndoWait);

        assert_eq!(m.step(GestureLabel::Victory, 2050.0), vec![Command::CommitUndo]);
        assert_eq!(m.state(), InteractionState::UndoComplete);
        let cmds = run(&mut m, GestureLabel::Victory, 2083.0, 5000.0, 33.0);
        assert!(cmds.is_empty(), "held victory must not undo again");
    }

    #[test]
    fn test_swipe_cycles_color_and_idles() {
        let mut m = InteractionMachine::default();
        m.step(GestureLabel::Victory, 0.0);
        assert_eq!(m.step(GestureLabel::SwipeLeft, 10.0), vec![Command::CycleColor { step: -1 }]);
        assert_eq!(m.state(), InteractionState::Idle);
        assert_eq!(m.step(GestureLabel::SwipeRight, 20.0), vec![Command::CycleColor { step: 1 }]);
    }

    #[test]
    fn test_status_countdown() {
        let mut m = InteractionMachine::default();
        m.step(GestureLabel::Pinch, 0.0);
        assert_eq!(m.status(500.0), "Building in 1.5s");
        m.step(GestureLabel::Pinch, 2500.0);
        assert_eq!(m.status(2500.0), "Aim at a cell to build");

        m.reset();
        m.step(GestureLabel::Victory, 1000.0);
        assert_eq!(m.status(1800.0), "Undo in 1.2s");
        assert_eq!(m.status(4000.0), "Undo in 0.0s");
    }
}
