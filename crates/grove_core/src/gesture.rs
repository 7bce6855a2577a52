//! Pointer gesture recognition.
//!
//! Raw pointer events (down / move / up / wheel / leave / enter / out) are
//! folded into a discrete `GestureState` plus a positional `GestureModel`.
//!
//! Some transitions are two-phase: a press enters `HoldDown` immediately and
//! settles into `Hold` one scheduling tick later, and a release passes through
//! `HoldUp` (and `Click` when no drag happened) before returning to `Idle`.
//! The follow-up states are kept in an explicit queue that the frame driver
//! drains with `tick()`, one transition per tick. A new pointer event first
//! applies whatever is still queued so event order is never reordered.
//!
//! Every handler is a no-op while no target is attached.

use std::collections::VecDeque;

use glam::{Affine2, Vec2};
use serde::Deserialize;

use crate::math::Rect;

const HISTORY_CAPACITY: usize = 256;
pub const DEFAULT_MOVE_THRESHOLD: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureState {
    #[default]
    Idle,
    HoldDown,
    Hold,
    HoldMove,
    HoldUp,
    Click,
    Wheel,
}

impl GestureState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::HoldDown => "HOLD_DOWN",
            Self::Hold => "HOLD",
            Self::HoldMove => "HOLD_MOVE",
            Self::HoldUp => "HOLD_UP",
            Self::Click => "CLICK",
            Self::Wheel => "WHEEL",
        }
    }
}

impl std::fmt::Display for GestureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A position with the delta that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelVector {
    pub position: Vec2,
    pub delta: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureModel {
    /// Last raw pointer coordinate (viewport space).
    pub position: Vec2,
    pub delta: Vec2,
    /// Bounding rect of the tracked target in viewport space.
    pub target_rect: Rect,
    /// Coordinate relative to the target rect's origin.
    pub element: ModelVector,
    /// Coordinate in the target's own coordinate space, when it has one.
    pub local: ModelVector,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up { x: f32, y: f32 },
    Wheel { x: f32, y: f32, delta_x: f32, delta_y: f32 },
    Leave { x: f32, y: f32 },
    Enter { x: f32, y: f32 },
    Out { x: f32, y: f32 },
}

impl PointerEvent {
    pub fn position(&self) -> Vec2 {
        match *self {
            PointerEvent::Down { x, y }
            | PointerEvent::Move { x, y }
            | PointerEvent::Up { x, y }
            | PointerEvent::Wheel { x, y, .. }
            | PointerEvent::Leave { x, y }
            | PointerEvent::Enter { x, y }
            | PointerEvent::Out { x, y } => Vec2::new(x, y),
        }
    }
}

/// What the host should do with the device event after the recognizer saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Not consumed (no target, or a reserved hook).
    Ignored,
    Handled,
    /// Consumed and the device default action (page scroll) must be suppressed.
    PreventDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMetric {
    #[default]
    Euclidean,
    PerAxis,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureTarget {
    pub rect: Rect,
    /// Maps the target's local coordinate space into viewport space
    /// (a vector-graphics screen transform). `None` for plain elements.
    pub local_to_viewport: Option<Affine2>,
}

impl GestureTarget {
    pub fn element(rect: Rect) -> Self {
        Self {
            rect,
            local_to_viewport: None,
        }
    }

    pub fn with_local_space(rect: Rect, local_to_viewport: Affine2) -> Self {
        Self {
            rect,
            local_to_viewport: Some(local_to_viewport),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTransition {
    state: GestureState,
    reset_model_to: Option<Vec2>,
}

pub struct GestureRecognizer {
    state: GestureState,
    model: GestureModel,
    target: Option<GestureTarget>,
    threshold: f32,
    metric: ThresholdMetric,
    accumulated: Vec2,
    last_pointer: Vec2,
    pending: VecDeque<ScheduledTransition>,
    history: VecDeque<GestureState>,
    selection_suppressed: bool,
}

impl GestureRecognizer {
    pub fn new(threshold: f32, metric: ThresholdMetric) -> Self {
        let mut history = VecDeque::with_capacity(HISTORY_CAPACITY);
        history.push_back(GestureState::Idle);
        Self {
            state: GestureState::Idle,
            model: GestureModel::default(),
            target: None,
            threshold: threshold.max(0.0),
            metric,
            accumulated: Vec2::ZERO,
            last_pointer: Vec2::ZERO,
            pending: VecDeque::new(),
            history,
            selection_suppressed: false,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn model(&self) -> &GestureModel {
        &self.model
    }

    /// Whether document-wide text selection must currently be suppressed.
    pub fn selection_suppressed(&self) -> bool {
        self.selection_suppressed
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Every state applied so far, oldest first (bounded).
    pub fn history(&self) -> impl Iterator<Item = GestureState> + '_ {
        self.history.iter().copied()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.history.push_back(self.state);
    }

    pub fn attach_target(&mut self, target: GestureTarget) {
        self.target = Some(target);
        self.model.target_rect = target.rect;
    }

    /// Detach the target: pending transitions are dropped and the state goes
    /// back to `Idle` so selection suppression is released.
    pub fn detach_target(&mut self) {
        self.target = None;
        self.pending.clear();
        if self.state != GestureState::Idle {
            self.set_state(GestureState::Idle);
        }
    }

    /// Resize hook: the target's content box moved or changed size.
    pub fn set_target_rect(&mut self, rect: Rect) {
        if let Some(target) = self.target.as_mut() {
            target.rect = rect;
            self.model.target_rect = rect;
        }
    }

    pub fn handle(&mut self, event: PointerEvent) -> EventDisposition {
        if self.target.is_none() {
            return EventDisposition::Ignored;
        }
        self.flush_pending();

        let coord = event.position();
        match event {
            PointerEvent::Down { .. } => self.on_press(coord),
            PointerEvent::Move { .. } => self.on_move(coord),
            PointerEvent::Up { .. } => self.on_release(coord),
            PointerEvent::Wheel {
                delta_x, delta_y, ..
            } => {
                self.set_state(GestureState::Wheel);
                self.update_model(coord, Vec2::new(delta_x, delta_y));
                return EventDisposition::PreventDefault;
            }
            // Reserved for idle handling; must not alter state.
            PointerEvent::Leave { .. } | PointerEvent::Enter { .. } | PointerEvent::Out { .. } => {
                return EventDisposition::Ignored;
            }
        }
        EventDisposition::Handled
    }

    /// Apply one scheduled transition. Called once per frame by the driver.
    pub fn tick(&mut self) -> Option<GestureState> {
        let next = self.pending.pop_front()?;
        self.apply(next);
        Some(next.state)
    }

    fn flush_pending(&mut self) {
        while let Some(next) = self.pending.pop_front() {
            self.apply(next);
        }
    }

    fn apply(&mut self, transition: ScheduledTransition) {
        self.set_state(transition.state);
        if let Some(coord) = transition.reset_model_to {
            self.update_model(coord, Vec2::ZERO);
        }
    }

    fn schedule(&mut self, state: GestureState, reset_model_to: Option<Vec2>) {
        self.pending.push_back(ScheduledTransition {
            state,
            reset_model_to,
        });
    }

    fn on_press(&mut self, coord: Vec2) {
        self.accumulated = Vec2::ZERO;
        self.last_pointer = coord;
        self.set_state(GestureState::HoldDown);
        self.schedule(GestureState::Hold, Some(coord));
    }

    fn on_move(&mut self, coord: Vec2) {
        let delta = coord - self.model.position;
        match self.state {
            GestureState::Idle | GestureState::HoldMove => {
                self.update_model(coord, delta);
            }
            GestureState::Hold => {
                self.accumulated += coord - self.last_pointer;
                if self.threshold_passed() {
                    self.set_state(GestureState::HoldMove);
                    self.update_model(coord, delta);
                }
            }
            GestureState::HoldDown
            | GestureState::HoldUp
            | GestureState::Click
            | GestureState::Wheel => {
                self.set_state(GestureState::Idle);
                self.update_model(coord, delta);
            }
        }
        self.last_pointer = coord;
    }

    fn on_release(&mut self, coord: Vec2) {
        let prev = self.state;
        self.update_model(coord, Vec2::ZERO);
        self.set_state(GestureState::HoldUp);
        if prev == GestureState::Hold {
            self.schedule(GestureState::Click, None);
        }
        self.schedule(GestureState::Idle, None);
    }

    fn threshold_passed(&self) -> bool {
        match self.metric {
            ThresholdMetric::Euclidean => self.accumulated.length() > self.threshold,
            ThresholdMetric::PerAxis => {
                self.accumulated.x.abs() > self.threshold
                    || self.accumulated.y.abs() > self.threshold
            }
        }
    }

    fn set_state(&mut self, state: GestureState) {
        if self.state != state {
            log::trace!("gesture {} -> {}", self.state, state);
        }
        self.state = state;
        self.selection_suppressed = state != GestureState::Idle;
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(state);
    }

    fn update_model(&mut self, coord: Vec2, delta: Vec2) {
        let Some(target) = self.target else {
            return;
        };
        let local = match target.local_to_viewport {
            Some(transform) => {
                let inverse = transform.inverse();
                ModelVector {
                    position: inverse.transform_point2(coord),
                    delta: inverse.transform_vector2(delta),
                }
            }
            None => ModelVector::default(),
        };
        self.model = GestureModel {
            position: coord,
            delta,
            target_rect: target.rect,
            element: ModelVector {
                position: coord - target.rect.min(),
                delta,
            },
            local,
        };
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_THRESHOLD, ThresholdMetric::Euclidean)
    }
}
