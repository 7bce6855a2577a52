//! Follow camera for a top-down 2D world.
//!
//! The camera state is a world-space top-left corner plus a viewport in
//! surface pixels and a zoom factor. Following uses exponential smoothing,
//! `alpha = 1 - exp(-k * dt)`, so convergence depends on elapsed wall time and
//! not on frame count: a 30 Hz and a 144 Hz run reach the target together.
//!
//! The camera never owns what it follows. It stores a lookup key `K` and the
//! caller resolves that key to a rect at update time; an unresolved key is a
//! no-op.

use glam::Vec2;
use grove_core::math::Rect;

use crate::surface::SurfaceMetrics;

pub const MIN_ZOOM: f32 = 0.1;
pub const DEFAULT_FOLLOW_STRENGTH: f32 = 0.008;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// World-space top-left corner.
    pub position: Vec2,
    /// Viewport size in surface pixels.
    pub viewport: Vec2,
    pub zoom: f32,
}

/// World extents the camera is clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

pub struct CameraController<K> {
    state: CameraState,
    bounds: Option<Bounds>,
    follow_target: Option<K>,
    follow_enabled: bool,
    follow_strength: f32,
    min_zoom: f32,
}

impl<K: Copy> CameraController<K> {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            state: CameraState {
                position: Vec2::ZERO,
                viewport: Vec2::new(viewport_width.max(0.0), viewport_height.max(0.0)),
                zoom: 1.0,
            },
            bounds: None,
            follow_target: None,
            follow_enabled: true,
            follow_strength: DEFAULT_FOLLOW_STRENGTH,
            min_zoom: MIN_ZOOM,
        }
    }

    pub fn with_tuning(mut self, follow_strength: f32, min_zoom: f32) -> Self {
        self.follow_strength = follow_strength.max(0.0);
        self.min_zoom = if min_zoom.is_finite() && min_zoom > 0.0 {
            min_zoom
        } else {
            MIN_ZOOM
        };
        self
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn position(&self) -> Vec2 {
        self.state.position
    }

    pub fn zoom(&self) -> f32 {
        self.state.zoom
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn follow_target(&self) -> Option<K> {
        self.follow_target
    }

    pub fn is_follow_enabled(&self) -> bool {
        self.follow_enabled
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.state.viewport = Vec2::new(width.max(0.0), height.max(0.0));
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if !zoom.is_finite() || zoom < self.min_zoom {
            log::warn!("Zoom {} clamped to {}", zoom, self.min_zoom);
            self.state.zoom = self.min_zoom;
        } else {
            self.state.zoom = zoom;
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.state.position = Vec2::new(x, y);
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.state.position += Vec2::new(dx, dy);
    }

    pub fn set_bounds(&mut self, bounds: Option<Bounds>) {
        self.bounds = bounds;
    }

    pub fn set_follow_target(&mut self, target: Option<K>) {
        self.follow_target = target;
    }

    pub fn enable_follow(&mut self) {
        self.follow_enabled = true;
    }

    pub fn disable_follow(&mut self) {
        self.follow_enabled = false;
    }

    /// Top-left that centers `target` in the viewport at the current zoom.
    pub fn desired_position(&self, target: Rect) -> Vec2 {
        target.center() - self.state.viewport / (2.0 * self.state.zoom)
    }

    pub fn update(&mut self, delta_ms: f32, lookup: impl FnOnce(K) -> Option<Rect>) {
        if !self.follow_enabled {
            return;
        }
        let Some(key) = self.follow_target else {
            return;
        };
        let Some(target) = lookup(key) else {
            return;
        };

        let desired = self.desired_position(target);
        let alpha = 1.0 - (-self.follow_strength * delta_ms.max(0.0)).exp();
        self.state.position += (desired - self.state.position) * alpha;
        self.clamp_to_bounds();
    }

    /// Clamp the position into the bounds. Idempotent.
    pub fn clamp_to_bounds(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let visible = self.state.viewport / self.state.zoom;
        let max_x = (bounds.width - visible.x).max(0.0);
        let max_y = (bounds.height - visible.y).max(0.0);
        self.state.position.x = self.state.position.x.max(0.0).min(max_x);
        self.state.position.y = self.state.position.y.max(0.0).min(max_y);
    }

    /// World rect covered by the viewport, from the same snapped origin the
    /// view transform draws with.
    pub fn visible_rect(&self) -> Rect {
        Rect::from_min_size(
            self.view_transform().origin,
            self.state.viewport / self.state.zoom,
        )
    }

    pub fn view_transform(&self) -> ViewTransform {
        ViewTransform {
            zoom: self.state.zoom,
            origin: self.state.position.floor(),
        }
    }
}

/// World → surface transform: scale by zoom, then translate by the
/// pixel-snapped camera origin. Rendering and hit-testing share this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub origin: Vec2,
}

impl ViewTransform {
    pub fn world_to_viewport(&self, world: Vec2) -> Vec2 {
        (world - self.origin) * self.zoom
    }

    pub fn viewport_to_world(&self, viewport: Vec2) -> Vec2 {
        viewport / self.zoom + self.origin
    }

    /// World point to window (CSS) coordinates through the output surface.
    pub fn world_point_to_window(&self, world: Vec2, surface: &SurfaceMetrics) -> Vec2 {
        surface.surface_to_window(self.world_to_viewport(world))
    }

    /// Window rect of a world rect; the extent is rounded like the overlay
    /// placement code expects.
    pub fn world_rect_to_window(&self, world: Rect, surface: &SurfaceMetrics) -> Rect {
        let top_left = self.world_point_to_window(world.min(), surface);
        let bottom_right = self.world_point_to_window(world.max(), surface);
        Rect::new(
            top_left.x,
            top_left.y,
            (bottom_right.x - top_left.x).round(),
            (bottom_right.y - top_left.y).round(),
        )
    }

    /// Inverse of `world_point_to_window`, used to hit-test pointer events.
    pub fn window_point_to_world(&self, window: Vec2, surface: &SurfaceMetrics) -> Vec2 {
        self.viewport_to_world(surface.window_to_surface(window))
    }
}
