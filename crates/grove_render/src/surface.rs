//! Output surface geometry and deferred resize handling.
//!
//! A surface has a client rect in window (CSS) units and a backing store in
//! device pixels. Resize notifications arrive on a channel from whatever owns
//! the window and are applied at the start of a frame, never mid-draw.

use std::sync::mpsc::{self, Receiver, Sender};

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    /// Top-left of the surface inside the window.
    pub client_origin: Vec2,
    /// Client size in window units.
    pub client_size: Vec2,
    /// Backing store size in pixels.
    pub pixel_size: Vec2,
}

impl SurfaceMetrics {
    pub fn new(client_origin: Vec2, client_size: Vec2, device_pixel_ratio: f32) -> Self {
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let client_size = client_size.max(Vec2::ZERO);
        Self {
            client_origin,
            client_size,
            pixel_size: (client_size * ratio).round().max(Vec2::ONE),
        }
    }

    /// Window units per surface pixel, per axis.
    pub fn units_per_pixel(&self) -> Vec2 {
        let pixels = self.pixel_size.max(Vec2::ONE);
        self.client_size / pixels
    }

    pub fn surface_to_window(&self, surface: Vec2) -> Vec2 {
        self.client_origin + surface * self.units_per_pixel()
    }

    pub fn window_to_surface(&self, window: Vec2) -> Vec2 {
        let scale = self.units_per_pixel();
        let scale = Vec2::new(
            if scale.x > 0.0 { scale.x } else { 1.0 },
            if scale.y > 0.0 { scale.y } else { 1.0 },
        );
        (window - self.client_origin) / scale
    }
}

/// Content-box change reported by the windowing side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    pub client_origin: Vec2,
    pub client_size: Vec2,
    pub device_pixel_ratio: f32,
}

/// Sending half handed to the window owner.
#[derive(Debug, Clone)]
pub struct ResizeNotifier {
    tx: Sender<ResizeEvent>,
}

impl ResizeNotifier {
    /// Returns false once the surface has been dropped.
    pub fn notify(&self, event: ResizeEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

pub struct Surface {
    metrics: SurfaceMetrics,
    tx: Sender<ResizeEvent>,
    rx: Receiver<ResizeEvent>,
}

impl Surface {
    pub fn new(metrics: SurfaceMetrics) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { metrics, tx, rx }
    }

    pub fn metrics(&self) -> &SurfaceMetrics {
        &self.metrics
    }

    pub fn notifier(&self) -> ResizeNotifier {
        ResizeNotifier {
            tx: self.tx.clone(),
        }
    }

    /// Apply the most recent queued resize, if any. Earlier ones are
    /// superseded and dropped.
    pub fn apply_pending(&mut self) -> Option<SurfaceMetrics> {
        let latest = self.rx.try_iter().last()?;
        self.metrics = SurfaceMetrics::new(
            latest.client_origin,
            latest.client_size,
            latest.device_pixel_ratio,
        );
        log::debug!(
            "Surface resized to {}x{} px",
            self.metrics.pixel_size.x,
            self.metrics.pixel_size.y
        );
        Some(self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_size_follows_device_ratio() {
        let metrics = SurfaceMetrics::new(Vec2::ZERO, Vec2::new(400.0, 300.0), 2.0);
        assert_eq!(metrics.pixel_size, Vec2::new(800.0, 600.0));
        assert_eq!(metrics.units_per_pixel(), Vec2::splat(0.5));
    }

    #[test]
    fn invalid_ratio_falls_back_to_one() {
        let metrics = SurfaceMetrics::new(Vec2::ZERO, Vec2::new(100.0, 50.0), 0.0);
        assert_eq!(metrics.pixel_size, Vec2::new(100.0, 50.0));
    }

    #[test]
    fn window_surface_round_trip() {
        let metrics = SurfaceMetrics::new(Vec2::new(12.0, 30.0), Vec2::new(640.0, 480.0), 1.5);
        let p = Vec2::new(100.0, 200.0);
        let back = metrics.surface_to_window(metrics.window_to_surface(p));
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn only_latest_resize_is_applied() {
        let mut surface = Surface::new(SurfaceMetrics::new(Vec2::ZERO, Vec2::splat(100.0), 1.0));
        assert!(surface.apply_pending().is_none());

        let notifier = surface.notifier();
        for width in [200.0, 300.0, 400.0] {
            assert!(notifier.notify(ResizeEvent {
                client_origin: Vec2::ZERO,
                client_size: Vec2::new(width, 100.0),
                device_pixel_ratio: 1.0,
            }));
        }
        let applied = surface.apply_pending().map(|m| m.pixel_size);
        assert_eq!(applied, Some(Vec2::new(400.0, 100.0)));
        assert!(surface.apply_pending().is_none());
    }

    #[test]
    fn notify_after_drop_reports_failure() {
        let surface = Surface::new(SurfaceMetrics::new(Vec2::ZERO, Vec2::splat(10.0), 1.0));
        let notifier = surface.notifier();
        drop(surface);
        assert!(!notifier.notify(ResizeEvent {
            client_origin: Vec2::ZERO,
            client_size: Vec2::splat(20.0),
            device_pixel_ratio: 1.0,
        }));
    }
}
