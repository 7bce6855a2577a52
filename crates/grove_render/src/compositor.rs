//! Back-to-front sprite composition onto an abstract render sink.
//!
//! Drawables are stable-sorted by their bottom edge so an object standing
//! lower on screen covers the ones behind it. Ties keep push order.

use grove_core::math::Rect;

use crate::camera::ViewTransform;

/// Opaque reference to a decoded sprite owned by the sink side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteHandle(pub u32);

/// 2D immediate-mode drawing surface. Transforms compose like a canvas
/// context: each call post-multiplies the current matrix.
pub trait RenderSink {
    fn clear(&mut self, width: f32, height: f32);
    fn save(&mut self);
    fn restore(&mut self);
    fn scale(&mut self, sx: f32, sy: f32);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);
    fn draw_image(&mut self, sprite: SpriteHandle, rect: Rect);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawableKind {
    /// Rotated about its center by the cached sway angle.
    Player { sway_angle: f32 },
    Tree,
    Loot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub kind: DrawableKind,
    pub sprite: Option<SpriteHandle>,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub drawn: usize,
    pub skipped: usize,
}

#[derive(Default)]
pub struct RenderCompositor {
    drawables: Vec<Drawable>,
}

impl RenderCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.drawables.clear();
    }

    pub fn push(&mut self, drawable: Drawable) {
        self.drawables.push(drawable);
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Clear the surface, then draw everything pushed this frame inside the
    /// view transform.
    pub fn render(
        &mut self,
        sink: &mut dyn RenderSink,
        view: &ViewTransform,
        surface_width: f32,
        surface_height: f32,
    ) -> RenderStats {
        // sort_by is stable
        self.drawables
            .sort_by(|a, b| a.rect.bottom().total_cmp(&b.rect.bottom()));

        sink.clear(surface_width, surface_height);
        sink.save();
        sink.scale(view.zoom, view.zoom);
        sink.translate(-view.origin.x, -view.origin.y);

        let mut stats = RenderStats::default();
        for drawable in &self.drawables {
            let Some(sprite) = drawable.sprite else {
                stats.skipped += 1;
                continue;
            };
            match drawable.kind {
                DrawableKind::Player { sway_angle } => {
                    let center = drawable.rect.center();
                    let half = drawable.rect.size() * 0.5;
                    sink.save();
                    sink.translate(center.x, center.y);
                    sink.rotate(sway_angle);
                    sink.draw_image(
                        sprite,
                        Rect::new(-half.x, -half.y, drawable.rect.width, drawable.rect.height),
                    );
                    sink.restore();
                }
                DrawableKind::Tree | DrawableKind::Loot => {
                    sink.draw_image(sprite, drawable.rect);
                }
            }
            stats.drawn += 1;
        }

        sink.restore();
        log::trace!(
            "Composited {} drawables ({} without sprite)",
            stats.drawn,
            stats.skipped
        );
        stats
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCommand {
    Clear { width: f32, height: f32 },
    Save,
    Restore,
    Scale { sx: f32, sy: f32 },
    Translate { dx: f32, dy: f32 },
    Rotate { radians: f32 },
    DrawImage { sprite: SpriteHandle, rect: Rect },
}

/// Sink that records every call. Used by the headless harness and tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub commands: Vec<SinkCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }

    pub fn draws(&self) -> impl Iterator<Item = (SpriteHandle, Rect)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            SinkCommand::DrawImage { sprite, rect } => Some((*sprite, *rect)),
            _ => None,
        })
    }

    /// Number of sprite switches across consecutive draws.
    pub fn sprite_binds(&self) -> usize {
        let mut binds = 0usize;
        let mut current: Option<SpriteHandle> = None;
        for (sprite, _) in self.draws() {
            if current != Some(sprite) {
                current = Some(sprite);
                binds += 1;
            }
        }
        binds
    }
}

impl RenderSink for RecordingSink {
    fn clear(&mut self, width: f32, height: f32) {
        self.commands.push(SinkCommand::Clear { width, height });
    }

    fn save(&mut self) {
        self.commands.push(SinkCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(SinkCommand::Restore);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.commands.push(SinkCommand::Scale { sx, sy });
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.commands.push(SinkCommand::Translate { dx, dy });
    }

    fn rotate(&mut self, radians: f32) {
        self.commands.push(SinkCommand::Rotate { radians });
    }

    fn draw_image(&mut self, sprite: SpriteHandle, rect: Rect) {
        self.commands.push(SinkCommand::DrawImage { sprite, rect });
    }
}
