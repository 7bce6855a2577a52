pub mod camera;
pub mod compositor;
pub mod surface;

pub use camera::{Bounds, CameraController, CameraState, ViewTransform};
pub use compositor::{
    Drawable, DrawableKind, RecordingSink, RenderCompositor, RenderSink, RenderStats,
    SinkCommand, SpriteHandle,
};
pub use surface::{ResizeEvent, ResizeNotifier, Surface, SurfaceMetrics};
