pub mod command;
pub mod gesture;
pub mod input;
pub mod math;
pub mod time;

pub use command::{Command, CommandMapper, CommandState};
pub use gesture::{
    EventDisposition, GestureModel, GestureRecognizer, GestureState, GestureTarget, ModelVector,
    PointerEvent, ThresholdMetric,
};
pub use input::{InputState, Key};
pub use math::Rect;
pub use time::{FrameClock, FrameTick};
