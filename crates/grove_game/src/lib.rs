pub mod assets;
pub mod collision;
pub mod config;
pub mod entities;
pub mod error;
pub mod inventory;
pub mod player;
pub mod replay;
pub mod simulation;
pub mod spatial;
pub mod world;

pub use config::SimConfig;
pub use error::LoadError;
pub use simulation::{FollowKey, FrameInput, FrameReport, Simulation};
