//! Top-down player movement with a walking sway.
//!
//! Movement is variable-step: position advances by `direction * speed * dt`
//! where `dt` is the frame delta in milliseconds. While moving, the sway phase
//! is a pure function of how long the player has been walking. When the
//! player stops, the phase eases back to the nearest rest angle (0 or π, where
//! the sine is zero) instead of snapping.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use grove_core::math::Rect;
use grove_core::CommandState;
use grove_render::SpriteHandle;

use crate::config::SimConfig;
use crate::entities::DrawObject;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub object: DrawObject,
    /// World units per millisecond.
    pub speed: f32,
    /// Milliseconds of uninterrupted movement; zero while idle.
    pub moving_time: f32,
    /// Phase in [0, 2π).
    pub sway: f32,
    /// `sin(sway) * amplitude`, cached for the compositor.
    pub sway_angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerTuning {
    pub speed: f32,
    pub sway_rate: f32,
    pub sway_amplitude: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 0.3,
            sway_rate: 0.01,
            sway_amplitude: 0.08,
        }
    }
}

impl From<&SimConfig> for PlayerTuning {
    fn from(config: &SimConfig) -> Self {
        Self {
            speed: config.player_speed,
            sway_rate: config.sway_rate,
            sway_amplitude: config.sway_amplitude,
        }
    }
}

pub struct PlayerController {
    player: Player,
    tuning: PlayerTuning,
}

impl PlayerController {
    pub fn new(rect: Rect, tuning: PlayerTuning) -> Self {
        Self {
            player: Player {
                object: DrawObject::new(rect),
                speed: tuning.speed,
                moving_time: 0.0,
                sway: 0.0,
                sway_angle: 0.0,
            },
            tuning,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn rect(&self) -> Rect {
        self.player.object.rect()
    }

    pub fn set_sprite(&mut self, sprite: SpriteHandle) {
        self.player.object.sprite = Some(sprite);
    }

    /// Advance one frame. Returns whether the player moved.
    pub fn update(&mut self, commands: &CommandState, delta_ms: f32) -> bool {
        let delta_ms = delta_ms.max(0.0);
        let direction = commands.direction().normalize_or_zero();
        let moving = direction != Vec2::ZERO;
        let player = &mut self.player;

        if moving {
            player.object.translate(direction * player.speed * delta_ms);
            player.moving_time += delta_ms;
            player.sway = (player.moving_time * self.tuning.sway_rate).rem_euclid(TAU);
        } else {
            player.moving_time = 0.0;
            let rest = nearest_rest_angle(player.sway);
            player.sway = move_towards(player.sway, rest, delta_ms * self.tuning.sway_rate);
            if player.sway >= TAU {
                player.sway = 0.0;
            }
        }

        player.sway_angle = player.sway.sin() * self.tuning.sway_amplitude;
        moving
    }
}

fn nearest_rest_angle(sway: f32) -> f32 {
    if sway < PI * 0.5 {
        0.0
    } else if sway < PI * 1.5 {
        PI
    } else {
        TAU
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else if target > current {
        current + max_delta
    } else {
        current - max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::Command;

    fn controller() -> PlayerController {
        PlayerController::new(Rect::new(0.0, 0.0, 128.0, 128.0), PlayerTuning::default())
    }

    fn idle() -> CommandState {
        CommandState::new()
    }

    #[test]
    fn moves_by_speed_times_delta() {
        let mut controller = controller();
        let moved = controller.update(&CommandState::from_commands(&[Command::MoveRight]), 100.0);
        assert!(moved);
        assert!((controller.rect().x - 30.0).abs() < 1e-4);
        assert_eq!(controller.rect().y, 0.0);
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let mut controller = controller();
        let commands = CommandState::from_commands(&[Command::MoveUp, Command::MoveLeft]);
        controller.update(&commands, 100.0);
        let travelled = controller.rect().min().length();
        assert!((travelled - 30.0).abs() < 1e-3);
        assert!(controller.rect().x < 0.0 && controller.rect().y < 0.0);
    }

    #[test]
    fn opposing_commands_do_not_move() {
        let mut controller = controller();
        let commands = CommandState::from_commands(&[Command::MoveUp, Command::MoveDown]);
        assert!(!controller.update(&commands, 100.0));
        assert_eq!(controller.rect().min(), Vec2::ZERO);
        assert_eq!(controller.player().moving_time, 0.0);
    }

    #[test]
    fn sway_follows_moving_time() {
        let mut controller = controller();
        let right = CommandState::from_commands(&[Command::MoveRight]);
        controller.update(&right, 50.0);
        controller.update(&right, 50.0);
        let player = controller.player();
        assert_eq!(player.moving_time, 100.0);
        assert!((player.sway - 1.0).abs() < 1e-5);
        assert!((player.sway_angle - 1.0f32.sin() * 0.08).abs() < 1e-6);
    }

    #[test]
    fn sway_returns_to_rest_after_stopping() {
        let mut controller = controller();
        let right = CommandState::from_commands(&[Command::MoveRight]);
        for _ in 0..100 {
            controller.update(&right, 10.0);
        }
        assert!(controller.player().sway_angle.abs() > 0.01);

        for _ in 0..100 {
            controller.update(&idle(), 16.0);
        }
        let player = controller.player();
        assert_eq!(player.moving_time, 0.0);
        assert!(player.sway_angle.abs() < 1e-6, "{}", player.sway_angle);
    }

    #[test]
    fn sway_decay_never_overshoots() {
        let mut controller = controller();
        let right = CommandState::from_commands(&[Command::MoveRight]);
        controller.update(&right, 20.0); // sway 0.2
        controller.update(&idle(), 1000.0);
        assert_eq!(controller.player().sway, 0.0);
    }

    #[test]
    fn sway_near_full_turn_wraps_to_zero() {
        let mut controller = controller();
        let right = CommandState::from_commands(&[Command::MoveRight]);
        controller.update(&right, 600.0); // sway 6.0, nearest rest is 2π
        controller.update(&idle(), 1000.0);
        assert_eq!(controller.player().sway, 0.0);
        assert_eq!(controller.player().sway_angle, 0.0);
    }

    #[test]
    fn nearest_rest_angle_picks_closest() {
        assert_eq!(nearest_rest_angle(0.3), 0.0);
        assert_eq!(nearest_rest_angle(2.0), PI);
        assert_eq!(nearest_rest_angle(4.0), PI);
        assert_eq!(nearest_rest_angle(5.0), TAU);
    }
}
