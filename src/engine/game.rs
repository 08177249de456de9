//! Demo game state: a keyboard-driven player and a slowly spinning column.
//!
//! Owns the draw-queue construction: every frame it hands the renderer a
//! fresh ordered list of (model, transform) pairs and keeps nothing of it.

use std::sync::Arc;

use glam::{Quat, Vec3};
use winit::keyboard::{Key, NamedKey};

use crate::engine::assets::ModelKind;
use crate::engine::assets::sound::SoundData;
use crate::engine::audio::Audio;
use crate::engine::graphics::{DrawEntity, Transform};
use crate::engine::physics::{BodyHandle, Physics};
use crate::engine::user_input::InputState;

const PLAYER_SPEED: f32 = 1.5;
const COLUMN_SPIN: f32 = 0.4; // radians per second

struct Placed {
    kind: ModelKind,
    transform: Transform,
    body: BodyHandle,
}

pub struct Game {
    physics: Physics,
    player: Placed,
    column: Placed,

    audio: Option<Audio>,
    bump_clip: Option<Arc<SoundData>>,
    in_contact: bool,
    column_angle: f32,
}

impl Game {
    pub fn new(
        mut physics: Physics,
        audio: Option<Audio>,
        bump_clip: Option<SoundData>,
    ) -> Self {
        let player_start = Transform::from_position(Vec3::new(-1.2, 0.0, 0.0));
        let column_start = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));

        let player = Placed {
            kind: ModelKind::Player,
            body: physics.add_body(ModelKind::Player, &player_start),
            transform: player_start,
        };
        let column = Placed {
            kind: ModelKind::Column,
            body: physics.add_body(ModelKind::Column, &column_start),
            transform: column_start,
        };

        Self {
            physics,
            player,
            column,
            audio,
            bump_clip: bump_clip.map(Arc::new),
            in_contact: false,
            column_angle: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32, input: &InputState) {
        self.column_angle += COLUMN_SPIN * dt;
        self.column.transform.rotation = Quat::from_rotation_y(self.column_angle);
        self.physics
            .set_body_transform(self.column.body, &self.column.transform);

        let previous = self.player.transform;
        let step = movement_direction(input) * PLAYER_SPEED * dt;
        self.player.transform.position += step;
        self.physics
            .set_body_transform(self.player.body, &self.player.transform);

        self.physics.update(dt);

        let touching = self.physics.in_contact(self.player.body, self.column.body);
        if touching {
            // Blocked: undo this frame's movement.
            self.player.transform = previous;
            self.physics
                .set_body_transform(self.player.body, &previous);

            if !self.in_contact {
                self.play_bump();
            }
        }
        self.in_contact = touching;
    }

    /// The per-frame draw queue, in stable order. Transient by contract.
    pub fn draw_queue(&self) -> Vec<DrawEntity> {
        vec![
            DrawEntity {
                model: self.player.kind,
                transform: self.player.transform,
            },
            DrawEntity {
                model: self.column.kind,
                transform: self.column.transform,
            },
        ]
    }

    fn play_bump(&self) {
        if let (Some(audio), Some(clip)) = (&self.audio, &self.bump_clip) {
            audio.play(clip.clone());
        }
    }
}

/// Arrow keys move the player in the view plane.
fn movement_direction(input: &InputState) -> Vec3 {
    let mut dir = Vec3::ZERO;
    if input.key_down(&Key::Named(NamedKey::ArrowLeft)) {
        dir.x -= 1.0;
    }
    if input.key_down(&Key::Named(NamedKey::ArrowRight)) {
        dir.x += 1.0;
    }
    if input.key_down(&Key::Named(NamedKey::ArrowUp)) {
        dir.y += 1.0;
    }
    if input.key_down(&Key::Named(NamedKey::ArrowDown)) {
        dir.y -= 1.0;
    }
    if dir != Vec3::ZERO {
        dir = dir.normalize();
    }
    dir
}
