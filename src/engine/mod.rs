pub mod assets;
pub mod audio;
pub mod camera;
pub mod cli;
pub mod config;
pub mod game;
pub mod graphics;
pub mod physics;
pub mod user_input;
pub mod windowing;

use thiserror::Error;

/// Everything here is fatal: configuration errors fail fast before any GPU
/// resource exists, and resource/contract errors abort at the frame-loop
/// boundary. There is no recoverable-error path in this design.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Assets(#[from] assets::AssetError),
    #[error(transparent)]
    Mesh(#[from] assets::mesh::MeshError),
    #[error(transparent)]
    Physics(#[from] physics::PhysicsError),
    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
}

pub type EngineResult<T> = Result<T, EngineError>;
