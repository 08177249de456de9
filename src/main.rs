mod engine;

use std::process::ExitCode;

use engine::EngineResult;
use engine::assets::{ModelLibrary, sound};
use engine::audio::Audio;
use engine::cli::Cli;
use engine::config::EngineConfig;
use engine::game::Game;
use engine::graphics::{Renderer, convert_model};
use engine::physics::Physics;
use engine::user_input::UserInput;
use engine::windowing::Windowing;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> EngineResult<()> {
    let cli = Cli::parse();
    let mut config = EngineConfig::load(cli.config_path.as_deref())?;
    if let Some(asset_root) = cli.asset_root {
        config.asset_root = asset_root;
    }

    // Load and convert everything before touching the GPU: degenerate
    // meshes and bad material ids must fail here, not mid-upload.
    let library = ModelLibrary::load(&config.asset_root)?;
    let mut renderables = Vec::with_capacity(library.meshes().len());
    for mesh in library.meshes() {
        renderables.push(convert_model(mesh, config.dot_target, config.sampler_seed)?);
    }

    let physics = Physics::new(library.meshes())?;

    // Sound is optional: no device or no clip just means a silent demo.
    let audio = match Audio::start() {
        Ok(audio) => Some(audio),
        Err(e) => {
            log::warn!("audio disabled: {e}");
            None
        }
    };
    let bump_clip = load_bump_clip(&config);

    let game = Game::new(physics, audio, bump_clip);
    let renderer = Renderer::new(renderables, library.palette().to_vec(), config.viewport);
    let user_input = UserInput::new();

    Windowing::run_app(game, renderer, user_input, config.viewport)?;
    Ok(())
}

fn load_bump_clip(config: &EngineConfig) -> Option<sound::SoundData> {
    for name in ["bump.wav", "bump.ogg"] {
        let path = config.audio_dir().join(name);
        if !path.exists() {
            continue;
        }
        match sound::load_clip(&path) {
            Ok(clip) => return Some(clip),
            Err(e) => log::warn!("could not decode {}: {e}", path.display()),
        }
    }
    log::info!("no bump clip found under {}", config.audio_dir().display());
    None
}
