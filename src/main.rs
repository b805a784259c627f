use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use softraster::prelude::*;

/// Interactive viewer for the software rasterizer.
///
/// Drag with the left button to orbit, the right or middle button to pan,
/// scroll to zoom. `R` resets the view, `1`-`5` toggle wireframe, shading,
/// depth test, face normals and vertex normals. Drop an `.obj` file to load
/// a model, any other file to load a texture.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML viewer configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OBJ model to open; a cube is shown otherwise.
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Texture bound to every mesh.
    #[arg(short, long)]
    texture: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width.max(1);
    }
    if let Some(height) = args.height {
        config.height = height.max(1);
    }

    let mut window = Window::new("softraster", config.width, config.height, config.byte_order)?;
    let mut engine = Engine::from_config(&config);

    match &args.model {
        Some(path) => {
            engine.load_model(path)?;
        }
        None => {
            engine.add_mesh(Mesh::cube());
        }
    }
    if let Some(path) = &args.texture {
        // A broken texture leaves the meshes untextured; keep running.
        let _ = engine.load_texture(path);
    }

    let mut limiter = FrameLimiter::new(&window);
    let mut is_running = true;
    info!("viewer started at {}x{}", config.width, config.height);

    while is_running {
        for event in window.poll_events() {
            match event {
                WindowEvent::Quit => is_running = false,
                WindowEvent::Input(input) => {
                    engine.handle_event(&input);
                }
                WindowEvent::LoadModel(path) => {
                    if engine.load_model(&path).is_ok() {
                        engine.camera_mut().reset_view();
                    }
                }
                WindowEvent::LoadTexture(path) => {
                    let _ = engine.load_texture(&path);
                }
            }
        }

        let dt = limiter.wait_and_get_delta(&window);
        engine.tick(dt);
        engine.render();
        if let Err(e) = window.present(engine.frame()) {
            error!("present failed: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}
