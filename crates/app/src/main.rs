//! Spinel - Main Entry Point
//!
//! Opens a window, builds the Vulkan renderer, and drives the redraw loop
//! that keeps the textured quad spinning until the window is closed.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use spinel_core::Timer;
use spinel_platform::Window;
use spinel_renderer::Renderer;

/// Immutable application configuration resolved in `main`.
struct AppConfig {
    /// Initial window width in pixels.
    width: u32,
    /// Initial window height in pixels.
    height: u32,
    /// Window title.
    title: &'static str,
    /// Directory containing the `shaders/` and `textures/` asset folders.
    asset_root: PathBuf,
}

impl AppConfig {
    /// Builds the default configuration, taking an optional asset-root path
    /// from the first command-line argument.
    fn from_args() -> Self {
        let asset_root = std::env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("assets"));

        Self {
            width: 800,
            height: 600,
            title: "Vulkan",
            asset_root,
        }
    }
}

struct App {
    config: AppConfig,
    window: Option<Window>,
    renderer: Option<Renderer>,
    timer: Timer,
    /// First fatal error seen in the loop; turned into the process exit code.
    failure: Option<String>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            renderer: None,
            timer: Timer::new(),
            failure: None,
        }
    }

    /// Records a fatal error and stops the event loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, message: String) {
        error!("{}", message);
        if self.failure.is_none() {
            self.failure = Some(message);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = match Window::new(
                event_loop,
                self.config.width,
                self.config.height,
                self.config.title,
            ) {
                Ok(window) => window,
                Err(e) => {
                    self.fail(event_loop, format!("Failed to create window: {}", e));
                    return;
                }
            };

            match Renderer::new(&window, &self.config.asset_root) {
                Ok(renderer) => {
                    info!("Initialization complete, entering main loop");
                    self.renderer = Some(renderer);
                    self.window = Some(window);
                }
                Err(e) => {
                    self.fail(event_loop, format!("Failed to create renderer: {}", e));
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                info!("Window resized to {}x{}", size.width, size.height);
                if let Some(ref mut window) = self.window {
                    window.resize(size.width, size.height);
                }
                if let Some(ref mut renderer) = self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let elapsed = self.timer.elapsed_secs();

                let result = match self.renderer {
                    Some(ref mut renderer) => renderer.render_frame(elapsed),
                    None => Ok(()),
                };
                if let Err(e) = result {
                    self.fail(event_loop, format!("Render error: {}", e));
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    spinel_core::init_logging();
    info!("Starting Spinel");

    let config = AppConfig::from_args();
    info!("Asset root: {}", config.asset_root.display());

    // Create event loop
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    // Create app and run
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    // The renderer tears down (waiting for device idle) when `app` drops;
    // any failure recorded during the loop becomes a non-zero exit code.
    if let Some(message) = app.failure.take() {
        return Err(anyhow!(message));
    }

    info!("Shut down cleanly");
    Ok(())
}
