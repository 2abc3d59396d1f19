use std::path::PathBuf;

use app::{app::AppOptions, config, App};
use clap::Parser;
use color_eyre::Result;
use crt::{CrtSettings, FeatureSettings, RenderPassEvent, ShaderRef};
use log::warn;
use wgpu::SurfaceError;
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::ControlFlow,
};

/// Renders a test pattern through the CRT filter.
///
/// Keys 1-6 toggle distortion, scanlines, chromatic aberration, bloom,
/// noise and vsync glitch. R reloads the settings file, S recompiles the
/// shader.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML file with CRT settings.
    #[arg(long, env = "CRTFX_SETTINGS")]
    settings: Option<PathBuf>,
    /// WGSL source replacing the builtin CRT shader.
    #[arg(long)]
    shader: Option<PathBuf>,
    /// Pipeline stage the filter is injected at.
    ///
    /// Only orders the filter against other queued passes. The test pattern is
    /// drawn before any queued pass, so every stage sees the finished scene.
    #[arg(long, default_value_t = RenderPassEvent::default())]
    event: RenderPassEvent,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::builder()
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .filter_module("wgpu_hal", log::LevelFilter::Warn)
        .filter_module("winit", log::LevelFilter::Warn)
        .filter_module("naga", log::LevelFilter::Error)
        .init();

    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => config::load_settings(path)?,
        None => CrtSettings::default(),
    };
    let options = AppOptions {
        feature: FeatureSettings {
            shader: Some(args.shader.map_or(ShaderRef::Builtin, ShaderRef::File)),
            render_pass_event: args.event,
        },
        settings,
        settings_path: args.settings,
    };

    let event_loop = winit::event_loop::EventLoop::new();
    let window = winit::window::WindowBuilder::new()
        .with_title("crtfx")
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)?;

    let mut app = App::new(&window, options)?;
    let info = app.info();
    log::info!("{} ({:?}, {:?})", info.name, info.backend, info.device_type);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::MainEventsCleared => window.request_redraw(),
            Event::RedrawRequested(_) => {
                if let Err(err) = app.render() {
                    match err {
                        SurfaceError::Lost | SurfaceError::Outdated => {
                            warn!("render: Outdated Surface");
                            app.reconfigure();
                            window.request_redraw();
                        }
                        SurfaceError::OutOfMemory => *control_flow = ControlFlow::Exit,
                        SurfaceError::Timeout => warn!("Surface Timeout"),
                    }
                }
            }
            Event::WindowEvent {
                event:
                    WindowEvent::Resized(PhysicalSize { width, height })
                    | WindowEvent::ScaleFactorChanged {
                        new_inner_size: &mut PhysicalSize { width, height },
                        ..
                    },
                ..
            } => {
                if width != 0 && height != 0 {
                    app.resize(width, height);
                }
            }
            Event::WindowEvent {
                event:
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                virtual_keycode: Some(VirtualKeyCode::Escape),
                                ..
                            },
                        ..
                    },
                ..
            } => *control_flow = ControlFlow::Exit,
            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                virtual_keycode: Some(key),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    },
                ..
            } => match key {
                VirtualKeyCode::Key1 => app.toggle_effect(1),
                VirtualKeyCode::Key2 => app.toggle_effect(2),
                VirtualKeyCode::Key3 => app.toggle_effect(3),
                VirtualKeyCode::Key4 => app.toggle_effect(4),
                VirtualKeyCode::Key5 => app.toggle_effect(5),
                VirtualKeyCode::Key6 => app.toggle_effect(6),
                VirtualKeyCode::R => {
                    if let Err(err) = app.reload_settings() {
                        log::error!("{err:#}");
                    }
                }
                VirtualKeyCode::S => app.reload_shader(),
                _ => {}
            },
            _ => {}
        }
    })
}
