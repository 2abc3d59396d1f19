//! wgpu backend for the CRT filter and the demo application around it.

pub mod app;
mod blitter;
pub mod config;
mod executor;
mod material;
mod scene;
mod view_target;

pub use app::App;
pub use blitter::Blitter;
pub use executor::WgpuExecutor;
pub use material::{CrtMaterial, CrtMaterialFactory};
pub use scene::TestPattern;
pub use view_target::ViewTarget;
