//! CRT emulation filter for a render-graph based pipeline.
//!
//! ```text
//!   CrtFeature::add_render_passes (every frame)
//!          │ settings from the volume stack, if active
//!          ▼
//!   Renderer queue ──▶ CrtPass::record_render_graph
//!                             │
//!                             ├─▶ CrtDistortion          camera color ─▶ temp
//!                             └─▶ CrtScanlinesAndPhosphor temp ─▶ camera color
//! ```
//!
//! The graph executes both passes later, in declaration order. Each pass
//! carries its own parameter snapshot and uniform block, so nothing staged
//! for one pass can leak into the other.

pub mod feature;
pub mod params;
pub mod pass;
pub mod renderer;
pub mod settings;

pub use feature::{CrtFeature, Enqueue, FeatureSettings, MaterialFactory, ShaderRef};
pub use params::{DistortionParams, DistortionRecord, ScanlineParams, ScanlineRecord};
pub use pass::CrtPass;
pub use renderer::{FrameResources, RenderPassEvent, Renderer, ScriptablePass};
pub use settings::{ClampedF32, CrtSettings, ParamRange, SettingsProvider};
