use std::{fmt, str::FromStr};

use color_eyre::{eyre::eyre, Result};
use components::Registry;
use graph::{RenderGraph, TextureHandle};

/// Frame-scoped data the host publishes before passes record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameResources {
    pub active_color_texture: TextureHandle,
    /// Seconds since startup, drives the animated effects.
    pub time: f32,
}

/// Pipeline stage a pass is inserted at. Passes record in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RenderPassEvent {
    BeforeRendering,
    BeforeRenderingOpaques,
    AfterRenderingOpaques,
    BeforeRenderingTransparents,
    AfterRenderingTransparents,
    #[default]
    BeforeRenderingPostProcessing,
    AfterRenderingPostProcessing,
    AfterRendering,
}

impl RenderPassEvent {
    pub const ALL: [Self; 8] = [
        Self::BeforeRendering,
        Self::BeforeRenderingOpaques,
        Self::AfterRenderingOpaques,
        Self::BeforeRenderingTransparents,
        Self::AfterRenderingTransparents,
        Self::BeforeRenderingPostProcessing,
        Self::AfterRenderingPostProcessing,
        Self::AfterRendering,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeRendering => "before-rendering",
            Self::BeforeRenderingOpaques => "before-rendering-opaques",
            Self::AfterRenderingOpaques => "after-rendering-opaques",
            Self::BeforeRenderingTransparents => "before-rendering-transparents",
            Self::AfterRenderingTransparents => "after-rendering-transparents",
            Self::BeforeRenderingPostProcessing => "before-rendering-post-processing",
            Self::AfterRenderingPostProcessing => "after-rendering-post-processing",
            Self::AfterRendering => "after-rendering",
        }
    }
}

impl fmt::Display for RenderPassEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderPassEvent {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| eyre!("Unknown render pass event `{s}`"))
    }
}

pub trait ScriptablePass {
    fn name(&self) -> &str;

    fn render_pass_event(&self) -> RenderPassEvent;

    fn record_render_graph(&self, graph: &mut RenderGraph, frame: &Registry) -> Result<()>;
}

/// Passes enqueued for a single frame.
#[derive(Default)]
pub struct Renderer<'a> {
    queue: Vec<&'a dyn ScriptablePass>,
}

impl<'a> Renderer<'a> {
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    pub fn enqueue_pass(&mut self, pass: &'a dyn ScriptablePass) {
        self.queue.push(pass);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Records every queued pass, ordered by event and then by enqueue order.
    ///
    /// A pass that fails to record is logged and skipped so the rest of the
    /// frame still renders.
    pub fn record(&mut self, graph: &mut RenderGraph, frame: &Registry) {
        self.queue.sort_by_key(|pass| pass.render_pass_event());
        for pass in &self.queue {
            let declared = graph.passes().len();
            if let Err(err) = pass.record_render_graph(graph, frame) {
                log::error!("{}: failed to record render graph: {err:#}", pass.name());
                continue;
            }
            log::debug!(
                "{} at {}: declared {} passes",
                pass.name(),
                pass.render_pass_event(),
                graph.passes().len() - declared
            );
        }
    }
}
