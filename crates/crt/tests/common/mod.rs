#![allow(dead_code)]

use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use components::Registry;
use crt::{FrameResources, MaterialFactory, ShaderRef};
use glam::Vec4;
use graph::{
    BlitTarget, ExecutedPass, GraphError, Material, PassExecutor, RasterCommand, RenderGraph,
    TextureDesc, TextureHandle, Textures,
};

pub struct FakeMaterial;

impl Material for FakeMaterial {
    fn name(&self) -> &str {
        "fake-crt"
    }

    fn technique_count(&self) -> u32 {
        2
    }

    fn encode_blit(&self, _: &mut BlitTarget<'_>, _: u32, _: &[u8]) {}
}

pub struct FakeFactory;

impl MaterialFactory for FakeFactory {
    fn create_material(&self, _: &ShaderRef) -> Result<Arc<dyn Material>> {
        Ok(Arc::new(FakeMaterial))
    }
}

pub struct BrokenFactory;

impl MaterialFactory for BrokenFactory {
    fn create_material(&self, shader: &ShaderRef) -> Result<Arc<dyn Material>> {
        Err(eyre!("{shader} does not compile"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Blit {
    pub source: TextureHandle,
    pub scale_bias: Vec4,
    pub technique: u32,
    pub params: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Trace {
    pub passes: Vec<(String, TextureHandle, Vec<Blit>)>,
}

impl PassExecutor for Trace {
    fn execute_pass(&mut self, _: &Textures, pass: ExecutedPass<'_>) -> Result<(), GraphError> {
        let blits = pass
            .commands
            .into_iter()
            .map(
                |RasterCommand::Blit {
                     source,
                     scale_bias,
                     technique,
                     params,
                     ..
                 }| Blit {
                    source,
                    scale_bias,
                    technique,
                    params,
                },
            )
            .collect();
        self.passes
            .push((pass.name.to_owned(), pass.attachment.texture, blits));
        Ok(())
    }
}

pub struct Frame {
    pub graph: RenderGraph,
    pub data: Registry,
    pub color: TextureHandle,
}

pub fn frame(width: u32, height: u32, time: f32) -> Frame {
    let mut graph = RenderGraph::new();
    let color = graph.import_texture(TextureDesc::new(
        "CameraColor",
        width,
        height,
        wgpu::TextureFormat::Rgba16Float,
    ));
    let mut data = Registry::new();
    data.insert(FrameResources {
        active_color_texture: color,
        time,
    });
    Frame { graph, data, color }
}
