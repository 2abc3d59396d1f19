use std::{fmt, sync::Arc};

use glam::Vec4;

use crate::TextureHandle;

/// Everything a material needs to encode one full-screen draw.
pub struct BlitTarget<'a> {
    pub device: &'a wgpu::Device,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub source: &'a wgpu::TextureView,
    pub destination: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub scale_bias: Vec4,
}

/// A GPU material with one shader technique per pass.
///
/// `params` is the uniform block of the invoked technique. Each technique
/// owns its own block, so encoding one never disturbs the parameters of
/// another.
pub trait Material {
    fn name(&self) -> &str;
    fn technique_count(&self) -> u32;
    fn encode_blit(&self, target: &mut BlitTarget<'_>, technique: u32, params: &[u8]);
}

#[derive(Clone)]
pub enum RasterCommand {
    Blit {
        source: TextureHandle,
        scale_bias: Vec4,
        material: Arc<dyn Material>,
        technique: u32,
        params: Vec<u8>,
    },
}

impl fmt::Debug for RasterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blit {
                source,
                scale_bias,
                material,
                technique,
                params,
            } => f
                .debug_struct("Blit")
                .field("source", source)
                .field("scale_bias", scale_bias)
                .field("material", &material.name())
                .field("technique", technique)
                .field("params", &params.len())
                .finish(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RasterCommandBuffer {
    commands: Vec<RasterCommand>,
}

impl RasterCommandBuffer {
    pub fn blit_texture(
        &mut self,
        source: TextureHandle,
        scale_bias: Vec4,
        material: &Arc<dyn Material>,
        technique: u32,
        params: &[u8],
    ) {
        self.commands.push(RasterCommand::Blit {
            source,
            scale_bias,
            material: material.clone(),
            technique,
            params: params.to_vec(),
        });
    }

    pub fn commands(&self) -> &[RasterCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<RasterCommand> {
        self.commands
    }
}

/// Handed to a pass's render function during graph execution.
#[derive(Debug, Default)]
pub struct RasterGraphContext {
    pub cmd: RasterCommandBuffer,
}
