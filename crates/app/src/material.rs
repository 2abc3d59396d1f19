use std::{borrow::Cow, cell::RefCell, path::Path, sync::Arc};

use ahash::AHashMap;
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use components::Gpu;
use crt::{MaterialFactory, ShaderRef};
use glam::Vec4;
use graph::{BlitTarget, Material};
use pollster::FutureExt;
use wgpu::util::DeviceExt;

/// Largest parameter block a technique accepts.
const PARAMS_SIZE: usize = 64;
/// Scale/bias vector followed by the technique parameters, bound at slot 2.
const BLOCK_SIZE: usize = 16 + PARAMS_SIZE;

const TECHNIQUES: [&str; 2] = ["fs_distortion", "fs_scanlines"];

/// The CRT shader compiled into one render pipeline per technique and target
/// format.
pub struct CrtMaterial {
    name: String,
    shader: wgpu::ShaderModule,
    layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: RefCell<AHashMap<(u32, wgpu::TextureFormat), wgpu::RenderPipeline>>,
    sampler: wgpu::Sampler,
}

impl CrtMaterial {
    pub fn new(device: &wgpu::Device, name: impl Into<String>, source: &str) -> Self {
        let name = name.into();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("CRT Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("CRT Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("CRT Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("CRT Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            name,
            shader,
            layout,
            pipeline_layout,
            pipelines: RefCell::new(AHashMap::new()),
            sampler,
        }
    }

    /// Builds the pipelines of every technique for `format` ahead of the first
    /// frame, so shader errors surface while the material is created.
    pub fn warm_up(&self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        let mut pipelines = self.pipelines.borrow_mut();
        for technique in 0..TECHNIQUES.len() as u32 {
            pipelines
                .entry((technique, format))
                .or_insert_with(|| self.create_pipeline(device, technique, format));
        }
    }

    fn create_pipeline(
        &self,
        device: &wgpu::Device,
        technique: u32,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        log::debug!("{}: pipeline for technique {technique} as {format:?}", self.name);
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(TECHNIQUES[technique as usize]),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: TECHNIQUES[technique as usize],
                targets: &[Some(format.into())],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }
}

impl Material for CrtMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn technique_count(&self) -> u32 {
        TECHNIQUES.len() as u32
    }

    fn encode_blit(&self, target: &mut BlitTarget<'_>, technique: u32, params: &[u8]) {
        if params.len() > PARAMS_SIZE {
            log::warn!(
                "{}: technique {technique} got {} bytes of parameters, truncated to {PARAMS_SIZE}",
                self.name,
                params.len()
            );
        }
        let block = uniform_block(target.scale_bias, params);

        let uniform = target
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("CRT Params"),
                contents: &block,
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = target.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("CRT Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(target.source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
        });

        let mut pipelines = self.pipelines.borrow_mut();
        let pipeline = pipelines
            .entry((technique, target.format))
            .or_insert_with(|| self.create_pipeline(target.device, technique, target.format));

        let mut render_pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(TECHNIQUES[technique as usize]),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.destination,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: true,
                },
            })],
            depth_stencil_attachment: None,
        });
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

fn uniform_block(scale_bias: Vec4, params: &[u8]) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block[..16].copy_from_slice(bytemuck::bytes_of(&scale_bias));
    let len = params.len().min(PARAMS_SIZE);
    block[16..16 + len].copy_from_slice(&params[..len]);
    block
}

/// Compiles [`CrtMaterial`]s against the device of the running app.
pub struct CrtMaterialFactory {
    gpu: Arc<Gpu>,
    target_format: wgpu::TextureFormat,
}

impl CrtMaterialFactory {
    pub fn new(gpu: Arc<Gpu>, target_format: wgpu::TextureFormat) -> Self {
        Self { gpu, target_format }
    }

    fn read_source(shader: &ShaderRef) -> Result<Cow<'static, str>> {
        match shader {
            ShaderRef::Builtin => Ok(Cow::Borrowed(include_str!("crt.wgsl"))),
            ShaderRef::File(path) => read_shader_file(path).map(Cow::Owned),
        }
    }
}

fn read_shader_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read shader at {}", path.display()))
}

impl MaterialFactory for CrtMaterialFactory {
    fn create_material(&self, shader: &ShaderRef) -> Result<Arc<dyn Material>> {
        let source = Self::read_source(shader)?;
        let device = self.gpu.device();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let material = CrtMaterial::new(device, format!("CrtMaterial({shader})"), &source);
        material.warm_up(device, self.target_format);
        if let Some(err) = device.pop_error_scope().block_on() {
            return Err(eyre!("{shader} failed to compile: {err}"));
        }

        log::info!("Created {}", material.name());
        Ok(Arc::new(material))
    }
}

#[cfg(test)]
mod tests {
    use glam::vec4;

    use super::*;

    #[test]
    fn block_starts_with_scale_bias() {
        let params = [7u8; 32];
        let block = uniform_block(vec4(0.5, 2., 0.25, 0.), &params);

        let scale_bias: [f32; 4] = bytemuck::pod_read_unaligned(&block[..16]);
        assert_eq!(scale_bias, [0.5, 2., 0.25, 0.]);
        assert_eq!(&block[16..48], &params);
        assert!(block[48..].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn oversized_params_are_truncated() {
        let params = [1u8; 100];
        let block = uniform_block(Vec4::ONE, &params);
        assert_eq!(block.len(), BLOCK_SIZE);
        assert!(block[16..].iter().all(|&byte| byte == 1));
    }
}
