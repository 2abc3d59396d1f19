use ahash::AHashMap;
use components::Gpu;
use graph::{
    BlitTarget, ExecutedPass, GraphError, PassExecutor, RasterCommand, TextureHandle,
    TextureOrigin, Textures,
};

/// Plays recorded graph commands into a wgpu command encoder.
///
/// Imported textures must be bound before execution. Transient ones are
/// allocated on first use and live as long as the executor.
pub struct WgpuExecutor<'a> {
    gpu: &'a Gpu,
    encoder: &'a mut wgpu::CommandEncoder,
    imported: AHashMap<TextureHandle, &'a wgpu::TextureView>,
    transient: AHashMap<TextureHandle, (wgpu::Texture, wgpu::TextureView)>,
}

impl<'a> WgpuExecutor<'a> {
    pub fn new(gpu: &'a Gpu, encoder: &'a mut wgpu::CommandEncoder) -> Self {
        Self {
            gpu,
            encoder,
            imported: AHashMap::new(),
            transient: AHashMap::new(),
        }
    }

    pub fn bind(&mut self, texture: TextureHandle, view: &'a wgpu::TextureView) -> &mut Self {
        self.imported.insert(texture, view);
        self
    }

    fn allocate(&mut self, textures: &Textures, texture: TextureHandle) -> Result<(), GraphError> {
        let entry = textures.get(texture)?;
        if entry.origin == TextureOrigin::Imported || self.transient.contains_key(&texture) {
            return Ok(());
        }
        let desc = &entry.desc;
        let allocated = self.gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.name),
            size: desc.size(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = allocated.create_view(&Default::default());
        self.transient.insert(texture, (allocated, view));
        Ok(())
    }
}

fn lookup_view<'v>(
    imported: &'v AHashMap<TextureHandle, &wgpu::TextureView>,
    transient: &'v AHashMap<TextureHandle, (wgpu::Texture, wgpu::TextureView)>,
    textures: &Textures,
    texture: TextureHandle,
) -> Result<&'v wgpu::TextureView, GraphError> {
    let entry = textures.get(texture)?;
    match entry.origin {
        TextureOrigin::Imported => imported.get(&texture).copied(),
        TextureOrigin::Transient => transient.get(&texture).map(|(_, view)| view),
    }
    .ok_or_else(|| GraphError::Unbound(entry.desc.name.clone()))
}

impl PassExecutor for WgpuExecutor<'_> {
    fn execute_pass(
        &mut self,
        textures: &Textures,
        pass: ExecutedPass<'_>,
    ) -> Result<(), GraphError> {
        let destination = pass.attachment.texture;
        self.allocate(textures, destination)?;
        for RasterCommand::Blit { source, .. } in &pass.commands {
            self.allocate(textures, *source)?;
        }

        let format = textures.get(destination)?.desc.format;
        let Self {
            gpu,
            encoder,
            imported,
            transient,
        } = self;
        for command in &pass.commands {
            let RasterCommand::Blit {
                source,
                scale_bias,
                material,
                technique,
                params,
            } = command;

            let source_view = lookup_view(imported, transient, textures, *source)?;
            let destination_view = lookup_view(imported, transient, textures, destination)?;
            let mut target = BlitTarget {
                device: gpu.device(),
                encoder: &mut **encoder,
                source: source_view,
                destination: destination_view,
                format,
                scale_bias: *scale_bias,
            };
            log::trace!("{}: {} technique {technique}", pass.name, material.name());
            material.encode_blit(&mut target, *technique, params);
        }
        Ok(())
    }
}
