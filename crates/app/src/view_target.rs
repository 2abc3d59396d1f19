use graph::TextureDesc;

/// The camera color target the scene renders into and the CRT filter
/// rewrites in place.
pub struct ViewTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ViewTarget {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
    pub const NAME: &'static str = "CameraColor";

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(Self::NAME),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        Self { texture, view }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// How the target is imported into the frame's render graph.
    pub fn desc(&self) -> TextureDesc {
        TextureDesc::new(
            Self::NAME,
            self.texture.width(),
            self.texture.height(),
            Self::FORMAT,
        )
    }
}
