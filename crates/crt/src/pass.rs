use std::sync::Arc;

use color_eyre::Result;
use components::Registry;
use glam::Vec4;
use graph::{AccessFlags, Material, RenderGraph, TextureDesc};

use crate::{
    params::{DistortionParams, DistortionRecord, ScanlineParams, ScanlineRecord},
    renderer::{FrameResources, RenderPassEvent, ScriptablePass},
    settings::CrtSettings,
};

const SCALE_BIAS: Vec4 = Vec4::new(1., 1., 0., 0.);

/// Records the two CRT passes into the frame's render graph.
///
/// Pass `CrtDistortion` reads the camera color and writes a temporary texture,
/// pass `CrtScanlinesAndPhosphor` reads the temporary and writes the result
/// back onto the camera color.
pub struct CrtPass {
    material: Option<Arc<dyn Material>>,
    settings: Option<CrtSettings>,
    event: RenderPassEvent,
}

impl CrtPass {
    pub const NAME: &'static str = "CrtPass";
    pub const DISTORTION_PASS: &'static str = "CrtDistortion";
    pub const SCANLINE_PASS: &'static str = "CrtScanlinesAndPhosphor";
    pub const TEMP_TEXTURE: &'static str = "CrtDistortionTempTexture";

    pub fn new(material: Option<Arc<dyn Material>>) -> Self {
        Self {
            material,
            settings: None,
            event: RenderPassEvent::default(),
        }
    }

    pub fn setup(&mut self, settings: CrtSettings) {
        self.settings = Some(settings);
    }

    pub fn settings(&self) -> Option<&CrtSettings> {
        self.settings.as_ref()
    }

    pub fn has_material(&self) -> bool {
        self.material.is_some()
    }

    pub fn release_material(&mut self) {
        self.material = None;
    }

    pub fn set_render_pass_event(&mut self, event: RenderPassEvent) {
        self.event = event;
    }
}

impl ScriptablePass for CrtPass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render_pass_event(&self) -> RenderPassEvent {
        self.event
    }

    fn record_render_graph(&self, graph: &mut RenderGraph, frame: &Registry) -> Result<()> {
        let (Some(material), Some(settings)) = (&self.material, &self.settings) else {
            return Ok(());
        };

        let FrameResources {
            active_color_texture: camera_color,
            time,
        } = *frame.get::<FrameResources>()?;

        let color_desc = graph.texture_desc(camera_color)?.clone();
        let screen_resolution = color_desc.resolution();

        let temp_texture = graph.create_texture(TextureDesc {
            name: Self::TEMP_TEXTURE.into(),
            ..color_desc
        });

        let distortion = DistortionRecord {
            source: camera_color,
            destination: temp_texture,
            params: DistortionParams::new(settings, screen_resolution),
        };
        let pass_material = material.clone();
        graph
            .add_raster_pass(Self::DISTORTION_PASS, distortion)
            .use_texture(distortion.source, AccessFlags::Read)
            .set_render_attachment(distortion.destination, 0, AccessFlags::Write)
            .set_render_func(move |data: &DistortionRecord, ctx| {
                ctx.cmd.blit_texture(
                    data.source,
                    SCALE_BIAS,
                    &pass_material,
                    DistortionParams::TECHNIQUE,
                    bytemuck::bytes_of(&data.params),
                );
            });

        let scanlines = ScanlineRecord {
            source: temp_texture,
            destination: camera_color,
            params: ScanlineParams::new(settings, screen_resolution, time),
        };
        let pass_material = material.clone();
        graph
            .add_raster_pass(Self::SCANLINE_PASS, scanlines)
            .use_texture(scanlines.source, AccessFlags::Read)
            .set_render_attachment(scanlines.destination, 0, AccessFlags::Write)
            .set_render_func(move |data: &ScanlineRecord, ctx| {
                ctx.cmd.blit_texture(
                    data.source,
                    SCALE_BIAS,
                    &pass_material,
                    ScanlineParams::TECHNIQUE,
                    bytemuck::bytes_of(&data.params),
                );
            });

        Ok(())
    }
}
