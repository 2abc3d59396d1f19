use std::{cell::RefCell, path::PathBuf, rc::Rc, sync::Arc, time::Instant};

use color_eyre::{eyre::ContextCompat, Result};
use components::{Gpu, Registry};
use crt::{CrtFeature, CrtSettings, Enqueue, FeatureSettings, FrameResources, Renderer};
use graph::RenderGraph;
use pollster::FutureExt;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{config, Blitter, CrtMaterialFactory, TestPattern, ViewTarget, WgpuExecutor};

/// The volume stack shared between the app and the feature reading it.
pub type Volumes = Rc<RefCell<Registry>>;

pub struct AppOptions {
    pub feature: FeatureSettings,
    pub settings: CrtSettings,
    /// Reloaded on [`App::reload_settings`].
    pub settings_path: Option<PathBuf>,
}

pub struct App {
    pub gpu: Arc<Gpu>,
    pub surface: wgpu::Surface,
    pub surface_config: wgpu::SurfaceConfiguration,
    view_target: ViewTarget,
    blitter: Blitter,
    pattern: TestPattern,

    volumes: Volumes,
    feature: CrtFeature<Volumes>,
    factory: CrtMaterialFactory,
    settings_path: Option<PathBuf>,

    start: Instant,
}

impl App {
    pub fn new(window: &Window, options: AppOptions) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(&window) }?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .block_on()
            .context("Failed to create Adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    features: wgpu::Features::empty(),
                    limits: adapter.limits(),
                },
                None,
            )
            .block_on()?;
        let gpu = Arc::new(Gpu::new(adapter, device, queue));

        let PhysicalSize { width, height } = window.inner_size();
        let formats = surface.get_capabilities(gpu.adapter()).formats;
        let format = preferred_framebuffer_format(&formats).context("Surface reports no formats")?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
        };
        surface.configure(gpu.device(), &surface_config);

        let volumes = {
            let mut volumes = Registry::new();
            volumes.insert(options.settings);
            Rc::new(RefCell::new(volumes))
        };
        let factory = CrtMaterialFactory::new(gpu.clone(), ViewTarget::FORMAT);
        let mut feature = CrtFeature::new(options.feature, volumes.clone());
        feature.create(&factory);

        Ok(Self {
            view_target: ViewTarget::new(gpu.device(), width, height),
            blitter: Blitter::new(gpu.device()),
            pattern: TestPattern::new(gpu.device(), ViewTarget::FORMAT),
            gpu,
            surface,
            surface_config,

            volumes,
            feature,
            factory,
            settings_path: options.settings_path,

            start: Instant::now(),
        })
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let target = self.surface.get_current_texture()?;
        let target_view = target.texture.create_view(&Default::default());
        let descriptor = wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        };
        let mut encoder = self.gpu.device().create_command_encoder(&descriptor);

        let time = self.start.elapsed().as_secs_f32();
        let color_desc = self.view_target.desc();
        // Drawn outside the graph, ahead of every render pass event.
        self.pattern.render(
            self.gpu.queue(),
            &mut encoder,
            self.view_target.view(),
            [color_desc.width as f32, color_desc.height as f32],
            time,
        );

        let mut graph = RenderGraph::new();
        let color = graph.import_texture(color_desc);
        let mut frame = Registry::new();
        frame.insert(FrameResources {
            active_color_texture: color,
            time,
        });

        {
            let mut renderer = Renderer::new();
            if self.feature.add_render_passes(&mut renderer) == Enqueue::Enqueued {
                log::trace!("CRT filter enqueued");
            }
            renderer.record(&mut graph, &frame);
        }

        {
            let mut executor = WgpuExecutor::new(&self.gpu, &mut encoder);
            executor.bind(color, self.view_target.view());
            if let Err(err) = graph.execute(&mut executor) {
                log::error!("Render graph failed: {err}");
            }
        }

        self.blitter.blit_to_texture(
            &mut encoder,
            self.gpu.device(),
            self.view_target.view(),
            &target_view,
            self.surface_config.format,
        );

        self.gpu.queue().submit(Some(encoder.finish()));
        target.present();

        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(self.gpu.device(), &self.surface_config);
        self.view_target = ViewTarget::new(self.gpu.device(), width, height);
    }

    pub fn reconfigure(&self) {
        self.surface.configure(self.gpu.device(), &self.surface_config);
    }

    /// Flips one effect flag, numbered 1 to 6 in declaration order.
    pub fn toggle_effect(&self, index: usize) {
        let volumes = self.volumes.borrow();
        let Ok(mut settings) = volumes.get_mut::<CrtSettings>() else {
            log::warn!("No CRT settings on the volume stack");
            return;
        };
        let (name, flag) = match index {
            1 => ("distortion", &mut settings.enable_distortion),
            2 => ("scanlines and phosphor", &mut settings.enable_scanlines_and_phosphor),
            3 => ("chromatic aberration", &mut settings.enable_chromatic_aberration),
            4 => ("bloom", &mut settings.enable_bloom),
            5 => ("noise and flicker", &mut settings.enable_noise_and_flicker),
            6 => ("vsync glitch", &mut settings.enable_vsync_glitch),
            _ => return,
        };
        *flag = !*flag;
        log::info!("CRT {name}: {}", if *flag { "on" } else { "off" });
    }

    pub fn reload_settings(&self) -> Result<()> {
        let path = self
            .settings_path
            .as_ref()
            .context("No settings file to reload")?;
        let settings = config::load_settings(path)?;

        let mut volumes = self.volumes.borrow_mut();
        let replaced = match volumes.get_mut::<CrtSettings>() {
            Ok(mut current) => {
                *current = settings;
                true
            }
            Err(_) => false,
        };
        if !replaced {
            volumes.insert(settings);
        }
        log::info!("Reloaded CRT settings from {}", path.display());
        Ok(())
    }

    /// Releases the material and compiles the shader again.
    pub fn reload_shader(&mut self) {
        self.feature.dispose();
        self.feature.create(&self.factory);
    }

    pub fn volumes(&self) -> &Volumes {
        &self.volumes
    }

    pub fn info(&self) -> wgpu::AdapterInfo {
        self.gpu.adapter().get_info()
    }
}

fn preferred_framebuffer_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| {
            matches!(
                format,
                wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Bgra8Unorm
            )
        })
        .or_else(|| formats.first().copied())
}
