use std::{fmt, path::PathBuf, sync::Arc};

use color_eyre::Result;
use graph::Material;

use crate::{
    pass::CrtPass,
    renderer::{RenderPassEvent, Renderer},
    settings::{CrtSettings, SettingsProvider},
};

/// Where the CRT shader comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderRef {
    /// WGSL shipped with the backend.
    Builtin,
    File(PathBuf),
}

impl fmt::Display for ShaderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("builtin shader"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub trait MaterialFactory {
    fn create_material(&self, shader: &ShaderRef) -> Result<Arc<dyn Material>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSettings {
    pub shader: Option<ShaderRef>,
    pub render_pass_event: RenderPassEvent,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            shader: Some(ShaderRef::Builtin),
            render_pass_event: RenderPassEvent::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Enqueued,
    /// No settings on the stack, or every pass flag is off.
    Inactive,
    MissingMaterial,
}

/// Owns the CRT material and decides every frame whether [`CrtPass`] runs.
pub struct CrtFeature<P> {
    settings: FeatureSettings,
    provider: P,
    material: Option<Arc<dyn Material>>,
    pass: Option<CrtPass>,
    missing_material_reported: bool,
}

impl<P: SettingsProvider> CrtFeature<P> {
    pub fn new(settings: FeatureSettings, provider: P) -> Self {
        Self {
            settings,
            provider,
            material: None,
            pass: None,
            missing_material_reported: false,
        }
    }

    pub fn create(&mut self, factory: &dyn MaterialFactory) {
        self.material = match &self.settings.shader {
            Some(shader) => match factory.create_material(shader) {
                Ok(material) => Some(material),
                Err(err) => {
                    log::error!("CrtFeature: failed to create material from {shader}: {err:#}");
                    None
                }
            },
            None => None,
        };
        self.pass = Some(CrtPass::new(self.material.clone()));
        self.missing_material_reported = false;
    }

    pub fn add_render_passes<'a>(&'a mut self, renderer: &mut Renderer<'a>) -> Enqueue {
        if self.material.is_none() || self.pass.is_none() {
            if !self.missing_material_reported {
                log::error!(
                    "CrtFeature: Missing material. CrtPass will not execute. \
                     Check the shader reference of the feature."
                );
                self.missing_material_reported = true;
            }
            return Enqueue::MissingMaterial;
        }

        let Some(settings) = self.provider.current().filter(CrtSettings::is_active) else {
            return Enqueue::Inactive;
        };

        let event = self.settings.render_pass_event;
        let Some(pass) = self.pass.as_mut() else {
            return Enqueue::MissingMaterial;
        };
        pass.setup(settings);
        pass.set_render_pass_event(event);
        renderer.enqueue_pass(&*pass);
        Enqueue::Enqueued
    }

    pub fn dispose(&mut self) {
        self.material = None;
        if let Some(pass) = &mut self.pass {
            pass.release_material();
        }
    }

    pub fn material(&self) -> Option<&Arc<dyn Material>> {
        self.material.as_ref()
    }

    pub fn pass(&self) -> Option<&CrtPass> {
        self.pass.as_ref()
    }

    pub fn settings(&self) -> &FeatureSettings {
        &self.settings
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}
