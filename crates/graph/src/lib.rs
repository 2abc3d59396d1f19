//! Per-frame render graph.
//!
//! Passes are declared in order with their texture accesses, then executed in
//! the same order once the frame is fully recorded. Render functions only
//! record commands; a [`PassExecutor`] turns them into GPU work.

use std::{any::Any, fmt};

use thiserror::Error;

mod command;
mod resource;

pub use command::{BlitTarget, Material, RasterCommand, RasterCommandBuffer, RasterGraphContext};
pub use resource::{
    AccessFlags, TextureDesc, TextureEntry, TextureHandle, TextureOrigin, Textures,
};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("texture handle {0:?} does not belong to this graph")]
    UnknownTexture(TextureHandle),
    #[error("pass `{pass}` reads `{texture}` before any pass wrote it")]
    ReadBeforeWrite { pass: String, texture: String },
    #[error("pass `{pass}` has no render attachment")]
    MissingAttachment { pass: String },
    #[error("pass `{pass}` reads and writes `{texture}`")]
    FeedbackLoop { pass: String, texture: String },
    #[error("pass `{pass}` uses technique {technique} of `{material}` which has {count}")]
    TechniqueOutOfRange {
        pass: String,
        material: String,
        technique: u32,
        count: u32,
    },
    #[error("imported texture `{0}` has no backing view")]
    Unbound(String),
}

type RenderFunc = Box<dyn Fn(&dyn Any, &mut RasterGraphContext)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub texture: TextureHandle,
    pub index: u32,
    pub access: AccessFlags,
}

pub struct PassNode {
    name: String,
    uses: Vec<(TextureHandle, AccessFlags)>,
    attachments: Vec<Attachment>,
    data: Box<dyn Any>,
    render_func: Option<RenderFunc>,
}

impl PassNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reads(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        let used = self
            .uses
            .iter()
            .filter(|(_, access)| access.reads())
            .map(|&(texture, _)| texture);
        let loaded = self
            .attachments
            .iter()
            .filter(|a| a.access.reads())
            .map(|a| a.texture);
        used.chain(loaded)
    }

    pub fn writes(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        let used = self
            .uses
            .iter()
            .filter(|(_, access)| access.writes())
            .map(|&(texture, _)| texture);
        let stored = self
            .attachments
            .iter()
            .filter(|a| a.access.writes())
            .map(|a| a.texture);
        used.chain(stored)
    }

    pub fn color_attachment(&self) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.index == 0)
    }

    /// Parameter snapshot the pass was declared with.
    pub fn data<D: 'static>(&self) -> Option<&D> {
        self.data.downcast_ref()
    }

    pub fn has_render_func(&self) -> bool {
        self.render_func.is_some()
    }
}

impl fmt::Debug for PassNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassNode")
            .field("name", &self.name)
            .field("uses", &self.uses)
            .field("attachments", &self.attachments)
            .field("has_render_func", &self.render_func.is_some())
            .finish()
    }
}

pub struct RasterPassBuilder<'a, D> {
    node: &'a mut PassNode,
    _data: std::marker::PhantomData<D>,
}

impl<'a, D: 'static> RasterPassBuilder<'a, D> {
    pub fn use_texture(&mut self, texture: TextureHandle, access: AccessFlags) -> &mut Self {
        self.node.uses.push((texture, access));
        self
    }

    pub fn set_render_attachment(
        &mut self,
        texture: TextureHandle,
        index: u32,
        access: AccessFlags,
    ) -> &mut Self {
        self.node.attachments.retain(|a| a.index != index);
        self.node.attachments.push(Attachment {
            texture,
            index,
            access,
        });
        self
    }

    pub fn set_render_func<F>(&mut self, func: F) -> &mut Self
    where
        F: Fn(&D, &mut RasterGraphContext) + 'static,
    {
        self.node.render_func = Some(Box::new(move |data, ctx| {
            if let Some(data) = data.downcast_ref::<D>() {
                func(data, ctx)
            }
        }));
        self
    }
}

/// Executed pass handed to the backend along with the commands it recorded.
#[derive(Debug)]
pub struct ExecutedPass<'a> {
    pub name: &'a str,
    pub attachment: Attachment,
    pub commands: Vec<RasterCommand>,
}

pub trait PassExecutor {
    fn execute_pass(
        &mut self,
        textures: &Textures,
        pass: ExecutedPass<'_>,
    ) -> Result<(), GraphError>;
}

#[derive(Debug, Default)]
pub struct RenderGraph {
    textures: Textures,
    passes: Vec<PassNode>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn import_texture(&mut self, desc: TextureDesc) -> TextureHandle {
        self.textures.push(desc, TextureOrigin::Imported)
    }

    pub fn create_texture(&mut self, desc: TextureDesc) -> TextureHandle {
        log::debug!("Graph: transient texture `{}` {}x{}", desc.name, desc.width, desc.height);
        self.textures.push(desc, TextureOrigin::Transient)
    }

    pub fn texture_desc(&self, texture: TextureHandle) -> Result<&TextureDesc, GraphError> {
        self.textures.get(texture).map(|entry| &entry.desc)
    }

    pub fn textures(&self) -> &Textures {
        &self.textures
    }

    pub fn add_raster_pass<D: 'static>(
        &mut self,
        name: impl Into<String>,
        data: D,
    ) -> RasterPassBuilder<'_, D> {
        self.passes.push(PassNode {
            name: name.into(),
            uses: Vec::new(),
            attachments: Vec::new(),
            data: Box::new(data),
            render_func: None,
        });
        let last = self.passes.len() - 1;
        RasterPassBuilder {
            node: &mut self.passes[last],
            _data: std::marker::PhantomData,
        }
    }

    pub fn passes(&self) -> &[PassNode] {
        &self.passes
    }

    pub fn pass(&self, name: &str) -> Option<&PassNode> {
        self.passes.iter().find(|pass| pass.name == name)
    }

    /// Checks that every read is satisfied by an import or an earlier write.
    pub fn compile(&self) -> Result<(), GraphError> {
        let mut written: Vec<bool> = self
            .textures
            .iter()
            .map(|(_, entry)| entry.origin == TextureOrigin::Imported)
            .collect();

        for pass in &self.passes {
            let Some(attachment) = pass.color_attachment() else {
                return Err(GraphError::MissingAttachment {
                    pass: pass.name.clone(),
                });
            };
            for texture in pass.reads() {
                let entry = self.textures.get(texture)?;
                if !written[texture.index()] {
                    return Err(GraphError::ReadBeforeWrite {
                        pass: pass.name.clone(),
                        texture: entry.desc.name.clone(),
                    });
                }
                if texture == attachment.texture && attachment.access == AccessFlags::Write {
                    return Err(GraphError::FeedbackLoop {
                        pass: pass.name.clone(),
                        texture: entry.desc.name.clone(),
                    });
                }
            }
            for texture in pass.writes() {
                self.textures.get(texture)?;
                written[texture.index()] = true;
            }
        }
        Ok(())
    }

    /// Runs every pass in declaration order and consumes the frame's graph.
    pub fn execute(self, executor: &mut impl PassExecutor) -> Result<(), GraphError> {
        self.compile()?;

        for pass in &self.passes {
            let Some(render_func) = &pass.render_func else {
                log::warn!("Graph: pass `{}` has no render function, culled", pass.name);
                continue;
            };
            let Some(&attachment) = pass.color_attachment() else {
                continue;
            };

            let mut ctx = RasterGraphContext::default();
            render_func(pass.data.as_ref(), &mut ctx);
            let commands = ctx.cmd.into_commands();

            for command in &commands {
                let RasterCommand::Blit {
                    material,
                    technique,
                    source,
                    ..
                } = command;
                self.textures.get(*source)?;
                if *technique >= material.technique_count() {
                    return Err(GraphError::TechniqueOutOfRange {
                        pass: pass.name.clone(),
                        material: material.name().to_owned(),
                        technique: *technique,
                        count: material.technique_count(),
                    });
                }
            }

            executor.execute_pass(
                &self.textures,
                ExecutedPass {
                    name: &pass.name,
                    attachment,
                    commands,
                },
            )?;
        }
        Ok(())
    }
}
