use glam::{vec4, Vec4};

use crate::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl TextureDesc {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
        }
    }

    pub fn size(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    /// `(width, height, 0, 0)`, the layout shaders expect for `_ScreenResolution`.
    pub fn resolution(&self) -> Vec4 {
        vec4(self.width as f32, self.height as f32, 0., 0.)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessFlags {
    Read,
    Write,
    ReadWrite,
}

impl AccessFlags {
    pub fn reads(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn writes(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureOrigin {
    /// Owned outside the graph, e.g. the camera color target.
    Imported,
    /// Allocated by the executor for the current frame only.
    Transient,
}

#[derive(Debug, Clone)]
pub struct TextureEntry {
    pub desc: TextureDesc,
    pub origin: TextureOrigin,
}

#[derive(Debug, Default)]
pub struct Textures {
    entries: Vec<TextureEntry>,
}

impl Textures {
    pub(crate) fn push(&mut self, desc: TextureDesc, origin: TextureOrigin) -> TextureHandle {
        let handle = TextureHandle(self.entries.len() as u32);
        self.entries.push(TextureEntry { desc, origin });
        handle
    }

    pub fn get(&self, handle: TextureHandle) -> Result<&TextureEntry, GraphError> {
        self.entries
            .get(handle.index())
            .ok_or(GraphError::UnknownTexture(handle))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureHandle, &TextureEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (TextureHandle(i as u32), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
