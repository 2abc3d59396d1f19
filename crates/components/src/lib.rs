#![allow(clippy::new_without_default)]

use std::num::NonZeroU64;

pub mod registry;

pub use registry::{Read, Registry, Resource, Write};

#[derive(Debug)]
pub struct Gpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl Gpu {
    pub fn new(adapter: wgpu::Adapter, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            adapter,
            device,
            queue,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }
}

pub trait NonZeroSized: Sized {
    const NSIZE: NonZeroU64 = {
        match NonZeroU64::new(Self::SIZE as _) {
            Some(size) => size,
            None => panic!("type is zero-sized"),
        }
    };
    const SIZE: usize = std::mem::size_of::<Self>();
}
impl<T> NonZeroSized for T where T: Sized {}
