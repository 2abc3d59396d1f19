//! Per-pass uniform blocks and the records the graph carries for each pass.
//!
//! A disabled effect contributes zero strength; shape parameters (density,
//! speed, bar height) pass through unchanged.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use graph::TextureHandle;

use crate::settings::CrtSettings;

fn gated(enabled: bool, value: f32) -> f32 {
    if enabled {
        value
    } else {
        0.
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DistortionParams {
    pub screen_resolution: Vec4,
    pub distortion_strength: f32,
    pub chromatic_aberration_strength: f32,
    _padding: [f32; 2],
}

impl DistortionParams {
    pub const TECHNIQUE: u32 = 0;

    pub fn new(settings: &CrtSettings, screen_resolution: Vec4) -> Self {
        Self {
            screen_resolution,
            distortion_strength: gated(settings.enable_distortion, settings.distortion_strength()),
            chromatic_aberration_strength: gated(
                settings.enable_chromatic_aberration,
                settings.chromatic_aberration_strength(),
            ),
            _padding: [0.; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ScanlineParams {
    pub screen_resolution: Vec4,
    pub scanline_density: f32,
    pub scanline_strength: f32,
    pub phosphor_strength: f32,
    pub bloom_strength: f32,
    pub noise_strength: f32,
    pub flicker_strength: f32,
    pub vsync_glitch_strength: f32,
    pub vsync_glitch_speed: f32,
    pub vsync_glitch_bar_height: f32,
    pub time: f32,
    _padding: [f32; 2],
}

impl ScanlineParams {
    pub const TECHNIQUE: u32 = 1;

    pub fn new(settings: &CrtSettings, screen_resolution: Vec4, time: f32) -> Self {
        let scanlines = settings.enable_scanlines_and_phosphor;
        let noise = settings.enable_noise_and_flicker;
        Self {
            screen_resolution,
            scanline_density: settings.scanline_density(),
            scanline_strength: gated(scanlines, settings.scanline_strength()),
            phosphor_strength: gated(scanlines, settings.phosphor_strength()),
            bloom_strength: gated(settings.enable_bloom, settings.bloom_strength()),
            noise_strength: gated(noise, settings.noise_strength()),
            flicker_strength: gated(noise, settings.flicker_strength()),
            vsync_glitch_strength: gated(
                settings.enable_vsync_glitch,
                settings.vsync_glitch_strength(),
            ),
            vsync_glitch_speed: settings.vsync_glitch_speed(),
            vsync_glitch_bar_height: settings.vsync_glitch_bar_height(),
            time,
            _padding: [0.; 2],
        }
    }
}

/// Snapshot consumed by the distortion pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionRecord {
    pub source: TextureHandle,
    pub destination: TextureHandle,
    pub params: DistortionParams,
}

/// Snapshot consumed by the scanline pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanlineRecord {
    pub source: TextureHandle,
    pub destination: TextureHandle,
    pub params: ScanlineParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec4;

    #[test]
    fn uniform_blocks_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<DistortionParams>() % 16, 0);
        assert_eq!(std::mem::size_of::<ScanlineParams>() % 16, 0);
        assert_eq!(std::mem::size_of::<ScanlineParams>(), 64);
    }

    #[test]
    fn disabled_effects_have_zero_strength() {
        let mut settings = CrtSettings::default();
        settings.enable_bloom = false;
        settings.enable_noise_and_flicker = false;
        let params = ScanlineParams::new(&settings, vec4(640., 480., 0., 0.), 2.0);

        assert_eq!(params.bloom_strength, 0.);
        assert_eq!(params.noise_strength, 0.);
        assert_eq!(params.flicker_strength, 0.);
        assert_eq!(params.scanline_strength, 0.5);
        assert_eq!(params.vsync_glitch_strength, 20.0);
        assert_eq!(params.time, 2.0);
    }
}
