//! CRT effect settings as stored on the volume stack.
//!
//! Every numeric parameter carries a fixed range. Writes outside of it are
//! clamped to the nearest bound, both through the setters and when settings
//! are deserialized.

use components::Registry;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedF32 {
    value: f32,
    min: f32,
    max: f32,
}

impl ClampedF32 {
    pub fn new(value: f32, min: f32, max: f32) -> Self {
        let mut this = Self {
            value: min,
            min,
            max,
        };
        this.set(value);
        this
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }
}

/// Documented range of one tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub name: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

macro_rules! crt_settings {
    (
        flags { $($flag:ident),* $(,)? }
        params {
            $($param:ident, $setter:ident = $default:literal in $min:literal ..= $max:literal;)*
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        #[serde(from = "SettingsFile", into = "SettingsFile")]
        pub struct CrtSettings {
            $(pub $flag: bool,)*
            $($param: ClampedF32,)*
        }

        impl Default for CrtSettings {
            fn default() -> Self {
                Self {
                    $($flag: true,)*
                    $($param: ClampedF32::new($default, $min, $max),)*
                }
            }
        }

        impl CrtSettings {
            pub const PARAM_RANGES: &'static [ParamRange] = &[
                $(ParamRange {
                    name: stringify!($param),
                    default: $default,
                    min: $min,
                    max: $max,
                },)*
            ];

            $(
                pub fn $param(&self) -> f32 {
                    self.$param.value()
                }

                pub fn $setter(&mut self, value: f32) {
                    self.$param.set(value);
                }
            )*
        }

        #[derive(Debug, Default, Serialize, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        struct SettingsFile {
            $($flag: Option<bool>,)*
            $($param: Option<f32>,)*
        }

        impl From<SettingsFile> for CrtSettings {
            fn from(file: SettingsFile) -> Self {
                let mut settings = Self::default();
                $(if let Some(flag) = file.$flag {
                    settings.$flag = flag;
                })*
                $(if let Some(value) = file.$param {
                    settings.$setter(value);
                })*
                settings
            }
        }

        impl From<CrtSettings> for SettingsFile {
            fn from(settings: CrtSettings) -> Self {
                Self {
                    $($flag: Some(settings.$flag),)*
                    $($param: Some(settings.$param()),)*
                }
            }
        }
    };
}

crt_settings! {
    flags {
        enable_distortion,
        enable_scanlines_and_phosphor,
        enable_chromatic_aberration,
        enable_bloom,
        enable_noise_and_flicker,
        enable_vsync_glitch,
    }
    params {
        distortion_strength, set_distortion_strength = 0.1 in 0.0..=0.5;
        scanline_density, set_scanline_density = 400.0 in 0.0..=1000.0;
        scanline_strength, set_scanline_strength = 0.5 in 0.0..=1.0;
        phosphor_strength, set_phosphor_strength = 0.1 in 0.0..=1.0;
        chromatic_aberration_strength, set_chromatic_aberration_strength = 10.0 in 0.0..=50.0;
        bloom_strength, set_bloom_strength = 0.1 in 0.0..=1.0;
        noise_strength, set_noise_strength = 0.05 in 0.0..=0.2;
        flicker_strength, set_flicker_strength = 0.08 in 0.0..=0.5;
        vsync_glitch_strength, set_vsync_glitch_strength = 20.0 in 0.0..=100.0;
        vsync_glitch_speed, set_vsync_glitch_speed = 1.0 in 0.0..=5.0;
        vsync_glitch_bar_height, set_vsync_glitch_bar_height = 0.1 in 0.01..=0.5;
    }
}

impl CrtSettings {
    /// Every flag off. Parameters keep their defaults.
    pub fn disabled() -> Self {
        Self {
            enable_distortion: false,
            enable_scanlines_and_phosphor: false,
            enable_chromatic_aberration: false,
            enable_bloom: false,
            enable_noise_and_flicker: false,
            enable_vsync_glitch: false,
            ..Self::default()
        }
    }

    pub fn distortion_pass_active(&self) -> bool {
        self.enable_distortion || self.enable_chromatic_aberration
    }

    pub fn scanline_pass_active(&self) -> bool {
        self.enable_scanlines_and_phosphor || self.enable_bloom || self.enable_vsync_glitch
    }

    /// Noise and flicker alone never activate the effect.
    pub fn is_active(&self) -> bool {
        self.distortion_pass_active() || self.scanline_pass_active()
    }

    pub fn is_tile_compatible(&self) -> bool {
        false
    }

    pub fn param_ranges() -> &'static [ParamRange] {
        Self::PARAM_RANGES
    }
}

/// Source of the settings that apply to the current frame.
pub trait SettingsProvider {
    fn current(&self) -> Option<CrtSettings>;
}

impl SettingsProvider for Registry {
    fn current(&self) -> Option<CrtSettings> {
        self.get::<CrtSettings>().ok().map(|settings| *settings)
    }
}

impl<T: SettingsProvider> SettingsProvider for RefCell<T> {
    fn current(&self) -> Option<CrtSettings> {
        self.try_borrow().ok()?.current()
    }
}

impl<T: SettingsProvider> SettingsProvider for Rc<T> {
    fn current(&self) -> Option<CrtSettings> {
        self.as_ref().current()
    }
}
