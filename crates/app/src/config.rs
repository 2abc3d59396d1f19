use std::path::Path;

use color_eyre::{eyre::WrapErr, Result};
use crt::CrtSettings;

/// Reads CRT settings from a TOML file. Missing keys keep their defaults and
/// out-of-range values are clamped.
pub fn load_settings(path: impl AsRef<Path>) -> Result<CrtSettings> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read settings at {}", path.display()))?;
    let settings = toml::from_str(&text)
        .wrap_err_with(|| format!("Failed to parse settings at {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings(path: impl AsRef<Path>, settings: &CrtSettings) -> Result<()> {
    let path = path.as_ref();
    let text = toml::to_string_pretty(settings)?;
    std::fs::write(path, text)
        .wrap_err_with(|| format!("Failed to write settings to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults_and_clamps() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "enable_bloom = false\nscanline_density = 5000.0\nnoise_strength = -1.0"
        )
        .unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert!(!settings.enable_bloom);
        assert!(settings.enable_distortion);
        assert_eq!(settings.scanline_density(), 1000.);
        assert_eq!(settings.noise_strength(), 0.);
        assert_eq!(
            settings.distortion_strength(),
            CrtSettings::default().distortion_strength()
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scanline_dencity = 10.0").unwrap();
        assert!(load_settings(file.path()).is_err());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crt.toml");
        let mut settings = CrtSettings::disabled();
        settings.set_vsync_glitch_bar_height(0.3);

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_settings("/nonexistent/crt.toml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/crt.toml"));
    }
}
