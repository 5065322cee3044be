// ============================================================================
// SETTINGS — key=value config file with environment overrides
// ============================================================================

use std::path::PathBuf;

use crate::ops::mask::{DEFAULT_FEATHER_RADIUS, Feather};

pub const DEFAULT_API_ENDPOINT: &str = "https://openrouter.ai/api/v1/generation";
pub const DEFAULT_MODEL: &str = "google/gemini-pro-vision";
/// Environment variable that overrides `api_key` from the settings file.
pub const API_KEY_ENV: &str = "INPAINTFE_API_KEY";

/// Persistent user settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub api_endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Longest allowed edge of the images sent to the API.
    pub max_upload_dimension: u32,
    /// JPEG quality (1–100) of the uploaded source image.
    pub jpeg_quality: u8,
    pub feather_enabled: bool,
    pub feather_radius: f32,
    /// Bounds the paint layer is fitted into when an image is loaded.
    pub display_max_width: u32,
    pub display_max_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_upload_dimension: 1024,
            jpeg_quality: 90,
            feather_enabled: false,
            feather_radius: DEFAULT_FEATHER_RADIUS,
            display_max_width: 800,
            display_max_height: 600,
        }
    }
}

impl Settings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/inpaintfe/inpaintfe_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\InpaintFE\inpaintfe_settings.cfg
    /// On macOS:   ~/Library/Application Support/InpaintFE/inpaintfe_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("inpaintfe");
            return Some(config_dir.join("inpaintfe_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("InpaintFE").join("inpaintfe_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("InpaintFE")
                    .join("inpaintfe_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("inpaintfe_settings.cfg")))
        }
    }

    /// Load settings from disk, then apply environment overrides.
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        let mut s = Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .map(|content| Self::from_config_str(&content))
            .unwrap_or_default();
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            s.api_key = key.trim().to_string();
        }
        s
    }

    /// Save settings to disk, creating the config directory if needed.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::settings_path() else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    /// Parse `key=value` lines. Unknown keys, comments and malformed values
    /// are ignored, leaving the default in place.
    pub fn from_config_str(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "api_endpoint" => {
                    if !val.is_empty() {
                        s.api_endpoint = val.to_string();
                    }
                }
                "api_key" => s.api_key = val.to_string(),
                "model" => {
                    if !val.is_empty() {
                        s.model = val.to_string();
                    }
                }
                "max_upload_dimension" => {
                    s.max_upload_dimension = val.parse::<u32>().ok().filter(|&v| v > 0).unwrap_or(1024);
                }
                "jpeg_quality" => {
                    s.jpeg_quality = val.parse::<u8>().map(|q| q.clamp(1, 100)).unwrap_or(90);
                }
                "feather_enabled" => s.feather_enabled = val == "true",
                "feather_radius" => {
                    s.feather_radius = val
                        .parse::<f32>()
                        .ok()
                        .filter(|r| r.is_finite() && *r >= 0.0)
                        .unwrap_or(DEFAULT_FEATHER_RADIUS);
                }
                "display_max_width" => {
                    s.display_max_width = val.parse::<u32>().ok().filter(|&v| v > 0).unwrap_or(800);
                }
                "display_max_height" => {
                    s.display_max_height = val.parse::<u32>().ok().filter(|&v| v > 0).unwrap_or(600);
                }
                _ => {}
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "api_endpoint={}\n\
             api_key={}\n\
             model={}\n\
             max_upload_dimension={}\n\
             jpeg_quality={}\n\
             feather_enabled={}\n\
             feather_radius={}\n\
             display_max_width={}\n\
             display_max_height={}\n",
            self.api_endpoint,
            self.api_key,
            self.model,
            self.max_upload_dimension,
            self.jpeg_quality,
            self.feather_enabled,
            self.feather_radius,
            self.display_max_width,
            self.display_max_height,
        )
    }

    pub fn feather(&self) -> Feather {
        Feather::enabled(self.feather_enabled, self.feather_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_config_str(""), Settings::default());
    }

    #[test]
    fn parses_known_keys() {
        let s = Settings::from_config_str(
            "# comment\n\
             api_endpoint = https://example.test/edit\n\
             api_key=sk-123\n\
             model=acme/inpaint-xl\n\
             max_upload_dimension=2048\n\
             jpeg_quality=75\n\
             feather_enabled=true\n\
             feather_radius=4.5\n\
             display_max_width=640\n\
             display_max_height=480\n",
        );
        assert_eq!(s.api_endpoint, "https://example.test/edit");
        assert_eq!(s.api_key, "sk-123");
        assert_eq!(s.model, "acme/inpaint-xl");
        assert_eq!(s.max_upload_dimension, 2048);
        assert_eq!(s.jpeg_quality, 75);
        assert_eq!(s.feather(), Feather::Radius(4.5));
        assert_eq!((s.display_max_width, s.display_max_height), (640, 480));
    }

    #[test]
    fn malformed_values_fall_back() {
        let s = Settings::from_config_str(
            "max_upload_dimension=zero\n\
             jpeg_quality=900\n\
             feather_radius=-3\n\
             display_max_width=0\n\
             no_equals_sign\n\
             unknown_key=whatever\n",
        );
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn config_string_round_trips() {
        let s = Settings {
            api_key: "abc".into(),
            feather_enabled: true,
            feather_radius: 6.0,
            ..Settings::default()
        };
        assert_eq!(Settings::from_config_str(&s.to_config_string()), s);
    }
}
