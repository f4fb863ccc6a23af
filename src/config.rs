use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::VoiceId;

/// Time base for the voice LFOs and the kick overlay.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BeatClock {
    /// Seconds since the Unix epoch at stream start, advanced by the sample count.
    /// Independent sessions land on the same beat grid.
    #[default]
    Wall,
    /// Zero at stream start.
    Session,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BeatConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bpm")]
    pub bpm: f32,
    #[serde(default = "default_beat_level")]
    pub level: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_master_gain")]
    pub master_gain: f32,
    #[serde(default = "default_buffer_frames")]
    pub buffer_frames: u32,
    #[serde(default)]
    pub default_voice: VoiceId,
    /// Output device name; the host default when unset.
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub beat_clock: BeatClock,
    #[serde(default)]
    pub beat: BeatConfig,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_true() -> bool {
    true
}

fn default_bpm() -> f32 {
    120.0
}

fn default_beat_level() -> f32 {
    0.4
}

fn default_master_gain() -> f32 {
    0.5
}

fn default_buffer_frames() -> u32 {
    4096
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bpm: default_bpm(),
            level: default_beat_level(),
        }
    }
}

impl BeatConfig {
    /// Seconds between kicks. Non-positive tempos fall back to 120 bpm.
    pub fn interval(&self) -> f64 {
        let bpm = if self.bpm.is_finite() && self.bpm > 0.0 {
            self.bpm
        } else {
            default_bpm()
        };
        60.0 / bpm as f64
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            master_gain: default_master_gain(),
            buffer_frames: default_buffer_frames(),
            default_voice: VoiceId::default(),
            device: None,
            output_dir: default_output_dir(),
            beat_clock: BeatClock::default(),
            beat: BeatConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(txt: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(txt)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&txt)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the default configuration to `path`.
    pub fn generate_default<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let txt = Self::default().to_toml_string()?;
        std::fs::write(path, txt).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve a render target against `output_dir` unless it is absolute.
    pub fn resolve_output<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.output_dir.join(path)
        }
    }
}

fn config_path() -> PathBuf {
    std::env::var_os("FOCUS_AUDIO_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

pub static CONFIG: Lazy<EngineConfig> = Lazy::new(|| {
    let path = config_path();
    if !path.exists() {
        return EngineConfig::default();
    }
    match EngineConfig::load(&path) {
        Ok(cfg) => {
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            log::warn!("Ignoring config {}: {e}", path.display());
            EngineConfig::default()
        }
    }
});
