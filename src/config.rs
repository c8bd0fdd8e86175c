// config.rs

use crate::backend::DEFAULT_NOTE_DURATION;
use crate::scheduler::PlaybackConfig;
use ::config::{Config, Environment, File};
use log::{debug, info};
use std::path::Path;
use thiserror::Error;

/// Prefix for environment overrides, e.g. `MIDIPLAY_TEMPO=1.5`
pub const ENV_PREFIX: &str = "MIDIPLAY";
/// Settings file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_NAME: &str = "midiplay";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Values given on the command line; these win over every other source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub tempo: Option<f64>,
    pub transpose: Option<i32>,
    pub mute_lead: Option<bool>,
    pub note_duration: Option<f64>,
    pub device: Option<String>,
    pub channel: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub playback: PlaybackConfig,
    /// Seconds each triggered note sounds
    pub note_duration: f64,
    /// Substring of the MIDI output port to use
    pub device: Option<String>,
    pub channel: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            note_duration: DEFAULT_NOTE_DURATION,
            device: None,
            channel: 0,
        }
    }
}

impl Settings {
    /// Layers defaults, the settings file, `MIDIPLAY_*` variables and `overrides`
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load_with_env_prefix(path, overrides, ENV_PREFIX)
    }

    pub fn load_with_env_prefix(
        path: Option<&Path>,
        overrides: &Overrides,
        env_prefix: &str,
    ) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let mut builder = Config::builder()
            .set_default("tempo", defaults.playback.tempo_multiplier)?
            .set_default("transpose", i64::from(defaults.playback.transpose_semitones))?
            .set_default("mute_lead", defaults.playback.mute_lead_track)?
            .set_default("note_duration", defaults.note_duration)?
            .set_default("channel", i64::from(defaults.channel))?;

        builder = match path {
            Some(path) => {
                info!("Loading settings from {}", path.display());
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        let config = builder
            .add_source(Environment::with_prefix(env_prefix))
            .set_override_option("tempo", overrides.tempo)?
            .set_override_option("transpose", overrides.transpose.map(i64::from))?
            .set_override_option("mute_lead", overrides.mute_lead)?
            .set_override_option("note_duration", overrides.note_duration)?
            .set_override_option("device", overrides.device.clone())?
            .set_override_option("channel", overrides.channel.map(i64::from))?
            .build()?;

        let tempo = config.get_float("tempo")?;
        if !tempo.is_finite() || tempo <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tempo must be a positive number, got {}",
                tempo
            )));
        }

        let transpose = config.get_int("transpose")?;
        let transpose = i32::try_from(transpose)
            .map_err(|_| ConfigError::Invalid(format!("transpose {} is out of range", transpose)))?;

        let note_duration = config.get_float("note_duration")?;
        if !note_duration.is_finite() || note_duration <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "note duration must be a positive number of seconds, got {}",
                note_duration
            )));
        }

        let channel = config.get_int("channel")?;
        let channel = u8::try_from(channel)
            .ok()
            .filter(|c| *c < 16)
            .ok_or_else(|| ConfigError::Invalid(format!("MIDI channel {} is not 0-15", channel)))?;

        let settings = Settings {
            playback: PlaybackConfig {
                tempo_multiplier: tempo,
                transpose_semitones: transpose,
                mute_lead_track: config.get_bool("mute_lead")?,
            },
            note_duration,
            device: config.get_string("device").ok(),
            channel,
        };

        debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let settings =
            Settings::load_with_env_prefix(None, &Overrides::default(), "MIDIPLAY_UNIT_DEFAULTS")
                .unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            tempo: Some(2.0),
            transpose: Some(-12),
            mute_lead: Some(true),
            note_duration: Some(0.25),
            device: Some("Synth".to_string()),
            channel: Some(9),
        };
        let settings =
            Settings::load_with_env_prefix(None, &overrides, "MIDIPLAY_UNIT_OVERRIDES").unwrap();
        assert_eq!(settings.playback.tempo_multiplier, 2.0);
        assert_eq!(settings.playback.transpose_semitones, -12);
        assert!(settings.playback.mute_lead_track);
        assert_eq!(settings.note_duration, 0.25);
        assert_eq!(settings.device.as_deref(), Some("Synth"));
        assert_eq!(settings.channel, 9);
    }

    #[test]
    fn test_non_positive_tempo_is_invalid() {
        let overrides = Overrides {
            tempo: Some(0.0),
            ..Overrides::default()
        };
        let result = Settings::load_with_env_prefix(None, &overrides, "MIDIPLAY_UNIT_TEMPO");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_channel_out_of_range_is_invalid() {
        let overrides = Overrides {
            channel: Some(16),
            ..Overrides::default()
        };
        let result = Settings::load_with_env_prefix(None, &overrides, "MIDIPLAY_UNIT_CHANNEL");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
