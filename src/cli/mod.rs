use crate::config::Overrides;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// MIDI file to load
    pub file: Option<PathBuf>,

    /// List available MIDI output devices
    #[arg(long)]
    pub device_list: bool,

    /// Send notes to the output device whose name contains this text
    #[arg(long)]
    pub device: Option<String>,

    /// MIDI channel (0-15) to send notes on
    #[arg(long)]
    pub channel: Option<u8>,

    /// Playback speed multiplier, 1.0 is nominal
    #[arg(long)]
    pub tempo: Option<f64>,

    /// Semitones to shift every note by
    #[arg(long, allow_hyphen_values = true)]
    pub transpose: Option<i32>,

    /// Leave out the first track
    #[arg(long)]
    pub mute_lead: bool,

    /// Seconds each note sounds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Settings file (TOML, YAML or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the schedule instead of playing it
    #[arg(long)]
    pub dump: bool,

    /// Play without a MIDI device, logging each note
    #[arg(long)]
    pub dry_run: bool,

    /// Control playback from a menu
    #[arg(long)]
    pub interactive: bool,
}

impl Args {
    /// Command-line values that take precedence over settings files
    pub fn overrides(&self) -> Overrides {
        Overrides {
            tempo: self.tempo,
            transpose: self.transpose,
            mute_lead: self.mute_lead.then_some(true),
            note_duration: self.duration,
            device: self.device.clone(),
            channel: self.channel,
        }
    }
}

pub fn handle_device_list() -> Vec<String> {
    crate::backend::list_output_ports()
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
