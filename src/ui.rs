// ui.rs

use crate::backend::SoundBackend;
use crate::player::{PlaybackController, PlaybackState};
use crate::scheduler::PlaybackConfig;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{error, info};
use std::path::Path;
use std::thread;
use std::time::Duration;

const REFRESH_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Play,
    Stop,
    Tempo,
    Transpose,
    ToggleMuteLead,
    Load,
    Quit,
}

pub const MENU: [(MenuAction, &str); 7] = [
    (MenuAction::Play, "Play"),
    (MenuAction::Stop, "Stop"),
    (MenuAction::Tempo, "Set tempo"),
    (MenuAction::Transpose, "Set transpose"),
    (MenuAction::ToggleMuteLead, "Toggle lead track mute"),
    (MenuAction::Load, "Load file"),
    (MenuAction::Quit, "Quit"),
];

/// One-line summary of the player shown above the menu
pub fn status_line(state: PlaybackState, config: &PlaybackConfig, tracks: usize) -> String {
    format!(
        "{:?} | {} tracks | tempo x{} | transpose {:+} | lead {}",
        state,
        tracks,
        config.tempo_multiplier,
        config.transpose_semitones,
        if config.mute_lead_track { "muted" } else { "on" }
    )
}

/// Progress bar counting milliseconds of playback
pub fn create_playback_progress(total_secs: f64) -> ProgressBar {
    let total_ms = (total_secs.max(0.0) * 1000.0) as u64;
    let pb = ProgressBar::with_draw_target(Some(total_ms), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan}] {elapsed_precise} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("⣀⣤⣦⣶⣷⣿ "),
    );
    pb.set_prefix("Playing");
    pb
}

/// Blocks until the last scheduled note has ended, showing progress
pub fn wait_for_playback<B: SoundBackend>(player: &PlaybackController<B>) {
    let Some(end) = player.playback_end() else {
        return;
    };
    let start = player.backend().current_time();
    let pb = create_playback_progress(end - start);

    loop {
        let now = player.backend().current_time();
        if now >= end {
            break;
        }
        pb.set_position(((now - start).max(0.0) * 1000.0) as u64);
        thread::sleep(REFRESH_INTERVAL);
    }
    pb.finish_with_message("done");
}

/// Reads a whole MIDI file from disk and hands it to the player
pub fn load_file<B: SoundBackend>(
    player: &mut PlaybackController<B>,
    path: &Path,
) -> Result<(), String> {
    let data = std::fs::read(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    player
        .load_bytes(&data)
        .map_err(|e| format!("Cannot load {}: {}", path.display(), e))
}

/// Lets the user pick an output port when there is more than one
pub fn choose_output_port(ports: &[String]) -> Result<Option<String>, dialoguer::Error> {
    match ports {
        [] => Ok(None),
        [only] => Ok(Some(only.clone())),
        _ => {
            let index = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("MIDI output port")
                .items(ports)
                .default(0)
                .interact()?;
            Ok(ports.get(index).cloned())
        }
    }
}

/// Menu loop driving the player until the user quits
pub fn run_interactive<B: SoundBackend>(
    player: &mut PlaybackController<B>,
) -> Result<(), dialoguer::Error> {
    let theme = ColorfulTheme::default();
    let labels: Vec<&str> = MENU.iter().map(|(_, label)| *label).collect();

    loop {
        let prompt = status_line(player.state(), player.config(), player.score().tracks.len());
        let index = Select::with_theme(&theme)
            .with_prompt(prompt)
            .items(&labels[..])
            .default(0)
            .interact()?;
        let Some((action, _)) = MENU.get(index) else {
            continue;
        };
        info!("Menu action: {:?}", action);

        match action {
            MenuAction::Play => {
                let count = player.play();
                if player.is_playing() {
                    eprintln!("Playing {} notes", count);
                }
            }
            MenuAction::Stop => player.stop(),
            MenuAction::Tempo => {
                let tempo: f64 = Input::with_theme(&theme)
                    .with_prompt("Tempo multiplier")
                    .default(player.config().tempo_multiplier)
                    .interact_text()?;
                if let Err(e) = player.set_tempo(tempo) {
                    error!("{}", e);
                    eprintln!("{}", e);
                }
            }
            MenuAction::Transpose => {
                let semitones: i32 = Input::with_theme(&theme)
                    .with_prompt("Transpose (semitones)")
                    .default(player.config().transpose_semitones)
                    .interact_text()?;
                player.set_transpose(semitones);
            }
            MenuAction::ToggleMuteLead => {
                let mute = !player.config().mute_lead_track;
                player.set_mute_lead(mute);
            }
            MenuAction::Load => {
                let path: String = Input::with_theme(&theme)
                    .with_prompt("MIDI file")
                    .interact_text()?;
                if let Err(msg) = load_file(player, Path::new(path.trim())) {
                    eprintln!("{}", msg);
                }
            }
            MenuAction::Quit => {
                player.stop();
                return Ok(());
            }
        }
    }
}
