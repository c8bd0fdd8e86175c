use clap::Parser;
use midiplay::{
    cli::{validate_device, Args},
    config::Settings,
    handle_device_list, logging,
    scheduler::schedule,
    smf,
    ui::{choose_output_port, load_file, run_interactive, wait_for_playback},
    MidirBackend, MockBackend, PlaybackController, SoundBackend,
};
use std::path::Path;

fn main() {
    initialize_logging();
    let args = Args::parse();

    if args.device_list {
        list_available_devices(&handle_device_list());
        return;
    }

    let settings = match Settings::load(args.config.as_deref(), &args.overrides()) {
        Ok(settings) => settings,
        Err(e) => exit_with_error(&e.to_string()),
    };

    if args.dump {
        let Some(path) = &args.file else {
            exit_with_error("--dump needs a MIDI file");
        };
        dump_schedule(path, &settings);
        return;
    }

    if args.dry_run {
        run_player(MockBackend::logging(), &args, &settings, false);
        return;
    }

    let devices = handle_device_list();
    let device = match &settings.device {
        Some(device_name) => {
            if let Err(error_msg) = validate_device(device_name, &devices) {
                exit_with_error(&error_msg);
            }
            Some(device_name.clone())
        }
        None if args.interactive => match choose_output_port(&devices) {
            Ok(choice) => choice,
            Err(e) => exit_with_error(&format!("Port selection failed: {}", e)),
        },
        None => None,
    };

    match MidirBackend::connect(device.as_deref(), settings.channel) {
        Ok(backend) => {
            log::info!("Successfully connected to MIDI device: {}", backend.port_name());
            println!("Successfully connected to MIDI device: {}", backend.port_name());
            run_player(backend, &args, &settings, true);
        }
        Err(e) => exit_with_error(&format!("Error connecting to MIDI device: {}", e)),
    }
}

fn initialize_logging() {
    if let Err(e) = logging::init_logger() {
        logging::init_fallback_logger();
        log::warn!("File logging unavailable ({}), logging to stderr", e);
    }
    log::info!("Application starting");
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI output devices:");
    for device in devices {
        println!("  - {}", device);
    }
}

fn dump_schedule(path: &Path, settings: &Settings) {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => exit_with_error(&format!("Cannot read {}: {}", path.display(), e)),
    };
    let score = match smf::decode(&data) {
        Ok(score) => score,
        Err(e) => exit_with_error(&format!("Cannot load {}: {}", path.display(), e)),
    };

    println!(
        "format {}, division {}, {} tracks",
        score.format,
        score.division,
        score.tracks.len()
    );
    for note in schedule(&score, &settings.playback, 0.0) {
        println!(
            "{:>10.4}s  note {:>4}  vel {:>3}",
            note.absolute_time, note.note, note.velocity
        );
    }
}

fn run_player<B: SoundBackend>(backend: B, args: &Args, settings: &Settings, wait: bool) {
    let mut player =
        PlaybackController::with_config(backend, settings.playback, settings.note_duration);

    if let Some(path) = &args.file {
        if let Err(msg) = load_file(&mut player, path) {
            exit_with_error(&msg);
        }
    }

    if args.interactive {
        if let Err(e) = run_interactive(&mut player) {
            exit_with_error(&format!("Interactive session failed: {}", e));
        }
        return;
    }

    if args.file.is_none() {
        exit_with_error("No MIDI file given (see --help)");
    }

    let count = player.play();
    println!("Playing {} notes", count);
    if wait {
        wait_for_playback(&player);
    }
    player.stop();
    log::info!("Application exiting");
}

fn exit_with_error(error_msg: &str) -> ! {
    log::error!("{}", error_msg);
    eprintln!("{}", error_msg);
    std::process::exit(1);
}
