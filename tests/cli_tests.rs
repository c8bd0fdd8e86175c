#[cfg(test)]
mod tests {
    use clap::Parser;
    use midiplay::config::Overrides;
    use midiplay::*;
    use std::path::PathBuf;

    #[cfg(feature = "test-mock")]
    #[test]
    fn test_device_list() {
        let devices = handle_device_list();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0], "Mock Device 1");
        assert_eq!(devices[1], "Mock Device 2");
    }

    #[cfg(feature = "test-mock")]
    #[test]
    fn test_valid_device_binding() {
        let devices = handle_device_list();
        assert!(validate_device("Mock Device 1", &devices).is_ok());
        assert!(validate_device("Device 2", &devices).is_ok());
    }

    #[test]
    fn test_invalid_device_lists_alternatives() {
        let devices = vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()];
        let error_msg = validate_device("Nonexistent Device", &devices).unwrap_err();
        assert!(error_msg.contains("'Nonexistent Device' not found"));
        assert!(error_msg.contains("  - Mock Device 1\n"));
        assert!(error_msg.contains("  - Mock Device 2\n"));
    }

    #[test]
    fn test_args_with_file_and_knobs() {
        let args = Args::parse_from([
            "midiplay",
            "song.mid",
            "--tempo",
            "1.5",
            "--transpose",
            "-12",
            "--mute-lead",
            "--device",
            "Synth",
        ]);
        assert_eq!(args.file, Some(PathBuf::from("song.mid")));
        assert_eq!(
            args.overrides(),
            Overrides {
                tempo: Some(1.5),
                transpose: Some(-12),
                mute_lead: Some(true),
                note_duration: None,
                device: Some("Synth".to_string()),
                channel: None,
            }
        );
    }

    #[test]
    fn test_args_without_options() {
        let args = Args::parse_from(["midiplay"]);
        assert_eq!(args.file, None);
        assert!(!args.device_list);
        assert!(!args.dump);
        assert!(!args.dry_run);
        assert!(!args.interactive);
        // An unset flag must not override a settings file
        assert_eq!(args.overrides(), Overrides::default());
    }

    #[test]
    fn test_args_modes() {
        let args = Args::parse_from(["midiplay", "--dump", "--dry-run", "--interactive", "a.mid"]);
        assert!(args.dump);
        assert!(args.dry_run);
        assert!(args.interactive);
    }

    #[test]
    fn test_args_reject_non_numeric_tempo() {
        assert!(Args::try_parse_from(["midiplay", "--tempo", "fast"]).is_err());
    }
}
