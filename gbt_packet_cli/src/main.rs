use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use libgbt_packet::config::Config;
use libgbt_packet::diagnostic::Diagnosis;
use libgbt_packet::error::ConfigError;
use libgbt_packet::process::{process, CaseOutcome};
use libgbt_packet::status::CaseStatus;

fn make_template_config(path: &Path) -> Result<(), ConfigError> {
    Config::default().write_config_file(path)
}

fn main() {
    // Create a cli
    let matches = Command::new("gbt_packet_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the config file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    if let Err(e) = LogWrapper::new(pb_manager.clone(), logger).try_init() {
        eprintln!("Could not create logging/progress: {e}");
        return;
    }

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            log::error!("A config path is required");
            return;
        }
    };

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        match make_template_config(&config_path) {
            Ok(()) => log::info!("Done."),
            Err(e) => log::error!("{e}"),
        }
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Mode: {:?}", config.mode);
    log::info!("Packet Path: {}", config.packet_dir.to_string_lossy());
    log::info!("Append Sentinel: {}", config.append_sentinel);
    log::info!("Number of Cases: {}", config.cases.len());

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    let (tx, rx) = mpsc::channel::<CaseStatus>();
    // Spawn the task!
    let handle = std::thread::spawn(move || process(config, tx));

    // The channel closes once the task is done with its sender
    for status in rx.iter() {
        pb.set_position((status.progress * 100.0) as u64);
    }

    match handle.join() {
        Ok(result) => match result {
            Ok(outcomes) => {
                let mut flagged = 0;
                for (idx, outcome) in outcomes.iter().enumerate() {
                    log::info!("Case {idx}: {outcome}");
                    match outcome {
                        CaseOutcome::Checked(report) if !report.matched => flagged += 1,
                        CaseOutcome::Diagnosed(diagnosis)
                            if *diagnosis != Diagnosis::NoInvestigationNeeded =>
                        {
                            flagged += 1
                        }
                        _ => (),
                    }
                }
                if flagged > 0 {
                    log::warn!("{flagged} of {} cases need attention", outcomes.len());
                } else {
                    log::info!("Successfully ran all cases!");
                }
            }
            Err(e) => log::error!("Processing failed with error: {e}"),
        },
        Err(_) => log::error!("Failed to join processing task!"),
    }

    pb.finish();

    log::info!("Done.");
}
