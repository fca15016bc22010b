mod cli;

use ismforge::{config, ingest, pipeline, storage::LocalContainer, subtitles};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use ismforge_common::formats::MediaFormat;
use ismforge_media::{extract_media, MediaInfo};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "ismforge=trace,ismforge_media=debug,ismforge_common=debug".to_string()
        } else {
            "ismforge=info,ismforge_media=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            container,
            name,
            output,
            overwrite,
            single_threaded,
            threads,
        } => {
            let mut config = config::load_config_or_default(cli.config.as_deref())?;

            // CLI flags take precedence over the config file
            if let Some(container) = container {
                config.storage.container = container;
            }
            if name.is_some() {
                config.manifest.name = name;
            }
            if output.is_some() {
                config.manifest.output_dir = output;
            }
            if overwrite {
                config.manifest.overwrite = true;
            }
            if single_threaded {
                config.processing.multithreading = false;
            }
            if threads.is_some() {
                config.processing.worker_threads = threads;
            }
            config::validate_config(&config)?;

            generate(&config)
        }
        Commands::Probe { file, json } => probe_file(&file, json),
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("ismforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn generate(config: &config::Config) -> Result<()> {
    if !config.storage.container.is_dir() {
        anyhow::bail!(
            "Container directory does not exist: {:?}",
            config.storage.container
        );
    }

    let summary = pipeline::run(config)?;
    print!("{}", summary);
    Ok(())
}

/// Split a file path into its directory container and blob name.
fn as_blob(file: &Path) -> Result<(LocalContainer, String)> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file name: {:?}", file))?
        .to_string();
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((LocalContainer::new(dir), name))
}

fn probe_file(file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let (container, name) = as_blob(file)?;
    let format = MediaFormat::from_name(&name)
        .with_context(|| format!("Unsupported file type: {}", name))?;

    if format.is_text() {
        let data = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
        let info = subtitles::probe_subtitle(&name, &data)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            println!("File: {}", info.name);
            println!("Start: {:.3}s", info.start.as_secs_f64());
            println!("Duration: {:.3}s", info.duration.as_secs_f64());
            println!("Bitrate: {} bps", info.bit_rate);
            if let Some(ref lang) = info.language {
                println!("Language: {}", lang);
            }
        }
        return Ok(());
    }

    let segments = ingest::fetch_media_segments(&container, &name)?;
    let info = extract_media(&segments.moov, &segments.moofs, &name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_media_info(&name, format, segments.moofs.len(), &info);
    }

    Ok(())
}

fn print_media_info(name: &str, format: MediaFormat, fragments: usize, info: &MediaInfo) {
    println!("File: {}", name);
    println!("Format: {}", format);
    if fragments > 0 {
        println!("Fragments: {}", fragments);
    }
    let secs = info.duration.seconds();
    println!(
        "Duration: {:02}:{:02}:{:06.3}",
        (secs / 3600.0) as u64,
        (secs / 60.0) as u64 % 60,
        secs % 60.0
    );

    println!("\nTracks: {}", info.tracks.len());
    for track in &info.tracks {
        print!(
            "  [{}] {} {} {} bps, {} chunks",
            track.track_id,
            track.track_type,
            track.four_cc,
            track.bit_rate,
            track.chunks.len()
        );
        if let (Some(w), Some(h)) = (track.width, track.height) {
            print!(", {}x{}", w, h);
        }
        if let Some(channels) = track.channels {
            print!(", {}ch", channels);
        }
        if let Some(rate) = track.sampling_rate {
            print!(" @ {} Hz", rate);
        }
        if let Some(ref lang) = track.language {
            print!(" ({})", lang);
        }
        println!();
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_config(&config::Config::default());
        }
    }

    Ok(())
}

fn print_config(config: &config::Config) {
    println!("  Container: {:?}", config.storage.container);
    println!("  Output: {:?}", config.output_dir());
    println!("  Multithreading: {}", config.processing.multithreading);
    println!("  Worker threads: {}", config.processing.threads());
    match &config.manifest.name {
        Some(name) => println!("  Manifest name: {}", name),
        None => println!("  Manifest name: (from first file)"),
    }
    println!("  Overwrite: {}", config.manifest.overwrite);
}
