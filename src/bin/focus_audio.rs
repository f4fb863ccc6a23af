use clap::{Args as ClapArgs, Parser, Subcommand};
use crossbeam::channel::{bounded, RecvTimeoutError};
use focus_audio::config::{EngineConfig, CONFIG};
use focus_audio::dsp::NoiseSource;
use focus_audio::render::render_to_wav;
use focus_audio::{catalog, AmbientEngine, Synth, VoiceId};
use std::time::Duration;

/// Procedural focus audio player
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available voices
    List(ListArgs),
    /// Play a voice on the output device
    Play(PlayArgs),
    /// Render a voice to a WAV file
    Render(RenderArgs),
    /// Print the names of the output devices
    Devices,
    /// Generate a default config file and exit
    GenerateConfig(ConfigArgs),
}

#[derive(ClapArgs)]
struct ListArgs {
    /// Print the catalog as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(ClapArgs)]
struct PlayArgs {
    /// Voice id (see `list`); defaults to the configured voice
    #[arg(long)]
    voice: Option<VoiceId>,
    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long, value_parser = parse_seconds)]
    seconds: Option<f64>,
}

#[derive(ClapArgs)]
struct RenderArgs {
    #[arg(long)]
    voice: VoiceId,
    #[arg(long, value_parser = parse_seconds)]
    seconds: f64,
    /// Output WAV path, relative to the configured output directory
    #[arg(long)]
    out: String,
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,
    /// Seed the noise source for a reproducible render
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(ClapArgs)]
struct ConfigArgs {
    /// Output path for the generated configuration
    #[arg(long, default_value = "config.toml")]
    out: String,
}

/// A finite, positive duration that fits a `Duration`.
fn parse_seconds(s: &str) -> Result<f64, String> {
    let secs: f64 = s.trim().parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("expected a positive number of seconds, got `{s}`"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())?;
    Ok(secs)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::List(args) => list_command(args)?,
        Commands::Play(args) => play_command(args)?,
        Commands::Render(args) => render_command(args)?,
        Commands::Devices => {
            for name in focus_audio::audio_io::list_output_devices()? {
                println!("{name}");
            }
        }
        Commands::GenerateConfig(cfg) => {
            EngineConfig::generate_default(&cfg.out)?;
            println!("Generated default config at {}", cfg.out);
        }
    }
    Ok(())
}

fn list_command(args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let menu = catalog();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&menu)?);
        return Ok(());
    }
    for info in menu {
        println!(
            "{:<13} {:<17} {:<15} {}",
            info.id, info.name, info.description, info.accent
        );
    }
    Ok(())
}

fn play_command(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = CONFIG.clone();
    let voice = args.voice.unwrap_or(config.default_voice);
    let mut engine = AmbientEngine::new(config);
    if !engine.start(voice) {
        return Err("could not open an audio output stream".into());
    }

    let (tx, rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })?;

    match args.seconds {
        Some(secs) => {
            println!("Playing {} for {secs}s... press Ctrl+C to stop", voice.info().name);
            let limit = Duration::try_from_secs_f64(secs)?;
            if let Err(RecvTimeoutError::Disconnected) = rx.recv_timeout(limit) {
                log::warn!("Ctrl+C handler went away");
            }
        }
        None => {
            println!("Playing {}... press Ctrl+C to stop", voice.info().name);
            rx.recv()?;
        }
    }

    let frames = engine.frames_rendered();
    engine.stop();
    println!("Stopped after {frames} frames");
    Ok(())
}

fn render_command(args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = &*CONFIG;
    let noise = args
        .seed
        .map_or_else(NoiseSource::from_entropy, NoiseSource::seeded);
    let mut synth = Synth::with_noise(args.voice, args.sample_rate, config, noise);
    let out_path = config.resolve_output(&args.out);
    let frames = render_to_wav(&mut synth, args.seconds, &out_path)?;
    println!("Rendered {frames} frames to {}", out_path.display());
    Ok(())
}
