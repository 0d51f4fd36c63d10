use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use emote_core::audio::DEFAULT_AUDIO_DIR;
use emote_core::{compute_color, dominant_label, Background, CueTable, ExpressionVector};
use std::path::PathBuf;

mod replay;

#[derive(Parser)]
#[command(name = "emote", about = "Emote expression feedback tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the gradient color for an expression vector
    Color {
        /// JSON object, e.g. '{"happy": 0.9, "sad": 0.05}'
        vector: String,
    },
    /// Print the dominant expression label of a vector
    Label {
        /// JSON object, e.g. '{"happy": 0.9, "sad": 0.05}'
        vector: String,
    },
    /// List the audio cue bound to each label
    Cues {
        #[arg(long, default_value = DEFAULT_AUDIO_DIR)]
        audio_dir: PathBuf,
    },
    /// Replay an expression script through the feedback pipeline (no audio)
    Replay {
        /// JSON-lines expression script
        script: PathBuf,
        /// Stop after this many frames
        #[arg(short, long)]
        frames: Option<usize>,
        #[arg(long, default_value = DEFAULT_AUDIO_DIR)]
        audio_dir: PathBuf,
    },
}

fn parse_vector(json: &str) -> Result<ExpressionVector> {
    serde_json::from_str(json).context("expression vector must be a JSON object of label → probability")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Color { vector } => {
            let v = parse_vector(&vector)?;
            let color = compute_color(&v);
            println!("{color}");
            println!("{}", Background::Gradient(color));
        }
        Commands::Label { vector } => {
            let v = parse_vector(&vector)?;
            println!("{}", dominant_label(&v));
        }
        Commands::Cues { audio_dir } => {
            for (label, path) in CueTable::new(audio_dir).entries() {
                let status = if path.is_file() { "" } else { " (missing)" };
                println!("{label:<10} {}{status}", path.display());
            }
        }
        Commands::Replay {
            script,
            frames,
            audio_dir,
        } => {
            let text = std::fs::read_to_string(&script)
                .with_context(|| format!("cannot read {}", script.display()))?;
            let mut parsed = emote_media::parse_script(&text)?;
            if let Some(limit) = frames {
                parsed.truncate(limit);
            }
            tracing::debug!(frames = parsed.len(), "replaying script");

            for line in replay::replay(&parsed, CueTable::new(audio_dir)) {
                println!("{line}");
            }
        }
    }

    Ok(())
}
