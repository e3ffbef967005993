//! Face analysis command-line tool.
//!
//! Loads the detection and age/gender models once, analyzes a single
//! image from disk, writes the annotated result and prints the per-face
//! attributes.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use visage_vision::{codec, FaceAnalysisConfig, FaceAnalyzer, ImageEncoding};

#[derive(Parser, Debug)]
#[command(name = "visage-cli", about = "Detect faces and estimate age/gender in an image")]
struct Args {
    /// Input image path (png/jpg/jpeg)
    #[arg(long)]
    image: PathBuf,

    /// Face detection model path
    #[arg(long, env = "VISAGE_DETECTOR_MODEL")]
    detector_model: Option<PathBuf>,

    /// Age/gender estimation model path
    #[arg(long, env = "VISAGE_GENDERAGE_MODEL")]
    genderage_model: Option<PathBuf>,

    /// Minimum detection confidence
    #[arg(long)]
    score_threshold: Option<f32>,

    /// Where to write the annotated image
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the annotated image as a PNG data URI
    #[arg(long)]
    data_uri: bool,

    /// Also draw facial landmark dots
    #[arg(long)]
    landmarks: bool,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("ort=warn".parse().expect("static directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let file_name = args
        .image
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !codec::is_allowed_extension(file_name) {
        bail!("unsupported image extension: {file_name}");
    }

    let mut config = FaceAnalysisConfig::from_env();
    if let Some(path) = args.detector_model {
        config.detector_model = path;
    }
    if let Some(path) = args.genderage_model {
        config.genderage_model = path;
    }
    if let Some(threshold) = args.score_threshold {
        config.score_threshold = threshold;
    }

    let analyzer = FaceAnalyzer::from_config(&config)
        .context("loading models")?
        .with_landmarks(args.landmarks);

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;
    let frame = codec::decode_frame(&bytes).context("decoding image")?;

    info!(
        path = %args.image.display(),
        width = frame.width(),
        height = frame.height(),
        "analyzing image"
    );

    let report = analyzer.analyze(&frame).context("analyzing image")?;

    if report.face_count() == 0 {
        println!("No faces detected.");
    }
    for (index, (gender, age)) in report.genders.iter().zip(&report.ages).enumerate() {
        println!("Face {}: Gender: {}, Age: {:.0}", index + 1, gender, age);
    }

    if let Some(output) = &args.output {
        report
            .annotated
            .save(output)
            .with_context(|| format!("writing {}", output.display()))?;
        info!(path = %output.display(), "annotated image written");
    }

    if args.data_uri {
        println!(
            "{}",
            codec::encode_data_uri(&report.annotated, ImageEncoding::Png)
                .context("encoding result")?
        );
    }

    Ok(())
}
