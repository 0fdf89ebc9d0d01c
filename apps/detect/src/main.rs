use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use client_core::{
    load_settings,
    view::{error_banner, ResultPanel, UploadPanel},
    ControllerEvent, UploadController,
};
use shared::{domain::SelectedFile, error::Locale};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod render;

use render::{render_result_panel, render_upload_panel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Language {
    En,
    Th,
}

impl From<Language> for Locale {
    fn from(value: Language) -> Self {
        match value {
            Language::En => Locale::English,
            Language::Th => Locale::Thai,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "detect",
    about = "Upload an image to an object-detection API and print what it found"
)]
struct Args {
    /// PNG or JPEG image, at most 10MB.
    image: PathBuf,
    /// Base URL of the detection API; overrides detect.toml and the environment.
    #[arg(long)]
    api_url: Option<String>,
    /// Request timeout in milliseconds; must be positive.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,
    #[arg(long, value_enum, default_value = "en")]
    lang: Language,
    /// Write the annotated JPEG returned by the API to this path.
    #[arg(long)]
    annotated_out: Option<PathBuf>,
    /// Print the raw prediction JSON instead of the formatted list.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let locale = Locale::from(args.lang);

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        settings.request_timeout_ms = timeout_ms;
    }

    let mut controller = UploadController::from_settings(&settings)?;
    let mut events = controller.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ControllerEvent::LoadingChanged(loading) => debug!(loading, "loading changed"),
                ControllerEvent::ResultAvailable(result) => {
                    debug!(detections = result.detections.len(), "result available")
                }
                ControllerEvent::ErrorAvailable(err) => debug!(error = %err, "error available"),
            }
        }
    });

    let file = read_selected_file(&args.image).await?;
    if let Err(err) = controller.select_file(file) {
        bail!(err.localized(locale));
    }
    if let Some(line) = render_upload_panel(&UploadPanel::project(&controller), locale) {
        println!("{line}");
    }

    controller
        .submit()
        .await
        .map_err(|err| anyhow!(err.localized(locale)))?;
    if let Some(message) = error_banner(&controller, locale) {
        bail!(message);
    }
    let result = controller
        .result()
        .context("detection finished without a result")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!(
            "{}",
            render_result_panel(&ResultPanel::project(&controller), locale)
        );
    }

    if let Some(path) = &args.annotated_out {
        let bytes = result
            .annotated_image_bytes()
            .context("annotated image in response is not valid base64")?;
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("failed to write annotated image '{}'", path.display()))?;
        info!(path = %path.display(), "annotated image written");
    }

    Ok(())
}

async fn read_selected_file(path: &Path) -> Result<SelectedFile> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image '{}'", path.display()))?;
    Ok(SelectedFile::new(name, mime_type, bytes))
}
