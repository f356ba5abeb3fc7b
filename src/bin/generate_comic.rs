use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use comicgen::cli::OpenAiOptions;
use comicgen::config::{load_dotenv, setup_logging};
use comicgen::constants::{DEFAULT_IMAGE_DIR, PUBLIC_IMAGE_PREFIX};
use comicgen::openai::HttpImageFetcher;
use comicgen::orchestrator::{ComicEnvelope, ComicOrchestrator};
use comicgen::store::ImageStore;
use comicgen::strip::compose_strip;

/// Draw a comic strip from the command line, without starting the server.
///
///   generate_comic "a robot learns to bake"
///   generate_comic --continue-from story.txt "the cake comes alive"
///   generate_comic --strip-out strip.png "a robot learns to bake"
#[derive(Parser, Debug)]
#[command(name = "generate_comic")]
#[command(about = "Generate (or continue) a comic strip and print the result as JSON")]
struct Args {
    /// Story idea, or the reader's choice when continuing
    idea: String,

    /// Continue the story stored in this file instead of starting a new strip
    #[arg(long)]
    continue_from: Option<PathBuf>,

    /// Also write the finished panels as one strip image to this file
    #[arg(long)]
    strip_out: Option<PathBuf>,

    /// Where the panel images are written
    #[arg(long, default_value = DEFAULT_IMAGE_DIR, env = "COMICGEN_IMAGE_DIR")]
    image_dir: PathBuf,

    /// Enable debug logging
    #[arg(long, env = "COMICGEN_DEBUG")]
    debug: bool,

    #[command(flatten)]
    openai: OpenAiOptions,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| anyhow!("Failed to set up logging: {err}"))?;

    let store = ImageStore::new(&args.image_dir, PUBLIC_IMAGE_PREFIX);
    store
        .init()
        .await
        .with_context(|| format!("Failed to prepare {}", args.image_dir.display()))?;

    let (http, openai) = args.openai.build_clients()?;
    let openai = Arc::new(openai);
    let orchestrator = ComicOrchestrator::new(
        store,
        openai.clone(),
        openai,
        Arc::new(HttpImageFetcher::new(http)),
    )
    .with_image_quality(args.openai.image_quality);

    let envelope = match &args.continue_from {
        Some(path) => {
            let story = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read story from {}", path.display()))?;
            orchestrator.continue_from_choice(&story, &args.idea).await
        }
        None => orchestrator.generate_from_idea(&args.idea).await,
    };

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    report(&envelope)?;

    if let Some(strip_out) = &args.strip_out {
        let images: Vec<String> = envelope
            .panels
            .iter()
            .chain(envelope.new_panels.iter())
            .flatten()
            .filter_map(|panel| panel.image_path.clone())
            .collect();
        let panels = orchestrator.store().load_strip_panels(&images).await?;
        tokio::fs::write(strip_out, compose_strip(&panels)?)
            .await
            .with_context(|| format!("Failed to write {}", strip_out.display()))?;
        eprintln!("Wrote strip to {}", strip_out.display());
    }
    Ok(())
}

fn report(envelope: &ComicEnvelope) -> Result<()> {
    if envelope.success {
        Ok(())
    } else {
        Err(anyhow!(
            "generation failed: {}",
            envelope.error.as_deref().unwrap_or("unknown error")
        ))
    }
}
