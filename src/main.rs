use std::sync::Arc;

use clap::Parser;
use comicgen::config::{load_dotenv, setup_logging};
use comicgen::constants::PUBLIC_IMAGE_PREFIX;
use comicgen::openai::HttpImageFetcher;
use comicgen::orchestrator::ComicOrchestrator;
use comicgen::store::ImageStore;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    load_dotenv();
    let cli = comicgen::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let store = ImageStore::new(&cli.image_dir, PUBLIC_IMAGE_PREFIX);
    if let Err(err) = store.init().await {
        error!("Failed to prepare image dir {}: {}", cli.image_dir.display(), err);
        return;
    }

    let (http, openai) = match cli.openai.build_clients() {
        Ok(clients) => clients,
        Err(err) => {
            error!("Failed to set up the OpenAI client: {}", err);
            return;
        }
    };
    let openai = Arc::new(openai);
    let orchestrator = ComicOrchestrator::new(
        store,
        openai.clone(),
        openai,
        Arc::new(HttpImageFetcher::new(http)),
    )
    .with_image_quality(cli.openai.image_quality);

    if let Err(err) =
        comicgen::web::setup_server(&cli.listen_address, cli.port, orchestrator).await
    {
        error!("Application error: {}", err);
    }
}
