//! Config handling

use tracing::log::LevelFilter;

/// HTTP and TLS plumbing that floods the log at info level.
const CHATTY_MODULES: [&str; 6] = ["reqwest", "rustls", "hyper", "hyper_util", "h2", "tower_http"];

/// Installs the logger: everything at debug with `debug`, otherwise info with
/// the HTTP stack and `tracing` internals turned down.
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let mut logger = simple_logger::SimpleLogger::new();
    if debug {
        logger = logger.with_level(LevelFilter::Debug);
    } else {
        logger = logger
            .with_level(LevelFilter::Info)
            .with_module_level("tracing", LevelFilter::Warn);
        for module in CHATTY_MODULES {
            logger = logger.with_module_level(module, LevelFilter::Warn);
        }
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {err}");
        Box::new(std::io::Error::other(err))
    })
}

/// Loads a `.env` file from the working directory, if there is one.
///
/// Must run before the CLI is parsed so that env fallbacks see its values.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => eprintln!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => eprintln!("Failed to read .env file: {}", err),
    }
}
