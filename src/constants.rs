//! Shared constants for prompts, file naming and the OpenAI defaults
//!

/// The default place generated panel images are written to
pub const DEFAULT_IMAGE_DIR: &str = "./static/images";

/// URL prefix the image directory is served under
pub const PUBLIC_IMAGE_PREFIX: &str = "/static/images";

/// Reserved image shown by the client while panels load; never purged.
pub const PLACEHOLDER_FILENAME: &str = "placeholder.png";

/// Every generated panel image starts with this.
pub const GENERATED_IMAGE_PREFIX: &str = "panel_";

/// Extension of generated panel images.
pub const GENERATED_IMAGE_EXTENSION: &str = "png";

/// Most panels a single strip download may contain.
pub const MAX_STRIP_PANELS: usize = 24;

/// Name the browser saves a downloaded strip under.
pub const STRIP_DOWNLOAD_FILENAME: &str = "my-comic-strip.png";

/// Default OpenAI API base, must end with a slash so endpoints join onto it.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";

/// Default chat model used to write the script
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4";

/// Default image model used to draw the panels
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Square resolution requested for every panel.
pub const PANEL_IMAGE_SIZE: &str = "1024x1024";

/// Seconds before an upstream HTTP call gives up.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 120;

/// System prompt for a fresh strip.
pub const GENERATE_SYSTEM_PROMPT: &str =
    "You are a creative comic strip writer. Create a 3-panel comic strip based on the given idea.";

/// System prompt when extending an existing strip.
pub const CONTINUE_SYSTEM_PROMPT: &str =
    "You are a creative comic strip writer. Continue the comic strip based on the user's choice.";

/// What every script request asks the model to provide for each panel.
pub const PANEL_FIELDS_REQUEST: &str =
    "For each panel, provide: 1) Scene description, 2) Character dialogue, 3) Visual elements to include";

/// Prefix of the prompt sent to the image model, followed by the scene.
pub const IMAGE_PROMPT_PREFIX: &str = "Create a comic panel illustration for: ";

#[cfg(test)]
/// Idea used across the end-to-end tests
pub const TEST_IDEA: &str = "a robot learns to bake";
