//! Panel records handed back to the client

use serde::{Deserialize, Serialize};

/// One structured unit of a comic strip.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    /// What the panel shows, used as the image prompt.
    pub scene_description: String,
    /// Dialogue lines, one per line break.
    pub dialogue: String,
    /// Extra visual elements the writer asked for.
    pub visual_elements: String,
    /// Public path of the illustration, set once the image is saved.
    #[serde(rename = "image")]
    pub image_path: Option<String>,
}

impl Panel {
    /// True when no text field carries anything.
    pub fn is_blank(&self) -> bool {
        self.scene_description.trim().is_empty()
            && self.dialogue.trim().is_empty()
            && self.visual_elements.trim().is_empty()
    }
}

/// Which kind of batch an image belongs to, encoded in its filename.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PanelRole {
    /// Panels of a freshly generated strip
    Panel,
    /// Panels appended by a continuation
    Continuation,
}

impl PanelRole {
    /// Filename tag for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            PanelRole::Panel => "panel",
            PanelRole::Continuation => "panel_cont",
        }
    }
}

impl std::fmt::Display for PanelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
