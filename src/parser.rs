//! Turns the free text a chat model writes into ordered [`Panel`] records.
//!
//! This is a heuristic, not a grammar. Models answer in a handful of common
//! shapes (`Panel 1:` headings, markdown bullets, numbered lists) and the
//! parser leans on keywords in each line to pick the fields out:
//!
//! - a line mentioning `scene`, `setting` or `description` is the scene;
//! - a line mentioning `dialogue` joins the dialogue block;
//! - a line labelled `visual`/`element` is the visual elements;
//! - any other line with a colon is treated as a speaker line of dialogue.
//!
//! It never fails. Only blank input gives an empty list, and non-blank input
//! never produces a fully blank panel.

use std::sync::LazyLock;

use regex::Regex;

use crate::panel::Panel;

/// Literal that opens every panel block in the usual model output.
const PANEL_MARKER: &str = "Panel";

const SCENE_KEYWORDS: [&str; 3] = ["scene", "setting", "description"];
const VISUAL_KEYWORDS: [&str; 2] = ["visual", "element"];

/// `1.`, `2)`, `3:` style list markers, used when there are no panel markers.
static NUMBERED_ITEM: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\d+[\.\):]").ok());

#[derive(Debug, Eq, PartialEq)]
enum LineKind {
    Scene,
    Dialogue,
    Visual,
    Ignored,
}

/// Parse raw model output into panels, in the order they were written.
pub fn parse_panels(raw: &str) -> Vec<Panel> {
    split_fragments(raw)
        .into_iter()
        .map(parse_fragment)
        .collect()
}

/// Splits the text into one trimmed, non-empty fragment per panel.
fn split_fragments(raw: &str) -> Vec<&str> {
    let mut pieces: Vec<&str> = raw.split(PANEL_MARKER).collect();
    if pieces.len() <= 1
        && let Some(numbered) = NUMBERED_ITEM.as_ref()
    {
        pieces = numbered.split(raw).collect();
    }

    let fragments: Vec<&str> = pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect();

    // `**Panel 1:**` leaves `**` behind as its own piece
    let meaningful: Vec<&str> = fragments
        .iter()
        .copied()
        .filter(|piece| piece.chars().any(char::is_alphanumeric))
        .collect();
    if !meaningful.is_empty() {
        return meaningful;
    }
    if !fragments.is_empty() {
        return fragments;
    }

    // only markers, eg `Panel` or `1) 2)`
    let whole = raw.trim();
    if whole.is_empty() { Vec::new() } else { vec![whole] }
}

fn parse_fragment(fragment: &str) -> Panel {
    let mut scene: Option<&str> = None;
    let mut dialogue = String::new();
    let mut visuals: Option<&str> = None;

    for line in fragment.lines().map(str::trim) {
        match classify_line(line) {
            LineKind::Scene => scene = Some(line),
            LineKind::Dialogue => {
                dialogue.push_str(line);
                dialogue.push('\n');
            }
            LineKind::Visual => visuals = Some(line),
            LineKind::Ignored => {}
        }
    }

    Panel {
        scene_description: scene.unwrap_or(fragment).to_string(),
        dialogue: dialogue.trim().to_string(),
        visual_elements: visuals.unwrap_or_default().to_string(),
        image_path: None,
    }
}

fn classify_line(line: &str) -> LineKind {
    // panel numbers and markdown rules like `1:**` or `---`
    if !line.chars().any(char::is_alphabetic) {
        return LineKind::Ignored;
    }

    let lower = line.to_lowercase();
    if SCENE_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        LineKind::Scene
    } else if lower.contains("dialogue") {
        LineKind::Dialogue
    } else if is_visual_line(&lower) {
        LineKind::Visual
    } else if lower.contains(':') {
        LineKind::Dialogue
    } else {
        LineKind::Ignored
    }
}

/// A colon line only counts as visual when its label says so, so that
/// `Robot: what an element!` stays dialogue.
fn is_visual_line(lower: &str) -> bool {
    let mentions_visual =
        |text: &str| VISUAL_KEYWORDS.iter().any(|keyword| text.contains(keyword));
    match lower.split_once(':') {
        Some((label, _)) => mentions_visual(label),
        None => mentions_visual(lower),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_panels() {
        assert!(parse_panels("").is_empty());
        assert!(parse_panels("   \n\t  ").is_empty());
    }

    #[test]
    fn labelled_panel_fields() {
        let raw = "Panel 1\nScene: A park\nDialogue: \"Hi\": said Amy\nVisual elements: sunny";
        let panels = parse_panels(raw);
        assert_eq!(panels.len(), 1);
        let panel = &panels[0];
        assert!(panel.scene_description.contains("A park"));
        assert!(panel.dialogue.contains("said Amy"));
        assert!(panel.visual_elements.contains("sunny"));
        assert!(panel.image_path.is_none());
    }

    #[test]
    fn numbered_list_fallback() {
        let panels = parse_panels("1) First idea\n2) Second idea");
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].scene_description, "First idea");
        assert_eq!(panels[1].scene_description, "Second idea");
    }

    #[test]
    fn numbered_fallback_accepts_dots_and_colons() {
        let panels = parse_panels("1. A kitchen\n2: A bakery\n3) A party");
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[2].scene_description, "A party");
    }

    #[test]
    fn marker_free_text_becomes_single_scene() {
        let raw = "A robot stares at an oven, confused";
        let panels = parse_panels(raw);
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].scene_description, raw);
        assert!(panels[0].dialogue.is_empty());
    }

    #[test]
    fn speaker_lines_accumulate_in_order() {
        let raw = "Panel 1:\nScene: A kitchen\nRobot: Where is the flour?\nCat: Under me.\nPanel 2:\nScene: A mess";
        let panels = parse_panels(raw);
        assert_eq!(panels.len(), 2);
        assert_eq!(
            panels[0].dialogue,
            "Robot: Where is the flour?\nCat: Under me."
        );
        assert_eq!(panels[1].scene_description, "Scene: A mess");
        assert!(panels[1].dialogue.is_empty());
    }

    #[test]
    fn last_scene_and_visual_lines_win() {
        let raw = "Panel 1\nScene: first\nSetting: second\nVisual: one\nElements: two";
        let panels = parse_panels(raw);
        assert_eq!(panels[0].scene_description, "Setting: second");
        assert_eq!(panels[0].visual_elements, "Elements: two");
    }

    #[test]
    fn colon_dialogue_without_scene_still_has_content() {
        let panels = parse_panels("Panel 1\nBob: hi there");
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].dialogue, "Bob: hi there");
        assert!(!panels[0].is_blank());
        assert!(panels[0].scene_description.contains("Bob: hi there"));
    }

    #[test]
    fn speaker_mentioning_elements_stays_dialogue() {
        let panels = parse_panels("Panel 1\nScene: lab\nChemist: Mind the elements!");
        assert_eq!(panels[0].dialogue, "Chemist: Mind the elements!");
        assert!(panels[0].visual_elements.is_empty());
    }

    #[test]
    fn markdown_headings_do_not_create_extra_panels() {
        let raw = "**Panel 1:**\n- **Scene Description:** A robot in a kitchen.\n- **Dialogue:** Robot: \"Beep.\"\n- **Visual Elements:** Flour everywhere.\n\n**Panel 2:**\n- **Scene Description:** The oven smokes.\n- **Dialogue:** Robot: \"Oops.\"\n- **Visual Elements:** Smoke.";
        let panels = parse_panels(raw);
        assert_eq!(panels.len(), 2);
        assert_eq!(
            panels[0].scene_description,
            "- **Scene Description:** A robot in a kitchen."
        );
        assert_eq!(panels[0].dialogue, "- **Dialogue:** Robot: \"Beep.\"");
        assert_eq!(panels[1].visual_elements, "- **Visual Elements:** Smoke.");
    }

    #[test]
    fn punctuation_only_input_is_kept() {
        let panels = parse_panels("Panel ***");
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].scene_description, "***");
    }

    #[test]
    fn never_blank_for_non_blank_input() {
        let samples = [
            "Panel",
            "PanelPanel",
            "1. 2.",
            "Panel 1",
            "::",
            "1)",
            "Panel 1\n\n\nPanel 2\nVisual: stars",
            "random words without structure",
            "Dialogue:\nPanel\nscene",
        ];
        for sample in samples {
            let panels = parse_panels(sample);
            assert!(!panels.is_empty(), "no panels for {sample:?}");
            for panel in panels {
                assert!(!panel.is_blank(), "blank panel for {sample:?}");
            }
        }
    }

    #[test]
    fn marker_only_input_keeps_the_text() {
        for (raw, scene) in [
            ("Panel", "Panel"),
            ("PanelPanel", "PanelPanel"),
            ("1)", "1)"),
            (" 1. 2. ", "1. 2."),
        ] {
            let panels = parse_panels(raw);
            assert_eq!(panels.len(), 1, "{raw:?}");
            assert_eq!(panels[0].scene_description, scene);
        }
    }
}
