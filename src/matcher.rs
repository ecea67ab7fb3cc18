use serde::{Deserialize, Serialize};

use crate::lyrics::Section;
use crate::scene::Scene;

/// One AI-authored (label, image prompt, animation prompt) triple awaiting
/// consumption by the matcher. Each candidate binds to at most one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCandidate {
    pub label: String,
    pub image_prompt: String,
    pub animation_prompt: String,
}

/// Reconcile segmented sections with an unordered candidate list.
///
/// The prompt generator does not guarantee positional alignment with our
/// segmentation, so candidates are matched by label instead of zipped by
/// index: for each section in order, take the first pool candidate whose
/// normalized label equals the normalized header, else the first related by
/// substring in either direction. Greedy, first-match-wins; a miss binds
/// empty prompts. Mismatched counts are tolerated, leftover candidates are
/// dropped.
pub fn match_sections(sections: &[Section], candidates: Vec<PromptCandidate>) -> Vec<Scene> {
    let mut pool = candidates;
    let mut scenes = Vec::with_capacity(sections.len());

    for (id, section) in sections.iter().enumerate() {
        let header = normalize_label(&section.header);

        let hit = pool
            .iter()
            .position(|c| normalize_label(&c.label) == header)
            .or_else(|| {
                pool.iter().position(|c| {
                    let label = normalize_label(&c.label);
                    // An empty string is a substring of everything; require
                    // both sides non-empty so a headerless section cannot
                    // steal an arbitrary candidate.
                    !header.is_empty()
                        && !label.is_empty()
                        && (header.contains(&label) || label.contains(&header))
                })
            });

        let scene = match hit {
            Some(idx) => {
                let candidate = pool.remove(idx);
                Scene::new(
                    id,
                    section.header.clone(),
                    section.content.clone(),
                    candidate.image_prompt,
                    candidate.animation_prompt,
                )
            }
            None => Scene::new(id, section.header.clone(), section.content.clone(), "", ""),
        };
        scenes.push(scene);
    }

    scenes
}

/// Lowercase, strip bracket/paren/colon punctuation, trim.
fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '(' | ')' | ':'))
        .collect::<String>()
        .trim()
        .to_string()
}
