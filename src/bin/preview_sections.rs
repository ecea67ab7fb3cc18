//! Quick dev binary: segments a lyrics file and previews the scene list
//! without touching any generation API.
//! Usage: cargo run --bin preview_sections -- <lyrics.txt> [prompts.json]
//!
//! The optional prompts.json holds an array of {label, image_prompt,
//! animation_prompt} objects, as returned by the scene-prompt generator.

use anyhow::{Context, Result};

use songreel::matcher::{match_sections, PromptCandidate};
use songreel::segment_lyrics;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let lyrics_path = args
        .next()
        .context("usage: preview_sections <lyrics.txt> [prompts.json]")?;
    let prompts_path = args.next();

    let text = std::fs::read_to_string(&lyrics_path)
        .with_context(|| format!("Failed to read lyrics file {}", lyrics_path))?;

    let sections = segment_lyrics(&text);
    eprintln!("Segmented {} sections from {}", sections.len(), lyrics_path);

    let candidates: Vec<PromptCandidate> = match &prompts_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompts file {}", path))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse prompt candidates in {}", path))?
        }
        None => Vec::new(),
    };
    let candidate_count = candidates.len();

    let scenes = match_sections(&sections, candidates);

    let mut matched = 0usize;
    for scene in &scenes {
        let label = if scene.header.is_empty() {
            "(no header)"
        } else {
            scene.header.as_str()
        };
        let binding = if scene.image_prompt.is_empty() {
            "no prompts"
        } else {
            matched += 1;
            "prompts bound"
        };
        let preview: String = scene.content.chars().take(60).collect();
        println!("[{}] {} - {}: \"{}\"", scene.id, label, binding, preview);
    }

    if prompts_path.is_some() {
        eprintln!(
            "\n{}/{} scenes matched a candidate ({} candidates supplied)",
            matched,
            scenes.len(),
            candidate_count
        );
    }

    Ok(())
}
