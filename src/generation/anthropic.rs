use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::{GenerateError, Result};
use crate::matcher::PromptCandidate;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-sonnet-4-5-20250929";

/// A generated song: title, musical style and the full lyric text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub style: String,
    pub lyrics: String,
}

/// Write a song for a theme in the given language.
pub async fn generate_song(
    http: &reqwest::Client,
    api_key: &str,
    theme: &str,
    language: &str,
) -> Result<Song> {
    let system = format!(
        "You are a songwriter. Write complete, performable song lyrics in {}. \
         Structure the lyrics into labelled sections (Verse 1, Chorus, Bridge, ...) \
         separated by blank lines. Report the result via the write_song tool.",
        language
    );
    let user_message = format!("Write a song about: {}", theme);

    let tool = json!({
        "name": "write_song",
        "description": "Report the finished song",
        "input_schema": {
            "type": "object",
            "required": ["title", "style", "lyrics"],
            "properties": {
                "title": {"type": "string", "description": "Song title"},
                "style": {"type": "string", "description": "Musical style, short phrase"},
                "lyrics": {"type": "string", "description": "Full lyrics with section labels"}
            }
        }
    });

    info!("Requesting song for theme \"{}\" ({})", theme, language);
    let input = call_tool(http, api_key, &system, &user_message, tool, "write_song").await?;

    serde_json::from_value(input)
        .map_err(|e| GenerateError::Malformed(format!("write_song tool input: {}", e)))
}

/// Author one (label, image prompt, animation prompt) triple per lyric
/// section. The returned list is unordered and its count may differ from the
/// section count; reconciliation happens in the matcher.
pub async fn generate_scene_prompts(
    http: &reqwest::Client,
    api_key: &str,
    lyrics: &str,
    style: &str,
    language: &str,
) -> Result<Vec<PromptCandidate>> {
    let system = format!(
        "You are a music video director. For each labelled section of the song \
         you are given, author one visual scene: a detailed English image prompt \
         for a still frame, and a short animation prompt describing camera and \
         subject motion. Match the mood of the \"{}\" style. The lyrics are in {}. \
         Report every scene via the report_scenes tool, labelling each with the \
         section label it belongs to.",
        style, language
    );

    let tool = json!({
        "name": "report_scenes",
        "description": "Report one visual scene per song section",
        "input_schema": {
            "type": "object",
            "required": ["scenes"],
            "properties": {
                "scenes": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["label", "image_prompt", "animation_prompt"],
                        "properties": {
                            "label": {"type": "string", "description": "Section label, e.g. Verse 1"},
                            "image_prompt": {"type": "string"},
                            "animation_prompt": {"type": "string"}
                        }
                    }
                }
            }
        }
    });

    info!("Requesting scene prompts ({} chars of lyrics)", lyrics.len());
    let input = call_tool(http, api_key, &system, lyrics, tool, "report_scenes").await?;

    #[derive(Deserialize)]
    struct Scenes {
        scenes: Vec<PromptCandidate>,
    }

    let parsed: Scenes = serde_json::from_value(input)
        .map_err(|e| GenerateError::Malformed(format!("report_scenes tool input: {}", e)))?;
    Ok(parsed.scenes)
}

// Anthropic API response structures
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text {
        #[allow(dead_code)]
        text: String,
    },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[allow(dead_code)]
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

/// Call the Anthropic Messages API with a forced tool for structured output.
async fn call_tool(
    http: &reqwest::Client,
    api_key: &str,
    system: &str,
    user_message: &str,
    tool: serde_json::Value,
    tool_name: &str,
) -> Result<serde_json::Value> {
    let request_body = json!({
        "model": MODEL,
        "max_tokens": 8192,
        "system": system,
        "tools": [tool],
        "tool_choice": {"type": "tool", "name": tool_name},
        "messages": [{"role": "user", "content": user_message}]
    });

    let response = http
        .post(ANTHROPIC_API_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .header("content-type", "application/json")
        .json(&request_body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GenerateError::from_status(status, body));
    }

    let api_response: AnthropicResponse = response
        .json()
        .await
        .map_err(|e| GenerateError::Malformed(format!("Anthropic response body: {}", e)))?;

    for block in api_response.content {
        if let AnthropicContentBlock::ToolUse { name, input, .. } = block {
            if name == tool_name {
                return Ok(input);
            }
        }
    }

    Err(GenerateError::Malformed(format!(
        "no tool_use block for tool '{}' in response",
        tool_name
    )))
}
