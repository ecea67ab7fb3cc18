use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One lyric stanza as segmented from raw text, with an optional
/// structural label ("Verse 1", "Chorus", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub header: String,
    pub content: String,
}

/// Header lines longer than this are treated as lyric content, not labels.
const MAX_HEADER_CHARS: usize = 40;

/// Closed vocabulary of song-structure labels, optionally numbered and/or
/// colon-terminated ("Verse 2", "chorus:", "Pre-Chorus 1:").
static STRUCTURE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:verse|chorus|bridge|intro|outro|pre[- ]?chorus|hook|interlude|solo|refrain|post[- ]?chorus|build)(?:\s*\d+)?\s*:?$",
    )
    .unwrap()
});

/// Split raw lyric text into ordered sections.
///
/// Blocks are separated by runs of blank lines. A block's first line becomes
/// the section header when it looks like a structural label; otherwise the
/// whole block is content under an empty header. Never fails; empty or
/// whitespace-only input yields an empty list.
pub fn segment_lyrics(text: &str) -> Vec<Section> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut sections = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    // Trailing sentinel flushes the last block.
    for line in text.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !block.is_empty() {
                sections.push(block_to_section(&block));
                block.clear();
            }
        } else {
            block.push(line.trim());
        }
    }

    sections
}

fn block_to_section(lines: &[&str]) -> Section {
    let first = lines[0];
    if is_header_line(first) {
        Section {
            header: header_value(first),
            content: lines[1..].join("\n"),
        }
    } else {
        Section {
            header: String::new(),
            content: lines.join("\n"),
        }
    }
}

fn is_header_line(line: &str) -> bool {
    if line.chars().count() >= MAX_HEADER_CHARS {
        return false;
    }
    let stripped = line.strip_suffix(':').unwrap_or(line).trim_end();
    if stripped.len() > 2
        && ((stripped.starts_with('[') && stripped.ends_with(']'))
            || (stripped.starts_with('(') && stripped.ends_with(')')))
    {
        return true;
    }
    STRUCTURE_HEADER.is_match(line)
}

/// The stored header drops a trailing colon: "Verse 1:" -> "Verse 1".
fn header_value(line: &str) -> String {
    line.strip_suffix(':').unwrap_or(line).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.header.as_str()).collect()
    }

    #[test]
    fn segments_labelled_stanzas() {
        let sections = segment_lyrics("Verse 1:\nHello there\n\nChorus:\nShine on");
        assert_eq!(
            sections,
            vec![
                Section {
                    header: "Verse 1".into(),
                    content: "Hello there".into()
                },
                Section {
                    header: "Chorus".into(),
                    content: "Shine on".into()
                },
            ]
        );
    }

    #[test]
    fn empty_and_whitespace_input_yield_nothing() {
        assert!(segment_lyrics("").is_empty());
        assert!(segment_lyrics("   \n\n  \t  \n").is_empty());
    }

    #[test]
    fn unstructured_text_is_one_headerless_section() {
        let sections = segment_lyrics("just some words\nacross two lines");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].header, "");
        assert_eq!(sections[0].content, "just some words\nacross two lines");
    }

    #[test]
    fn header_only_block_has_empty_content() {
        let sections = segment_lyrics("[Intro]\n\nVerse 1:\nFirst line");
        assert_eq!(headers(&sections), vec!["[Intro]", "Verse 1"]);
        assert_eq!(sections[0].content, "");
        assert_eq!(sections[1].content, "First line");
    }

    #[test]
    fn bracketed_and_parenthesized_headers() {
        let sections = segment_lyrics("[Chorus]\nla la la\n\n(Bridge)\nsomething else");
        assert_eq!(headers(&sections), vec!["[Chorus]", "(Bridge)"]);
    }

    #[test]
    fn keyword_headers_case_insensitive_and_numbered() {
        let sections = segment_lyrics("pre-chorus 2\nbuild it up\n\nOUTRO:\nfade away");
        assert_eq!(headers(&sections), vec!["pre-chorus 2", "OUTRO"]);
        assert_eq!(sections[0].content, "build it up");
    }

    #[test]
    fn long_first_line_is_content_not_header() {
        let long = "[this bracketed line is far too long to be a structural label in any song]";
        let sections = segment_lyrics(&format!("{}\nand more", long));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].header, "");
        assert!(sections[0].content.starts_with(long));
    }

    #[test]
    fn non_vocabulary_first_line_is_content() {
        let sections = segment_lyrics("Morning light\nspills over rooftops");
        assert_eq!(sections[0].header, "");
        assert_eq!(sections[0].content, "Morning light\nspills over rooftops");
    }

    #[test]
    fn crlf_line_endings() {
        let sections = segment_lyrics("Verse 1:\r\nHello there\r\n\r\nChorus:\r\nShine on");
        assert_eq!(headers(&sections), vec!["Verse 1", "Chorus"]);
        assert_eq!(sections[1].content, "Shine on");
    }

    #[test]
    fn header_and_content_reconstruct_the_block() {
        let source = "Verse 1:\nHello there\nStill here";
        let sections = segment_lyrics(source);
        assert_eq!(sections.len(), 1);
        // Reconstruction is modulo normalized whitespace and the trailing colon.
        let rebuilt = format!("{}:\n{}", sections[0].header, sections[0].content);
        assert_eq!(rebuilt, source);
    }
}
