//! WebVTT caption parsing.
//!
//! YouTube serves captions as WebVTT. Auto-generated tracks repeat the
//! previous line at the top of each cue ("rolling" captions) and embed
//! per-word timing tags, so the raw cue text needs cleaning before it reads
//! like a transcript.

use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

/// Convert WebVTT captions into plain text, one caption line per output line.
pub fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header = true;
    let mut in_note = false;

    for raw in vtt.lines() {
        let line = raw.trim();

        if line.is_empty() {
            in_header = false;
            in_note = false;
            continue;
        }
        if in_header || in_note {
            continue;
        }
        if line.starts_with("NOTE") || line.starts_with("STYLE") || line.starts_with("REGION") {
            in_note = true;
            continue;
        }
        // Cue timing line, or a numeric cue identifier preceding one.
        if line.contains("-->") || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let cleaned = tag_regex().replace_all(line, "");
        let cleaned = decode_entities(cleaned.trim());
        if cleaned.is_empty() {
            continue;
        }

        if lines.last().is_some_and(|last| *last == cleaned) {
            continue;
        }
        lines.push(cleaned);
    }

    lines.join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_captions() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n\
            1\n00:00:00.000 --> 00:00:02.000\nHello and welcome.\n\n\
            2\n00:00:02.000 --> 00:00:04.000\nToday: rivers &amp; lakes.\n";
        assert_eq!(vtt_to_text(vtt), "Hello and welcome.\nToday: rivers & lakes.");
    }

    #[test]
    fn test_rolling_auto_captions_are_collapsed() {
        let vtt = "WEBVTT\n\n\
            00:00:00.000 --> 00:00:02.000 align:start position:0%\n\
            so<00:00:00.500><c> today</c><00:00:01.000><c> we</c>\n\n\
            00:00:02.000 --> 00:00:02.010 align:start position:0%\n\
            so today we\n\n\
            00:00:02.010 --> 00:00:04.000 align:start position:0%\n\
            so today we\n\
            talk<00:00:02.500><c> about</c><00:00:03.000><c> rivers</c>\n";
        assert_eq!(vtt_to_text(vtt), "so today we\ntalk about rivers");
    }

    #[test]
    fn test_notes_are_skipped() {
        let vtt = "WEBVTT\n\nNOTE this is a comment\nspanning lines\n\n00:00.000 --> 00:01.000\nText\n";
        assert_eq!(vtt_to_text(vtt), "Text");
    }
}
