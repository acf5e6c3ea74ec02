//! WebVTT caption parsing.
//!
//! YouTube's automatic captions "roll": every cue repeats the previous line
//! before adding a new one, and inline `<c>` / `<00:00:01.000>` tags mark word
//! timings. Parsing strips the tags and, for such rolling captions only,
//! keeps each caption line once. Manual captions are kept as written.

use super::TranscriptSegment;
use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"))
}

/// Word-timing or `<c>` class tags, only emitted in automatic captions.
fn rolling_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(?:c[.>]|\d[\d:.]*>)").expect("marker regex is valid"))
}

/// Parse a WebVTT document into transcript segments.
///
/// Cues without text after cleanup are dropped.
pub fn parse_vtt(content: &str) -> Vec<TranscriptSegment> {
    let mut segments = Vec::new();
    let mut current: Option<(f64, f64, Vec<String>)> = None;
    let mut last_line: Option<String> = None;
    let rolling = rolling_marker_regex().is_match(content);

    for raw in content.lines() {
        let line = raw.trim_end_matches('\r');

        if line.contains("-->") {
            flush(&mut current, &mut segments);
            current = parse_timing(line).map(|(start, end)| (start, end, Vec::new()));
            continue;
        }

        if line.is_empty() {
            flush(&mut current, &mut segments);
            continue;
        }

        let Some((_, _, lines)) = current.as_mut() else {
            // Header, cue identifier, NOTE or STYLE block.
            continue;
        };

        let text = clean_line(line);
        if text.is_empty() || (rolling && last_line.as_deref() == Some(text.as_str())) {
            continue;
        }
        last_line = Some(text.clone());
        lines.push(text);
    }

    flush(&mut current, &mut segments);
    segments
}

fn flush(current: &mut Option<(f64, f64, Vec<String>)>, segments: &mut Vec<TranscriptSegment>) {
    if let Some((start, end, lines)) = current.take() {
        if !lines.is_empty() {
            segments.push(TranscriptSegment::new(start, end, lines.join(" ")));
        }
    }
}

/// Parse `00:00:01.000 --> 00:00:02.500 align:start` into seconds.
fn parse_timing(line: &str) -> Option<(f64, f64)> {
    let (left, right) = line.split_once("-->")?;
    let start = parse_timestamp(left.split_whitespace().next()?)?;
    let end = parse_timestamp(right.split_whitespace().next()?)?;
    Some((start, end))
}

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm`.
fn parse_timestamp(value: &str) -> Option<f64> {
    let mut parts: Vec<&str> = value.split(':').collect();
    let seconds: f64 = parts.pop()?.replace(',', ".").parse().ok()?;
    let minutes: f64 = match parts.pop() {
        Some(m) => m.parse().ok()?,
        None => 0.0,
    };
    let hours: f64 = match parts.pop() {
        Some(h) => h.parse().ok()?,
        None => 0.0,
    };
    if !parts.is_empty() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn clean_line(line: &str) -> String {
    let stripped = tag_regex().replace_all(line, "");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
