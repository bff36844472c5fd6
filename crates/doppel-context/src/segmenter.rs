//! Splits a raw transcript into attributed turns.
//!
//! A paragraph matching `speaker: content` opens a new turn; any other
//! non-blank paragraph continues the open turn on a new line. Paragraphs
//! seen before the first speaker line have nobody to belong to and are
//! dropped.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use doppel_core::Turn;

use crate::error::ContextError;

/// Speaker is everything before the first colon.
pub const DEFAULT_SPEAKER_PATTERN: &str = r"^([^:]+):\s*(.*)$";

static DEFAULT_SPEAKER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_SPEAKER_PATTERN).unwrap());

#[derive(Clone, Debug)]
pub struct Segmenter {
    speaker_line: Regex,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            speaker_line: DEFAULT_SPEAKER_LINE.clone(),
        }
    }
}

impl Segmenter {
    /// Use a custom pattern. Group 1 is the speaker, group 2 the content.
    pub fn with_pattern(pattern: &str) -> Result<Self, ContextError> {
        let speaker_line = Regex::new(pattern)?;
        // captures_len counts the implicit whole-match group
        if speaker_line.captures_len() < 3 {
            return Err(ContextError::MissingCaptureGroups {
                pattern: pattern.to_string(),
            });
        }
        Ok(Self { speaker_line })
    }

    /// Segment a sequence of paragraphs in document order.
    pub fn segment<I, S>(&self, paragraphs: I) -> Vec<Turn>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut turns = Vec::new();
        let mut open: Option<(String, Vec<String>)> = None;
        let mut dropped = 0usize;

        for paragraph in paragraphs {
            let text = paragraph.as_ref().trim();
            if text.is_empty() {
                continue;
            }

            if let Some(caps) = self.speaker_line.captures(text) {
                if let Some(prev) = open.take() {
                    push_turn(&mut turns, prev);
                }
                let speaker = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
                let content = caps.get(2).map_or("", |m| m.as_str()).trim();
                let lines = if content.is_empty() {
                    Vec::new()
                } else {
                    vec![content.to_string()]
                };
                open = Some((speaker, lines));
            } else if let Some((_, lines)) = open.as_mut() {
                lines.push(text.to_string());
            } else {
                dropped += 1;
            }
        }

        if let Some(last) = open {
            push_turn(&mut turns, last);
        }
        if dropped > 0 {
            debug!(dropped, "dropped paragraphs before the first speaker line");
        }
        turns
    }

    /// Segment plain text, one paragraph per line.
    pub fn segment_text(&self, raw: &str) -> Vec<Turn> {
        self.segment(raw.lines())
    }
}

/// Turns without any text are discarded.
fn push_turn(turns: &mut Vec<Turn>, (speaker, lines): (String, Vec<String>)) {
    if !lines.is_empty() {
        turns.push(Turn::new(speaker, lines.join("\n")));
    }
}

/// Summary of what a segmentation pass found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranscriptStats {
    pub turns: usize,
    /// Distinct speakers in order of first appearance.
    pub speakers: Vec<String>,
}

impl TranscriptStats {
    pub fn from_turns(turns: &[Turn]) -> Self {
        let mut speakers: Vec<String> = Vec::new();
        for turn in turns {
            if !speakers.iter().any(|s| s == &turn.speaker) {
                speakers.push(turn.speaker.clone());
            }
        }
        Self {
            turns: turns.len(),
            speakers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_lines_join_the_open_turn() {
        let turns = Segmenter::default().segment(["Yy: hi", "how are you", "Ptaclfere: good thanks"]);
        assert_eq!(
            turns,
            vec![
                Turn::new("Yy", "hi\nhow are you"),
                Turn::new("Ptaclfere", "good thanks"),
            ]
        );
    }

    #[test]
    fn same_speaker_twice_is_two_turns() {
        let turns = Segmenter::default().segment(["Yy: one", "Yy: two"]);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].text, "two");
    }

    #[test]
    fn leading_unattributed_paragraphs_are_dropped() {
        let turns = Segmenter::default().segment(["exported on monday", "", "Yy: hey"]);
        assert_eq!(turns, vec![Turn::new("Yy", "hey")]);
    }

    #[test]
    fn blank_paragraphs_are_skipped() {
        let turns = Segmenter::default().segment(["Yy: a", "   ", "", "b"]);
        assert_eq!(turns, vec![Turn::new("Yy", "a\nb")]);
    }

    #[test]
    fn empty_speaker_line_takes_text_from_continuations() {
        let turns = Segmenter::default().segment(["Yy:", "photo attached", "Ptaclfere:"]);
        assert_eq!(turns, vec![Turn::new("Yy", "photo attached")]);
    }

    #[test]
    fn speaker_and_content_are_trimmed() {
        let turns = Segmenter::default().segment(["  Yy  :   spaced out  "]);
        assert_eq!(turns, vec![Turn::new("Yy", "spaced out")]);
    }

    #[test]
    fn segment_text_splits_on_lines() {
        let turns = Segmenter::default().segment_text("Yy: hi\r\nhow are you\n\nPtaclfere: good\n");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "hi\nhow are you");
    }

    #[test]
    fn custom_pattern() {
        let seg = Segmenter::with_pattern(r"^\[\d\d:\d\d\] ([^:]+): (.*)$").unwrap();
        let turns = seg.segment(["[10:02] Yy: morning", "Yy: not a match here"]);
        assert_eq!(turns, vec![Turn::new("Yy", "morning\nYy: not a match here")]);
    }

    #[test]
    fn custom_pattern_without_groups_is_rejected() {
        let err = Segmenter::with_pattern(r"^\w+:").unwrap_err();
        assert!(matches!(err, ContextError::MissingCaptureGroups { .. }));
        assert!(matches!(
            Segmenter::with_pattern("(unclosed").unwrap_err(),
            ContextError::InvalidPattern(_)
        ));
    }

    #[test]
    fn stats_keep_first_seen_speaker_order() {
        let turns = vec![
            Turn::new("Ptaclfere", "a"),
            Turn::new("Yy", "b"),
            Turn::new("Ptaclfere", "c"),
        ];
        let stats = TranscriptStats::from_turns(&turns);
        assert_eq!(stats.turns, 3);
        assert_eq!(stats.speakers, vec!["Ptaclfere", "Yy"]);
    }
}
