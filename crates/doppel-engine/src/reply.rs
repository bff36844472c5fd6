//! Splitting a raw reply into chat bubbles and pacing their delivery.

use std::time::Duration;

/// Reserved bubble separator. Never part of genuine reply content.
pub const REPLY_DELIMITER: &str = "|||";

/// Ordered, non-empty, trimmed segments of one reply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplyPlan {
    segments: Vec<String>,
}

impl ReplyPlan {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split(REPLY_DELIMITER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Lazily pair each segment with the pause that should follow it.
    ///
    /// Has no side effects; iterate again to replay.
    pub fn paced<'a>(&'a self, policy: &'a PacingPolicy) -> impl Iterator<Item = PacedSegment<'a>> + 'a {
        let last = self.segments.len().saturating_sub(1);
        self.segments
            .iter()
            .enumerate()
            .map(move |(index, text)| PacedSegment {
                index,
                text,
                delay_after: (index < last).then(|| policy.delay_for(text)),
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacedSegment<'a> {
    pub index: usize,
    pub text: &'a str,
    /// `None` for the final segment.
    pub delay_after: Option<Duration>,
}

/// Typing cadence: `min(per_char * chars + base, max)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacingPolicy {
    pub per_char: Duration,
    pub base: Duration,
    pub max: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            per_char: Duration::from_millis(50),
            base: Duration::from_millis(500),
            max: Duration::from_millis(2000),
        }
    }
}

impl PacingPolicy {
    /// No pauses at all.
    pub fn instant() -> Self {
        Self {
            per_char: Duration::ZERO,
            base: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, segment: &str) -> Duration {
        let chars = u32::try_from(segment.chars().count()).unwrap_or(u32::MAX);
        self.per_char
            .saturating_mul(chars)
            .saturating_add(self.base)
            .min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims() {
        let plan = ReplyPlan::parse("Haha true. ||| Wait, are you serious?");
        assert_eq!(plan.segments(), ["Haha true.", "Wait, are you serious?"]);
    }

    #[test]
    fn drops_empty_segments() {
        assert_eq!(ReplyPlan::parse("a ||| ||| b").segments(), ["a", "b"]);
        assert_eq!(ReplyPlan::parse("|||a||||||b|||").segments(), ["a", "b"]);
        assert!(ReplyPlan::parse(" ||| ").is_empty());
    }

    #[test]
    fn no_delimiter_is_one_segment() {
        let plan = ReplyPlan::parse("just one line\nwith a break");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.segments()[0], "just one line\nwith a break");
    }

    #[test]
    fn pacing_formula() {
        let policy = PacingPolicy::default();
        assert_eq!(policy.delay_for(""), Duration::from_millis(500));
        assert_eq!(policy.delay_for("Haha true."), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(&"x".repeat(30)), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(&"x".repeat(300)), Duration::from_millis(2000));
        // counted in characters, not bytes
        assert_eq!(policy.delay_for("哈哈"), Duration::from_millis(600));
    }

    #[test]
    fn last_segment_has_no_trailing_delay() {
        let plan = ReplyPlan::parse("Haha true. ||| ok");
        let policy = PacingPolicy::default();
        let paced: Vec<_> = plan.paced(&policy).collect();
        assert_eq!(paced.len(), 2);
        assert_eq!(paced[0].delay_after, Some(Duration::from_millis(1000)));
        assert_eq!(paced[1].delay_after, None);
        assert_eq!(paced[1].index, 1);

        // restartable
        assert_eq!(plan.paced(&policy).count(), 2);
    }

    #[test]
    fn instant_policy_never_waits() {
        assert_eq!(PacingPolicy::instant().delay_for("long text here"), Duration::ZERO);
    }
}
