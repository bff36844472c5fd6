use doppel_core::Turn;

/// Contiguous run of turns submitted to the summarizer together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub turns: Vec<Turn>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// `speaker: text` per turn, newline separated.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Partition `turns` into chunks of `max_size` turns; the last may be shorter.
///
/// A `max_size` of zero is treated as one.
pub fn chunk(turns: &[Turn], max_size: usize) -> Vec<Chunk> {
    turns
        .chunks(max_size.max(1))
        .map(|c| Chunk { turns: c.to_vec() })
        .collect()
}
