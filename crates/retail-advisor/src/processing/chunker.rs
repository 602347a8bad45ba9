use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub id: Uuid,
    pub text: String,
    pub index: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_size: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize, min_chunk_size: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            min_chunk_size,
        }
    }

    pub fn from_config(config: &crate::config::ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.min_chunk_size)
    }

    pub fn chunk(&self, text: &str) -> Vec<ChunkResult> {
        if text.len() <= self.chunk_size {
            if text.is_empty() || text.len() < self.min_chunk_size {
                return Vec::new();
            }
            return vec![ChunkResult {
                id: Uuid::new_v4(),
                text: text.to_string(),
                index: 0,
                start_offset: 0,
                end_offset: text.len(),
            }];
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < text.len() {
            let raw_end = (start + self.chunk_size).min(text.len());
            let mut end = snap_to_char_boundary(text, raw_end);
            if end <= start {
                // chunk_size smaller than a single multi-byte char
                end = next_char_boundary(text, start);
            }

            // Try to find a natural boundary near the end
            let actual_end = if end < text.len() {
                self.find_break_point(text, start, end)
            } else {
                end
            };

            let chunk_text = &text[start..actual_end];

            if chunk_text.len() >= self.min_chunk_size {
                chunks.push(ChunkResult {
                    id: Uuid::new_v4(),
                    text: chunk_text.to_string(),
                    index,
                    start_offset: start,
                    end_offset: actual_end,
                });
                index += 1;
            }

            if actual_end >= text.len() {
                break;
            }

            // Move forward with overlap
            let len = actual_end - start;
            let step = if len > self.chunk_overlap {
                len - self.chunk_overlap
            } else {
                len
            };

            let next = snap_to_char_boundary(text, start + step);
            // Overlap can snap back onto `start` inside a multi-byte char
            start = if next > start {
                next
            } else {
                next_char_boundary(text, start)
            };
        }

        chunks
    }

    /// Returns an end offset in `(start, preferred_end]`.
    fn find_break_point(&self, text: &str, start: usize, preferred_end: usize) -> usize {
        let raw_search_start = preferred_end.saturating_sub(200).max(start);
        let search_start = snap_to_char_boundary(text, raw_search_start);
        let safe_end = snap_to_char_boundary(text, preferred_end);

        if search_start >= safe_end {
            return safe_end;
        }

        let search_region = &text[search_start..safe_end];

        // Priority: paragraph break > sentence end > line break > word break
        let candidates = [
            search_region.rfind("\n\n").map(|pos| pos + 2),
            search_region.rfind(". ").map(|pos| pos + 2),
            search_region.rfind(".\n").map(|pos| pos + 2),
            search_region.rfind('\n').map(|pos| pos + 1),
            search_region.rfind(' ').map(|pos| pos + 1),
        ];

        candidates
            .into_iter()
            .flatten()
            .map(|offset| search_start + offset)
            .find(|&end| end > start)
            .unwrap_or(safe_end)
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(500, 50, 1)
    }
}

/// Snap a byte offset to the nearest valid UTF-8 char boundary (rounding down).
/// If `pos` is beyond text length, returns `text.len()`.
fn snap_to_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut p = pos;
    while p > 0 && !text.is_char_boundary(p) {
        p -= 1;
    }
    p
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    let mut p = pos + 1;
    while p < text.len() && !text.is_char_boundary(p) {
        p += 1;
    }
    p.min(text.len())
}
