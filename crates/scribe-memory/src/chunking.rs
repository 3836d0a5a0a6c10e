//! Sliding-window text splitter
//!
//! Lengths and offsets are counted in characters, so a chunk boundary never
//! falls inside a multi-byte code point.

use scribe_core::{Result, ScribeError};

/// A slice of the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Character offset of the chunk start in the original text
    pub offset: usize,
    pub text: String,
}

/// Splits text into chunks of at most `chunk_size` characters, with
/// `overlap` characters shared between consecutive chunks
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ScribeError::Config("chunk_size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(ScribeError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunks. Empty text yields no chunks.
    ///
    /// Chunk starts advance by `chunk_size - overlap`; the last chunk ends at
    /// the end of the text and may be shorter than `chunk_size`.
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        // Byte position of every char start, plus the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        if total_chars == 0 {
            return Vec::new();
        }

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(total_chars);
            chunks.push(TextChunk {
                offset: start,
                text: text[boundaries[start]..boundaries[end]].to_string(),
            });

            if end == total_chars {
                break;
            }
            start += step;
        }

        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> String {
        (0..len)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect()
    }

    #[test]
    fn test_offsets_advance_by_step() {
        let splitter = TextSplitter::new(1000, 100).unwrap();
        let text = sample(2500);
        let chunks = splitter.split(&text);

        let offsets: Vec<usize> = chunks.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 900, 1800]);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 1000));
        assert_eq!(chunks.last().unwrap().text.chars().count(), 700);
    }

    #[test]
    fn test_non_overlapping_spans_reconstruct_text() {
        let splitter = TextSplitter::new(1000, 100).unwrap();
        let text = sample(2500);
        let chunks = splitter.split(&text);

        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(splitter.overlap()));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let splitter = TextSplitter::new(10, 3).unwrap();
        let chunks = splitter.split("abcdefghijklmnopq");

        assert_eq!(chunks[0].text, "abcdefghij");
        assert_eq!(chunks[1].text, "hijklmnopq");
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split("short note");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].offset, 0);
        assert_eq!(chunks[0].text, "short note");
    }

    #[test]
    fn test_exact_chunk_size_single_chunk() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        assert_eq!(splitter.split(&sample(10)).len(), 1);
    }

    #[test]
    fn test_empty_text() {
        assert!(TextSplitter::default().split("").is_empty());
    }

    #[test]
    fn test_multibyte_boundaries() {
        let splitter = TextSplitter::new(4, 1).unwrap();
        let chunks = splitter.split("héllo wörld");
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 4));
        assert_eq!(chunks[0].text, "héll");
        assert_eq!(chunks[1].text, "lo w");
    }

    #[test]
    fn test_deterministic() {
        let splitter = TextSplitter::new(50, 5).unwrap();
        let text = sample(333);
        assert_eq!(splitter.split(&text), splitter.split(&text));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(100, 150).is_err());
    }
}
