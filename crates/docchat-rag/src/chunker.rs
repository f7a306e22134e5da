//! Fixed-size overlapping text chunker

use docchat_core::{Chunk, ChunkConfig, Result};

/// Splits text into chunks of at most `max_size` characters.
///
/// Text of at most `max_size` characters is a single chunk. Longer text is split so that
/// chunk `i` starts at character `i * (max_size - overlap)`: consecutive chunks share
/// `overlap` characters and every chunk makes forward progress. Boundaries may fall
/// mid-word.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Create a chunker, rejecting invalid parameters
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkConfig {
        self.config
    }

    /// Split `text` from document `source` into ordered chunks
    pub fn split(&self, source: &str, text: &str) -> Vec<Chunk> {
        // Byte offset of every char boundary, plus the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = boundaries.len() - 1;

        if char_len == 0 {
            return Vec::new();
        }
        if char_len <= self.config.max_size {
            return vec![Chunk {
                text: text.to_string(),
                source: source.to_string(),
                index: 0,
                start: 0,
                end: char_len,
            }];
        }

        (0..char_len)
            .step_by(self.config.step())
            .enumerate()
            .map(|(index, start)| {
                let end = (start + self.config.max_size).min(char_len);
                Chunk {
                    text: text[boundaries[start]..boundaries[end]].to_string(),
                    source: source.to_string(),
                    index,
                    start,
                    end,
                }
            })
            .collect()
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkConfig::default(),
        }
    }
}

/// Split `text` with the given parameters
pub fn split(text: &str, max_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    let chunker = Chunker::new(ChunkConfig { max_size, overlap })?;
    Ok(chunker.split("", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::Error;

    /// Rebuild the original text from each chunk's non-overlapping tail
    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut text = String::new();
        let mut covered = 0usize;
        for chunk in chunks {
            let skip = covered.saturating_sub(chunk.start);
            text.extend(chunk.text.chars().skip(skip));
            covered = covered.max(chunk.end);
        }
        text
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(split("", 10, 2).unwrap().is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = split("short", 10, 2).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!((chunks[0].start, chunks[0].end), (0, 5));
    }

    #[test]
    fn test_text_up_to_max_size_is_single_chunk() {
        let chunks = split("abcd", 5, 4).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd"]);

        let exact = split("abcde", 5, 4).unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!((exact[0].start, exact[0].end), (0, 5));

        let chunker = Chunker::default();
        let document = "x".repeat(460);
        let chunks = chunker.split("doc", &document);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, document);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(split("abc", 0, 0), Err(Error::Configuration(_))));
        assert!(matches!(split("abc", 5, 5), Err(Error::Configuration(_))));
        assert!(matches!(split("abc", 5, 9), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let chunks = split("abcdefghijklmnopqrstuvwxyz", 10, 3).unwrap();
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start, pair[0].start + 7);
            let tail: String = pair[0].text.chars().skip(7).collect();
            assert!(pair[1].text.starts_with(&tail));
        }
    }

    #[test]
    fn test_zero_overlap_partitions_text() {
        let chunks = split("abcdefghij", 4, 0).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let chunks = split("héllo wörld ✓✓", 5, 1).unwrap();
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 5);
        }
        assert_eq!(reconstruct(&chunks), "héllo wörld ✓✓");
    }

    #[test]
    fn test_size_bound_and_reconstruction() {
        let texts = [
            "a",
            "The quick brown fox jumps over the lazy dog.",
            "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor.",
            "naïve café — ünïcödé text with accents and dashes",
        ];
        let configs = [(1, 0), (3, 1), (7, 0), (10, 9), (20, 5), (64, 8)];

        for text in texts {
            let len = text.chars().count();
            for (max_size, overlap) in configs {
                let chunks = split(text, max_size, overlap).unwrap();
                let step = max_size - overlap;

                assert!(chunks.len() <= len.div_ceil(step));
                assert!(chunks.iter().all(|c| c.text.chars().count() <= max_size));
                assert!(chunks.iter().enumerate().all(|(i, c)| c.index == i));
                assert_eq!(reconstruct(&chunks), text, "max={max_size} overlap={overlap}");
            }
        }
    }

    #[test]
    fn test_chunks_carry_source() {
        let chunker = Chunker::new(ChunkConfig::new(4, 1).unwrap()).unwrap();
        let chunks = chunker.split("notes.txt", "abcdefg");
        assert!(chunks.iter().all(|c| c.source == "notes.txt"));
    }
}
