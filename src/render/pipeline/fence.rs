//! Fenced code block tracking for line-based stages.
//!
//! Fenced code is opaque to most text rewriting: line preprocessors and the
//! block splitter use this tracker to leave its contents alone.

/// Tracks whether the current line is inside a fenced code block.
///
/// Fences use backticks or tildes (three or more). The closing fence must use
/// the same character and be at least as long as the opening one.
#[derive(Debug, Default)]
pub struct FenceTracker {
    fence_char: Option<char>,
    fence_len: usize,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_fence(&self) -> bool {
        self.fence_char.is_some()
    }

    /// Feed the next line. Returns `true` if the line opens or closes a fence.
    pub fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        match self.fence_char {
            Some(ch) => {
                if is_closing_fence(trimmed, ch, self.fence_len) {
                    self.fence_char = None;
                    self.fence_len = 0;
                    true
                } else {
                    false
                }
            }
            None => match detect_fence(trimmed) {
                Some((ch, len)) => {
                    self.fence_char = Some(ch);
                    self.fence_len = len;
                    true
                }
                None => false,
            },
        }
    }

    /// Feed a line and report whether a text stage may rewrite it.
    ///
    /// Fence markers and lines inside a fence are not rewritable.
    pub fn is_text(&mut self, line: &str) -> bool {
        !self.update(line) && !self.in_fence()
    }
}

fn detect_fence(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}

fn is_closing_fence(trimmed: &str, expected: char, min_len: usize) -> bool {
    if !trimmed.starts_with(expected) {
        return false;
    }

    let count = trimmed.chars().take_while(|&c| c == expected).count();
    count >= min_len && trimmed[count..].chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_fence() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.update("```rust"));
        assert!(tracker.in_fence());
        assert!(!tracker.update("let x = 1;"));
        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_must_match_char_and_length() {
        let mut tracker = FenceTracker::new();
        tracker.update("````");
        assert!(!tracker.update("```"));
        assert!(!tracker.update("~~~~"));
        assert!(tracker.in_fence());
        assert!(tracker.update("`````"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_is_text() {
        let mut tracker = FenceTracker::new();
        let lines = ["a", "~~~", "b", "~~~", "c"];
        let text: Vec<bool> = lines.iter().map(|l| tracker.is_text(l)).collect();
        assert_eq!(text, vec![true, false, false, false, true]);
    }
}
