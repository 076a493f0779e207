/// Ordered text fragments of one session, concatenated for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    fragments: Vec<String>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.fragments.push(text);
        }
    }

    pub fn reset(&mut self) {
        self.fragments.clear();
    }

    pub fn snapshot(&self) -> String {
        self.fragments.concat()
    }

    /// Text appended after the first `fragment_index` fragments.
    pub fn since(&self, fragment_index: usize) -> String {
        self.fragments
            .get(fragment_index..)
            .map(|tail| tail.concat())
            .unwrap_or_default()
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn ends_with_newline(&self) -> bool {
        self.fragments.last().map_or(true, |last| last.ends_with('\n'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_receipt_order() {
        let mut buffer = OutputBuffer::new();
        buffer.append("b");
        buffer.append("a");
        buffer.append("b");
        assert_eq!(buffer.snapshot(), "bab");
        assert_eq!(buffer.fragment_count(), 3);
    }

    #[test]
    fn test_reset() {
        let mut buffer = OutputBuffer::new();
        buffer.append("hello\n");
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.snapshot(), "");
    }

    #[test]
    fn test_since() {
        let mut buffer = OutputBuffer::new();
        buffer.append("one\n");
        let seen = buffer.fragment_count();
        buffer.append("two\n");
        buffer.append("three\n");

        assert_eq!(buffer.since(seen), "two\nthree\n");
        assert_eq!(buffer.since(10), "");
    }

    #[test]
    fn test_ends_with_newline() {
        let mut buffer = OutputBuffer::new();
        assert!(buffer.ends_with_newline());
        buffer.append("Enter n: ");
        assert!(!buffer.ends_with_newline());
    }
}
