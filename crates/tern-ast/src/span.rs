// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

/// A half-open byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span { start: self.start.min(other.start), end: self.end.max(other.end) }
    }

    /// Whether `other` lies entirely within `self`.
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Precomputed newline offsets for byte-offset → line:column lookup.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offset at which each line begins; entry 0 is always 0.
    starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.bytes().enumerate().filter(|&(_, b)| b == b'\n').map(|(i, _)| i + 1));
        LineMap { starts }
    }

    /// 1-based (line, column) of a byte offset. O(log n).
    pub fn location(&self, offset: usize) -> (u32, u32) {
        let line = self.starts.partition_point(|&s| s <= offset).saturating_sub(1);
        ((line + 1) as u32, (offset - self.starts[line] + 1) as u32)
    }

    /// The text of a 1-based line, without its trailing newline.
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> Option<&'a str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.starts.get(idx)?;
        let end = match self.starts.get(idx + 1) {
            Some(&next) => next - 1,
            None => source.len(),
        };
        source.get(start..end)
    }

    pub fn line_count(&self) -> u32 {
        self.starts.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_merge_and_containment() {
        let a = Span::new(2, 5);
        let b = Span::new(4, 9);
        assert_eq!(a.to(b), Span::new(2, 9));
        assert_eq!(b.to(a), Span::new(2, 9));
        assert!(a.to(b).contains(a));
        assert!(a.to(b).contains(b));
        assert!(!a.contains(b));
    }

    #[test]
    fn location_lookup() {
        let lm = LineMap::new("var x = 1\nvar y = 2\n");
        assert_eq!(lm.location(0), (1, 1));
        assert_eq!(lm.location(8), (1, 9));
        assert_eq!(lm.location(10), (2, 1));
        assert_eq!(lm.location(14), (2, 5));
        assert_eq!(lm.line_count(), 3);
    }

    #[test]
    fn line_text_lookup() {
        let src = "if a\nreturn 1\nend";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_text(src, 1), Some("if a"));
        assert_eq!(lm.line_text(src, 2), Some("return 1"));
        assert_eq!(lm.line_text(src, 3), Some("end"));
        assert_eq!(lm.line_text(src, 4), None);
    }

    #[test]
    fn empty_source() {
        let lm = LineMap::new("");
        assert_eq!(lm.location(0), (1, 1));
        assert_eq!(lm.line_count(), 1);
    }
}
