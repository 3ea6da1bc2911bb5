use miette::SourceSpan;

/// Byte range of a tag or text run in the template source.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Range {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<Range> for SourceSpan {
    fn from(range: Range) -> Self {
        SourceSpan::new(range.start.into(), std::cmp::max(range.len(), 1))
    }
}
