use std::ops::Range;

/// A single `bytes=` range request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=a-b`, both inclusive.
    Bounded { first: u64, last: u64 },
    /// `bytes=a-`
    From { first: u64 },
    /// `bytes=-n`, the final `n` bytes.
    Suffix { length: u64 },
}

impl ByteRange {
    /// Parse a `Range` header. Multi-range and non-byte units yield `None`.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let spec = value?.trim().strip_prefix("bytes=")?.trim();
        if spec.contains(',') {
            return None;
        }
        let (first, last) = spec.split_once('-')?;
        let (first, last) = (first.trim(), last.trim());

        match (first.is_empty(), last.is_empty()) {
            (false, false) => {
                let first: u64 = first.parse().ok()?;
                let last: u64 = last.parse().ok()?;
                (first <= last).then_some(ByteRange::Bounded { first, last })
            }
            (false, true) => Some(ByteRange::From {
                first: first.parse().ok()?,
            }),
            (true, false) => {
                let length: u64 = last.parse().ok()?;
                (length > 0).then_some(ByteRange::Suffix { length })
            }
            (true, true) => None,
        }
    }

    /// Exclusive byte range within content of `size` bytes, if satisfiable.
    pub fn resolve(self, size: u64) -> Option<Range<u64>> {
        let range = match self {
            ByteRange::Bounded { first, last } => first..last.saturating_add(1).min(size),
            ByteRange::From { first } => first..size,
            ByteRange::Suffix { length } => size.saturating_sub(length)..size,
        };
        (range.start < range.end).then_some(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            ByteRange::parse(Some("bytes=0-9")),
            Some(ByteRange::Bounded { first: 0, last: 9 })
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=5-")),
            Some(ByteRange::From { first: 5 })
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=-3")),
            Some(ByteRange::Suffix { length: 3 })
        );
    }

    #[test]
    fn test_parse_invalid() {
        for raw in ["bytes=9-0", "bytes=-", "items=0-1", "bytes=a-b", "bytes=0-1,4-5", "bytes=-0", ""] {
            assert_eq!(ByteRange::parse(Some(raw)), None, "{raw}");
        }
        assert_eq!(ByteRange::parse(None), None);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(ByteRange::Bounded { first: 2, last: 4 }.resolve(10), Some(2..5));
        assert_eq!(ByteRange::Bounded { first: 2, last: 40 }.resolve(10), Some(2..10));
        assert_eq!(ByteRange::From { first: 7 }.resolve(10), Some(7..10));
        assert_eq!(ByteRange::Suffix { length: 3 }.resolve(10), Some(7..10));
        assert_eq!(ByteRange::Suffix { length: 30 }.resolve(10), Some(0..10));
        assert_eq!(ByteRange::From { first: 10 }.resolve(10), None);
    }
}
