//! Parsing of the `Range` request header for a single byte range.
//!
//! Only one range per request is honoured. Requests asking for several ranges, or carrying a
//! header that can't be parsed, are answered with the whole file, which RFC 9110 permits.

use hyper::header::HeaderValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ByteRange {
    /// Serve the complete representation.
    Full,
    /// Serve `start..=end`.
    Partial { start: u64, end: u64 },
    /// The range lies beyond the end of the file.
    Unsatisfiable,
}

impl ByteRange {
    pub(super) fn parse(header: Option<&HeaderValue>, len: u64) -> ByteRange {
        let spec = match header.and_then(|value| value.to_str().ok()) {
            Some(value) => value.trim(),
            None => return ByteRange::Full,
        };

        let spec = match spec.split_once('=') {
            Some((unit, spec)) if unit.trim().eq_ignore_ascii_case("bytes") => spec.trim(),
            _ => return ByteRange::Full,
        };

        if spec.contains(',') {
            return ByteRange::Full;
        }

        let (first, last) = match spec.split_once('-') {
            Some((first, last)) => (first.trim(), last.trim()),
            None => return ByteRange::Full,
        };

        if first.is_empty() {
            // suffix range, the last `n` bytes
            return match last.parse::<u64>() {
                Ok(0) => ByteRange::Unsatisfiable,
                Ok(_) if len == 0 => ByteRange::Unsatisfiable,
                Ok(n) => ByteRange::Partial {
                    start: len.saturating_sub(n),
                    end: len - 1,
                },
                Err(_) => ByteRange::Full,
            };
        }

        let start = match first.parse::<u64>() {
            Ok(start) => start,
            Err(_) => return ByteRange::Full,
        };
        let end = if last.is_empty() {
            None
        } else {
            match last.parse::<u64>() {
                Ok(end) if end >= start => Some(end),
                _ => return ByteRange::Full,
            }
        };

        if start >= len {
            return ByteRange::Unsatisfiable;
        }

        ByteRange::Partial {
            start,
            end: end.map_or(len - 1, |end| end.min(len - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ByteRange;
    use hyper::header::HeaderValue;

    fn parse(value: &str, len: u64) -> ByteRange {
        ByteRange::parse(Some(&HeaderValue::from_str(value).unwrap()), len)
    }

    #[test]
    fn missing_header_is_full() {
        assert_eq!(ByteRange::parse(None, 10), ByteRange::Full);
    }

    #[test]
    fn bounded_open_and_suffix_ranges() {
        assert_eq!(parse("bytes=0-4", 10), ByteRange::Partial { start: 0, end: 4 });
        assert_eq!(parse("bytes=6-", 10), ByteRange::Partial { start: 6, end: 9 });
        assert_eq!(parse("bytes=-3", 10), ByteRange::Partial { start: 7, end: 9 });
        assert_eq!(parse("bytes=-30", 10), ByteRange::Partial { start: 0, end: 9 });
        assert_eq!(parse("bytes=2-400", 10), ByteRange::Partial { start: 2, end: 9 });
        assert_eq!(parse("Bytes = 1 - 2", 10), ByteRange::Partial { start: 1, end: 2 });
    }

    #[test]
    fn unsatisfiable_ranges() {
        assert_eq!(parse("bytes=10-", 10), ByteRange::Unsatisfiable);
        assert_eq!(parse("bytes=-0", 10), ByteRange::Unsatisfiable);
        assert_eq!(parse("bytes=0-", 0), ByteRange::Unsatisfiable);
    }

    #[test]
    fn ignored_ranges_serve_everything() {
        assert_eq!(parse("bytes=0-1,4-5", 10), ByteRange::Full);
        assert_eq!(parse("items=0-1", 10), ByteRange::Full);
        assert_eq!(parse("bytes=5-2", 10), ByteRange::Full);
        assert_eq!(parse("bytes=a-b", 10), ByteRange::Full);
        assert_eq!(parse("bytes=", 10), ByteRange::Full);
    }
}
