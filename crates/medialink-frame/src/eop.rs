use std::fmt;

use bytes::Bytes;

use crate::codec::to_hex;

/// End-of-packet terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Eop {
    /// A single byte, e.g. `0x7E` or `b'\n'`.
    Byte(u8),
    /// An exact byte sequence.
    Bytes(Bytes),
    /// Text compared byte-for-byte against its UTF-8 encoding.
    Text(String),
}

impl Eop {
    /// The bytes the terminator matches.
    pub fn pattern(&self) -> &[u8] {
        match self {
            Eop::Byte(byte) => std::slice::from_ref(byte),
            Eop::Bytes(bytes) => bytes,
            Eop::Text(text) => text.as_bytes(),
        }
    }

    /// A terminator must match at least one byte.
    pub fn is_valid(&self) -> bool {
        !self.pattern().is_empty()
    }
}

impl fmt::Display for Eop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eop::Byte(byte) => write!(f, "0x{byte:02X}"),
            Eop::Bytes(bytes) => f.write_str(&to_hex(bytes)),
            Eop::Text(text) => write!(f, "{text:?}"),
        }
    }
}

impl From<u8> for Eop {
    fn from(value: u8) -> Self {
        Eop::Byte(value)
    }
}

impl From<&[u8]> for Eop {
    fn from(value: &[u8]) -> Self {
        Eop::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Vec<u8>> for Eop {
    fn from(value: Vec<u8>) -> Self {
        Eop::Bytes(value.into())
    }
}

impl From<&str> for Eop {
    fn from(value: &str) -> Self {
        Eop::Text(value.to_string())
    }
}

impl From<String> for Eop {
    fn from(value: String) -> Self {
        Eop::Text(value)
    }
}

/// Outcome of scanning a buffer for a terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMatch {
    /// No complete terminator yet.
    Incomplete,
    /// Terminator found; the frame is `buf[..end]`, terminator included.
    Complete(usize),
    /// The terminator is empty and can never match.
    InvalidTerminator,
}

/// Incremental terminator search over a growing buffer.
///
/// Only bytes appended since the previous [`scan`](Self::scan) are examined.
/// The matcher keeps the length of the longest buffer suffix that is a
/// prefix of the terminator, so a terminator split across deliveries is
/// found once its last byte arrives.
#[derive(Debug, Clone)]
pub struct EopMatcher {
    pattern: Bytes,
    /// `fallback[i]`: longest proper prefix of `pattern[..=i]` that is also its suffix.
    fallback: Vec<usize>,
    partial: usize,
    scanned: usize,
}

impl EopMatcher {
    pub fn new(eop: &Eop) -> Self {
        let pattern = Bytes::copy_from_slice(eop.pattern());
        let fallback = build_fallback(&pattern);
        Self {
            pattern,
            fallback,
            partial: 0,
            scanned: 0,
        }
    }

    /// Scan the bytes of `buf` not seen yet.
    ///
    /// `buf` must be the same buffer as in previous calls, possibly with more
    /// bytes appended. A shorter buffer restarts the search from the start.
    pub fn scan(&mut self, buf: &[u8]) -> FrameMatch {
        if self.pattern.is_empty() {
            return FrameMatch::InvalidTerminator;
        }
        if buf.len() < self.scanned {
            self.reset();
        }

        for (offset, &byte) in buf.iter().enumerate().skip(self.scanned) {
            while self.partial > 0 && self.pattern[self.partial] != byte {
                self.partial = self.fallback[self.partial - 1];
            }
            if self.pattern[self.partial] == byte {
                self.partial += 1;
            }
            if self.partial == self.pattern.len() {
                self.partial = 0;
                self.scanned = offset + 1;
                return FrameMatch::Complete(offset + 1);
            }
        }

        self.scanned = buf.len();
        FrameMatch::Incomplete
    }

    /// Bytes at the end of the scanned buffer that start the terminator.
    pub fn partial(&self) -> usize {
        self.partial
    }

    /// Forget everything scanned so far.
    pub fn reset(&mut self) {
        self.partial = 0;
        self.scanned = 0;
    }
}

/// One-shot search for `eop` in `buf`.
pub fn find_eop(buf: &[u8], eop: &Eop) -> FrameMatch {
    EopMatcher::new(eop).scan(buf)
}

fn build_fallback(pattern: &[u8]) -> Vec<usize> {
    let mut fallback = vec![0; pattern.len()];
    let mut len = 0;
    for i in 1..pattern.len() {
        while len > 0 && pattern[i] != pattern[len] {
            len = fallback[len - 1];
        }
        if pattern[i] == pattern[len] {
            len += 1;
        }
        fallback[i] = len;
    }
    fallback
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn single_byte_terminator() {
        assert_eq!(find_eop(b"OK\nextra", &Eop::Byte(b'\n')), FrameMatch::Complete(3));
        assert_eq!(find_eop(b"OK", &Eop::Byte(b'\n')), FrameMatch::Incomplete);
    }

    #[test]
    fn text_terminator() {
        assert_eq!(
            find_eop(b"+CSQ: 20\r\nOK\r\n", &Eop::from("OK\r\n")),
            FrameMatch::Complete(14)
        );
    }

    #[test]
    fn empty_terminator_is_invalid() {
        assert_eq!(find_eop(b"abc", &Eop::from("")), FrameMatch::InvalidTerminator);
        assert_eq!(find_eop(b"abc", &Eop::from(Vec::new())), FrameMatch::InvalidTerminator);
        assert!(!Eop::from("").is_valid());
    }

    #[test]
    fn terminator_split_across_deliveries() {
        let eop = Eop::from(&[0x7E, 0x7E, 0x0D][..]);
        let mut matcher = EopMatcher::new(&eop);
        let mut buf = vec![0x01, 0x02, 0x7E];

        assert_eq!(matcher.scan(&buf), FrameMatch::Incomplete);
        assert_eq!(matcher.partial(), 1);

        buf.push(0x7E);
        assert_eq!(matcher.scan(&buf), FrameMatch::Incomplete);
        assert_eq!(matcher.partial(), 2);

        buf.extend_from_slice(&[0x0D, 0xAA]);
        assert_eq!(matcher.scan(&buf), FrameMatch::Complete(5));
    }

    #[test]
    fn overlapping_prefix_is_not_missed() {
        // "aab" inside "aaab": a naive restart after the mismatch would miss it.
        let mut matcher = EopMatcher::new(&Eop::from("aab"));
        assert_eq!(matcher.scan(b"aa"), FrameMatch::Incomplete);
        assert_eq!(matcher.scan(b"aaa"), FrameMatch::Incomplete);
        assert_eq!(matcher.scan(b"aaab"), FrameMatch::Complete(4));
    }

    #[test]
    fn shrunk_buffer_restarts_scan() {
        let mut matcher = EopMatcher::new(&Eop::Byte(b';'));
        assert_eq!(matcher.scan(b"abcdef"), FrameMatch::Incomplete);
        assert_eq!(matcher.scan(b"x;"), FrameMatch::Complete(2));
    }

    #[test]
    fn scanning_continues_after_a_match() {
        let mut matcher = EopMatcher::new(&Eop::Byte(b'\n'));
        let buf = b"a\nb\n";
        assert_eq!(matcher.scan(buf), FrameMatch::Complete(2));
        assert_eq!(matcher.scan(buf), FrameMatch::Complete(4));
        assert_eq!(matcher.scan(buf), FrameMatch::Incomplete);
    }

    #[test]
    fn display() {
        assert_eq!(Eop::Byte(0x0A).to_string(), "0x0A");
        assert_eq!(Eop::from(vec![0x0D, 0x0A]).to_string(), "0D 0A");
        assert_eq!(Eop::from("OK").to_string(), "\"OK\"");
    }

    proptest! {
        #[test]
        fn chunking_never_changes_the_match(
            body in proptest::collection::vec(any::<u8>().prop_filter("no 0xF0", |b| *b != 0xF0), 0..32),
            eop in proptest::collection::vec(any::<u8>(), 1..6),
            split in any::<prop::sample::Index>(),
        ) {
            // A body free of the first terminator byte cannot contain the terminator,
            // so the first match must end exactly after it.
            let mut eop = eop;
            eop[0] = 0xF0;
            let eop = Eop::from(eop);
            let mut wire = body.clone();
            wire.extend_from_slice(eop.pattern());
            let expected = FrameMatch::Complete(wire.len());

            let cut = split.index(wire.len());
            let mut matcher = EopMatcher::new(&eop);
            let first = matcher.scan(&wire[..cut]);
            prop_assert_eq!(first, FrameMatch::Incomplete);
            prop_assert_eq!(matcher.scan(&wire), expected);
            prop_assert_eq!(find_eop(&wire, &eop), expected);
        }
    }
}
