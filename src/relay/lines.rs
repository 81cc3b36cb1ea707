//! Newline framing across arbitrary read boundaries.

/// Splits a byte stream into complete lines, carrying any partial tail.
///
/// The carry is kept as bytes. `\n` never appears inside a multi-byte UTF-8
/// sequence, so a character split across two reads is whole again by the time
/// its line is decoded.
#[derive(Debug, Default)]
pub struct LineBuffer {
    carry: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read and return every line it completed, in order.
    ///
    /// Returned lines have the `\n` (and a trailing `\r`, if any) removed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // Only the new bytes can hold a newline; the carry never does.
        let Some(offset) = chunk.iter().rposition(|b| *b == b'\n') else {
            self.carry.extend_from_slice(chunk);
            return Vec::new();
        };
        let last_newline = self.carry.len() + offset;
        self.carry.extend_from_slice(chunk);

        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);

        complete[..last_newline]
            .split(|b| *b == b'\n')
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect()
    }

    /// Bytes of the incomplete trailing line.
    pub fn carry(&self) -> &[u8] {
        &self.carry
    }

    /// Whether an incomplete line is pending.
    pub fn is_empty(&self) -> bool {
        self.carry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_lines_are_returned_in_order() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"one\ntwo\n"), vec!["one", "two"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_line_waits_for_its_newline() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"data: {\"type\":").is_empty());
        assert_eq!(buf.carry(), b"data: {\"type\":");
        assert_eq!(
            buf.push(b"\"other\"}\nnext"),
            vec!["data: {\"type\":\"other\"}"]
        );
        assert_eq!(buf.carry(), b"next");
    }

    #[test]
    fn blank_lines_are_kept() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"a\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn crlf_is_stripped() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"a\r\nb\r"), vec!["a"]);
        assert_eq!(buf.push(b"\n"), vec!["b"]);
    }

    #[test]
    fn multibyte_character_split_across_reads() {
        let text = "data: ☀️ Météo\n";
        let bytes = text.as_bytes();
        // Split inside the three-byte sun glyph.
        let (a, b) = bytes.split_at(8);
        let mut buf = LineBuffer::new();
        assert!(buf.push(a).is_empty());
        assert_eq!(buf.push(b), vec!["data: ☀️ Météo"]);
    }

    #[test]
    fn every_split_point_yields_the_same_lines() {
        let input = "data: {\"a\":1}\nnoise\n\ndata: ünï\n".as_bytes();
        let expected = LineBuffer::new().push(input);
        for split in 0..=input.len() {
            let mut buf = LineBuffer::new();
            let mut lines = buf.push(&input[..split]);
            lines.extend(buf.push(&input[split..]));
            assert_eq!(lines, expected, "split at {split}");
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn long_line_fed_one_byte_at_a_time() {
        let line = format!("data: {}", "x".repeat(4096));
        let mut buf = LineBuffer::new();
        for byte in line.as_bytes() {
            assert!(buf.push(std::slice::from_ref(byte)).is_empty());
        }
        assert_eq!(buf.carry().len(), line.len());
        assert_eq!(buf.push(b"\nrest"), vec![line]);
        assert_eq!(buf.carry(), b"rest");
    }
}
