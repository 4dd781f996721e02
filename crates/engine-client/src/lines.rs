//! Reassembly of newline-delimited text from arbitrarily split chunks.

/// Holds the fragment of a line that has not seen its newline yet.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Prefix of `pending` already known to contain no newline.
    searched: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk exactly as it arrived.
    pub fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// Bytes received but not yet taken as lines.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Removes and returns the next complete line without its terminator
    /// (`\n` or `\r\n`). Invalid UTF-8 is replaced.
    pub fn next_line(&mut self) -> Option<String> {
        let Some(offset) = self.pending[self.searched..].iter().position(|&b| b == b'\n') else {
            self.searched = self.pending.len();
            return None;
        };
        let end = self.searched + offset;
        self.searched = 0;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Takes whatever is left as a final, unterminated line. Returns `None`
    /// when nothing is pending.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        self.searched = 0;
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}
