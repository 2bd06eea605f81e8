//! Incremental decoder for the upstream event stream framing.
//!
//! The stream is a sequence of SSE-style frames: one or more `data: <payload>`
//! lines terminated by a blank line. Network reads split frames arbitrarily,
//! so bytes are buffered until a full frame is available. Frames are only
//! decoded as UTF-8 once complete; the delimiter is ASCII, so a multi-byte
//! character can never straddle two frames.

const FRAME_DELIMITER: &[u8] = b"\n\n";

/// One complete frame's data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// `data:` lines joined with `\n`.
    pub data: String,
}

/// Buffering frame decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Buffer prefix already searched for a delimiter.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns every frame completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Frame> {
        // CRLF streams are normalised to LF so one delimiter covers both.
        self.buffer.extend(bytes.iter().copied().filter(|&b| b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.find_delimiter() {
            let raw: Vec<u8> = self.buffer.drain(..end + FRAME_DELIMITER.len()).collect();
            self.scanned = 0;
            if let Some(frame) = parse_frame(&raw[..end]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flushes a trailing frame that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<Frame> {
        let raw = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        parse_frame(&raw)
    }

    /// Bytes buffered while waiting for the rest of a frame.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn find_delimiter(&mut self) -> Option<usize> {
        // Back up one byte: the first half of the delimiter may have been the
        // last byte seen by the previous scan.
        let start = self.scanned.saturating_sub(FRAME_DELIMITER.len() - 1);
        let found = self.buffer[start..]
            .windows(FRAME_DELIMITER.len())
            .position(|w| w == FRAME_DELIMITER)
            .map(|pos| start + pos);
        if found.is_none() {
            self.scanned = self.buffer.len();
        }
        found
    }
}

fn parse_frame(raw: &[u8]) -> Option<Frame> {
    let text = String::from_utf8_lossy(raw);
    let mut data_lines = Vec::new();

    for line in text.split('\n') {
        // Comments and non-data fields (event:, id:, retry:) carry nothing we use.
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if data_lines.is_empty() {
        return None;
    }
    Some(Frame {
        data: data_lines.join("\n"),
    })
}
