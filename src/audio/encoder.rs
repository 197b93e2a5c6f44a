use super::backend::AudioFrame;

/// Default encoded frame size (16 KiB, ~0.5s of 16kHz mono s16le)
pub const DEFAULT_FRAME_BYTES: usize = 16 * 1024;

/// Bounded streaming encoder
///
/// Encodes PCM samples as little-endian s16 bytes and releases them in
/// fixed-size frames as soon as a frame fills up. At most `frame_bytes - 1`
/// bytes are held between calls, so memory stays flat for the whole session.
#[derive(Debug)]
pub struct FrameEncoder {
    frame_bytes: usize,
    buffer: Vec<u8>,
    bytes_encoded: u64,
}

impl FrameEncoder {
    pub fn new(frame_bytes: usize) -> Self {
        // A zero-sized frame would never fill
        let frame_bytes = frame_bytes.max(2);

        Self {
            frame_bytes,
            buffer: Vec::with_capacity(frame_bytes),
            bytes_encoded: 0,
        }
    }

    /// Encode a frame and return every frame that is now complete
    pub fn push(&mut self, frame: &AudioFrame) -> Vec<Vec<u8>> {
        let mut ready = Vec::new();

        for sample in &frame.samples {
            self.buffer.extend_from_slice(&sample.to_le_bytes());

            if self.buffer.len() >= self.frame_bytes {
                let rest = self.buffer.split_off(self.frame_bytes);
                let full = std::mem::replace(&mut self.buffer, rest);
                ready.push(full);
            }
        }

        self.bytes_encoded += frame.samples.len() as u64 * 2;
        ready
    }

    /// Flush whatever is buffered, leaving the encoder empty
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Bytes waiting for the next frame to fill
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes encoded since creation
    pub fn bytes_encoded(&self) -> u64 {
        self.bytes_encoded
    }

    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }
}
