//! One-shot chunked transfer of the sketch bitmap to a paired device.
//!
//! The outbound channel takes one message at a time and reports delivery
//! asynchronously, so a transfer is a session: the sender emits the chunk at
//! the current position, waits for the delivery callback, advances, and
//! repeats until the final chunk is acknowledged. [`TransferSession`] is the
//! pure state machine for that protocol; actually putting bytes on the wire
//! is the caller's job.

use heapless::Vec;

/// Maximum payload bytes per transfer chunk.
///
/// Sized under the practical outbox ceiling of the paired-device messaging
/// channel.
pub const MAX_CHUNK_BYTES: usize = 512;

/// Outbound dictionary key carrying the chunk byte blob.
pub const IMAGE_DATA_KEY: u32 = 1;

/// Outbound dictionary key carrying the chunk status tag.
pub const CHUNK_STATUS_KEY: u32 = 2;

/// Position of a chunk within a transfer session.
///
/// The receiver reassembles the image from these tags alone: `First` resets
/// its buffer, `Mid` appends, `Last` appends and finalizes, and `Only`
/// resets, appends and finalizes in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChunkStatus {
    /// First chunk of a multi-chunk session
    First = 1,
    /// Interior chunk
    Mid = 2,
    /// Final chunk of a multi-chunk session
    Last = 3,
    /// Sole chunk of a session that fits in one message
    Only = 4,
}

impl ChunkStatus {
    /// Get the status as its wire byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a status from its wire byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ChunkStatus::First),
            2 => Some(ChunkStatus::Mid),
            3 => Some(ChunkStatus::Last),
            4 => Some(ChunkStatus::Only),
            _ => None,
        }
    }

    /// Check if this chunk opens a session
    pub fn is_first(self) -> bool {
        matches!(self, ChunkStatus::First | ChunkStatus::Only)
    }

    /// Check if this chunk closes a session
    pub fn is_final(self) -> bool {
        matches!(self, ChunkStatus::Last | ChunkStatus::Only)
    }
}

/// Errors from transfer session handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// Session started over an empty buffer
    Empty,
    /// Chunk payload exceeds [`MAX_CHUNK_BYTES`]
    PayloadTooLarge,
}

/// A chunk's location within the image buffer, plus its status tag.
///
/// Chunks carry offsets rather than bytes so the session never has to hold
/// a copy of the image; the caller slices the live bitmap when it builds
/// the outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Chunk {
    /// Byte offset of this chunk in the image buffer
    pub offset: usize,
    /// Chunk length in bytes (at most [`MAX_CHUNK_BYTES`])
    pub len: usize,
    /// Status tag for the receiver
    pub status: ChunkStatus,
}

impl Chunk {
    /// Byte range of this chunk in the image buffer
    pub fn range(&self) -> core::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// An assembled outbound message: status tag plus payload bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMessage {
    /// Status tag for the receiver
    pub status: ChunkStatus,
    /// Payload data
    pub payload: Vec<u8, MAX_CHUNK_BYTES>,
}

impl ChunkMessage {
    /// Create a message with the given status and payload
    pub fn new(status: ChunkStatus, payload: &[u8]) -> Result<Self, TransferError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| TransferError::PayloadTooLarge)?;

        Ok(Self {
            status,
            payload: payload_vec,
        })
    }
}

/// Result of acknowledging a delivered chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferAck {
    /// More to send: the next chunk to put on the wire
    Next(Chunk),
    /// Final chunk delivered; the session is complete
    Complete,
}

/// State machine for one chunked transfer session.
///
/// The position is monotonic non-decreasing within a session and the chunk
/// lengths partition the buffer exactly: no gaps, no overlap, summing to
/// `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferSession {
    position: usize,
    total: usize,
    active: bool,
}

impl TransferSession {
    /// Start a session over a buffer of `total` bytes
    pub fn begin(total: usize) -> Result<Self, TransferError> {
        if total == 0 {
            return Err(TransferError::Empty);
        }
        Ok(Self {
            position: 0,
            total,
            active: true,
        })
    }

    /// The chunk waiting to be sent, or `None` once the session has ended
    pub fn current(&self) -> Option<Chunk> {
        if self.active {
            Some(self.chunk_at(self.position))
        } else {
            None
        }
    }

    /// Record confirmed delivery of the current chunk.
    ///
    /// Advances the position and returns the next chunk to send, or
    /// [`TransferAck::Complete`] once the final chunk has been delivered.
    pub fn acknowledge(&mut self) -> TransferAck {
        if !self.active {
            return TransferAck::Complete;
        }
        if self.position + MAX_CHUNK_BYTES < self.total {
            self.position += MAX_CHUNK_BYTES;
            TransferAck::Next(self.chunk_at(self.position))
        } else {
            self.active = false;
            TransferAck::Complete
        }
    }

    /// Abort the session (delivery failure). No retry, no partial resume.
    pub fn abort(&mut self) {
        self.active = false;
    }

    /// Check whether the session still has chunks outstanding
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current chunk position in bytes
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total session length in bytes
    pub fn total(&self) -> usize {
        self.total
    }

    /// Delivery progress as a percentage of bytes positioned
    pub fn progress_percent(&self) -> u8 {
        (self.position * 100 / self.total) as u8
    }

    fn chunk_at(&self, offset: usize) -> Chunk {
        let remaining = self.total - offset;
        let len = remaining.min(MAX_CHUNK_BYTES);
        let status = if offset == 0 {
            if len == self.total {
                ChunkStatus::Only
            } else {
                ChunkStatus::First
            }
        } else if offset + len >= self.total {
            ChunkStatus::Last
        } else {
            ChunkStatus::Mid
        };
        Chunk {
            offset,
            len,
            status,
        }
    }
}
