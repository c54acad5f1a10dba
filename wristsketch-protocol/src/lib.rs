//! Image transfer and persistence protocol for wristsketch
//!
//! This crate defines the two chunked representations of the sketch bitmap:
//! the one-shot transfer stream sent to a paired device, and the entry
//! layout used for durable key-value storage. Both partition the same byte
//! buffer without gaps or overlap, under different size caps:
//!
//! ```text
//! transfer:  ┌── 512B ──┬── 512B ──┬─ ... ─┬─ tail ─┐
//!            │  FIRST   │   MID    │  MID  │  LAST  │
//!            └──────────┴──────────┴───────┴────────┘
//! persist:   ┌─ 256B ─┬─ 256B ─┬─ ... ─┬─ tail ─┐   sequential keys
//!            │ base+0 │ base+1 │       │ base+n │   from a fixed base
//!            └────────┴────────┴───────┴────────┘
//! ```
//!
//! Nothing in here touches hardware or performs IO; the core crate drives
//! these state machines through its channel and store traits.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod persist;
pub mod transfer;

pub use persist::{entry_count, entry_len, entry_range, MAX_ENTRY_BYTES};
pub use transfer::{
    Chunk, ChunkMessage, ChunkStatus, TransferAck, TransferError, TransferSession,
    MAX_CHUNK_BYTES,
};
