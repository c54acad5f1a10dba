//! Collaborator traits.
//!
//! The core never touches hardware or the UI toolkit directly: durable
//! storage, the outbound message channel, the vibe motor and the backlight
//! are all reached through these seams. The dispatcher that owns the
//! controller provides the implementations.

pub mod channel;
pub mod feedback;
pub mod store;

pub use channel::{ChannelError, OutboundChannel};
pub use feedback::{Backlight, Haptics};
pub use store::{KeyValueStore, StoreError};

/// Everything the controller needs from its host, as one bound.
///
/// Blanket-implemented, so a host type only implements the three concern
/// traits.
pub trait Platform: Haptics + Backlight + OutboundChannel {}

impl<T: Haptics + Backlight + OutboundChannel> Platform for T {}
