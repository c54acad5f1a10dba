//! Outbound message channel trait.
//!
//! Models the paired-device messaging service: one message in flight at a
//! time, delivery reported asynchronously. The host forwards the service's
//! callbacks to [`Controller::chunk_delivered`] /
//! [`Controller::chunk_failed`], and its one-shot timer expiry to
//! [`Controller::pacing_elapsed`].
//!
//! [`Controller::chunk_delivered`]: crate::controller::Controller::chunk_delivered
//! [`Controller::chunk_failed`]: crate::controller::Controller::chunk_failed
//! [`Controller::pacing_elapsed`]: crate::controller::Controller::pacing_elapsed

use wristsketch_protocol::transfer::ChunkMessage;

/// Delivery failure reasons, as reported by the messaging service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// A send is already in flight
    Busy,
    /// No paired device reachable
    Disconnected,
    /// Message exceeds the outbox capacity
    PayloadTooLarge,
    /// Unspecified service failure
    Internal,
}

/// One-at-a-time outbound message channel with asynchronous delivery
pub trait OutboundChannel {
    /// Hand one chunk message to the service.
    ///
    /// An `Ok` return means the message was accepted for delivery, not
    /// that it arrived; the delivery outcome comes back through the
    /// controller's callback handlers.
    fn send(&mut self, message: &ChunkMessage) -> Result<(), ChannelError>;

    /// Arm a one-shot timer that re-enters the controller via
    /// `pacing_elapsed` after `delay_ms`.
    fn schedule_resume(&mut self, delay_ms: u32);
}
