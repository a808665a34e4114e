// SSE Delivery Loop
//
// This crate drives one long-lived widget connection: poll the event and
// typing stores on a fixed interval, push new frames through a sink, keep
// the connection alive with heartbeats, and cut it off at a wall-clock cap
// with a reconnect hint.
//
// Key design decisions:
// - Transport-agnostic via FrameSink: the state machine is tested with
//   paused tokio time, no HTTP involved
// - Cooperative polling instead of pub/sub fan-out; delivery latency is
//   bounded by one check interval
// - Peer disconnect is polled at the top of each cycle, so detection
//   latency is bounded by the same interval
// - The wall-clock cap is a pure timer independent of the transport's own
//   connection lifetime limits

pub mod config;
pub mod frame;
pub mod r#loop;
pub mod sink;

pub use config::DeliveryConfig;
pub use frame::DeliveryFrame;
pub use r#loop::{DeliveryLoop, DeliveryOutcome, EndReason};
pub use sink::{ChannelSink, CollectingSink, FrameSink, SinkClosed};
