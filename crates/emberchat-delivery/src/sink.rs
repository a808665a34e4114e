// Frame sinks
//
// The loop writes frames through this seam. The API layer hands it a
// channel whose receiving half feeds the SSE response body, so peer
// disconnect surfaces here as a closed channel. CollectingSink keeps
// frames in memory for tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::frame::DeliveryFrame;

/// The peer has gone away; the loop stops silently when it sees this
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

impl std::fmt::Display for SinkClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame sink closed")
    }
}

impl std::error::Error for SinkClosed {}

/// Where delivery frames go
#[async_trait]
pub trait FrameSink: Send {
    /// Deliver one frame; Err(SinkClosed) when the peer is gone
    async fn send(&mut self, frame: DeliveryFrame) -> Result<(), SinkClosed>;

    /// Whether the peer has gone away. Checked at the top of every cycle,
    /// so disconnect detection latency is bounded by one check interval.
    fn is_closed(&self) -> bool;
}

// ============================================================================
// ChannelSink - feeds an SSE response body
// ============================================================================

/// Sink over an mpsc channel; dropping the receiver closes it
pub struct ChannelSink {
    tx: mpsc::Sender<DeliveryFrame>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<DeliveryFrame>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: DeliveryFrame) -> Result<(), SinkClosed> {
        self.tx.send(frame).await.map_err(|_| SinkClosed)
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ============================================================================
// CollectingSink - keeps frames in memory for testing
// ============================================================================

/// Sink that records every frame, never closes
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub frames: Vec<DeliveryFrame>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames of a given discriminant, for cadence assertions
    pub fn count_heartbeats(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| matches!(frame, DeliveryFrame::Heartbeat))
            .count()
    }
}

#[async_trait]
impl FrameSink for CollectingSink {
    async fn send(&mut self, frame: DeliveryFrame) -> Result<(), SinkClosed> {
        self.frames.push(frame);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_reports_closed_receiver() {
        let (tx, rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx);

        sink.send(DeliveryFrame::Connected).await.unwrap();
        assert!(!sink.is_closed());

        drop(rx);
        assert!(sink.is_closed());
        assert_eq!(
            sink.send(DeliveryFrame::Heartbeat).await,
            Err(SinkClosed)
        );
    }
}
