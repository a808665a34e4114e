// The delivery loop
//
// One instance per open SSE connection. Single-threaded cooperative with
// respect to its connection: the sleep between poll cycles is the only
// suspension point. Instances for other connections run as independent
// tasks.
//
// Per-connection guarantees:
// - events go out in strictly increasing id order
// - typing frames go out at most once per strictly-increasing timestamp
// - no ordering between the event and typing channels
//
// Heartbeats follow a fixed cadence from connection start (15s, 30s, ...)
// rather than resetting from the previous emission, so a long event drain
// cannot push the next heartbeat past a proxy's idle timeout.

use std::sync::Arc;
use tokio::time::{sleep, Instant};
use uuid::Uuid;

use emberchat_core::{EventStore, Result, TypingStore};

use crate::config::DeliveryConfig;
use crate::frame::DeliveryFrame;
use crate::sink::FrameSink;

/// Why a delivery loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Peer went away; nothing more to say to it
    Disconnected,
    /// Wall-clock cap reached; a reconnect hint was sent
    MaxDurationReached,
}

/// Final state of a finished loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// High-water-mark at the moment the loop ended
    pub last_event_id: u64,
    pub reason: EndReason,
}

/// The per-connection delivery state machine
pub struct DeliveryLoop {
    events: Arc<dyn EventStore>,
    typing: Arc<dyn TypingStore>,
    config: DeliveryConfig,
}

impl DeliveryLoop {
    pub fn new(
        events: Arc<dyn EventStore>,
        typing: Arc<dyn TypingStore>,
        config: DeliveryConfig,
    ) -> Self {
        Self {
            events,
            typing,
            config,
        }
    }

    /// Drive one connection until the peer disconnects, the wall-clock cap
    /// is reached, or a store read fails.
    ///
    /// The caller has already validated that the widget and session exist.
    /// A store error propagates out so the connection closes and the client
    /// reconnects; it is transient by contract.
    pub async fn run(
        &self,
        widget_id: Uuid,
        session_id: Uuid,
        last_event_id: u64,
        sink: &mut dyn FrameSink,
    ) -> Result<DeliveryOutcome> {
        let started = Instant::now();
        let mut last_event_id = last_event_id;
        let mut typing_watermark: u64 = 0;
        let mut next_heartbeat = started + self.config.heartbeat_interval;

        tracing::debug!(%widget_id, %session_id, last_event_id, "delivery loop started");

        if sink.send(DeliveryFrame::Connected).await.is_err() {
            return Ok(DeliveryOutcome {
                last_event_id,
                reason: EndReason::Disconnected,
            });
        }

        loop {
            if sink.is_closed() {
                tracing::debug!(%session_id, last_event_id, "peer disconnected");
                return Ok(DeliveryOutcome {
                    last_event_id,
                    reason: EndReason::Disconnected,
                });
            }

            if started.elapsed() >= self.config.max_connection {
                // Designed handshake, not an error: hand the client its
                // resume cursor and let it re-open immediately.
                let _ = sink
                    .send(DeliveryFrame::Reconnect { last_event_id })
                    .await;
                tracing::debug!(%session_id, last_event_id, "max connection duration reached");
                return Ok(DeliveryOutcome {
                    last_event_id,
                    reason: EndReason::MaxDurationReached,
                });
            }

            let events = self
                .events
                .events_since(widget_id, session_id, last_event_id)
                .await?;
            for event in events {
                let id = event.id;
                if sink.send(DeliveryFrame::Event(event)).await.is_err() {
                    return Ok(DeliveryOutcome {
                        last_event_id,
                        reason: EndReason::Disconnected,
                    });
                }
                last_event_id = id;
            }

            if let Some(signal) = self.typing.typing(widget_id, session_id).await? {
                if signal.timestamp > typing_watermark {
                    if sink
                        .send(DeliveryFrame::Typing {
                            timestamp: signal.timestamp,
                            operator_id: signal.operator_id,
                        })
                        .await
                        .is_err()
                    {
                        return Ok(DeliveryOutcome {
                            last_event_id,
                            reason: EndReason::Disconnected,
                        });
                    }
                    typing_watermark = signal.timestamp;
                }
            }

            if Instant::now() >= next_heartbeat {
                if sink.send(DeliveryFrame::Heartbeat).await.is_err() {
                    return Ok(DeliveryOutcome {
                        last_event_id,
                        reason: EndReason::Disconnected,
                    });
                }
                next_heartbeat += self.config.heartbeat_interval;
            }

            sleep(self.config.check_interval).await;
        }
    }
}
