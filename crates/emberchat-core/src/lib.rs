// Widget Event Delivery Abstractions
//
// This crate provides the backend-agnostic pieces of the widget event
// delivery subsystem: domain entities, the store traits the delivery loop
// and HTTP layer are written against, and the error taxonomy.
//
// Key design decisions:
// - Stores are traits (EventStore, TypingStore, NotificationStore) so the
//   cache backend is injected, never a process-wide singleton
// - Session mode transitions live on WidgetSession as fallible methods;
//   event emission for transitions is the caller's job so subscribers
//   observe every transition through the stores
// - Events are ephemeral by contract: TTL-bounded cache records, never
//   written to durable storage

// Domain entity types
pub mod event;
pub mod session;
pub mod widget;

pub mod error;
pub mod traits;

// In-memory implementations for the default binary wiring and testing
pub mod memory;

// Re-exports for convenience
pub use error::{DeliveryError, Result};
pub use event::{event_types, Notification, TypingSignal, WidgetEvent};
pub use memory::{InMemorySessionDirectory, InMemoryWidgetDirectory};
pub use session::{SessionMode, WidgetSession};
pub use traits::{
    EventStore, NotificationStore, SessionDirectory, TypingStore, WidgetDirectory,
};
pub use widget::Widget;
