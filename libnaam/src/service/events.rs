//! In-process event bus
//!
//! Services and the session manager publish what happened; front ends
//! subscribe to refresh their views. Built on `tokio::sync::broadcast`, so
//! any number of subscribers can listen and an emit with nobody listening
//! is dropped on the spot.
//!
//! # Example
//!
//! ```no_run
//! use libnaam::service::events::{Event, EventBus};
//!
//! # async fn example() {
//! let bus = EventBus::new(100);
//! let mut receiver = bus.subscribe();
//!
//! bus.emit(Event::LoggedOut);
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{EngagementAction, FeedKind, UserRole};

pub type EventReceiver = broadcast::Receiver<Event>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` is the per-subscriber buffer; lagging subscribers lose
    /// the oldest events first.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Publish an event without blocking
    pub fn emit(&self, event: Event) {
        // Err only means nobody is subscribed
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// OTP verification succeeded and the session was persisted
    LoggedIn { user_id: String, role: UserRole },

    /// The user logged out
    LoggedOut,

    /// The server rejected the token; every screen must return to login
    SessionInvalidated { reason: String },

    /// The cached profile was overwritten after a successful PATCH
    ProfileUpdated { user_id: String },

    LandDetailsSubmitted { farmer_id: String },

    CollectionCreated { entry_id: String },

    /// A feed counter adopted the server's value
    EngagementReconciled {
        kind: FeedKind,
        id: String,
        action: EngagementAction,
        server_count: u64,
    },

    /// A request failed in a way the user should hear about
    RequestFailed { operation: String, message: String },
}
