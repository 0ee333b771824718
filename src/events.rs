//! Wallet lifecycle events and session notices
//!
//! Inbound: the extension announces lifecycle changes as messages whose
//! `name` carries the `starkey-` tag. [`EventBus`] turns those into typed
//! [`WalletEvent`]s on a broadcast channel the session subscribes to.
//!
//! Outbound: the session reports what the UI should do (show a toast,
//! navigate, react to a new login) as [`SessionNotice`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Prefix shared by every extension event name
pub const EVENT_PREFIX: &str = "starkey-";

const CHANNEL_CAPACITY: usize = 64;

/// Extension-originated lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEvent {
    /// The extension became available (again)
    #[serde(rename = "starkey-extension-installed")]
    ExtensionInstalled,
    /// The active account changed
    #[serde(rename = "starkey-wallet-updated")]
    WalletUpdated,
    /// The wallet disconnected this site
    #[serde(rename = "starkey-wallet-disconnected")]
    WalletDisconnected,
    /// The extension popup closed
    #[serde(rename = "starkey-window-removed")]
    WindowRemoved,
}

impl WalletEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WalletEvent::ExtensionInstalled => "starkey-extension-installed",
            WalletEvent::WalletUpdated => "starkey-wallet-updated",
            WalletEvent::WalletDisconnected => "starkey-wallet-disconnected",
            WalletEvent::WindowRemoved => "starkey-window-removed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "starkey-extension-installed" => Some(WalletEvent::ExtensionInstalled),
            "starkey-wallet-updated" => Some(WalletEvent::WalletUpdated),
            "starkey-wallet-disconnected" => Some(WalletEvent::WalletDisconnected),
            "starkey-window-removed" => Some(WalletEvent::WindowRemoved),
            _ => None,
        }
    }

    /// Decode a raw message payload (`{"name": "starkey-...", ...}`)
    ///
    /// Messages without the tag, and tagged messages of unknown kinds, yield
    /// `None`.
    pub fn from_message(message: &Value) -> Option<Self> {
        let name = message.get("name")?.as_str()?;
        if !name.starts_with(EVENT_PREFIX) {
            return None;
        }
        let event = Self::from_name(name);
        if event.is_none() {
            tracing::debug!(name = %name, "Ignoring unknown StarKey event");
        }
        event
    }
}

/// Typed inbound channel for wallet events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WalletEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.sender.subscribe()
    }

    /// Publish a typed event; returns the number of subscribers reached
    pub fn publish(&self, event: WalletEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Publish a raw message if it is a recognised wallet event
    pub fn publish_message(&self, message: &Value) -> Option<WalletEvent> {
        let event = WalletEvent::from_message(message)?;
        tracing::info!(event = event.name(), "StarKey event");
        self.publish(event);
        Some(event)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// User-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Destructive,
        }
    }
}

/// Outbound notice from the session to its consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionNotice {
    /// A login completed and the session cookie is set
    Connected {
        account: String,
        timestamp: DateTime<Utc>,
    },
    Toast(Notification),
    /// The UI should move to this route
    Navigate { route: String },
}
