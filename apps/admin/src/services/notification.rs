//! Notifications for whoever is watching the back office.
//!
//! A tokio broadcast channel: every subscriber sees every notification
//! published after it subscribed. Each notification is also logged.

use std::fmt;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Buffered notifications per subscriber before the slowest one lags.
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Info(String),
    Warning(String),
    /// A product fell under the configured minimum.
    StockBajo {
        codigo: String,
        nombre: String,
        unidades: i64,
        minimo: i64,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Info(message) | Notification::Warning(message) => {
                f.write_str(message)
            }
            Notification::StockBajo {
                codigo,
                nombre,
                unidades,
                minimo,
            } => write!(
                f,
                "Stock bajo: {} ({}) tiene {} unidades, mínimo {}",
                nombre, codigo, unidades, minimo
            ),
        }
    }
}

/// Publishes [`Notification`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct NotificationService {
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationService {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        NotificationService { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Logs and broadcasts `notification`; returns how many subscribers
    /// received it.
    pub fn publish(&self, notification: Notification) -> usize {
        match &notification {
            Notification::Info(message) => info!(message = %message, "Notification"),
            Notification::Warning(message) => warn!(message = %message, "Notification"),
            Notification::StockBajo {
                codigo,
                unidades,
                minimo,
                ..
            } => warn!(codigo = %codigo, unidades, minimo, "Low stock"),
        }

        match self.sender.send(notification) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("No notification subscribers");
                0
            }
        }
    }

    pub fn info(&self, message: impl Into<String>) -> usize {
        self.publish(Notification::Info(message.into()))
    }

    pub fn warning(&self, message: impl Into<String>) -> usize {
        self.publish(Notification::Warning(message.into()))
    }
}
