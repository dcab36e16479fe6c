//! Fire-and-forget notification sink.
//!
//! The ledger schedules booking/acceptance/rejection messages toward an
//! out-of-band delivery channel. Delivery failure is logged and never
//! propagated: a notification can never fail or delay a booking.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A single outbound message, addressed by the recipient's email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Delivery boundary. Implementations must not block the caller.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, note: Notification);
}

/// Queues notifications onto an unbounded channel drained by a spawned
/// task, decoupling delivery from the booking transaction.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    /// Creates the sink and its receiving half. The caller owns the
    /// receiver and decides what delivery means (SMTP relay, test
    /// collection, ...).
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Convenience: spawn a drain task that only logs each message.
    /// Useful when the embedding application has no mail relay wired up.
    pub fn spawn_logging() -> Self {
        let (sink, mut rx) = Self::new();
        tokio::spawn(async move {
            while let Some(note) = rx.recv().await {
                tracing::info!(recipient = %note.recipient, subject = %note.subject, "notification");
            }
        });
        sink
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&self, note: Notification) {
        // Receiver dropped means nobody is listening; the booking already
        // succeeded, so log and move on.
        if let Err(e) = self.tx.send(note) {
            tracing::warn!("Notification dropped: {e}");
        }
    }
}

/// Discards everything. For tests that don't inspect notifications.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn deliver(&self, _note: Notification) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_queues_messages() {
        let (sink, mut rx) = ChannelSink::new();
        sink.deliver(Notification {
            recipient: "patient@example.com".into(),
            subject: "Appointment Booked".into(),
            body: "Your appointment is booked.".into(),
        });
        let note = rx.try_recv().unwrap();
        assert_eq!(note.recipient, "patient@example.com");
        assert_eq!(note.subject, "Appointment Booked");
    }

    #[test]
    fn delivery_with_dropped_receiver_does_not_panic() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.deliver(Notification {
            recipient: "doctor@example.com".into(),
            subject: "New Appointment Scheduled".into(),
            body: "A patient booked a slot.".into(),
        });
    }
}
