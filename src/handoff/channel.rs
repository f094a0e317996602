//! Handoff Channel

use std::time::Duration;

use jiff::Timestamp;
use tokio::{
    sync::mpsc,
    time::{Instant, timeout_at},
};
use tracing::{debug, info};

use crate::handoff::{
    HandoffError, HandoffMessage, HandoffOutcome, HandoffState, IgnoreReason, PaymentAttempt,
    PaymentConfirmation,
};

/// Create a connected sender and receiver for payment surface messages.
#[must_use]
pub fn handoff_channel(capacity: usize) -> (HandoffSender, HandoffChannel) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    (HandoffSender { tx }, HandoffChannel { rx })
}

/// The payment surface's end of the channel.
#[derive(Debug, Clone)]
pub struct HandoffSender {
    tx: mpsc::Sender<HandoffMessage>,
}

impl HandoffSender {
    /// Post a parsed message.
    ///
    /// # Errors
    ///
    /// [`HandoffError::ChannelClosed`] if nobody is listening.
    pub async fn post(&self, message: HandoffMessage) -> Result<(), HandoffError> {
        self.tx
            .send(message)
            .await
            .map_err(|_closed| HandoffError::ChannelClosed)
    }

    /// Parse and post a raw message.
    ///
    /// # Errors
    ///
    /// [`HandoffError::MalformedMessage`] or [`HandoffError::ChannelClosed`].
    pub async fn post_raw(&self, raw: &str) -> Result<(), HandoffError> {
        self.post(HandoffMessage::parse(raw)?).await
    }
}

/// The checkout's end of the channel.
#[derive(Debug)]
pub struct HandoffChannel {
    rx: mpsc::Receiver<HandoffMessage>,
}

impl HandoffChannel {
    /// Wait for the surface to settle an open attempt.
    ///
    /// Messages that do not belong to the attempt are skipped. Dropping every sender is
    /// treated as the user closing the surface.
    ///
    /// # Errors
    ///
    /// [`HandoffError::Cancelled`], [`HandoffError::PaymentTimeout`], or
    /// [`HandoffError::InvalidTransition`] when the attempt is not awaiting the user.
    pub async fn await_outcome(
        &mut self,
        attempt: &mut PaymentAttempt,
    ) -> Result<PaymentConfirmation, HandoffError> {
        let Some(remaining) = attempt.remaining(Timestamp::now()) else {
            return Err(HandoffError::InvalidTransition {
                state: attempt.state(),
                action: "await the payment surface",
            });
        };

        let deadline = Instant::now() + Duration::try_from(remaining).unwrap_or(Duration::ZERO);

        loop {
            let Ok(received) = timeout_at(deadline, self.rx.recv()).await else {
                attempt.time_out();

                info!(attempt = %attempt.id(), "payment window elapsed");

                return Err(HandoffError::PaymentTimeout);
            };

            let Some(message) = received else {
                attempt.surface_closed();

                return Err(HandoffError::Cancelled);
            };

            match attempt.receive(message, Timestamp::now()) {
                HandoffOutcome::Completed(confirmation) => return Ok(confirmation),
                HandoffOutcome::Cancelled => return Err(HandoffError::Cancelled),
                HandoffOutcome::Ignored(IgnoreReason::Late) => {
                    return Err(HandoffError::PaymentTimeout);
                }
                HandoffOutcome::Ignored(reason) => {
                    debug!(attempt = %attempt.id(), ?reason, "ignoring handoff message");

                    if attempt.state() != HandoffState::AwaitingUserAction {
                        return Err(HandoffError::InvalidTransition {
                            state: attempt.state(),
                            action: "await the payment surface",
                        });
                    }
                }
            }
        }
    }
}
