//! Payment Handoff
//!
//! Tracks a single attempt to collect payment through the provider's checkout surface,
//! from order creation until the surface reports back, is closed, or times out.

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use thiserror::Error;
use uuid::Uuid;

mod channel;
mod messages;

pub use channel::{HandoffChannel, HandoffSender, handoff_channel};
pub use messages::{HandoffMessage, PaymentConfirmation};

/// How long the payment surface may stay open before the attempt times out.
pub const DEFAULT_PAYMENT_WINDOW: SignedDuration = SignedDuration::from_mins(10);

/// Where a payment attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandoffState {
    /// Nothing has happened yet.
    Idle,

    /// The order is being created with the provider.
    AwaitingProvider,

    /// The payment surface is open and the user is expected to act.
    AwaitingUserAction,

    /// The surface reported a successful payment.
    Completed,

    /// The user dismissed or closed the surface.
    Cancelled,

    /// The surface was open for longer than the payment window.
    TimedOut,

    /// The order could not be created, the surface could not open, or the payment was
    /// rejected on verification.
    Failed,
}

impl HandoffState {
    /// Whether no further message can change the attempt.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::TimedOut | Self::Failed
        )
    }
}

impl fmt::Display for HandoffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingProvider => "awaiting_provider",
            Self::AwaitingUserAction => "awaiting_user_action",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        };

        f.write_str(name)
    }
}

/// Errors raised while driving a payment attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandoffError {
    /// The action is not allowed in the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// State the attempt was in.
        state: HandoffState,

        /// Action that was attempted.
        action: &'static str,
    },

    /// The browser refused to open the payment surface.
    #[error("payment window was blocked; allow pop-ups and try again")]
    PopupBlocked,

    /// The payment window elapsed without a result.
    #[error("payment timed out")]
    PaymentTimeout,

    /// The attempt already completed and cannot be retried.
    #[error("payment attempt already completed")]
    AttemptCompleted,

    /// The surface posted something that is not a valid result.
    #[error("malformed handoff message: {0}")]
    MalformedMessage(String),

    /// The user cancelled the payment.
    #[error("payment cancelled")]
    Cancelled,

    /// The receiving end of the handoff channel is gone.
    #[error("handoff channel closed")]
    ChannelClosed,
}

/// Why a received message did not change the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The message names a different attempt.
    ForeignAttempt,

    /// The attempt is not waiting for the user.
    NotAwaiting(HandoffState),

    /// The message arrived after the payment window closed.
    Late,
}

/// Result of feeding a message to an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// The payment succeeded; the confirmation should be verified server-side.
    Completed(PaymentConfirmation),

    /// The user cancelled.
    Cancelled,

    /// The message was discarded.
    Ignored(IgnoreReason),
}

/// A single attempt to pay for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAttempt {
    id: Uuid,
    idempotency_key: Uuid,
    state: HandoffState,
    window: SignedDuration,
    provider_order_id: Option<String>,
    deadline: Option<Timestamp>,
}

impl Default for PaymentAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentAttempt {
    /// Start a fresh attempt with the default payment window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(DEFAULT_PAYMENT_WINDOW)
    }

    /// Start a fresh attempt with a custom payment window.
    #[must_use]
    pub fn with_window(window: SignedDuration) -> Self {
        Self {
            id: Uuid::now_v7(),
            idempotency_key: Uuid::now_v7(),
            state: HandoffState::Idle,
            window,
            provider_order_id: None,
            deadline: None,
        }
    }

    /// Identifier echoed back by the payment surface.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Key sent with order creation so that retries of this attempt reuse one order.
    #[must_use]
    pub fn idempotency_key(&self) -> Uuid {
        self.idempotency_key
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HandoffState {
        self.state
    }

    /// Provider order the surface was opened for.
    #[must_use]
    pub fn provider_order_id(&self) -> Option<&str> {
        self.provider_order_id.as_deref()
    }

    /// Instant after which results are no longer accepted.
    #[must_use]
    pub fn deadline(&self) -> Option<Timestamp> {
        self.deadline
    }

    /// Time left before the deadline, or `None` if the surface is not open.
    #[must_use]
    pub fn remaining(&self, now: Timestamp) -> Option<SignedDuration> {
        match (self.state, self.deadline) {
            (HandoffState::AwaitingUserAction, Some(deadline)) => {
                Some(now.duration_until(deadline).max(SignedDuration::ZERO))
            }
            _ => None,
        }
    }

    /// Order creation has been requested.
    ///
    /// # Errors
    ///
    /// [`HandoffError::InvalidTransition`] unless the attempt is idle.
    pub fn begin(&mut self) -> Result<(), HandoffError> {
        self.transition(HandoffState::Idle, HandoffState::AwaitingProvider, "begin")
    }

    /// Order creation failed.
    ///
    /// # Errors
    ///
    /// [`HandoffError::InvalidTransition`] unless the attempt is awaiting the provider.
    pub fn order_failed(&mut self) -> Result<(), HandoffError> {
        self.transition(
            HandoffState::AwaitingProvider,
            HandoffState::Failed,
            "fail order creation",
        )
    }

    /// The payment surface opened for a provider order. Returns the deadline.
    ///
    /// # Errors
    ///
    /// [`HandoffError::InvalidTransition`] unless the attempt is awaiting the provider.
    pub fn surface_opened(
        &mut self,
        provider_order_id: impl Into<String>,
        now: Timestamp,
    ) -> Result<Timestamp, HandoffError> {
        self.transition(
            HandoffState::AwaitingProvider,
            HandoffState::AwaitingUserAction,
            "open the payment surface",
        )?;

        let deadline = now.saturating_add(self.window).unwrap_or(Timestamp::MAX);

        self.provider_order_id = Some(provider_order_id.into());
        self.deadline = Some(deadline);

        Ok(deadline)
    }

    /// The payment surface could not be opened. Fails the attempt and returns the error
    /// to report.
    pub fn surface_blocked(&mut self) -> HandoffError {
        match self.transition(
            HandoffState::AwaitingProvider,
            HandoffState::Failed,
            "report a blocked surface",
        ) {
            Ok(()) => HandoffError::PopupBlocked,
            Err(error) => error,
        }
    }

    /// Feed a message posted by the payment surface.
    pub fn receive(&mut self, message: HandoffMessage, now: Timestamp) -> HandoffOutcome {
        if message.attempt_id() != self.id {
            return HandoffOutcome::Ignored(IgnoreReason::ForeignAttempt);
        }

        if self.state != HandoffState::AwaitingUserAction {
            return HandoffOutcome::Ignored(IgnoreReason::NotAwaiting(self.state));
        }

        if self.expire(now) {
            return HandoffOutcome::Ignored(IgnoreReason::Late);
        }

        match message {
            HandoffMessage::PaymentSuccess { data, .. } => {
                self.state = HandoffState::Completed;

                HandoffOutcome::Completed(data)
            }
            HandoffMessage::PaymentCancelled { .. } => {
                self.state = HandoffState::Cancelled;

                HandoffOutcome::Cancelled
            }
        }
    }

    /// The surface was closed without posting a result. Returns whether the attempt was
    /// cancelled.
    pub fn surface_closed(&mut self) -> bool {
        self.settle(HandoffState::Cancelled)
    }

    /// Time the attempt out if `now` is past the deadline. The caller should close the
    /// surface when this returns `true`.
    pub fn expire(&mut self, now: Timestamp) -> bool {
        match self.deadline {
            Some(deadline) if now > deadline => self.settle(HandoffState::TimedOut),
            _ => false,
        }
    }

    /// Time the attempt out unconditionally, as when an external timer fires.
    pub fn time_out(&mut self) -> bool {
        self.settle(HandoffState::TimedOut)
    }

    /// Server-side verification refused the confirmation this attempt produced.
    ///
    /// # Errors
    ///
    /// [`HandoffError::InvalidTransition`] unless the attempt completed.
    pub fn reject_verification(&mut self) -> Result<(), HandoffError> {
        self.transition(
            HandoffState::Completed,
            HandoffState::Failed,
            "reject verification",
        )
    }

    /// Start a new attempt after a cancellation, timeout or failure.
    ///
    /// The new attempt has a fresh identifier and idempotency key, so it creates a new
    /// order.
    ///
    /// # Errors
    ///
    /// [`HandoffError::AttemptCompleted`] for a completed attempt, and
    /// [`HandoffError::InvalidTransition`] for one still in progress.
    pub fn retry(&self) -> Result<Self, HandoffError> {
        match self.state {
            HandoffState::Cancelled | HandoffState::TimedOut | HandoffState::Failed => {
                Ok(Self::with_window(self.window))
            }
            HandoffState::Completed => Err(HandoffError::AttemptCompleted),
            state => Err(HandoffError::InvalidTransition {
                state,
                action: "retry",
            }),
        }
    }

    fn settle(&mut self, state: HandoffState) -> bool {
        if self.state != HandoffState::AwaitingUserAction {
            return false;
        }

        self.state = state;

        true
    }

    fn transition(
        &mut self,
        from: HandoffState,
        to: HandoffState,
        action: &'static str,
    ) -> Result<(), HandoffError> {
        if self.state != from {
            return Err(HandoffError::InvalidTransition {
                state: self.state,
                action,
            });
        }

        self.state = to;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const NOW: Timestamp = Timestamp::constant(1_760_000_000, 0);

    fn confirmation() -> PaymentConfirmation {
        PaymentConfirmation {
            provider_order_id: "order_1".to_string(),
            provider_payment_id: "pay_1".to_string(),
            provider_signature: "sig".to_string(),
        }
    }

    fn open_attempt() -> Result<PaymentAttempt, HandoffError> {
        let mut attempt = PaymentAttempt::new();

        attempt.begin()?;
        attempt.surface_opened("order_1", NOW)?;

        Ok(attempt)
    }

    fn success(attempt: &PaymentAttempt) -> HandoffMessage {
        HandoffMessage::PaymentSuccess {
            attempt_id: attempt.id(),
            data: confirmation(),
        }
    }

    #[test]
    fn success_completes_the_attempt() -> TestResult {
        let mut attempt = open_attempt()?;

        assert_eq!(attempt.deadline(), Some(NOW + DEFAULT_PAYMENT_WINDOW));
        assert_eq!(attempt.provider_order_id(), Some("order_1"));

        let message = success(&attempt);

        assert_eq!(
            attempt.receive(message, NOW),
            HandoffOutcome::Completed(confirmation())
        );
        assert_eq!(attempt.state(), HandoffState::Completed);

        Ok(())
    }

    #[test]
    fn cancel_message_cancels() -> TestResult {
        let mut attempt = open_attempt()?;
        let message = HandoffMessage::PaymentCancelled {
            attempt_id: attempt.id(),
        };

        assert_eq!(attempt.receive(message, NOW), HandoffOutcome::Cancelled);
        assert_eq!(attempt.state(), HandoffState::Cancelled);

        Ok(())
    }

    #[test]
    fn message_at_deadline_is_accepted_and_after_is_late() -> TestResult {
        let mut attempt = open_attempt()?;
        let message = success(&attempt);

        let at_deadline = attempt.clone().receive(message.clone(), NOW + DEFAULT_PAYMENT_WINDOW);

        assert!(matches!(at_deadline, HandoffOutcome::Completed(_)));

        let late = NOW + DEFAULT_PAYMENT_WINDOW + SignedDuration::from_secs(1);

        assert_eq!(
            attempt.receive(message, late),
            HandoffOutcome::Ignored(IgnoreReason::Late)
        );
        assert_eq!(attempt.state(), HandoffState::TimedOut);

        Ok(())
    }

    #[test]
    fn messages_for_other_attempts_are_ignored() -> TestResult {
        let mut attempt = open_attempt()?;
        let other = PaymentAttempt::new();

        assert_eq!(
            attempt.receive(success(&other), NOW),
            HandoffOutcome::Ignored(IgnoreReason::ForeignAttempt)
        );
        assert_eq!(attempt.state(), HandoffState::AwaitingUserAction);

        Ok(())
    }

    #[test]
    fn duplicate_messages_are_ignored_after_completion() -> TestResult {
        let mut attempt = open_attempt()?;

        let _ = attempt.receive(success(&attempt), NOW);

        assert_eq!(
            attempt.receive(success(&attempt), NOW),
            HandoffOutcome::Ignored(IgnoreReason::NotAwaiting(HandoffState::Completed))
        );

        Ok(())
    }

    #[test]
    fn messages_before_the_surface_opens_are_ignored() -> TestResult {
        let mut attempt = PaymentAttempt::new();

        attempt.begin()?;

        assert_eq!(
            attempt.receive(success(&attempt), NOW),
            HandoffOutcome::Ignored(IgnoreReason::NotAwaiting(HandoffState::AwaitingProvider))
        );

        Ok(())
    }

    #[test]
    fn closing_the_surface_cancels() -> TestResult {
        let mut attempt = open_attempt()?;

        assert!(attempt.surface_closed());
        assert_eq!(attempt.state(), HandoffState::Cancelled);
        assert!(!attempt.surface_closed());

        Ok(())
    }

    #[test]
    fn expire_only_fires_past_the_deadline() -> TestResult {
        let mut attempt = open_attempt()?;

        assert!(!attempt.expire(NOW + DEFAULT_PAYMENT_WINDOW));
        assert!(attempt.expire(NOW + SignedDuration::from_mins(11)));
        assert_eq!(attempt.state(), HandoffState::TimedOut);

        Ok(())
    }

    #[test]
    fn blocked_surface_fails_the_attempt() -> TestResult {
        let mut attempt = PaymentAttempt::new();

        attempt.begin()?;

        assert_eq!(attempt.surface_blocked(), HandoffError::PopupBlocked);
        assert_eq!(attempt.state(), HandoffState::Failed);

        Ok(())
    }

    #[test]
    fn retry_issues_a_new_key() -> TestResult {
        let mut attempt = open_attempt()?;

        attempt.time_out();

        let retry = attempt.retry()?;

        assert_eq!(retry.state(), HandoffState::Idle);
        assert_ne!(retry.id(), attempt.id());
        assert_ne!(retry.idempotency_key(), attempt.idempotency_key());

        Ok(())
    }

    #[test]
    fn completed_attempts_cannot_be_retried() -> TestResult {
        let mut attempt = open_attempt()?;

        let _ = attempt.receive(success(&attempt), NOW);

        assert_eq!(attempt.retry(), Err(HandoffError::AttemptCompleted));

        attempt.reject_verification()?;

        assert!(attempt.retry().is_ok());

        Ok(())
    }

    #[test]
    fn begin_twice_is_invalid() -> TestResult {
        let mut attempt = PaymentAttempt::new();

        attempt.begin()?;

        assert_eq!(
            attempt.begin(),
            Err(HandoffError::InvalidTransition {
                state: HandoffState::AwaitingProvider,
                action: "begin",
            })
        );

        Ok(())
    }

    #[test]
    fn remaining_counts_down_to_zero() -> TestResult {
        let attempt = open_attempt()?;

        assert_eq!(
            attempt.remaining(NOW + SignedDuration::from_mins(4)),
            Some(SignedDuration::from_mins(6))
        );
        assert_eq!(
            attempt.remaining(NOW + SignedDuration::from_mins(20)),
            Some(SignedDuration::ZERO)
        );

        Ok(())
    }
}
