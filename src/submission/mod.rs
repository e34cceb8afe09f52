//! Booking submission: payload assembly, the single POST, and outcome
//! classification.

pub mod client;
pub mod envelope;
pub mod payload;

pub use client::*;
pub use envelope::*;
pub use payload::*;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::attachment::CompressionResult;
use crate::messages::Messages;
use crate::models::{BookingDraft, Locale};

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Booking service is not reachable at {0}")]
    Connection(String),

    #[error("Booking request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Booking rejected (status {status})")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("HTTP client could not be built: {0}")]
    ClientBuild(String),
}

impl SubmissionError {
    /// The request never completed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Transport(_) | Self::ClientBuild(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Request never completed.
    Transport,
    /// Endpoint answered and did not accept the booking.
    Application,
}

/// Terminal result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success {
        /// Endpoint text, or the built-in confirmation.
        message: String,
        /// RFC 3339 timestamp of the accepted submission.
        submitted_at: String,
    },
    Failure {
        kind: FailureKind,
        /// User-visible banner text.
        message: String,
    },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message, .. } => message,
        }
    }
}

/// Sends finalized drafts to the booking service.
pub struct BookingSubmitter {
    transport: Box<dyn BookingTransport>,
}

impl BookingSubmitter {
    pub fn new(transport: Box<dyn BookingTransport>) -> Self {
        Self { transport }
    }

    /// Submitter using the reqwest transport.
    pub fn http(config: &crate::config::BookingConfig) -> Result<Self, SubmissionError> {
        Ok(Self::new(Box::new(HttpBookingClient::new(config)?)))
    }

    /// Build the payload and submit it once.
    ///
    /// `selected_tests` are display labels in `locale`. Never returns an
    /// error: every failure is folded into `SubmissionOutcome::Failure`.
    pub async fn submit(
        &self,
        draft: &BookingDraft,
        selected_tests: Vec<String>,
        attachment: Option<&CompressionResult>,
        locale: Locale,
    ) -> SubmissionOutcome {
        let payload = BookingPayload::assemble(draft, selected_tests, attachment);
        self.submit_payload(&payload, locale).await
    }

    /// Submit an already-assembled payload once.
    pub async fn submit_payload(&self, payload: &BookingPayload, locale: Locale) -> SubmissionOutcome {
        match self.try_submit(payload, locale).await {
            Ok(message) => {
                info!(tests = payload.selected_tests.len(), "Booking accepted");
                SubmissionOutcome::Success {
                    message: message
                        .unwrap_or_else(|| Messages::booking_confirmed(locale).to_string()),
                    submitted_at: chrono::Utc::now().to_rfc3339(),
                }
            }
            Err(e) if e.is_transport() => {
                warn!(error = %e, "Booking submission did not complete");
                SubmissionOutcome::Failure {
                    kind: FailureKind::Transport,
                    message: Messages::network_error(locale).to_string(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Booking rejected by endpoint");
                let message = match e {
                    SubmissionError::Rejected {
                        message: Some(text),
                        ..
                    } => text,
                    _ => Messages::generic_error(locale).to_string(),
                };
                SubmissionOutcome::Failure {
                    kind: FailureKind::Application,
                    message,
                }
            }
        }
    }

    async fn try_submit(
        &self,
        payload: &BookingPayload,
        locale: Locale,
    ) -> Result<Option<String>, SubmissionError> {
        let raw = self.transport.send(payload).await?;
        let reply = interpret(raw.status, &raw.body, locale);
        if reply.accepted {
            Ok(reply.message)
        } else {
            Err(SubmissionError::Rejected {
                status: raw.status,
                message: reply.message,
            })
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
