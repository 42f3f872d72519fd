// Error types for the booking core

use chrono::NaiveDate;
use thiserror::Error;
use validator::ValidationErrors;

use crate::model::{BookingId, RoomId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid date range: check-in {check_in} must be before check-out {check_out}")]
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("Booking not found for reference: {0}")]
    ReferenceNotFound(String),

    #[error("Room {room_id} is not available from {check_in} to {check_out}")]
    Unavailable {
        room_id: RoomId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error(
        "Cannot cancel booking with check-in {check_in}; \
         cancellations must be made before {earliest}"
    )]
    CancellationWindowViolation {
        check_in: NaiveDate,
        earliest: NaiveDate,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Room number already exists: {0}")]
    DuplicateRoomNumber(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BookingError::RoomNotFound(_)
                | BookingError::BookingNotFound(_)
                | BookingError::ReferenceNotFound(_)
        )
    }
}

impl From<ValidationErrors> for BookingError {
    fn from(e: ValidationErrors) -> Self {
        BookingError::Validation(e.to_string())
    }
}

// Failures of the best-effort confirmation; logged by the workflow, never returned from it
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Notification timeout after {0}ms")]
    Timeout(u64),

    #[error("Mail relay error: {status_code} - {message}")]
    RelayError { status_code: u16, message: String },

    #[error("Notifier configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::NetworkError(e.to_string())
    }
}
