// Best-effort booking confirmations

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::NotifierConfig;
use crate::error::NotifyError;
use crate::model::{Booking, Customer, Room};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ConfirmationMessage {
    pub fn for_booking(
        booking: &Booking,
        room: &Room,
        customer: &Customer,
        currency: &str,
    ) -> Self {
        let body = format!(
            "Karibu! Your booking has been confirmed.\n\n\
             Booking Details:\n\
             Reference: {reference}\n\
             Hotel: {location}\n\
             Room: {number} ({room_type})\n\
             Check-in: {check_in}\n\
             Check-out: {check_out}\n\
             Total Price: {currency} {total}\n\n\
             Thank you for choosing Kenyan Hospitality!\n\
             For inquiries, call: +254 700 000 000",
            reference = booking.reference,
            location = room.location,
            number = room.room_number,
            room_type = room.room_type,
            check_in = booking.check_in,
            check_out = booking.check_out,
            total = booking.total_price,
        );

        Self {
            to: customer.email.clone(),
            subject: format!("Booking Confirmation - {}", booking.reference),
            body,
        }
    }
}

// A single delivery attempt. Implementations report failure through the result and never panic.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, message: &ConfirmationMessage) -> Result<(), NotifyError>;
}

// Writes confirmations to the log instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &ConfirmationMessage) -> Result<(), NotifyError> {
        tracing::info!(to = %message.to, subject = %message.subject, "confirmation (log only)");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

// Posts confirmations as JSON to an HTTP mail relay.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    sender: String,
    timeout_ms: u64,
}

impl WebhookNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| NotifyError::ConfigError(e.to_string()))?;
        Self::with_client(client, config)
    }

    // Uses a caller-built client, e.g. one with its own proxy or TLS settings
    pub fn with_client(
        client: reqwest::Client,
        config: &NotifierConfig,
    ) -> Result<Self, NotifyError> {
        let url = config
            .base_url
            .clone()
            .ok_or_else(|| NotifyError::ConfigError("base_url is not set".to_string()))?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            sender: config.sender.clone(),
            timeout_ms: config.timeout_ms,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &ConfirmationMessage) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(&self.url)
            .timeout(Duration::from_millis(self.timeout_ms))
            .json(&RelayRequest {
                from: &self.sender,
                to: &message.to,
                subject: &message.subject,
                text: &message.body,
            });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NotifyError::Timeout(self.timeout_ms)
            } else {
                NotifyError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::RelayError {
                status_code: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

// Picks the webhook relay when one is configured and falls back to logging
pub fn notifier_from_config(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.base_url {
        Some(_) => Ok(Arc::new(WebhookNotifier::new(config)?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}
