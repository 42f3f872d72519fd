// Booking workflow: create, cancel and look up bookings

use chrono::{DateTime, Days, NaiveDate, Utc};
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::availability::AvailabilityEngine;
use crate::clock::Clock;
use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::model::{
    Booking, BookingId, BookingStatus, Customer, DateRange, NewBooking, NewCustomer, Room, RoomId,
};
use crate::notify::{ConfirmationMessage, Notifier};
use crate::store::{BookingStore, CustomerStore, RoomStore};

const REFERENCE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBooking {
    pub room_id: RoomId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

pub struct BookingService {
    rooms: Arc<dyn RoomStore>,
    customers: Arc<dyn CustomerStore>,
    bookings: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    availability: AvailabilityEngine,
    config: BookingConfig,
    // One lock per room so the availability re-check and the insert are not interleaved
    room_locks: DashMap<RoomId, Arc<Mutex<()>>>,
}

impl BookingService {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        customers: Arc<dyn CustomerStore>,
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Self {
        let availability =
            AvailabilityEngine::new(rooms.clone(), bookings.clone(), config.overlap_rule);
        Self {
            rooms,
            customers,
            bookings,
            notifier,
            clock,
            availability,
            config,
            room_locks: DashMap::new(),
        }
    }

    pub fn availability(&self) -> &AvailabilityEngine {
        &self.availability
    }

    pub async fn create_booking(&self, request: CreateBooking) -> Result<Booking, BookingError> {
        let stay = DateRange::new(request.check_in, request.check_out)?;
        let room = self
            .rooms
            .get(request.room_id)
            .await?
            .ok_or(BookingError::RoomNotFound(request.room_id))?;

        let lock = self.room_lock(request.room_id);
        let guard = lock.lock().await;

        // Re-check against the current bookings rather than trusting an earlier search
        let available = self.availability.available_for(&room.location, stay).await?;
        if !available.iter().any(|r| r.id == Some(request.room_id)) {
            debug!(room_id = %request.room_id, %stay, "room unavailable");
            return Err(BookingError::Unavailable {
                room_id: request.room_id,
                check_in: stay.check_in,
                check_out: stay.check_out,
            });
        }

        // Every check that can fail runs before the customer is written
        let total_price = room
            .price_per_night
            .checked_mul(stay.nights())
            .ok_or_else(|| BookingError::Validation("total price overflows".to_string()))?;

        let customer = self
            .customers
            .get_or_create(NewCustomer {
                first_name: request.first_name,
                last_name: request.last_name,
                email: request.email,
                phone_number: request.phone_number,
            })
            .await?;

        let reference = self.unique_reference().await?;
        let booking = self
            .bookings
            .insert(
                NewBooking {
                    reference,
                    room_id: request.room_id,
                    customer_id: customer.id,
                    stay,
                    total_price,
                    created_at: self.clock.now(),
                },
                self.availability.rule(),
            )
            .await?;
        drop(guard);

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            room_id = %booking.room_id,
            %stay,
            total_price = %booking.total_price,
            "booking confirmed"
        );

        Ok(self.send_confirmation(booking, &room, &customer).await)
    }

    pub async fn cancel_booking(&self, id: BookingId) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .get(id)
            .await?
            .ok_or(BookingError::BookingNotFound(id))?;

        if booking.status == BookingStatus::Cancelled {
            debug!(booking_id = %id, "booking already cancelled");
            return Ok(booking);
        }

        let today = self.clock.today();
        let earliest = today
            .checked_add_days(Days::new(u64::from(self.config.cancellation_notice_days)))
            .ok_or_else(|| BookingError::Validation("cancellation window overflows".to_string()))?;
        if booking.check_in < earliest {
            return Err(BookingError::CancellationWindowViolation {
                check_in: booking.check_in,
                earliest,
            });
        }

        let cancelled = self.bookings.mark_cancelled(id).await?;
        info!(booking_id = %id, reference = %cancelled.reference, "booking cancelled");
        Ok(cancelled)
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.bookings
            .get(id)
            .await?
            .ok_or(BookingError::BookingNotFound(id))
    }

    // Every booking of the customer, in any status; empty for an unknown email
    pub async fn get_bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, BookingError> {
        match self.customers.find_by_email(email).await? {
            Some(customer) => self.bookings.list_by_customer(customer.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_booking_by_reference(&self, reference: &str) -> Result<Booking, BookingError> {
        self.bookings
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| BookingError::ReferenceNotFound(reference.to_string()))
    }

    fn room_lock(&self, room_id: RoomId) -> Arc<Mutex<()>> {
        self.room_locks.entry(room_id).or_default().clone()
    }

    async fn unique_reference(&self) -> Result<String, BookingError> {
        for _ in 0..REFERENCE_ATTEMPTS {
            let reference = generate_reference(&self.config.reference_prefix, self.clock.now());
            if self.bookings.find_by_reference(&reference).await?.is_none() {
                return Ok(reference);
            }
        }
        Err(BookingError::Storage(
            "could not generate a unique booking reference".to_string(),
        ))
    }

    // One attempt; a failure is logged and the booking is returned as persisted
    async fn send_confirmation(
        &self,
        mut booking: Booking,
        room: &Room,
        customer: &Customer,
    ) -> Booking {
        let message =
            ConfirmationMessage::for_booking(&booking, room, customer, &self.config.currency);

        if let Err(e) = self.notifier.send(&message).await {
            warn!(reference = %booking.reference, error = %e, "failed to send confirmation");
            return booking;
        }

        match self.bookings.mark_email_sent(booking.id).await {
            Ok(()) => booking.email_sent = true,
            Err(e) => {
                warn!(
                    reference = %booking.reference,
                    error = %e,
                    "failed to record sent confirmation"
                )
            }
        }
        booking
    }
}

// `{prefix}-{unix millis}-{6 upper-case alphanumerics}`
pub fn generate_reference(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}-{}-{}", prefix, now.timestamp_millis(), suffix)
}
