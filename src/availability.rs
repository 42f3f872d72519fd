// Availability engine: which rooms at a location can be booked for a stay

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::BookingError;
use crate::model::{DateRange, Room};
use crate::store::{BookingStore, RoomStore};

// Boundary behaviour of the date-range conflict check.
// With `HalfOpen` a stay ending on day D leaves the room free for a stay starting on day D.
// `Inclusive` treats the check-out day as still occupied, so the same pair conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapRule {
    #[default]
    HalfOpen,
    Inclusive,
}

impl OverlapRule {
    pub fn overlaps(&self, a: &DateRange, b: &DateRange) -> bool {
        match self {
            OverlapRule::HalfOpen => a.check_in < b.check_out && b.check_in < a.check_out,
            OverlapRule::Inclusive => a.check_in <= b.check_out && b.check_in <= a.check_out,
        }
    }
}

#[derive(Clone)]
pub struct AvailabilityEngine {
    rooms: Arc<dyn RoomStore>,
    bookings: Arc<dyn BookingStore>,
    rule: OverlapRule,
}

impl AvailabilityEngine {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        bookings: Arc<dyn BookingStore>,
        rule: OverlapRule,
    ) -> Self {
        Self {
            rooms,
            bookings,
            rule,
        }
    }

    pub fn rule(&self) -> OverlapRule {
        self.rule
    }

    // Rooms at `location` that are administratively available and, when both dates are
    // given, free of CONFIRMED bookings conflicting with `[check_in, check_out)`.
    // Without both dates the booking check is skipped. A reversed range fails with
    // `BookingError::InvalidRange`.
    pub async fn find_available(
        &self,
        location: &str,
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
    ) -> Result<Vec<Room>, BookingError> {
        let (check_in, check_out) = match (check_in, check_out) {
            (Some(check_in), Some(check_out)) => (check_in, check_out),
            _ => return self.rooms.list_available_by_location(location).await,
        };
        let window = DateRange::search_window(check_in, check_out)?;
        self.available_for(location, window).await
    }

    pub(crate) async fn available_for(
        &self,
        location: &str,
        window: DateRange,
    ) -> Result<Vec<Room>, BookingError> {
        let (candidates, taken) = futures::try_join!(
            self.rooms.list_available_by_location(location),
            self.bookings.conflicting_room_ids(window, self.rule),
        )?;
        let available: Vec<Room> = candidates
            .into_iter()
            .filter(|room| room.id.map_or(false, |id| !taken.contains(&id)))
            .collect();

        tracing::debug!(
            location,
            %window,
            available = available.len(),
            "availability search"
        );
        Ok(available)
    }
}
