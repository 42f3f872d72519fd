// Room catalogue: browsing, searching and administering rooms

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::availability::AvailabilityEngine;
use crate::error::BookingError;
use crate::model::{Room, RoomId, RoomType};
use crate::store::RoomStore;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomSearch {
    pub location: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub room_type: Option<RoomType>,
}

#[derive(Clone)]
pub struct RoomCatalog {
    rooms: Arc<dyn RoomStore>,
    availability: AvailabilityEngine,
}

impl RoomCatalog {
    pub fn new(rooms: Arc<dyn RoomStore>, availability: AvailabilityEngine) -> Self {
        Self {
            rooms,
            availability,
        }
    }

    pub async fn all_rooms(&self) -> Result<Vec<Room>, BookingError> {
        self.rooms.list().await
    }

    pub async fn room_by_id(&self, id: RoomId) -> Result<Room, BookingError> {
        self.rooms
            .get(id)
            .await?
            .ok_or(BookingError::RoomNotFound(id))
    }

    pub async fn rooms_by_location(&self, location: &str) -> Result<Vec<Room>, BookingError> {
        self.rooms.list_by_location(location).await
    }

    // Distinct locations, sorted
    pub async fn locations(&self) -> Result<Vec<String>, BookingError> {
        let locations: BTreeSet<String> = self
            .rooms
            .list()
            .await?
            .into_iter()
            .map(|room| room.location)
            .collect();
        Ok(locations.into_iter().collect())
    }

    pub async fn find_available(
        &self,
        location: &str,
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
    ) -> Result<Vec<Room>, BookingError> {
        self.availability
            .find_available(location, check_in, check_out)
            .await
    }

    // Availability search narrowed to a room type
    pub async fn search_rooms(&self, search: &RoomSearch) -> Result<Vec<Room>, BookingError> {
        let rooms = self
            .find_available(&search.location, search.check_in, search.check_out)
            .await?;
        Ok(match search.room_type {
            Some(room_type) => rooms
                .into_iter()
                .filter(|room| room.room_type == room_type)
                .collect(),
            None => rooms,
        })
    }

    pub async fn save_room(&self, room: Room) -> Result<Room, BookingError> {
        room.validate()?;
        let saved = self.rooms.save(room).await?;
        info!(
            room_id = ?saved.id,
            room_number = %saved.room_number,
            location = %saved.location,
            "room saved"
        );
        Ok(saved)
    }

    pub async fn set_room_availability(
        &self,
        id: RoomId,
        is_available: bool,
    ) -> Result<Room, BookingError> {
        let mut room = self.room_by_id(id).await?;
        room.is_available = is_available;
        let saved = self.rooms.save(room).await?;
        info!(room_id = %id, is_available, "room availability changed");
        Ok(saved)
    }

    // Bookings keep the id of a deleted room; they are not touched here
    pub async fn delete_room(&self, id: RoomId) -> Result<(), BookingError> {
        if !self.rooms.delete(id).await? {
            return Err(BookingError::RoomNotFound(id));
        }
        info!(room_id = %id, "room deleted");
        Ok(())
    }
}
