// Command/query surface over the room catalogue and the booking workflow.
// Transport-agnostic: an HTTP layer maps `ApiError::status_code` onto its responses.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::booking::CreateBooking;
use crate::error::BookingError;
use crate::model::{not_blank, Booking, BookingId, Room, RoomId, RoomType};
use crate::registry::AppRegistry;
use crate::rooms::RoomSearch;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable request: {0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Unprocessable(_) => 422,
            ApiError::Internal(_) => 500,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        let message = e.to_string();
        match e {
            BookingError::InvalidRange { .. } | BookingError::Validation(_) => {
                ApiError::BadRequest(message)
            }
            BookingError::RoomNotFound(_)
            | BookingError::BookingNotFound(_)
            | BookingError::ReferenceNotFound(_) => ApiError::NotFound(message),
            BookingError::Unavailable { .. } | BookingError::DuplicateRoomNumber(_) => {
                ApiError::Conflict(message)
            }
            BookingError::CancellationWindowViolation { .. } => ApiError::Unprocessable(message),
            BookingError::Storage(_) => ApiError::Internal(message),
        }
    }
}

// Body of a booking request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub room_id: RoomId,
    #[validate(custom = "not_blank")]
    pub first_name: String,
    #[validate(custom = "not_blank")]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom = "not_blank")]
    pub phone_number: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

impl From<BookingRequest> for CreateBooking {
    fn from(request: BookingRequest) -> Self {
        CreateBooking {
            room_id: request.room_id,
            email: request.email.trim().to_string(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            phone_number: request.phone_number.trim().to_string(),
            check_in: request.check_in_date,
            check_out: request.check_out_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSearchRequest {
    pub location: String,
    #[serde(default)]
    pub check_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub check_out_date: Option<NaiveDate>,
    #[serde(default)]
    pub room_type: Option<String>,
}

impl TryFrom<RoomSearchRequest> for RoomSearch {
    type Error = ApiError;

    fn try_from(request: RoomSearchRequest) -> Result<Self, Self::Error> {
        if request.location.trim().is_empty() {
            return Err(ApiError::BadRequest("location is required".to_string()));
        }
        let room_type = request
            .room_type
            .as_deref()
            .map(str::parse::<RoomType>)
            .transpose()?;
        Ok(RoomSearch {
            location: request.location,
            check_in: request.check_in_date,
            check_out: request.check_out_date,
            room_type,
        })
    }
}

#[async_trait]
pub trait BookingApi: Send + Sync + 'static {
    async fn rooms(&self) -> Result<Vec<Room>, ApiError>;

    async fn room(&self, id: RoomId) -> Result<Room, ApiError>;

    async fn locations(&self) -> Result<Vec<String>, ApiError>;

    async fn available_rooms(
        &self,
        location: &str,
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
    ) -> Result<Vec<Room>, ApiError>;

    async fn search_rooms(&self, request: RoomSearchRequest) -> Result<Vec<Room>, ApiError>;

    async fn create_booking(&self, request: BookingRequest) -> Result<Booking, ApiError>;

    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, ApiError>;

    async fn booking_by_reference(&self, reference: &str) -> Result<Booking, ApiError>;

    async fn cancel_booking(&self, id: BookingId) -> Result<Booking, ApiError>;
}

pub struct HotelBookingApi {
    registry: AppRegistry,
}

impl HotelBookingApi {
    pub fn new(registry: AppRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }
}

#[async_trait]
impl BookingApi for HotelBookingApi {
    async fn rooms(&self) -> Result<Vec<Room>, ApiError> {
        Ok(self.registry.room_catalog().all_rooms().await?)
    }

    async fn room(&self, id: RoomId) -> Result<Room, ApiError> {
        Ok(self.registry.room_catalog().room_by_id(id).await?)
    }

    async fn locations(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.registry.room_catalog().locations().await?)
    }

    async fn available_rooms(
        &self,
        location: &str,
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
    ) -> Result<Vec<Room>, ApiError> {
        Ok(self
            .registry
            .room_catalog()
            .find_available(location, check_in, check_out)
            .await?)
    }

    async fn search_rooms(&self, request: RoomSearchRequest) -> Result<Vec<Room>, ApiError> {
        let search = RoomSearch::try_from(request)?;
        Ok(self.registry.room_catalog().search_rooms(&search).await?)
    }

    async fn create_booking(&self, request: BookingRequest) -> Result<Booking, ApiError> {
        request.validate()?;
        Ok(self
            .registry
            .booking_service()
            .create_booking(request.into())
            .await?)
    }

    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, ApiError> {
        Ok(self
            .registry
            .booking_service()
            .get_bookings_by_email(email)
            .await?)
    }

    async fn booking_by_reference(&self, reference: &str) -> Result<Booking, ApiError> {
        Ok(self
            .registry
            .booking_service()
            .get_booking_by_reference(reference)
            .await?)
    }

    async fn cancel_booking(&self, id: BookingId) -> Result<Booking, ApiError> {
        Ok(self.registry.booking_service().cancel_booking(id).await?)
    }
}
