// Main library file for the hotel room booking backend

// Domain, storage and services
pub mod availability;
pub mod booking;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod rooms;
pub mod seed;
pub mod store;

// Wiring and the command/query surface
pub mod api;
pub mod registry;

// Re-export key types for convenience
pub use api::{ApiError, BookingApi, BookingRequest, HotelBookingApi, RoomSearchRequest};
pub use availability::{AvailabilityEngine, OverlapRule};
pub use booking::{BookingService, CreateBooking};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BookingConfig, NotifierConfig};
pub use error::{BookingError, NotifyError};
pub use model::{
    Booking, BookingId, BookingStatus, Customer, CustomerId, DateRange, Money, NewBooking,
    NewCustomer, Room, RoomId, RoomType,
};
pub use notify::{ConfirmationMessage, LogNotifier, Notifier, WebhookNotifier};
pub use registry::AppRegistry;
pub use rooms::{RoomCatalog, RoomSearch};
pub use store::{
    BookingStore, CustomerStore, InMemoryBookingStore, InMemoryCustomerStore, InMemoryRoomStore,
    RoomStore,
};
