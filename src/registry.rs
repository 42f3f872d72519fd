// Wiring of stores, notifier and clock into the services

use anyhow::Context;
use std::sync::Arc;

use crate::booking::BookingService;
use crate::clock::{Clock, SystemClock};
use crate::config::BookingConfig;
use crate::notify::{notifier_from_config, Notifier};
use crate::rooms::RoomCatalog;
use crate::store::{
    BookingStore, CustomerStore, InMemoryBookingStore, InMemoryCustomerStore, InMemoryRoomStore,
    RoomStore,
};

#[derive(Clone)]
pub struct AppRegistry {
    room_catalog: RoomCatalog,
    booking_service: Arc<BookingService>,
    config: Arc<BookingConfig>,
}

impl AppRegistry {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        customers: Arc<dyn CustomerStore>,
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Self {
        let booking_service = Arc::new(BookingService::new(
            rooms.clone(),
            customers,
            bookings,
            notifier,
            clock,
            config.clone(),
        ));
        let room_catalog = RoomCatalog::new(rooms, booking_service.availability().clone());
        Self {
            room_catalog,
            booking_service,
            config: Arc::new(config),
        }
    }

    // In-memory stores, the system clock and the notifier selected by the config
    pub fn in_memory(config: BookingConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let notifier = notifier_from_config(&config.notifier)
            .context("failed to set up the confirmation notifier")?;
        Ok(Self::new(
            Arc::new(InMemoryRoomStore::new()),
            Arc::new(InMemoryCustomerStore::new()),
            Arc::new(InMemoryBookingStore::new()),
            notifier,
            Arc::new(SystemClock),
            config,
        ))
    }

    pub fn room_catalog(&self) -> &RoomCatalog {
        &self.room_catalog
    }

    pub fn booking_service(&self) -> Arc<BookingService> {
        self.booking_service.clone()
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }
}
