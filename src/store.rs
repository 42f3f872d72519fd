// Persistence seams for rooms, customers and bookings.
// The in-memory implementations back the default registry and the tests; a database
// backend implements the same traits.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::availability::OverlapRule;
use crate::error::BookingError;
use crate::model::{
    normalize_email, Booking, BookingId, BookingStatus, Customer, CustomerId, DateRange,
    NewBooking, NewCustomer, Room, RoomId,
};

#[async_trait]
pub trait RoomStore: Send + Sync + 'static {
    async fn get(&self, id: RoomId) -> Result<Option<Room>, BookingError>;

    async fn list(&self) -> Result<Vec<Room>, BookingError>;

    async fn list_by_location(&self, location: &str) -> Result<Vec<Room>, BookingError>;

    // Rooms at the location whose administrative availability flag is set
    async fn list_available_by_location(&self, location: &str) -> Result<Vec<Room>, BookingError>;

    // Inserts when `room.id` is None, replaces otherwise. Room numbers stay unique.
    async fn save(&self, room: Room) -> Result<Room, BookingError>;

    // Returns false if there was nothing to delete
    async fn delete(&self, id: RoomId) -> Result<bool, BookingError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync + 'static {
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, BookingError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, BookingError>;

    // Existing customers are returned untouched; the supplied details only seed a new record
    async fn get_or_create(&self, customer: NewCustomer) -> Result<Customer, BookingError>;
}

#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    // Persists a CONFIRMED booking.
    // Implementations must refuse, with `BookingError::Unavailable`, a booking whose stay
    // conflicts with another CONFIRMED booking of the same room under `rule`, and must do the
    // check and the write atomically.
    async fn insert(&self, booking: NewBooking, rule: OverlapRule) -> Result<Booking, BookingError>;

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, BookingError>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Booking>, BookingError>;

    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Booking>, BookingError>;

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Booking>, BookingError>;

    // Rooms holding a CONFIRMED booking that conflicts with `range`
    async fn conflicting_room_ids(
        &self,
        range: DateRange,
        rule: OverlapRule,
    ) -> Result<HashSet<RoomId>, BookingError>;

    async fn mark_cancelled(&self, id: BookingId) -> Result<Booking, BookingError>;

    async fn mark_email_sent(&self, id: BookingId) -> Result<(), BookingError>;
}

#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    rooms: DashMap<RoomId, Room>,
    next_id: AtomicU64,
    // Serializes writes so the room number uniqueness check and the write are one step
    write_lock: Mutex<()>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut rooms: Vec<Room>) -> Vec<Room> {
        rooms.sort_by_key(|room| room.id);
        rooms
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn get(&self, id: RoomId) -> Result<Option<Room>, BookingError> {
        Ok(self.rooms.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(&self) -> Result<Vec<Room>, BookingError> {
        Ok(Self::sorted(
            self.rooms.iter().map(|entry| entry.value().clone()).collect(),
        ))
    }

    async fn list_by_location(&self, location: &str) -> Result<Vec<Room>, BookingError> {
        Ok(Self::sorted(
            self.rooms
                .iter()
                .filter(|entry| entry.location == location)
                .map(|entry| entry.value().clone())
                .collect(),
        ))
    }

    async fn list_available_by_location(&self, location: &str) -> Result<Vec<Room>, BookingError> {
        Ok(Self::sorted(
            self.rooms
                .iter()
                .filter(|entry| entry.location == location && entry.is_available)
                .map(|entry| entry.value().clone())
                .collect(),
        ))
    }

    async fn save(&self, mut room: Room) -> Result<Room, BookingError> {
        let _guard = self.write_lock.lock();

        let duplicate = self
            .rooms
            .iter()
            .any(|entry| entry.room_number == room.room_number && Some(*entry.key()) != room.id);
        if duplicate {
            return Err(BookingError::DuplicateRoomNumber(room.room_number));
        }

        let id = match room.id {
            Some(id) if self.rooms.contains_key(&id) => id,
            Some(id) => return Err(BookingError::RoomNotFound(id)),
            None => RoomId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
        };
        room.id = Some(id);
        self.rooms.insert(id, room.clone());
        Ok(room)
    }

    async fn delete(&self, id: RoomId) -> Result<bool, BookingError> {
        let _guard = self.write_lock.lock();
        Ok(self.rooms.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCustomerStore {
    // Keyed by normalized email
    customers: DashMap<String, Customer>,
    next_id: AtomicU64,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, BookingError> {
        Ok(self
            .customers
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, BookingError> {
        Ok(self
            .customers
            .get(&normalize_email(email))
            .map(|entry| entry.value().clone()))
    }

    async fn get_or_create(&self, customer: NewCustomer) -> Result<Customer, BookingError> {
        let email = normalize_email(&customer.email);
        let entry = self.customers.entry(email.clone()).or_insert_with(|| {
            let id = CustomerId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            tracing::debug!(customer_id = %id, "creating customer");
            Customer {
                id,
                first_name: customer.first_name,
                last_name: customer.last_name,
                email,
                phone_number: customer.phone_number,
            }
        });
        Ok(entry.value().clone())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: DashMap<BookingId, Booking>,
    references: DashMap<String, BookingId>,
    next_id: AtomicU64,
    // Held across the conflict check and the write of an insert
    insert_lock: Mutex<()>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    fn collect_sorted(&self, predicate: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by_key(|booking| booking.id);
        bookings
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(
        &self,
        booking: NewBooking,
        rule: OverlapRule,
    ) -> Result<Booking, BookingError> {
        let _guard = self.insert_lock.lock();

        if self.references.contains_key(&booking.reference) {
            return Err(BookingError::Storage(format!(
                "duplicate booking reference {}",
                booking.reference
            )));
        }

        let conflict = self.bookings.iter().any(|entry| {
            entry.room_id == booking.room_id
                && entry.is_confirmed()
                && rule.overlaps(&entry.stay(), &booking.stay)
        });
        if conflict {
            return Err(BookingError::Unavailable {
                room_id: booking.room_id,
                check_in: booking.stay.check_in,
                check_out: booking.stay.check_out,
            });
        }

        let id = BookingId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let stored = Booking {
            id,
            reference: booking.reference,
            room_id: booking.room_id,
            customer_id: booking.customer_id,
            check_in: booking.stay.check_in,
            check_out: booking.stay.check_out,
            total_price: booking.total_price,
            status: BookingStatus::Confirmed,
            email_sent: false,
            created_at: booking.created_at,
        };
        self.references.insert(stored.reference.clone(), id);
        self.bookings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, BookingError> {
        Ok(self.bookings.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Booking>, BookingError> {
        let Some(id) = self.references.get(reference).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.bookings.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Booking>, BookingError> {
        Ok(self.collect_sorted(|booking| booking.customer_id == customer_id))
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Booking>, BookingError> {
        Ok(self.collect_sorted(|booking| booking.room_id == room_id))
    }

    async fn conflicting_room_ids(
        &self,
        range: DateRange,
        rule: OverlapRule,
    ) -> Result<HashSet<RoomId>, BookingError> {
        Ok(self
            .bookings
            .iter()
            .filter(|entry| entry.is_confirmed() && rule.overlaps(&entry.stay(), &range))
            .map(|entry| entry.room_id)
            .collect())
    }

    async fn mark_cancelled(&self, id: BookingId) -> Result<Booking, BookingError> {
        let mut entry = self
            .bookings
            .get_mut(&id)
            .ok_or(BookingError::BookingNotFound(id))?;
        entry.status = BookingStatus::Cancelled;
        Ok(entry.value().clone())
    }

    async fn mark_email_sent(&self, id: BookingId) -> Result<(), BookingError> {
        let mut entry = self
            .bookings
            .get_mut(&id)
            .ok_or(BookingError::BookingNotFound(id))?;
        entry.email_sent = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Money, RoomType};
    use chrono::{NaiveDate, Utc};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn room(number: &str, location: &str, available: bool) -> Room {
        Room {
            id: None,
            room_number: number.to_string(),
            room_type: RoomType::Double,
            price_per_night: Money::from_major(8500).unwrap(),
            location: location.to_string(),
            description: None,
            amenities: vec!["WiFi".to_string()],
            capacity: 2,
            is_available: available,
        }
    }

    fn new_booking(
        reference: &str,
        room_id: RoomId,
        check_in: &str,
        check_out: &str,
    ) -> NewBooking {
        NewBooking {
            reference: reference.to_string(),
            room_id,
            customer_id: CustomerId(1),
            stay: DateRange::new(date(check_in), date(check_out)).unwrap(),
            total_price: Money::from_major(100).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_room_store_assigns_ids_and_filters() {
        let store = InMemoryRoomStore::new();
        let first = store.save(room("101", "Nairobi", true)).await.unwrap();
        let second = store.save(room("201", "Nairobi", false)).await.unwrap();
        store.save(room("102", "Mombasa", true)).await.unwrap();

        assert_eq!(first.id, Some(RoomId(1)));
        assert_eq!(second.id, Some(RoomId(2)));
        assert_eq!(store.list().await.unwrap().len(), 3);
        assert_eq!(store.list_by_location("Nairobi").await.unwrap().len(), 2);

        let available = store.list_available_by_location("Nairobi").await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].room_number, "101");
    }

    #[tokio::test]
    async fn test_room_store_rejects_duplicate_numbers() {
        let store = InMemoryRoomStore::new();
        let saved = store.save(room("101", "Nairobi", true)).await.unwrap();

        let result = store.save(room("101", "Kisumu", true)).await;
        assert_eq!(
            result,
            Err(BookingError::DuplicateRoomNumber("101".to_string()))
        );

        // Re-saving the same room under its own number is an update
        let mut updated = saved.clone();
        updated.is_available = false;
        let updated = store.save(updated).await.unwrap();
        assert_eq!(updated.id, saved.id);
        assert!(!store.get(RoomId(1)).await.unwrap().unwrap().is_available);
    }

    #[tokio::test]
    async fn test_room_store_update_of_unknown_id_fails() {
        let store = InMemoryRoomStore::new();
        let mut ghost = room("999", "Nairobi", true);
        ghost.id = Some(RoomId(42));
        assert_eq!(
            store.save(ghost).await,
            Err(BookingError::RoomNotFound(RoomId(42)))
        );
    }

    #[tokio::test]
    async fn test_room_store_delete() {
        let store = InMemoryRoomStore::new();
        store.save(room("101", "Nairobi", true)).await.unwrap();
        assert!(store.delete(RoomId(1)).await.unwrap());
        assert!(!store.delete(RoomId(1)).await.unwrap());
        assert!(store.get(RoomId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_customer_store_reuses_email() {
        let store = InMemoryCustomerStore::new();
        let first = store
            .get_or_create(NewCustomer {
                first_name: "Wanjiku".to_string(),
                last_name: "Kamau".to_string(),
                email: "wanjiku@example.com".to_string(),
                phone_number: "+254700111222".to_string(),
            })
            .await
            .unwrap();
        let second = store
            .get_or_create(NewCustomer {
                first_name: "Other".to_string(),
                last_name: "Name".to_string(),
                email: " Wanjiku@Example.com ".to_string(),
                phone_number: "+254700999999".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.first_name, "Wanjiku");
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.find_by_email("WANJIKU@example.com").await.unwrap(),
            Some(first.clone())
        );
        assert_eq!(store.get(first.id).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_booking_store_refuses_conflicting_insert() {
        let store = InMemoryBookingStore::new();
        store
            .insert(new_booking("A", RoomId(1), "2025-06-01", "2025-06-04"), OverlapRule::HalfOpen)
            .await
            .unwrap();

        let conflict = store
            .insert(new_booking("B", RoomId(1), "2025-06-03", "2025-06-05"), OverlapRule::HalfOpen)
            .await;
        assert!(matches!(conflict, Err(BookingError::Unavailable { .. })));

        // Other rooms are unaffected
        store
            .insert(new_booking("C", RoomId(2), "2025-06-03", "2025-06-05"), OverlapRule::HalfOpen)
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_booking_store_cancelled_bookings_do_not_conflict() {
        let store = InMemoryBookingStore::new();
        let first = store
            .insert(new_booking("A", RoomId(1), "2025-06-01", "2025-06-04"), OverlapRule::HalfOpen)
            .await
            .unwrap();
        store.mark_cancelled(first.id).await.unwrap();

        let range = DateRange::new(date("2025-06-02"), date("2025-06-03")).unwrap();
        assert!(store
            .conflicting_room_ids(range, OverlapRule::HalfOpen)
            .await
            .unwrap()
            .is_empty());
        store
            .insert(new_booking("B", RoomId(1), "2025-06-02", "2025-06-03"), OverlapRule::HalfOpen)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_booking_store_lookups() {
        let store = InMemoryBookingStore::new();
        let booking = store
            .insert(
                new_booking("KEN-1", RoomId(3), "2025-07-01", "2025-07-02"),
                OverlapRule::HalfOpen,
            )
            .await
            .unwrap();

        assert_eq!(
            store.find_by_reference("KEN-1").await.unwrap(),
            Some(booking.clone())
        );
        assert!(store.find_by_reference("KEN-2").await.unwrap().is_none());
        assert_eq!(store.list_by_room(RoomId(3)).await.unwrap().len(), 1);
        assert_eq!(store.list_by_customer(CustomerId(1)).await.unwrap().len(), 1);

        store.mark_email_sent(booking.id).await.unwrap();
        assert!(store.get(booking.id).await.unwrap().unwrap().email_sent);

        let duplicate = store
            .insert(
                new_booking("KEN-1", RoomId(4), "2025-07-01", "2025-07-02"),
                OverlapRule::HalfOpen,
            )
            .await;
        assert!(matches!(duplicate, Err(BookingError::Storage(_))));

        assert_eq!(
            store.mark_cancelled(BookingId(99)).await,
            Err(BookingError::BookingNotFound(BookingId(99)))
        );
    }
}
