// Domain types shared by the stores, the availability engine and the booking workflow

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::error::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Amount of money in minor units (cents), so nightly prices multiply exactly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(u64);

impl Money {
    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    // None on overflow
    pub fn from_major(major: u64) -> Option<Self> {
        major.checked_mul(100).map(Self)
    }

    pub fn minor_units(&self) -> u64 {
        self.0
    }

    // None on overflow
    pub fn checked_mul(self, factor: u64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = BookingError;

    // Accepts "12000", "12000.5" and "12000.00"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BookingError::Validation(format!("invalid amount: {s:?}"));
        let s = s.trim();
        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, ""),
        };
        if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if minor.len() > 2 || !minor.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let major: u64 = major.parse().map_err(|_| invalid())?;
        let minor: u64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => minor.parse().map_err(|_| invalid())?,
        };
        major
            .checked_mul(100)
            .and_then(|m| m.checked_add(minor))
            .map(Money)
            .ok_or_else(invalid)
    }
}

// Serialized as a decimal string, e.g. "12000.00"
impl Serialize for Money {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomType {
    Single,
    Double,
    Suite,
    Deluxe,
    Standard,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Single => "SINGLE",
            RoomType::Double => "DOUBLE",
            RoomType::Suite => "SUITE",
            RoomType::Deluxe => "DELUXE",
            RoomType::Standard => "STANDARD",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SINGLE" => Ok(RoomType::Single),
            "DOUBLE" => Ok(RoomType::Double),
            "SUITE" => Ok(RoomType::Suite),
            "DELUXE" => Ok(RoomType::Deluxe),
            "STANDARD" => Ok(RoomType::Standard),
            other => Err(BookingError::Validation(format!(
                "unknown room type: {other}"
            ))),
        }
    }
}

// Administrative checks run through `Validate` before a room is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Room {
    // None until the room store assigns one
    pub id: Option<RoomId>,
    #[validate(custom = "not_blank")]
    pub room_number: String,
    pub room_type: RoomType,
    pub price_per_night: Money,
    #[validate(custom = "not_blank")]
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[validate(range(min = 1))]
    pub capacity: u32,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

// Rejects empty and whitespace-only text
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

// Customer details carried by a booking request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

// Emails are the natural key for customers
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// A stay `[check_in, check_out)`. Construction through `DateRange::new`
// guarantees at least one night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl DateRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BookingError> {
        if check_in >= check_out {
            return Err(BookingError::InvalidRange {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    // Search windows may be empty (check_in == check_out); only reversed ranges are rejected
    pub(crate) fn search_window(
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Self, BookingError> {
        if check_in > check_out {
            return Err(BookingError::InvalidRange {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn nights(&self) -> u64 {
        (self.check_out - self.check_in).num_days().max(0) as u64
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.check_in, self.check_out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub reference: String,
    pub room_id: RoomId,
    pub customer_id: CustomerId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: Money,
    pub status: BookingStatus,
    pub email_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn stay(&self) -> DateRange {
        DateRange {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

// Booking as handed to the booking store, before an id is assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub reference: String,
    pub room_id: RoomId,
    pub customer_id: CustomerId,
    pub stay: DateRange,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
}
