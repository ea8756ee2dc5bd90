//! Meeting bookings as listed on the admin bookings page.
//!
//! Unlike content records these travel in snake_case, with the meeting slot
//! and the customer nested.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::content::{ValidationErrors, DEFAULT_PER_PAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            other => Err(format!("invalid booking status: {}", other)),
        }
    }
}

/// The reserved meeting slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub meeting_location: String,
    #[serde(default)]
    pub meeting_type: String,
    #[serde(default)]
    pub meeting_url: Option<String>,
}

/// The lead who booked. Missing contact details are sent as "N/A".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub lead_type: String,
    pub lead_id: String,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingBooking {
    pub id: String,
    pub booking_status: BookingStatus,
    #[serde(default)]
    pub requested_agenda: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    pub meeting: MeetingInfo,
    pub customer: CustomerInfo,
}

impl MeetingBooking {
    /// Case-insensitive match on company, contact name or email.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [
            &self.customer.company_name,
            &self.customer.contact_name,
            &self.customer.email,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }

    /// Apply a validated status change.
    pub fn apply(&mut self, update: &BookingUpdate, now: DateTime<Utc>) {
        self.booking_status = update.booking_status;
        if update.booking_status == BookingStatus::Cancelled {
            self.cancelled_at = Some(now);
            self.cancellation_reason = update.cancellation_reason.clone();
        }
    }
}

/// Status change submitted from the bookings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingUpdate {
    pub booking_status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl BookingUpdate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let reason = self.cancellation_reason.as_deref().map(str::trim).unwrap_or("");
        if self.booking_status == BookingStatus::Cancelled && reason.is_empty() {
            errors.push("cancellation_reason", "Cancellation reason is required");
        }
        errors.into_result()
    }
}

/// Filter and pagination of the bookings list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingQuery {
    pub page: u32,
    pub per_page: u32,
    pub status: Option<BookingStatus>,
    pub search: Option<String>,
}

impl Default for BookingQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            status: None,
            search: None,
        }
    }
}

impl BookingQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}
