//! Calendar Module
//! Groups meeting bookings by the local calendar day their meeting starts
//! on, and lays a month out as Sunday-first weeks for the calendar view.

use chrono::{Datelike, Duration, FixedOffset, NaiveDate};
use std::collections::BTreeMap;

use crate::bookings::MeetingBooking;

/// Bookings per day, ascending by date.
pub type DayBuckets<'a> = BTreeMap<NaiveDate, Vec<&'a MeetingBooking>>;

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Korea Standard Time, the offset the admin team works in.
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("UTC+9 is a valid offset")
}

/// `YYYY-MM-DD`
pub fn iso_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Bucket bookings by the `offset`-local day of their meeting start. Each
/// bucket is ordered by start time.
pub fn group_by_day(bookings: &[MeetingBooking], offset: FixedOffset) -> DayBuckets<'_> {
    let mut buckets: DayBuckets<'_> = BTreeMap::new();
    for booking in bookings {
        let day = booking.meeting.start_time.with_timezone(&offset).date_naive();
        buckets.entry(day).or_default().push(booking);
    }
    for day in buckets.values_mut() {
        day.sort_by_key(|b| b.meeting.start_time);
    }
    buckets
}

pub fn bookings_on<'a, 'b>(buckets: &'b DayBuckets<'a>, day: NaiveDate) -> &'b [&'a MeetingBooking] {
    buckets.get(&day).map(Vec::as_slice).unwrap_or(&[])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub booking_count: usize,
}

/// Seven cells, Sunday first. `None` pads days outside the month.
pub type Week = [Option<CalendarDay>; 7];

/// Weeks of `year`-`month` with booking counts. `None` for an invalid month.
pub fn month_grid(year: i32, month: u32, buckets: &DayBuckets<'_>) -> Option<Vec<Week>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    let mut weeks = Vec::new();
    let mut week: Week = [None; 7];
    let mut column = first.weekday().num_days_from_sunday() as usize;
    let mut day = first;

    while day < next_month {
        week[column] = Some(CalendarDay {
            date: day,
            booking_count: bookings_on(buckets, day).len(),
        });
        column += 1;
        if column == 7 {
            weeks.push(week);
            week = [None; 7];
            column = 0;
        }
        day += Duration::days(1);
    }
    if column > 0 {
        weeks.push(week);
    }

    Some(weeks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookings::BookingStatus;
    use serde_json::json;

    fn booking(id: &str, start: &str) -> MeetingBooking {
        serde_json::from_value(json!({
            "id": id,
            "booking_status": "CONFIRMED",
            "created_at": "2025-01-01T00:00:00Z",
            "meeting": {
                "id": format!("slot-{}", id),
                "title": "Demo",
                "start_time": start,
                "end_time": start,
                "duration_minutes": 30,
                "meeting_location": "ONLINE",
                "meeting_type": "DEMO"
            },
            "customer": {
                "lead_type": "CONTACT",
                "lead_id": "c-1",
                "company_name": "ACME",
                "contact_name": "Kim",
                "email": "kim@acme.example",
                "phone": "N/A"
            }
        }))
        .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_groups_by_local_day_not_utc_day() {
        // 16:00 UTC on the 14th is 01:00 on the 15th in Seoul.
        let bookings = vec![
            booking("late", "2025-01-14T16:00:00Z"),
            booking("early", "2025-01-14T02:00:00Z"),
        ];
        let buckets = group_by_day(&bookings, kst());
        assert_eq!(bookings_on(&buckets, date(2025, 1, 14))[0].id, "early");
        assert_eq!(bookings_on(&buckets, date(2025, 1, 15))[0].id, "late");

        let utc = group_by_day(&bookings, FixedOffset::east_opt(0).unwrap());
        assert_eq!(bookings_on(&utc, date(2025, 1, 14)).len(), 2);
    }

    #[test]
    fn test_bucket_is_sorted_by_start_time() {
        let bookings = vec![
            booking("b", "2025-03-03T07:00:00Z"),
            booking("a", "2025-03-03T01:00:00Z"),
            booking("c", "2025-03-03T08:30:00Z"),
        ];
        let buckets = group_by_day(&bookings, kst());
        let ids: Vec<&str> = bookings_on(&buckets, date(2025, 3, 3))
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(buckets.values().flatten().all(|b| b.booking_status == BookingStatus::Confirmed));
    }

    #[test]
    fn test_keys_are_iso_dates_in_order() {
        let bookings = vec![
            booking("x", "2025-02-10T01:00:00Z"),
            booking("y", "2025-01-31T01:00:00Z"),
        ];
        let keys: Vec<String> = group_by_day(&bookings, kst()).keys().map(|d| iso_key(*d)).collect();
        assert_eq!(keys, vec!["2025-01-31", "2025-02-10"]);
    }

    #[test]
    fn test_empty_day_has_no_bookings() {
        let buckets = group_by_day(&[], kst());
        assert!(bookings_on(&buckets, date(2025, 1, 1)).is_empty());
    }

    #[test]
    fn test_month_grid_starts_on_sunday() {
        // 2025-01-01 is a Wednesday.
        let bookings = vec![booking("a", "2025-01-15T01:00:00Z")];
        let buckets = group_by_day(&bookings, kst());
        let weeks = month_grid(2025, 1, &buckets).unwrap();

        assert_eq!(weeks.len(), 5);
        assert!(weeks[0][..3].iter().all(Option::is_none));
        assert_eq!(weeks[0][3].map(|d| d.date), Some(date(2025, 1, 1)));

        let days: Vec<CalendarDay> = weeks.iter().flatten().flatten().copied().collect();
        assert_eq!(days.len(), 31);
        let total: usize = days.iter().map(|d| d.booking_count).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_month_grid_rejects_invalid_month() {
        assert!(month_grid(2025, 13, &BTreeMap::new()).is_none());
        assert_eq!(month_grid(2024, 12, &BTreeMap::new()).map(|w| w.len()), Some(5));
    }
}
