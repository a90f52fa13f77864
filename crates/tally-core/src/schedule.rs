//! Schedule arithmetic for recurring rules and bills
//!
//! Month-based steps keep the day-of-month fixed but clamp it to 28 so the
//! cursor never lands on a day a month doesn't have (Jan 31 + 1 month would
//! otherwise be invalid); the cursor then stays on the clamped day for all
//! later periods.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{BillFrequency, RecurringFrequency};

/// Highest day-of-month a monthly/yearly cursor may use.
const MAX_SCHEDULE_DAY: u32 = 28;

/// Add whole months to a date, clamping the day to 28.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let zero_based = date.month0() as i32 + months;
    let year = date.year() + zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    let day = date.day().min(MAX_SCHEDULE_DAY);

    // Always valid: day <= 28 exists in every month.
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or(date)
}

/// Advance a recurring rule's cursor by one period.
pub fn advance_recurring(date: NaiveDate, frequency: RecurringFrequency) -> NaiveDate {
    match frequency {
        RecurringFrequency::Daily => date + Duration::days(1),
        RecurringFrequency::Weekly => date + Duration::weeks(1),
        RecurringFrequency::Monthly => add_months(date, 1),
        RecurringFrequency::Yearly => add_months(date, 12),
    }
}

/// Next due date for a recurring bill. One-time bills have no successor.
pub fn advance_bill(date: NaiveDate, frequency: BillFrequency) -> Option<NaiveDate> {
    match frequency {
        BillFrequency::Once => None,
        BillFrequency::Weekly => Some(date + Duration::weeks(1)),
        BillFrequency::Monthly => Some(add_months(date, 1)),
        BillFrequency::Quarterly => Some(add_months(date, 3)),
        BillFrequency::Yearly => Some(add_months(date, 12)),
    }
}
