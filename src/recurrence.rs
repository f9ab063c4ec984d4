use chrono::{Days, Months, NaiveDate};

use crate::error::{Result, SproutsError};
use crate::models::Frequency;

/// Computes the due date of the next occurrence of a recurring task.
///
/// Day-based frequencies add a fixed number of days. `Monthly` adds one
/// calendar month, clamping to the last day of a shorter month
/// (Jan 31 -> Feb 29 in a leap year).
///
/// The only failure is running off the end of the representable calendar.
pub fn next_due_date(current: NaiveDate, frequency: Frequency) -> Result<NaiveDate> {
    let next = match frequency {
        Frequency::Daily => current.checked_add_days(Days::new(1)),
        Frequency::EveryTwoToThreeDays => current.checked_add_days(Days::new(2)),
        Frequency::EveryFourToFiveDays => current.checked_add_days(Days::new(4)),
        Frequency::Weekly => current.checked_add_days(Days::new(7)),
        Frequency::Biweekly => current.checked_add_days(Days::new(14)),
        Frequency::Monthly => current.checked_add_months(Months::new(1)),
    };
    next.ok_or_else(|| {
        SproutsError::InvalidState(format!("no {} occurrence after {}", frequency, current))
    })
}
