use std::fmt;

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use crate::models::Task;

/// Display category of a due date relative to today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueBucket {
    Today,
    Tomorrow,
    /// Due 2 to 7 days from today.
    InDays(i64),
    /// Anything else, including overdue dates: a short month/day label.
    Calendar(String),
}

impl fmt::Display for DueBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueBucket::Today => f.write_str("Today"),
            DueBucket::Tomorrow => f.write_str("Tomorrow"),
            DueBucket::InDays(n) => write!(f, "In {} day{}", n, if *n > 1 { "s" } else { "" }),
            DueBucket::Calendar(label) => f.write_str(label),
        }
    }
}

/// Today's date in local time.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Classifies `date` against `today`. Both are calendar days, so time of day
/// never enters the comparison.
pub fn classify(date: NaiveDate, today: NaiveDate) -> DueBucket {
    let days = (date - today).num_days();
    match days {
        0 => DueBucket::Today,
        1 => DueBucket::Tomorrow,
        2..=7 => DueBucket::InDays(days),
        _ => DueBucket::Calendar(date.format("%b %-d").to_string()),
    }
}

/// Classifies a point in time by truncating it to its local calendar day.
pub fn classify_instant<Tz: TimeZone>(at: &DateTime<Tz>, today: NaiveDate) -> DueBucket {
    classify(at.with_timezone(&Local).date_naive(), today)
}

/// True when two instants fall on the same local calendar day.
pub fn same_local_day<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    a.with_timezone(&Local).date_naive() == b.with_timezone(&Local).date_naive()
}

pub fn is_due_today(task: &Task, today: NaiveDate) -> bool {
    classify(task.due_date, today) == DueBucket::Today
}

/// The task list split into display sections.
///
/// Every section is ordered by ascending due date; tasks due the same day
/// keep their store order.
#[derive(Debug, Default)]
pub struct Agenda<'a> {
    pub today: Vec<&'a Task>,
    pub upcoming: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
}

impl<'a> Agenda<'a> {
    pub fn build(tasks: &'a [Task], today: NaiveDate) -> Self {
        let mut sorted: Vec<&Task> = tasks.iter().collect();
        sorted.sort_by_key(|t| t.due_date);

        let mut agenda = Agenda::default();
        for t in sorted {
            if t.is_completed() {
                agenda.completed.push(t);
            } else if is_due_today(t, today) {
                agenda.today.push(t);
            } else {
                agenda.upcoming.push(t);
            }
        }
        agenda
    }

    /// Today followed by Upcoming.
    pub fn active(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.today.iter().chain(self.upcoming.iter()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.upcoming.is_empty() && self.completed.is_empty()
    }
}

/// The earliest task that still needs doing.
pub fn next_task(tasks: &[Task]) -> Option<&Task> {
    tasks
        .iter()
        .filter(|t| !t.is_completed())
        .fold(None, |best: Option<&Task>, t| match best {
            Some(b) if b.due_date <= t.due_date => Some(b),
            _ => Some(t),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn buckets_relative_to_today() {
        let today = date(2024, 1, 1);
        assert_eq!(classify(date(2024, 1, 1), today), DueBucket::Today);
        assert_eq!(classify(date(2024, 1, 2), today), DueBucket::Tomorrow);
        assert_eq!(classify(date(2024, 1, 5), today), DueBucket::InDays(4));
        assert_eq!(classify(date(2024, 1, 8), today), DueBucket::InDays(7));
        assert_eq!(classify(date(2024, 1, 9), today), DueBucket::Calendar("Jan 9".into()));
        assert_eq!(classify(date(2024, 3, 1), today), DueBucket::Calendar("Mar 1".into()));
    }

    #[test]
    fn overdue_gets_a_calendar_label() {
        let today = date(2024, 1, 10);
        assert_eq!(classify(date(2024, 1, 9), today), DueBucket::Calendar("Jan 9".into()));
    }

    #[test]
    fn labels() {
        assert_eq!(DueBucket::Today.to_string(), "Today");
        assert_eq!(DueBucket::InDays(4).to_string(), "In 4 days");
        assert_eq!(DueBucket::Calendar("Mar 1".into()).to_string(), "Mar 1");
    }

    #[test]
    fn instants_truncate_to_local_day() {
        let today = date(2024, 1, 1);
        let evening = Local.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap();
        let morning = Local.with_ymd_and_hms(2024, 1, 2, 0, 1, 0).unwrap();
        assert_eq!(classify_instant(&evening, today), DueBucket::Today);
        assert_eq!(classify_instant(&morning, today), DueBucket::Tomorrow);
        assert!(!same_local_day(&evening, &morning));
    }
}
