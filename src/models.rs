use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SproutsError;

/// How often a recurring care task comes back.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Daily,
    EveryTwoToThreeDays,
    EveryFourToFiveDays,
    Weekly,
    Biweekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 6] = [
        Frequency::Daily,
        Frequency::EveryTwoToThreeDays,
        Frequency::EveryFourToFiveDays,
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
    ];

    /// The label stored on disk and shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::EveryTwoToThreeDays => "2-3 days",
            Frequency::EveryFourToFiveDays => "4-5 days",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Frequency {
    type Err = SproutsError;

    /// Accepts the stored labels plus space-free spellings such as `2-3-days`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.as_str() {
            "daily" => Ok(Frequency::Daily),
            "2 3 days" | "2 3days" => Ok(Frequency::EveryTwoToThreeDays),
            "4 5 days" | "4 5days" => Ok(Frequency::EveryFourToFiveDays),
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" | "bi weekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(SproutsError::InvalidState(format!(
                "unknown frequency '{}' (expected one of: {})",
                s,
                Frequency::ALL.map(Frequency::label).join(", ")
            ))),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = SproutsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.label().to_string()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
}

impl RecurrencePattern {
    pub fn new(frequency: Frequency) -> Self {
        RecurrencePattern { frequency }
    }
}

/// A single plant care task instance.
///
/// Recurring series are star-shaped: every spawned instance carries the id of
/// the root task in `parent_task_id`, never the id of its predecessor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    /// Unique identifier, the only lookup key.
    pub id: String,
    pub title: String,
    pub plant_name: Option<String>,
    pub description: Option<String>,
    /// Day the task becomes actionable.
    pub due_date: NaiveDate,
    /// Present iff the task repeats.
    pub recurrence: Option<RecurrencePattern>,
    /// Present iff the task is completed.
    pub completed_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    /// Root of the lineage this instance was spawned from.
    pub parent_task_id: Option<String>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_date.is_some()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn frequency(&self) -> Option<Frequency> {
        self.recurrence.map(|p| p.frequency)
    }

    /// Id of the lineage root: the parent if spawned, otherwise itself.
    pub fn root_id(&self) -> &str {
        self.parent_task_id.as_deref().unwrap_or(&self.id)
    }

    pub fn is_root(&self) -> bool {
        self.parent_task_id.is_none()
    }
}

/// User input for creating a root task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub plant_name: Option<String>,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub frequency: Option<Frequency>,
}

/// The descriptive fields an edit replaces across a whole lineage.
///
/// Schedule, ids and completion state are deliberately absent.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEdit {
    pub title: String,
    pub plant_name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
}

impl TaskEdit {
    /// Starts an edit from the task's current values.
    pub fn from_task(task: &Task) -> Self {
        TaskEdit {
            title: task.title.clone(),
            plant_name: task.plant_name.clone(),
            description: task.description.clone(),
            frequency: task.frequency(),
        }
    }
}

/// A plant in the user's collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: String,
    pub name: String,
    /// Location of the user's own photo.
    #[serde(default, rename = "uri", skip_serializing_if = "Option::is_none")]
    pub photo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watering: Option<String>,
    #[serde(default)]
    pub sunlight: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
    pub created_date: DateTime<Utc>,
}

impl Plant {
    pub fn is_enriched(&self) -> bool {
        self.watering.is_some() || !self.sunlight.is_empty() || self.reference_image.is_some()
    }
}

/// A date on the wire: `YYYY-MM-DD`, an RFC 3339 timestamp, or epoch millis.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
enum WireInstant {
    Millis(i64),
    Text(String),
}

impl WireInstant {
    fn into_date(self) -> Result<NaiveDate, SproutsError> {
        match self {
            WireInstant::Millis(ms) => Ok(millis_to_utc(ms)?.with_timezone(&Local).date_naive()),
            WireInstant::Text(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                    return Ok(d);
                }
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Local).date_naive())
                    .map_err(|e| SproutsError::InvalidState(format!("bad date '{}': {}", s, e)))
            }
        }
    }

    fn into_instant(self) -> Result<DateTime<Utc>, SproutsError> {
        match self {
            WireInstant::Millis(ms) => millis_to_utc(ms),
            WireInstant::Text(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    return Ok(dt.with_timezone(&Utc));
                }
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .and_then(|dt| dt.and_local_timezone(Local).earliest())
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok_or_else(|| SproutsError::InvalidState(format!("bad timestamp '{}'", s)))
            }
        }
    }
}

fn millis_to_utc(ms: i64) -> Result<DateTime<Utc>, SproutsError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| SproutsError::InvalidState(format!("epoch millis {} out of range", ms)))
}

/// Serialized shape of a task, with the boolean flags the app stores.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: String,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    due_date: WireInstant,
    #[serde(default)]
    is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default)]
    is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_date: Option<WireInstant>,
    created_date: WireInstant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_task_id: Option<String>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = SproutsError;

    fn try_from(r: TaskRecord) -> Result<Self, Self::Error> {
        let created_date = r.created_date.into_instant()?;

        let recurrence = match (r.is_recurring, r.recurrence_pattern) {
            (true, Some(p)) => Some(p),
            (true, None) => {
                tracing::warn!(task_id = %r.id, "recurring task has no pattern, loading as one-off");
                None
            }
            (false, _) => None,
        };

        let completed_date = match (r.is_completed, r.completed_date) {
            (true, Some(d)) => Some(d.into_instant()?),
            (true, None) => {
                tracing::warn!(task_id = %r.id, "completed task has no completion date, using creation date");
                Some(created_date)
            }
            (false, _) => None,
        };

        Ok(Task {
            id: r.id,
            title: r.title,
            plant_name: r.plant_name,
            description: r.description,
            due_date: r.due_date.into_date()?,
            recurrence,
            completed_date,
            created_date,
            parent_task_id: r.parent_task_id,
        })
    }
}

impl From<Task> for TaskRecord {
    fn from(t: Task) -> Self {
        TaskRecord {
            id: t.id,
            title: t.title,
            plant_name: t.plant_name,
            description: t.description,
            due_date: WireInstant::Text(t.due_date.format("%Y-%m-%d").to_string()),
            is_recurring: t.recurrence.is_some(),
            recurrence_pattern: t.recurrence,
            is_completed: t.completed_date.is_some(),
            completed_date: t.completed_date.map(|d| WireInstant::Text(d.to_rfc3339())),
            created_date: WireInstant::Text(t.created_date.to_rfc3339()),
            parent_task_id: t.parent_task_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_parses_labels_and_spellings() {
        for f in Frequency::ALL {
            assert_eq!(f.label().parse::<Frequency>().unwrap(), f);
        }
        assert_eq!("2-3-days".parse::<Frequency>().unwrap(), Frequency::EveryTwoToThreeDays);
        assert_eq!("Weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
    }

    #[test]
    fn unknown_frequency_is_invalid_state() {
        let err = "fortnightly-ish".parse::<Frequency>().unwrap_err();
        assert!(matches!(err, SproutsError::InvalidState(_)));
    }

    #[test]
    fn loads_records_written_by_the_mobile_app() {
        let json = r#"{
            "id": "1704096000000",
            "title": "Water",
            "plantName": "Monstera",
            "dueDate": "2024-01-08T12:00:00.000Z",
            "isRecurring": true,
            "recurrencePattern": { "frequency": "weekly" },
            "isCompleted": true,
            "completedDate": "2024-01-08T18:30:00.000Z",
            "createdDate": 1704096000000,
            "parentTaskId": "1704000000000"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.title, "Water");
        assert_eq!(task.frequency(), Some(Frequency::Weekly));
        assert!(task.is_completed());
        assert_eq!(task.root_id(), "1704000000000");
        assert_eq!(task.created_date.timestamp_millis(), 1704096000000);
    }

    #[test]
    fn normalizes_flags_without_payload() {
        let json = r#"{
            "id": "a",
            "title": "Mist",
            "dueDate": "2024-02-01",
            "isRecurring": true,
            "isCompleted": true,
            "createdDate": "2024-01-01T00:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(!task.is_recurring());
        assert_eq!(task.completed_date, Some(task.created_date));
    }

    #[test]
    fn writes_camel_case_with_flags() {
        let task = Task {
            id: "x".into(),
            title: "Fertilize".into(),
            plant_name: None,
            description: None,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            recurrence: Some(RecurrencePattern::new(Frequency::EveryFourToFiveDays)),
            completed_date: None,
            created_date: DateTime::from_timestamp(0, 0).unwrap(),
            parent_task_id: None,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["dueDate"], "2024-03-01");
        assert_eq!(value["isRecurring"], true);
        assert_eq!(value["isCompleted"], false);
        assert_eq!(value["recurrencePattern"]["frequency"], "4-5 days");
        assert!(value.get("parentTaskId").is_none());

        let back: Task = serde_json::from_value(value).unwrap();
        assert_eq!(back, task);
    }
}
