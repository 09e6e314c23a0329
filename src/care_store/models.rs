use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub stock: i64,
    pub min_stock: i64,
    pub unit: String,
}

impl InventoryItem {
    /// Stock at or below the item's own threshold.
    pub fn is_low(&self) -> bool {
        self.stock <= self.min_stock
    }
}

/// Fixed vocabulary of activity log categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogType {
    Vitals,
    Food,
    Meds,
    Note,
    Hygiene,
    Incident,
}

impl LogType {
    pub const ALL: [LogType; 6] = [
        LogType::Vitals,
        LogType::Food,
        LogType::Meds,
        LogType::Note,
        LogType::Hygiene,
        LogType::Incident,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Vitals => "VITALS",
            LogType::Food => "FOOD",
            LogType::Meds => "MEDS",
            LogType::Note => "NOTE",
            LogType::Hygiene => "HYGIENE",
            LogType::Incident => "INCIDENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VITALS" => Some(LogType::Vitals),
            "FOOD" => Some(LogType::Food),
            "MEDS" => Some(LogType::Meds),
            "NOTE" => Some(LogType::Note),
            "HYGIENE" => Some(LogType::Hygiene),
            "INCIDENT" => Some(LogType::Incident),
            _ => None,
        }
    }

    /// Human label used in summaries, e.g. "Vitals".
    pub fn label(&self) -> &'static str {
        match self {
            LogType::Vitals => "Vitals",
            LogType::Food => "Food",
            LogType::Meds => "Meds",
            LogType::Note => "Note",
            LogType::Hygiene => "Hygiene",
            LogType::Incident => "Incident",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

/// An activity log entry joined with resident and author names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: i64,
    pub resident_id: i64,
    pub resident_name: String,
    pub author_name: Option<String>,
    pub log_type: LogType,
    pub details: Option<String>,
    pub created_at: i64,
}

/// An attendance row without a check-out, joined with the staff name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAttendance {
    pub id: i64,
    pub staff_id: i64,
    pub staff_name: String,
    pub check_in: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMessage {
    pub id: i64,
    pub author_name: String,
    pub content: String,
    /// True when written by a family member, false when staff replied.
    pub from_family: bool,
    pub created_at: i64,
}

/// A resident together with the newest message of their family thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentLatestMessage {
    pub resident_id: i64,
    pub resident_name: String,
    pub latest_message: FamilyMessage,
}
