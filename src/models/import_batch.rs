use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Pending,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Unknown values read back from storage are treated as failed batches.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            _ => Self::Failed,
        }
    }

    pub fn all() -> &'static [ImportStatus] {
        &[Self::Pending, Self::Completed, Self::Failed]
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One upload-and-process cycle of a sales spreadsheet.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub id: Option<i64>,
    pub filename: String,
    pub week_of: NaiveDate,
    pub imported_at: String,
    pub processed_items: i64,
    pub status: ImportStatus,
}

impl ImportBatch {
    pub fn new(filename: String, week_of: NaiveDate) -> Self {
        Self {
            id: None,
            filename,
            week_of,
            imported_at: chrono::Utc::now().to_rfc3339(),
            processed_items: 0,
            status: ImportStatus::Pending,
        }
    }
}

/// Monday of the week containing `date`; the default "week of" for an import.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
}
