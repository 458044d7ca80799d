use serde::{Deserialize, Serialize};

use super::{School, patch};
use crate::error::StoreResult;
use crate::validate::{DATE_FORMAT, Validator, clean};

const COLUMNS: &str = "id, title, description, date, priority, status, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPriority {
    Low,
    Medium,
    High,
}

impl ReminderPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderPriority::Low => "low",
            ReminderPriority::Medium => "medium",
            ReminderPriority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(ReminderPriority::Low),
            "medium" => Some(ReminderPriority::Medium),
            "high" => Some(ReminderPriority::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Done,
    Cancelled,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Done => "done",
            ReminderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(ReminderStatus::Pending),
            "done" => Some(ReminderStatus::Done),
            "cancelled" => Some(ReminderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub date: String,
    pub priority: ReminderPriority,
    pub status: ReminderStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Priority and status arrive as plain strings so a bad value is reported
/// per field instead of rejecting the whole body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateReminder {
    pub title: String,
    pub description: String,
    pub date: String,
    pub priority: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateReminder {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

struct ValidReminder {
    title: String,
    description: String,
    date: String,
    priority: ReminderPriority,
    status: ReminderStatus,
}

impl CreateReminder {
    fn validated(self) -> StoreResult<ValidReminder> {
        let mut v = Validator::new();
        v.required("title", &self.title)
            .required("description", &self.description);
        let date = v.date("date", Some(self.date.as_str()));

        let priority = if self.priority.trim().is_empty() {
            v.fail("priority", "is required");
            None
        } else {
            let parsed = ReminderPriority::from_str(&self.priority);
            v.check("priority", parsed.is_some(), "must be one of low, medium, high");
            parsed
        };

        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Some(ReminderStatus::default()),
            Some(s) => {
                let parsed = ReminderStatus::from_str(s);
                v.check("status", parsed.is_some(), "must be one of pending, done, cancelled");
                parsed
            }
        };
        v.finish()?;

        match (date, priority, status) {
            (Some(date), Some(priority), Some(status)) => Ok(ValidReminder {
                title: clean(&self.title),
                description: clean(&self.description),
                date: date.format(DATE_FORMAT).to_string(),
                priority,
                status,
            }),
            _ => Err(anyhow::anyhow!("reminder passed validation with missing fields").into()),
        }
    }
}

impl<'a> School<'a> {
    pub async fn create_reminder(&self, input: CreateReminder) -> StoreResult<Reminder> {
        let input = input.validated()?;
        let query = format!(
            r#"
            INSERT INTO reminders (title, description, date, priority, status)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    input.title,
                    input.description,
                    input.date,
                    input.priority.as_str(),
                    input.status.as_str()
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => row_to_reminder(&row),
            None => Err(anyhow::anyhow!("Failed to create reminder").into()),
        }
    }

    pub async fn get_reminder(&self, id: i32) -> StoreResult<Option<Reminder>> {
        let query = format!("SELECT {COLUMNS} FROM reminders WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_reminder(&row)?)),
            None => Ok(None),
        }
    }

    /// Soonest first.
    pub async fn list_reminders(&self) -> StoreResult<Vec<Reminder>> {
        let query = format!("SELECT {COLUMNS} FROM reminders ORDER BY date ASC, id");
        let mut rows = self.conn.query(&query, ()).await?;
        let mut reminders = Vec::new();

        while let Some(row) = rows.next().await? {
            reminders.push(row_to_reminder(&row)?);
        }

        Ok(reminders)
    }

    pub async fn update_reminder(&self, id: i32, update: UpdateReminder) -> StoreResult<Option<Reminder>> {
        let existing = match self.get_reminder(id).await? {
            Some(reminder) => reminder,
            None => return Ok(None),
        };

        let mut input = CreateReminder {
            title: existing.title,
            description: existing.description,
            date: existing.date,
            priority: existing.priority.as_str().to_string(),
            status: Some(existing.status.as_str().to_string()),
        };
        patch(&mut input.title, update.title);
        patch(&mut input.description, update.description);
        patch(&mut input.date, update.date);
        patch(&mut input.priority, update.priority);
        if update.status.is_some() {
            input.status = update.status;
        }
        let input = input.validated()?;

        let query = format!(
            r#"
            UPDATE reminders
            SET title = ?, description = ?, date = ?, priority = ?, status = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING {COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    input.title,
                    input.description,
                    input.date,
                    input.priority.as_str(),
                    input.status.as_str(),
                    id
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_reminder(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn delete_reminder(&self, id: i32) -> StoreResult<bool> {
        let result = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }
}

fn row_to_reminder(row: &libsql::Row) -> StoreResult<Reminder> {
    let priority: String = row.get(4)?;
    let status: String = row.get(5)?;

    Ok(Reminder {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date: row.get(3)?,
        priority: ReminderPriority::from_str(&priority)
            .ok_or_else(|| anyhow::anyhow!("unknown reminder priority {priority}"))?,
        status: ReminderStatus::from_str(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown reminder status {status}"))?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
