use serde::{Deserialize, Serialize};

use super::{School, patch};
use crate::error::StoreResult;
use crate::validate::{TIME_FORMAT, Validator, clean};

const COLUMNS: &str = "id, class_name, weekday, starts_at, ends_at, subject, teacher, created_at, updated_at";

/// School days a class can be scheduled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
        }
    }

    pub fn number(&self) -> i32 {
        match self {
            Weekday::Monday => 1,
            Weekday::Tuesday => 2,
            Weekday::Wednesday => 3,
            Weekday::Thursday => 4,
            Weekday::Friday => 5,
        }
    }

    pub fn from_number(n: i32) -> Option<Self> {
        match n {
            1 => Some(Weekday::Monday),
            2 => Some(Weekday::Tuesday),
            3 => Some(Weekday::Wednesday),
            4 => Some(Weekday::Thursday),
            5 => Some(Weekday::Friday),
            _ => None,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "monday" => Some(Weekday::Monday),
            "tuesday" => Some(Weekday::Tuesday),
            "wednesday" => Some(Weekday::Wednesday),
            "thursday" => Some(Weekday::Thursday),
            "friday" => Some(Weekday::Friday),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i32,
    #[serde(rename = "class")]
    pub class_name: String,
    pub weekday: Weekday,
    pub starts_at: String,
    pub ends_at: String,
    pub subject: String,
    pub teacher: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateSchedule {
    #[serde(rename = "class")]
    pub class_name: String,
    pub weekday: String,
    pub starts_at: String,
    pub ends_at: String,
    pub subject: String,
    pub teacher: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSchedule {
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub weekday: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub subject: Option<String>,
    pub teacher: Option<String>,
}

/// A submission that passed validation, with the weekday resolved and times normalized.
struct ValidSchedule {
    class_name: String,
    weekday: Weekday,
    starts_at: String,
    ends_at: String,
    subject: String,
    teacher: String,
}

impl CreateSchedule {
    fn validated(self) -> StoreResult<ValidSchedule> {
        let mut v = Validator::new();
        v.required("class", &self.class_name)
            .required("subject", &self.subject)
            .required("teacher", &self.teacher);

        let weekday = if self.weekday.trim().is_empty() {
            v.fail("weekday", "is required");
            None
        } else {
            let day = Weekday::from_str(&self.weekday);
            if day.is_none() {
                v.fail("weekday", "must be a school day (monday to friday)");
            }
            day
        };

        let starts_at = v.time("starts_at", &self.starts_at);
        let ends_at = v.time("ends_at", &self.ends_at);
        if let (Some(start), Some(end)) = (starts_at, ends_at) {
            v.check("ends_at", end > start, "must be after starts_at");
        }
        v.finish()?;

        match (weekday, starts_at, ends_at) {
            (Some(weekday), Some(start), Some(end)) => Ok(ValidSchedule {
                class_name: clean(&self.class_name),
                weekday,
                starts_at: start.format(TIME_FORMAT).to_string(),
                ends_at: end.format(TIME_FORMAT).to_string(),
                subject: clean(&self.subject),
                teacher: clean(&self.teacher),
            }),
            _ => Err(anyhow::anyhow!("schedule passed validation without weekday or times").into()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleFilter {
    #[serde(rename = "class")]
    pub class_name: Option<String>,
}

impl<'a> School<'a> {
    pub async fn create_schedule(&self, input: CreateSchedule) -> StoreResult<Schedule> {
        let input = input.validated()?;
        let query = format!(
            r#"
            INSERT INTO schedules (class_name, weekday, starts_at, ends_at, subject, teacher)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    input.class_name,
                    input.weekday.number(),
                    input.starts_at,
                    input.ends_at,
                    input.subject,
                    input.teacher
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => row_to_schedule(&row),
            None => Err(anyhow::anyhow!("Failed to create schedule").into()),
        }
    }

    pub async fn get_schedule(&self, id: i32) -> StoreResult<Option<Schedule>> {
        let query = format!("SELECT {COLUMNS} FROM schedules WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_schedule(&row)?)),
            None => Ok(None),
        }
    }

    /// Lists the timetable in weekday order, then by start time.
    pub async fn list_schedules(&self, filter: &ScheduleFilter) -> StoreResult<Vec<Schedule>> {
        let mut schedules = Vec::new();

        let mut rows = match filter.class_name.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(class_name) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM schedules WHERE class_name = ? ORDER BY weekday, starts_at, id"
                );
                self.conn.query(&query, libsql::params![class_name]).await?
            }
            None => {
                let query = format!("SELECT {COLUMNS} FROM schedules ORDER BY weekday, starts_at, id");
                self.conn.query(&query, ()).await?
            }
        };

        while let Some(row) = rows.next().await? {
            schedules.push(row_to_schedule(&row)?);
        }

        Ok(schedules)
    }

    pub async fn update_schedule(&self, id: i32, update: UpdateSchedule) -> StoreResult<Option<Schedule>> {
        let existing = match self.get_schedule(id).await? {
            Some(schedule) => schedule,
            None => return Ok(None),
        };

        let mut input = CreateSchedule {
            class_name: existing.class_name,
            weekday: existing.weekday.as_str().to_string(),
            starts_at: existing.starts_at,
            ends_at: existing.ends_at,
            subject: existing.subject,
            teacher: existing.teacher,
        };
        patch(&mut input.class_name, update.class_name);
        patch(&mut input.weekday, update.weekday);
        patch(&mut input.starts_at, update.starts_at);
        patch(&mut input.ends_at, update.ends_at);
        patch(&mut input.subject, update.subject);
        patch(&mut input.teacher, update.teacher);
        let input = input.validated()?;

        let query = format!(
            r#"
            UPDATE schedules
            SET class_name = ?, weekday = ?, starts_at = ?, ends_at = ?, subject = ?, teacher = ?,
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
                    input.class_name,
                    input.weekday.number(),
                    input.starts_at,
                    input.ends_at,
                    input.subject,
                    input.teacher,
                    id
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_schedule(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn delete_schedule(&self, id: i32) -> StoreResult<bool> {
        let result = self
            .conn
            .execute("DELETE FROM schedules WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }
}

fn row_to_schedule(row: &libsql::Row) -> StoreResult<Schedule> {
    let day: i32 = row.get(2)?;
    let weekday = Weekday::from_number(day).ok_or_else(|| anyhow::anyhow!("Invalid weekday: {}", day))?;

    Ok(Schedule {
        id: row.get(0)?,
        class_name: row.get(1)?,
        weekday,
        starts_at: row.get(3)?,
        ends_at: row.get(4)?,
        subject: row.get(5)?,
        teacher: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
