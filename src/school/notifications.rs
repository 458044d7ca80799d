use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{School, patch};
use crate::error::StoreResult;
use crate::validate::{DATE_FORMAT, Validator, clean};

const COLUMNS: &str = "id, title, message, audience, date, read, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub audience: String,
    pub date: String,
    pub read: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateNotification {
    pub title: String,
    pub message: String,
    pub audience: String,
    /// Publication date, today when omitted.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateNotification {
    pub title: Option<String>,
    pub message: Option<String>,
    pub audience: Option<String>,
    pub date: Option<String>,
    pub read: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread: bool,
}

struct ValidNotification {
    title: String,
    message: String,
    audience: String,
    date: NaiveDate,
}

fn validate(title: &str, message: &str, audience: &str, date: Option<&str>) -> StoreResult<ValidNotification> {
    let mut v = Validator::new();
    v.required("title", title)
        .required("message", message)
        .required("audience", audience);
    let date = v.date("date", date);
    v.finish()?;

    let date = date.ok_or_else(|| anyhow::anyhow!("notification passed validation without a date"))?;
    Ok(ValidNotification {
        title: clean(title),
        message: clean(message),
        audience: clean(audience),
        date,
    })
}

impl<'a> School<'a> {
    pub async fn create_notification(&self, input: CreateNotification, today: NaiveDate) -> StoreResult<Notification> {
        let date = input
            .date
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| today.format(DATE_FORMAT).to_string());
        let input = validate(&input.title, &input.message, &input.audience, Some(date.as_str()))?;

        let query = format!(
            r#"
            INSERT INTO notifications (title, message, audience, date, read)
            VALUES (?, ?, ?, ?, 0)
            RETURNING {COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    input.title,
                    input.message,
                    input.audience,
                    input.date.format(DATE_FORMAT).to_string()
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => row_to_notification(&row),
            None => Err(anyhow::anyhow!("Failed to create notification").into()),
        }
    }

    pub async fn get_notification(&self, id: i32) -> StoreResult<Option<Notification>> {
        let query = format!("SELECT {COLUMNS} FROM notifications WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_notification(&row)?)),
            None => Ok(None),
        }
    }

    /// Newest first.
    pub async fn list_notifications(&self, filter: &NotificationFilter) -> StoreResult<Vec<Notification>> {
        let where_clause = if filter.unread { "WHERE read = 0" } else { "" };
        let query = format!("SELECT {COLUMNS} FROM notifications {where_clause} ORDER BY date DESC, id DESC");
        let mut rows = self.conn.query(&query, ()).await?;
        let mut notifications = Vec::new();

        while let Some(row) = rows.next().await? {
            notifications.push(row_to_notification(&row)?);
        }

        Ok(notifications)
    }

    pub async fn update_notification(
        &self,
        id: i32,
        update: UpdateNotification,
    ) -> StoreResult<Option<Notification>> {
        let existing = match self.get_notification(id).await? {
            Some(notification) => notification,
            None => return Ok(None),
        };

        let mut title = existing.title;
        let mut message = existing.message;
        let mut audience = existing.audience;
        let mut date = existing.date;
        let mut read = existing.read;
        patch(&mut title, update.title);
        patch(&mut message, update.message);
        patch(&mut audience, update.audience);
        patch(&mut date, update.date);
        patch(&mut read, update.read);
        let input = validate(&title, &message, &audience, Some(date.as_str()))?;

        let query = format!(
            r#"
            UPDATE notifications
            SET title = ?, message = ?, audience = ?, date = ?, read = ?,
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
                    input.message,
                    input.audience,
                    input.date.format(DATE_FORMAT).to_string(),
                    read as i32,
                    id
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_notification(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn mark_notification_read(&self, id: i32) -> StoreResult<Option<Notification>> {
        let query = format!(
            r#"
            UPDATE notifications
            SET read = 1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING {COLUMNS}
        "#
        );

        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_notification(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn delete_notification(&self, id: i32) -> StoreResult<bool> {
        let result = self
            .conn
            .execute("DELETE FROM notifications WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }
}

fn row_to_notification(row: &libsql::Row) -> StoreResult<Notification> {
    let read: i32 = row.get(5)?;

    Ok(Notification {
        id: row.get(0)?,
        title: row.get(1)?,
        message: row.get(2)?,
        audience: row.get(3)?,
        date: row.get(4)?,
        read: read != 0,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
