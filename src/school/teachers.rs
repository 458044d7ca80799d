use serde::{Deserialize, Serialize};

use super::{School, patch, patch_opt};
use crate::error::{StoreError, StoreResult};
use crate::validate::{Validator, clean, clean_opt, digits_only, split_comma_separated_string};

const COLUMNS: &str = "id, name, email, phone, subjects, education, notes, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subjects: Vec<String>,
    pub education: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateTeacher {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subjects: Vec<String>,
    pub education: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateTeacher {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub education: Option<String>,
    pub notes: Option<String>,
}

impl CreateTeacher {
    fn validated(self) -> StoreResult<Self> {
        let email = clean(&self.email).to_lowercase();

        let mut v = Validator::new();
        v.required("name", &self.name).required("email", &email);
        if !email.is_empty() {
            v.email("email", Some(email.as_str()));
        }
        v.phone("phone", self.phone.as_deref().filter(|p| !p.trim().is_empty()));
        v.finish()?;

        let subjects = self
            .subjects
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(CreateTeacher {
            name: clean(&self.name),
            email,
            phone: digits_only(self.phone),
            subjects,
            education: clean_opt(self.education),
            notes: clean_opt(self.notes),
        })
    }

    fn merged(existing: Teacher, update: UpdateTeacher) -> Self {
        let mut input = CreateTeacher {
            name: existing.name,
            email: existing.email,
            phone: existing.phone,
            subjects: existing.subjects,
            education: existing.education,
            notes: existing.notes,
        };
        patch(&mut input.name, update.name);
        patch(&mut input.email, update.email);
        patch_opt(&mut input.phone, update.phone);
        patch(&mut input.subjects, update.subjects);
        patch_opt(&mut input.education, update.education);
        patch_opt(&mut input.notes, update.notes);
        input
    }
}

const DUPLICATE_EMAIL: &str = "email already registered";

impl<'a> School<'a> {
    pub async fn create_teacher(&self, input: CreateTeacher) -> StoreResult<Teacher> {
        let input = input.validated()?;
        let query = format!(
            r#"
            INSERT INTO teachers (name, email, phone, subjects, education, notes)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    input.name,
                    input.email,
                    input.phone,
                    input.subjects.join(","),
                    input.education,
                    input.notes
                ],
            )
            .await
            .map_err(|e| StoreError::unique_violation(e, DUPLICATE_EMAIL))?;

        match rows.next().await? {
            Some(row) => row_to_teacher(&row),
            None => Err(anyhow::anyhow!("Failed to create teacher").into()),
        }
    }

    pub async fn get_teacher(&self, id: i32) -> StoreResult<Option<Teacher>> {
        let query = format!("SELECT {COLUMNS} FROM teachers WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_teacher(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_teachers(&self) -> StoreResult<Vec<Teacher>> {
        let query = format!("SELECT {COLUMNS} FROM teachers ORDER BY name COLLATE NOCASE, id");
        let mut rows = self.conn.query(&query, ()).await?;
        let mut teachers = Vec::new();

        while let Some(row) = rows.next().await? {
            teachers.push(row_to_teacher(&row)?);
        }

        Ok(teachers)
    }

    pub async fn update_teacher(&self, id: i32, update: UpdateTeacher) -> StoreResult<Option<Teacher>> {
        let existing = match self.get_teacher(id).await? {
            Some(teacher) => teacher,
            None => return Ok(None),
        };

        let input = CreateTeacher::merged(existing, update).validated()?;
        let query = format!(
            r#"
            UPDATE teachers
            SET name = ?, email = ?, phone = ?, subjects = ?, education = ?, notes = ?,
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
                    input.name,
                    input.email,
                    input.phone,
                    input.subjects.join(","),
                    input.education,
                    input.notes,
                    id
                ],
            )
            .await
            .map_err(|e| StoreError::unique_violation(e, DUPLICATE_EMAIL))?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_teacher(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn delete_teacher(&self, id: i32) -> StoreResult<bool> {
        let result = self
            .conn
            .execute("DELETE FROM teachers WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }
}

fn row_to_teacher(row: &libsql::Row) -> StoreResult<Teacher> {
    let subjects: String = row.get(4)?;

    Ok(Teacher {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        subjects: split_comma_separated_string(&subjects),
        education: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
