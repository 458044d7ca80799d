use serde::{Deserialize, Serialize};

use super::{School, patch, patch_opt};
use crate::error::{StoreError, StoreResult};
use crate::validate::{Validator, clean, clean_opt};

const COLUMNS: &str = "id, name, area, description, weekly_hours, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i32,
    pub name: String,
    pub area: Option<String>,
    pub description: Option<String>,
    pub weekly_hours: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateSubject {
    pub name: String,
    pub area: Option<String>,
    pub description: Option<String>,
    pub weekly_hours: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSubject {
    pub name: Option<String>,
    pub area: Option<String>,
    pub description: Option<String>,
    pub weekly_hours: Option<i32>,
}

impl CreateSubject {
    fn validated(self) -> StoreResult<Self> {
        let mut v = Validator::new();
        v.required("name", &self.name);
        if let Some(hours) = self.weekly_hours {
            v.check("weekly_hours", hours > 0, "must be greater than zero");
        }
        v.finish()?;

        Ok(CreateSubject {
            name: clean(&self.name),
            area: clean_opt(self.area),
            description: clean_opt(self.description),
            weekly_hours: self.weekly_hours,
        })
    }
}

impl<'a> School<'a> {
    pub async fn create_subject(&self, input: CreateSubject) -> StoreResult<Subject> {
        let input = input.validated()?;
        let query = format!(
            r#"
            INSERT INTO subjects (name, area, description, weekly_hours)
            VALUES (?, ?, ?, ?)
            RETURNING {COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![input.name, input.area, input.description, input.weekly_hours],
            )
            .await
            .map_err(|e| StoreError::unique_violation(e, "subject already exists"))?;

        match rows.next().await? {
            Some(row) => row_to_subject(&row),
            None => Err(anyhow::anyhow!("Failed to create subject").into()),
        }
    }

    pub async fn get_subject(&self, id: i32) -> StoreResult<Option<Subject>> {
        let query = format!("SELECT {COLUMNS} FROM subjects WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_subject(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_subjects(&self) -> StoreResult<Vec<Subject>> {
        let query = format!("SELECT {COLUMNS} FROM subjects ORDER BY name COLLATE NOCASE, id");
        let mut rows = self.conn.query(&query, ()).await?;
        let mut subjects = Vec::new();

        while let Some(row) = rows.next().await? {
            subjects.push(row_to_subject(&row)?);
        }

        Ok(subjects)
    }

    pub async fn update_subject(&self, id: i32, update: UpdateSubject) -> StoreResult<Option<Subject>> {
        let existing = match self.get_subject(id).await? {
            Some(subject) => subject,
            None => return Ok(None),
        };

        let mut input = CreateSubject {
            name: existing.name,
            area: existing.area,
            description: existing.description,
            weekly_hours: existing.weekly_hours,
        };
        patch(&mut input.name, update.name);
        patch_opt(&mut input.area, update.area);
        patch_opt(&mut input.description, update.description);
        patch_opt(&mut input.weekly_hours, update.weekly_hours);
        let input = input.validated()?;

        let query = format!(
            r#"
            UPDATE subjects
            SET name = ?, area = ?, description = ?, weekly_hours = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING {COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![input.name, input.area, input.description, input.weekly_hours, id],
            )
            .await
            .map_err(|e| StoreError::unique_violation(e, "subject already exists"))?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_subject(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn delete_subject(&self, id: i32) -> StoreResult<bool> {
        let result = self
            .conn
            .execute("DELETE FROM subjects WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }
}

fn row_to_subject(row: &libsql::Row) -> StoreResult<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        area: row.get(2)?,
        description: row.get(3)?,
        weekly_hours: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_db;

    #[tokio::test]
    async fn test_subject_crud() {
        let t = test_db().await;
        let school = School::new(t.db.connection());

        let math = school
            .create_subject(CreateSubject {
                name: "Matemática".to_string(),
                description: Some("Álgebra, geometria e cálculo".to_string()),
                weekly_hours: Some(80),
                ..Default::default()
            })
            .await
            .unwrap();
        let science = school
            .create_subject(CreateSubject {
                name: "Ciências".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let names: Vec<_> = school
            .list_subjects()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Ciências", "Matemática"]);

        let updated = school
            .update_subject(
                math.id,
                UpdateSubject {
                    weekly_hours: Some(60),
                    area: Some("Exatas".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.weekly_hours, Some(60));
        assert_eq!(updated.area.as_deref(), Some("Exatas"));
        assert_eq!(updated.description, math.description);

        assert!(school.delete_subject(science.id).await.unwrap());
        assert_eq!(school.list_subjects().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subject_validation() {
        let t = test_db().await;
        let school = School::new(t.db.connection());

        let missing_name = school.create_subject(CreateSubject::default()).await;
        assert!(matches!(missing_name, Err(StoreError::Validation(_))));

        let zero_hours = school
            .create_subject(CreateSubject {
                name: "Artes".to_string(),
                weekly_hours: Some(0),
                ..Default::default()
            })
            .await;
        assert!(matches!(zero_hours, Err(StoreError::Validation(_))));

        school
            .create_subject(CreateSubject {
                name: "Artes".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let duplicate = school
            .create_subject(CreateSubject {
                name: "Artes".to_string(),
                ..Default::default()
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
    }
}
