use serde::{Deserialize, Serialize};

use super::{School, patch, patch_opt};
use crate::error::{StoreError, StoreResult};
use crate::validate::{Validator, clean, clean_opt, digits_only};

const COLUMNS: &str =
    "id, name, registration, class_name, grade, email, phone, guardian, notes, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub registration: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub grade: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub guardian: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateStudent {
    pub name: String,
    pub registration: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub grade: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub guardian: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateStudent {
    pub name: Option<String>,
    pub registration: Option<String>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub grade: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub guardian: Option<String>,
    pub notes: Option<String>,
}

impl CreateStudent {
    fn validated(self) -> StoreResult<Self> {
        let mut v = Validator::new();
        v.required("name", &self.name)
            .required("registration", &self.registration)
            .required("class", &self.class_name);

        let email = clean_opt(self.email).map(|e| e.to_lowercase());
        v.email("email", email.as_deref());
        v.phone("phone", self.phone.as_deref().filter(|p| !p.trim().is_empty()));
        v.finish()?;

        Ok(CreateStudent {
            name: clean(&self.name),
            registration: clean(&self.registration),
            class_name: clean(&self.class_name),
            grade: clean_opt(self.grade),
            email,
            phone: digits_only(self.phone),
            guardian: clean_opt(self.guardian),
            notes: clean_opt(self.notes),
        })
    }

    fn merged(existing: Student, update: UpdateStudent) -> Self {
        let mut input = CreateStudent {
            name: existing.name,
            registration: existing.registration,
            class_name: existing.class_name,
            grade: existing.grade,
            email: existing.email,
            phone: existing.phone,
            guardian: existing.guardian,
            notes: existing.notes,
        };
        patch(&mut input.name, update.name);
        patch(&mut input.registration, update.registration);
        patch(&mut input.class_name, update.class_name);
        patch_opt(&mut input.grade, update.grade);
        patch_opt(&mut input.email, update.email);
        patch_opt(&mut input.phone, update.phone);
        patch_opt(&mut input.guardian, update.guardian);
        patch_opt(&mut input.notes, update.notes);
        input
    }
}

const DUPLICATE_REGISTRATION: &str = "registration number already in use";

impl<'a> School<'a> {
    pub async fn create_student(&self, input: CreateStudent) -> StoreResult<Student> {
        let input = input.validated()?;
        let query = format!(
            r#"
            INSERT INTO students (name, registration, class_name, grade, email, phone, guardian, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    input.name,
                    input.registration,
                    input.class_name,
                    input.grade,
                    input.email,
                    input.phone,
                    input.guardian,
                    input.notes
                ],
            )
            .await
            .map_err(|e| StoreError::unique_violation(e, DUPLICATE_REGISTRATION))?;

        match rows.next().await? {
            Some(row) => row_to_student(&row),
            None => Err(anyhow::anyhow!("Failed to create student").into()),
        }
    }

    pub async fn get_student(&self, id: i32) -> StoreResult<Option<Student>> {
        let query = format!("SELECT {COLUMNS} FROM students WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_student(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_students(&self) -> StoreResult<Vec<Student>> {
        let query = format!("SELECT {COLUMNS} FROM students ORDER BY name COLLATE NOCASE, id");
        let mut rows = self.conn.query(&query, ()).await?;
        let mut students = Vec::new();

        while let Some(row) = rows.next().await? {
            students.push(row_to_student(&row)?);
        }

        Ok(students)
    }

    pub async fn update_student(&self, id: i32, update: UpdateStudent) -> StoreResult<Option<Student>> {
        let existing = match self.get_student(id).await? {
            Some(student) => student,
            None => return Ok(None),
        };

        let input = CreateStudent::merged(existing, update).validated()?;
        let query = format!(
            r#"
            UPDATE students
            SET name = ?, registration = ?, class_name = ?, grade = ?, email = ?, phone = ?,
                guardian = ?, notes = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
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
                    input.registration,
                    input.class_name,
                    input.grade,
                    input.email,
                    input.phone,
                    input.guardian,
                    input.notes,
                    id
                ],
            )
            .await
            .map_err(|e| StoreError::unique_violation(e, DUPLICATE_REGISTRATION))?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_student(&row)?)),
            None => Ok(None),
        }
    }

    /// Deletes a student and their returned-loan history.
    ///
    /// Refused with a conflict while the student still holds a book.
    pub async fn delete_student(&self, id: i32) -> StoreResult<bool> {
        let deleted = self
            .conn
            .execute(
                r#"
                DELETE FROM students
                WHERE id = ?
                  AND NOT EXISTS (SELECT 1 FROM loans WHERE student_id = ? AND status = 'active')
                "#,
                libsql::params![id, id],
            )
            .await?;

        if deleted > 0 {
            return Ok(true);
        }
        if self.get_student(id).await?.is_some() {
            return Err(StoreError::Conflict("student has active loans".to_string()));
        }
        Ok(false)
    }
}

fn row_to_student(row: &libsql::Row) -> StoreResult<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        registration: row.get(2)?,
        class_name: row.get(3)?,
        grade: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        guardian: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_db;

    fn ana() -> CreateStudent {
        CreateStudent {
            name: "  Ana Souza ".to_string(),
            registration: "2024-001".to_string(),
            class_name: "9º Ano A".to_string(),
            phone: Some("(11) 98765-4321".to_string()),
            email: Some("Ana@Escola.edu.br".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_appears_in_list() {
        let t = test_db().await;
        let school = School::new(t.db.connection());

        let created = school.create_student(ana()).await.unwrap();
        assert_eq!(created.name, "Ana Souza");
        assert_eq!(created.phone.as_deref(), Some("11987654321"));
        assert_eq!(created.email.as_deref(), Some("ana@escola.edu.br"));
        assert_eq!(created.guardian, None);

        let students = school.list_students().await.unwrap();
        assert_eq!(students, vec![created]);
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_name() {
        let t = test_db().await;
        let school = School::new(t.db.connection());

        for (name, reg) in [("Pedro", "3"), ("ana", "1"), ("Bruno", "2")] {
            school
                .create_student(CreateStudent {
                    name: name.to_string(),
                    registration: reg.to_string(),
                    class_name: "8º Ano B".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let names: Vec<_> = school
            .list_students()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["ana", "Bruno", "Pedro"]);
    }

    #[tokio::test]
    async fn test_missing_required_fields_are_rejected() {
        let t = test_db().await;
        let school = School::new(t.db.connection());

        let err = school
            .create_student(CreateStudent {
                name: "Ana".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        match err {
            StoreError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["registration", "class"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(school.list_students().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_the_target() {
        let t = test_db().await;
        let school = School::new(t.db.connection());

        let ana = school.create_student(ana()).await.unwrap();
        let bruno = school
            .create_student(CreateStudent {
                name: "Bruno".to_string(),
                registration: "2024-002".to_string(),
                class_name: "9º Ano A".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = school
            .update_student(
                ana.id,
                UpdateStudent {
                    class_name: Some("9º Ano B".to_string()),
                    phone: Some("".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.class_name, "9º Ano B");
        assert_eq!(updated.name, "Ana Souza");
        assert_eq!(updated.phone, None);
        assert_eq!(school.get_student(bruno.id).await.unwrap(), Some(bruno));

        let blanked = school
            .update_student(
                ana.id,
                UpdateStudent {
                    name: Some(" ".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(blanked, Err(StoreError::Validation(_))));

        assert!(school.update_student(999, UpdateStudent::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let t = test_db().await;
        let school = School::new(t.db.connection());

        school.create_student(ana()).await.unwrap();
        let err = school.create_student(ana()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let t = test_db().await;
        let school = School::new(t.db.connection());

        let ana = school.create_student(ana()).await.unwrap();
        assert!(school.delete_student(ana.id).await.unwrap());
        assert!(school.get_student(ana.id).await.unwrap().is_none());
        assert!(!school.delete_student(ana.id).await.unwrap());
    }
}
