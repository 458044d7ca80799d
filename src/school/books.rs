use serde::{Deserialize, Serialize};

use super::{School, patch, patch_opt};
use crate::error::{StoreError, StoreResult};
use crate::validate::{Validator, clean, clean_opt};

// `available` is derived from the active loans of the book, never stored.
const SELECT_BOOK: &str = r#"
    SELECT
        books.id, books.title, books.subject, books.author, books.publisher, books.grade,
        books.edition_year, books.quantity, books.notes, books.created_at, books.updated_at,
        books.quantity - (
            SELECT COUNT(*) FROM loans WHERE loans.book_id = books.id AND loans.status = 'active'
        ) AS available
    FROM books
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub subject: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub grade: Option<String>,
    pub edition_year: Option<i32>,
    pub quantity: i32,
    pub available: i32,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateBook {
    pub title: String,
    pub subject: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub grade: Option<String>,
    pub edition_year: Option<i32>,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub grade: Option<String>,
    pub edition_year: Option<i32>,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub subject: Option<String>,
    pub q: Option<String>,
}

impl CreateBook {
    fn validated(self) -> StoreResult<Self> {
        let mut v = Validator::new();
        v.required("title", &self.title).required("subject", &self.subject);
        match self.quantity {
            None => v.fail("quantity", "is required"),
            Some(q) => {
                v.check("quantity", q >= 0, "cannot be negative");
            }
        }
        if let Some(year) = self.edition_year {
            v.check("edition_year", (1000..=9999).contains(&year), "must be a four digit year");
        }
        v.finish()?;

        Ok(CreateBook {
            title: clean(&self.title),
            subject: clean(&self.subject),
            author: clean_opt(self.author),
            publisher: clean_opt(self.publisher),
            grade: clean_opt(self.grade),
            edition_year: self.edition_year,
            quantity: self.quantity,
            notes: clean_opt(self.notes),
        })
    }
}

impl<'a> School<'a> {
    pub async fn create_book(&self, input: CreateBook) -> StoreResult<Book> {
        let input = input.validated()?;
        let query = r#"
            INSERT INTO books (title, subject, author, publisher, grade, edition_year, quantity, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![
                    input.title,
                    input.subject,
                    input.author,
                    input.publisher,
                    input.grade,
                    input.edition_year,
                    input.quantity.unwrap_or(0),
                    input.notes
                ],
            )
            .await?;

        let id: i32 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => return Err(anyhow::anyhow!("Failed to create book").into()),
        };

        self.get_book(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("book {id} vanished after insert").into())
    }

    pub async fn get_book(&self, id: i32) -> StoreResult<Option<Book>> {
        let query = format!("{SELECT_BOOK} WHERE books.id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_book(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_books(&self, filter: &BookFilter) -> StoreResult<Vec<Book>> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(subject) = filter.subject.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push("books.subject = ?");
            params.push(subject.to_string().into());
        }
        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push("(books.title LIKE ? ESCAPE '\\' OR books.author LIKE ? ESCAPE '\\')");
            let pattern = format!("%{}%", escape_like(q));
            params.push(pattern.clone().into());
            params.push(pattern.into());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!("{SELECT_BOOK} {where_clause} ORDER BY books.title COLLATE NOCASE, books.id");

        let mut rows = self.conn.query(&query, params).await?;
        let mut books = Vec::new();

        while let Some(row) = rows.next().await? {
            books.push(row_to_book(&row)?);
        }

        Ok(books)
    }

    /// Applies a partial update. Lowering `quantity` below the number of copies
    /// currently on loan is a conflict.
    pub async fn update_book(&self, id: i32, update: UpdateBook) -> StoreResult<Option<Book>> {
        let existing = match self.get_book(id).await? {
            Some(book) => book,
            None => return Ok(None),
        };

        let mut input = CreateBook {
            title: existing.title,
            subject: existing.subject,
            author: existing.author,
            publisher: existing.publisher,
            grade: existing.grade,
            edition_year: existing.edition_year,
            quantity: Some(existing.quantity),
            notes: existing.notes,
        };
        patch(&mut input.title, update.title);
        patch(&mut input.subject, update.subject);
        patch_opt(&mut input.author, update.author);
        patch_opt(&mut input.publisher, update.publisher);
        patch_opt(&mut input.grade, update.grade);
        patch_opt(&mut input.edition_year, update.edition_year);
        patch_opt(&mut input.quantity, update.quantity);
        patch_opt(&mut input.notes, update.notes);
        let input = input.validated()?;
        let quantity = input.quantity.unwrap_or(0);

        let updated = self
            .conn
            .execute(
                r#"
                UPDATE books
                SET title = ?, subject = ?, author = ?, publisher = ?, grade = ?, edition_year = ?,
                    quantity = ?, notes = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                WHERE id = ?
                  AND ? >= (SELECT COUNT(*) FROM loans WHERE book_id = ? AND status = 'active')
                "#,
                libsql::params![
                    input.title,
                    input.subject,
                    input.author,
                    input.publisher,
                    input.grade,
                    input.edition_year,
                    quantity,
                    input.notes,
                    id,
                    quantity,
                    id
                ],
            )
            .await?;

        if updated == 0 {
            return match self.get_book(id).await? {
                Some(_) => Err(StoreError::Conflict(
                    "quantity is lower than the copies currently on loan".to_string(),
                )),
                None => Ok(None),
            };
        }

        self.get_book(id).await
    }

    /// Deletes a book and its returned-loan history; refused while copies are on loan.
    pub async fn delete_book(&self, id: i32) -> StoreResult<bool> {
        let deleted = self
            .conn
            .execute(
                r#"
                DELETE FROM books
                WHERE id = ?
                  AND NOT EXISTS (SELECT 1 FROM loans WHERE book_id = ? AND status = 'active')
                "#,
                libsql::params![id, id],
            )
            .await?;

        if deleted > 0 {
            return Ok(true);
        }
        if self.get_book(id).await?.is_some() {
            return Err(StoreError::Conflict("book has active loans".to_string()));
        }
        Ok(false)
    }
}

fn row_to_book(row: &libsql::Row) -> StoreResult<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        subject: row.get(2)?,
        author: row.get(3)?,
        publisher: row.get(4)?,
        grade: row.get(5)?,
        edition_year: row.get(6)?,
        quantity: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        available: row.get(11)?,
    })
}

/// Makes `%`, `_` and `\` in search text match literally under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
