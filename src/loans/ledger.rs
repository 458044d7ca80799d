use chrono::{Days, NaiveDate};
use libsql::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::validate::{DATE_FORMAT, Validator, clean_opt};

const SELECT_LOAN: &str = r#"
    SELECT loans.id, loans.book_id, loans.student_id, loans.loan_date, loans.due_date,
           loans.return_date, loans.status, loans.notes, loans.created_at, loans.updated_at,
           books.title, students.name
    FROM loans
    JOIN books ON books.id = loans.book_id
    JOIN students ON students.id = loans.student_id
"#;

/// Mirrors [`Loan::is_overdue`]; ISO dates compare correctly as text.
const OVERDUE_CONDITION: &str =
    "loans.status = 'active' AND loans.return_date IS NULL AND loans.due_date < ?";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(LoanStatus::Active),
            "returned" => Some(LoanStatus::Returned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub student_id: i32,
    pub loan_date: String,
    pub due_date: String,
    pub return_date: Option<String>,
    pub status: LoanStatus,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Loan {
    /// An active loan with no recorded return whose due date has passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        if self.status != LoanStatus::Active || self.return_date.is_some() {
            return false;
        }
        match NaiveDate::parse_from_str(&self.due_date, DATE_FORMAT) {
            Ok(due) => due < today,
            Err(_) => false,
        }
    }
}

/// A loan as clients see it: the stored row plus the names it points at and
/// the overdue flag for the day it was read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanView {
    #[serde(flatten)]
    pub loan: Loan,
    pub book_title: String,
    pub student_name: String,
    pub overdue: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateLoan {
    pub book_id: Option<i32>,
    pub student_id: Option<i32>,
    /// Defaults to today.
    pub loan_date: Option<String>,
    /// Defaults to the loan date plus the configured loan period.
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnLoan {
    /// Defaults to today.
    pub return_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoanFilter {
    /// `active`, `returned` or `overdue`.
    pub status: Option<String>,
    pub student_id: Option<i32>,
    pub book_id: Option<i32>,
}

struct ValidLoan {
    book_id: i32,
    student_id: i32,
    loan_date: NaiveDate,
    due_date: NaiveDate,
    notes: Option<String>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl CreateLoan {
    fn validated(self, today: NaiveDate, loan_period_days: u32) -> StoreResult<ValidLoan> {
        let mut v = Validator::new();
        if self.book_id.is_none() {
            v.fail("book_id", "is required");
        }
        if self.student_id.is_none() {
            v.fail("student_id", "is required");
        }

        let loan_date = match present(self.loan_date.as_deref()) {
            Some(date) => v.date("loan_date", Some(date)),
            None => Some(today),
        };
        let due_date = match (present(self.due_date.as_deref()), loan_date) {
            (Some(date), _) => v.date("due_date", Some(date)),
            (None, Some(start)) => {
                let due = start.checked_add_days(Days::new(u64::from(loan_period_days)));
                if due.is_none() {
                    v.fail("due_date", "is out of range");
                }
                due
            }
            (None, None) => None,
        };
        if let (Some(start), Some(due)) = (loan_date, due_date) {
            v.check("due_date", due >= start, "must not be before loan_date");
        }
        v.finish()?;

        match (self.book_id, self.student_id, loan_date, due_date) {
            (Some(book_id), Some(student_id), Some(loan_date), Some(due_date)) => Ok(ValidLoan {
                book_id,
                student_id,
                loan_date,
                due_date,
                notes: clean_opt(self.notes),
            }),
            _ => Err(anyhow::anyhow!("loan passed validation with missing fields").into()),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct Loans<'a> {
    db: &'a Database,
}

impl<'a> Loans<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Lends one copy of a book. The availability check and the insert share
    /// one transaction so two concurrent requests cannot take the last copy.
    /// The transaction runs on its own connection; a rollback only ever
    /// discards the loan.
    pub async fn create_loan(
        &self,
        input: CreateLoan,
        today: NaiveDate,
        loan_period_days: u32,
    ) -> StoreResult<LoanView> {
        let input = input.validated(today, loan_period_days)?;

        let id = {
            let _guard = self.db.tx_lock().await;
            let conn = self.db.connect().await?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate).await?;

            match Self::create_loan_internal(&tx, &input).await {
                Ok(id) => {
                    tx.commit().await?;
                    id
                }
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        tracing::warn!(error = %rollback, "failed to roll back loan");
                    }
                    return Err(e);
                }
            }
        };

        tracing::info!(
            loan_id = id,
            book_id = input.book_id,
            student_id = input.student_id,
            due_date = %input.due_date,
            "book lent"
        );

        self.get_loan(id, today)
            .await?
            .ok_or_else(|| anyhow::anyhow!("loan {id} vanished after insert").into())
    }

    async fn create_loan_internal(conn: &Connection, input: &ValidLoan) -> StoreResult<i32> {
        let mut rows = conn
            .query(
                r#"
                SELECT books.quantity - (
                    SELECT COUNT(*) FROM loans WHERE loans.book_id = books.id AND loans.status = 'active'
                )
                FROM books WHERE books.id = ?
                "#,
                libsql::params![input.book_id],
            )
            .await?;
        let available: Option<i64> = match rows.next().await? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };

        let mut rows = conn
            .query("SELECT 1 FROM students WHERE id = ?", libsql::params![input.student_id])
            .await?;
        let student_exists = rows.next().await?.is_some();

        let mut v = Validator::new();
        v.check("book_id", available.is_some(), "does not reference an existing book")
            .check("student_id", student_exists, "does not reference an existing student");
        v.finish()?;

        if available.unwrap_or(0) <= 0 {
            return Err(StoreError::Conflict("book has no available copies".to_string()));
        }

        let mut rows = conn
            .query(
                r#"
                INSERT INTO loans (book_id, student_id, loan_date, due_date, status, notes)
                VALUES (?, ?, ?, ?, 'active', ?)
                RETURNING id
                "#,
                libsql::params![
                    input.book_id,
                    input.student_id,
                    input.loan_date.format(DATE_FORMAT).to_string(),
                    input.due_date.format(DATE_FORMAT).to_string(),
                    input.notes.clone()
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get(0)?),
            None => Err(anyhow::anyhow!("Failed to create loan").into()),
        }
    }

    pub async fn get_loan(&self, id: i32, today: NaiveDate) -> StoreResult<Option<LoanView>> {
        let query = format!("{SELECT_LOAN} WHERE loans.id = ?");
        let mut rows = self.db.connection().query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_loan_view(&row, today)?)),
            None => Ok(None),
        }
    }

    /// Newest loans first.
    pub async fn list_loans(&self, filter: &LoanFilter, today: NaiveDate) -> StoreResult<Vec<LoanView>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        match present(filter.status.as_deref()) {
            None => {}
            Some("overdue") => {
                conditions.push(OVERDUE_CONDITION);
                params.push(today.format(DATE_FORMAT).to_string().into());
            }
            Some(status) => match LoanStatus::from_str(status) {
                Some(status) => {
                    conditions.push("loans.status = ?");
                    params.push(status.as_str().to_string().into());
                }
                None => {
                    return Err(StoreError::invalid(
                        "status",
                        "must be one of active, returned, overdue",
                    ));
                }
            },
        }
        if let Some(student_id) = filter.student_id {
            conditions.push("loans.student_id = ?");
            params.push(i64::from(student_id).into());
        }
        if let Some(book_id) = filter.book_id {
            conditions.push("loans.book_id = ?");
            params.push(i64::from(book_id).into());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!("{SELECT_LOAN} {where_clause} ORDER BY loans.loan_date DESC, loans.id DESC");

        self.fetch(&query, params, today).await
    }

    /// Overdue loans, the longest overdue first.
    pub async fn overdue_loans(&self, today: NaiveDate) -> StoreResult<Vec<LoanView>> {
        let query = format!("{SELECT_LOAN} WHERE {OVERDUE_CONDITION} ORDER BY loans.due_date ASC, loans.id");
        let params: Vec<libsql::Value> = vec![today.format(DATE_FORMAT).to_string().into()];

        self.fetch(&query, params, today).await
    }

    pub async fn loans_for_student(&self, student_id: i32, today: NaiveDate) -> StoreResult<Vec<LoanView>> {
        if !self.exists("students", student_id).await? {
            return Err(StoreError::NotFound("Student"));
        }
        let filter = LoanFilter {
            student_id: Some(student_id),
            ..Default::default()
        };
        self.list_loans(&filter, today).await
    }

    pub async fn loans_for_book(&self, book_id: i32, today: NaiveDate) -> StoreResult<Vec<LoanView>> {
        if !self.exists("books", book_id).await? {
            return Err(StoreError::NotFound("Book"));
        }
        let filter = LoanFilter {
            book_id: Some(book_id),
            ..Default::default()
        };
        self.list_loans(&filter, today).await
    }

    /// Records the return of a loan. Returning twice is a conflict.
    pub async fn return_loan(
        &self,
        id: i32,
        input: ReturnLoan,
        today: NaiveDate,
    ) -> StoreResult<Option<LoanView>> {
        let existing = match self.get_loan(id, today).await? {
            Some(view) => view.loan,
            None => return Ok(None),
        };
        if existing.status == LoanStatus::Returned {
            return Err(StoreError::Conflict("loan already returned".to_string()));
        }

        let mut v = Validator::new();
        let return_date = match present(input.return_date.as_deref()) {
            Some(date) => v.date("return_date", Some(date)),
            None => Some(today),
        };
        if let (Some(returned), Ok(lent)) = (
            return_date,
            NaiveDate::parse_from_str(&existing.loan_date, DATE_FORMAT),
        ) {
            v.check("return_date", returned >= lent, "must not be before loan_date");
        }
        v.finish()?;
        let return_date = return_date
            .ok_or_else(|| anyhow::anyhow!("return passed validation without a date"))?;

        let updated = self
            .db
            .connection()
            .execute(
                r#"
                UPDATE loans
                SET status = 'returned', return_date = ?,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                WHERE id = ? AND status = 'active'
                "#,
                libsql::params![return_date.format(DATE_FORMAT).to_string(), id],
            )
            .await?;

        if updated == 0 {
            return Err(StoreError::Conflict("loan already returned".to_string()));
        }

        tracing::info!(loan_id = id, return_date = %return_date, "book returned");
        self.get_loan(id, today).await
    }

    pub async fn delete_loan(&self, id: i32) -> StoreResult<bool> {
        let result = self
            .db
            .connection()
            .execute("DELETE FROM loans WHERE id = ?", libsql::params![id])
            .await?;
        Ok(result > 0)
    }

    async fn exists(&self, table: &str, id: i32) -> StoreResult<bool> {
        let query = format!("SELECT 1 FROM {table} WHERE id = ?");
        let mut rows = self.db.connection().query(&query, libsql::params![id]).await?;
        Ok(rows.next().await?.is_some())
    }

    async fn fetch(
        &self,
        query: &str,
        params: Vec<libsql::Value>,
        today: NaiveDate,
    ) -> StoreResult<Vec<LoanView>> {
        let mut rows = self.db.connection().query(query, params).await?;
        let mut loans = Vec::new();

        while let Some(row) = rows.next().await? {
            loans.push(row_to_loan_view(&row, today)?);
        }

        Ok(loans)
    }
}

fn row_to_loan_view(row: &libsql::Row, today: NaiveDate) -> StoreResult<LoanView> {
    let status: String = row.get(6)?;
    let loan = Loan {
        id: row.get(0)?,
        book_id: row.get(1)?,
        student_id: row.get(2)?,
        loan_date: row.get(3)?,
        due_date: row.get(4)?,
        return_date: row.get(5)?,
        status: LoanStatus::from_str(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown loan status {status}"))?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    };
    let overdue = loan.is_overdue(today);

    Ok(LoanView {
        loan,
        book_title: row.get(10)?,
        student_name: row.get(11)?,
        overdue,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::testing::test_db;
    use crate::school::{CreateBook, CreateStudent, School};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn loan_row(status: LoanStatus, due_date: &str, return_date: Option<&str>) -> Loan {
        Loan {
            id: 1,
            book_id: 1,
            student_id: 1,
            loan_date: "2024-05-01".to_string(),
            due_date: due_date.to_string(),
            return_date: return_date.map(str::to_string),
            status,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_is_overdue() {
        let today = date("2024-05-20");

        assert!(loan_row(LoanStatus::Active, "2024-05-16", None).is_overdue(today));
        assert!(!loan_row(LoanStatus::Active, "2024-05-20", None).is_overdue(today));
        assert!(!loan_row(LoanStatus::Active, "2024-06-01", None).is_overdue(today));
        assert!(!loan_row(LoanStatus::Returned, "2024-05-16", Some("2024-05-25")).is_overdue(today));
        assert!(!loan_row(LoanStatus::Returned, "2024-05-16", None).is_overdue(today));
    }

    struct Fixture {
        book_id: i32,
        student_id: i32,
    }

    async fn seed(db: &Database, quantity: i32) -> Fixture {
        let school = School::new(db.connection());
        let book = school
            .create_book(CreateBook {
                title: "Matemática - 9º Ano".to_string(),
                subject: "Matemática".to_string(),
                quantity: Some(quantity),
                ..Default::default()
            })
            .await
            .unwrap();
        let student = school
            .create_student(CreateStudent {
                name: "Ana Clara Silva".to_string(),
                registration: "2024001".to_string(),
                class_name: "9º A".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        Fixture {
            book_id: book.id,
            student_id: student.id,
        }
    }

    fn lend(f: &Fixture) -> CreateLoan {
        CreateLoan {
            book_id: Some(f.book_id),
            student_id: Some(f.student_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_default_dates() {
        let t = test_db().await;
        let f = seed(&t.db, 2).await;
        let loans = Loans::new(&t.db);

        let view = loans.create_loan(lend(&f), date("2024-05-01"), 15).await.unwrap();
        assert_eq!(view.loan.loan_date, "2024-05-01");
        assert_eq!(view.loan.due_date, "2024-05-16");
        assert_eq!(view.loan.status, LoanStatus::Active);
        assert_eq!(view.book_title, "Matemática - 9º Ano");
        assert_eq!(view.student_name, "Ana Clara Silva");
        assert!(!view.overdue);

        let book = School::new(t.db.connection()).get_book(f.book_id).await.unwrap().unwrap();
        assert_eq!(book.available, 1);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let t = test_db().await;
        let f = seed(&t.db, 1).await;
        let loans = Loans::new(&t.db);
        let today = date("2024-05-01");

        let err = loans.create_loan(CreateLoan::default(), today, 15).await.unwrap_err();
        match err {
            StoreError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["book_id", "student_id"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let backwards = loans
            .create_loan(
                CreateLoan {
                    loan_date: Some("2024-05-10".to_string()),
                    due_date: Some("2024-05-01".to_string()),
                    ..lend(&f)
                },
                today,
                15,
            )
            .await;
        assert!(matches!(backwards, Err(StoreError::Validation(_))));

        let unknown_book = loans
            .create_loan(
                CreateLoan {
                    book_id: Some(999),
                    ..lend(&f)
                },
                today,
                15,
            )
            .await;
        match unknown_book {
            Err(StoreError::Validation(errors)) => assert_eq!(errors[0].field, "book_id"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refuses_loan_when_no_copies_available() {
        let t = test_db().await;
        let f = seed(&t.db, 1).await;
        let loans = Loans::new(&t.db);
        let today = date("2024-05-01");

        let first = loans.create_loan(lend(&f), today, 15).await.unwrap();
        let err = loans.create_loan(lend(&f), today, 15).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        loans.return_loan(first.loan.id, ReturnLoan::default(), today).await.unwrap();
        loans.create_loan(lend(&f), today, 15).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_refused_loans_keep_concurrent_writes() {
        let t = test_db().await;
        let f = seed(&t.db, 0).await;
        let db = Arc::new(t.db);

        let lender = {
            let db = db.clone();
            tokio::spawn(async move {
                let loans = Loans::new(&db);
                for _ in 0..100 {
                    let err = loans.create_loan(lend(&f), date("2024-05-01"), 15).await.unwrap_err();
                    assert!(matches!(err, StoreError::Conflict(_)));
                }
            })
        };
        let registrar = {
            let db = db.clone();
            tokio::spawn(async move {
                let school = School::new(db.connection());
                let mut acknowledged = 0;
                for i in 0..100 {
                    let student = CreateStudent {
                        name: format!("Aluno {i}"),
                        registration: format!("2025{i:03}"),
                        class_name: "6º A".to_string(),
                        ..Default::default()
                    };
                    if school.create_student(student).await.is_ok() {
                        acknowledged += 1;
                    }
                }
                acknowledged
            })
        };

        lender.await.unwrap();
        let acknowledged = registrar.await.unwrap();
        assert_eq!(acknowledged, 100);

        let stored = School::new(db.connection()).list_students().await.unwrap();
        assert_eq!(stored.len(), acknowledged + 1);
    }

    #[tokio::test]
    async fn test_overdue_listing_excludes_returned_loans() {
        let t = test_db().await;
        let f = seed(&t.db, 3).await;
        let loans = Loans::new(&t.db);

        let late = loans
            .create_loan(
                CreateLoan {
                    loan_date: Some("2024-04-01".to_string()),
                    due_date: Some("2024-04-16".to_string()),
                    ..lend(&f)
                },
                date("2024-04-01"),
                15,
            )
            .await
            .unwrap();
        let returned = loans
            .create_loan(
                CreateLoan {
                    loan_date: Some("2024-04-01".to_string()),
                    due_date: Some("2024-04-10".to_string()),
                    ..lend(&f)
                },
                date("2024-04-01"),
                15,
            )
            .await
            .unwrap();
        loans
            .return_loan(
                returned.loan.id,
                ReturnLoan {
                    return_date: Some("2024-05-02".to_string()),
                },
                date("2024-05-02"),
            )
            .await
            .unwrap();
        let on_time = loans.create_loan(lend(&f), date("2024-05-10"), 15).await.unwrap();

        let today = date("2024-05-20");
        let overdue = loans.overdue_loans(today).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].loan.id, late.loan.id);
        assert!(overdue[0].overdue);

        let filter = LoanFilter {
            status: Some("overdue".to_string()),
            ..Default::default()
        };
        assert_eq!(loans.list_loans(&filter, today).await.unwrap(), overdue);

        let all = loans.list_loans(&LoanFilter::default(), today).await.unwrap();
        let ids: Vec<_> = all.iter().map(|l| l.loan.id).collect();
        assert_eq!(ids, vec![on_time.loan.id, returned.loan.id, late.loan.id]);
        let returned_view = all.iter().find(|l| l.loan.id == returned.loan.id).unwrap();
        assert!(!returned_view.overdue);
    }

    #[tokio::test]
    async fn test_return_twice_is_conflict() {
        let t = test_db().await;
        let f = seed(&t.db, 1).await;
        let loans = Loans::new(&t.db);
        let today = date("2024-05-10");

        let loan = loans.create_loan(lend(&f), date("2024-05-01"), 15).await.unwrap();

        let early = loans
            .return_loan(
                loan.loan.id,
                ReturnLoan {
                    return_date: Some("2024-04-30".to_string()),
                },
                today,
            )
            .await;
        assert!(matches!(early, Err(StoreError::Validation(_))));

        let returned = loans
            .return_loan(loan.loan.id, ReturnLoan::default(), today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(returned.loan.status, LoanStatus::Returned);
        assert_eq!(returned.loan.return_date.as_deref(), Some("2024-05-10"));

        let again = loans.return_loan(loan.loan.id, ReturnLoan::default(), today).await;
        assert!(matches!(again, Err(StoreError::Conflict(_))));

        assert!(loans.return_loan(999, ReturnLoan::default(), today).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_loan_blocks_student_and_book_deletion() {
        let t = test_db().await;
        let f = seed(&t.db, 1).await;
        let loans = Loans::new(&t.db);
        let school = School::new(t.db.connection());
        let today = date("2024-05-01");

        let loan = loans.create_loan(lend(&f), today, 15).await.unwrap();
        assert!(matches!(
            school.delete_student(f.student_id).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(school.delete_book(f.book_id).await, Err(StoreError::Conflict(_))));

        loans.return_loan(loan.loan.id, ReturnLoan::default(), today).await.unwrap();
        assert!(school.delete_student(f.student_id).await.unwrap());
        assert!(loans.get_loan(loan.loan.id, today).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_by_student_and_book() {
        let t = test_db().await;
        let f = seed(&t.db, 2).await;
        let loans = Loans::new(&t.db);
        let today = date("2024-05-01");

        let loan = loans.create_loan(lend(&f), today, 15).await.unwrap();

        let history = loans.loans_for_student(f.student_id, today).await.unwrap();
        assert_eq!(history, vec![loan.clone()]);
        assert_eq!(loans.loans_for_book(f.book_id, today).await.unwrap(), vec![loan.clone()]);
        assert!(matches!(
            loans.loans_for_student(999, today).await,
            Err(StoreError::NotFound("Student"))
        ));

        let bad_status = LoanFilter {
            status: Some("lost".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            loans.list_loans(&bad_status, today).await,
            Err(StoreError::Validation(_))
        ));

        assert!(loans.delete_loan(loan.loan.id).await.unwrap());
        assert!(!loans.delete_loan(loan.loan.id).await.unwrap());
    }
}
