//! Demo data for a fresh install.
//!
//! Each table is only filled while it is still empty, so running the loader
//! twice leaves an existing database untouched.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use libsql::Connection;

use crate::db::Database;
use crate::error::StoreResult;
use crate::loans::{CreateLoan, Loans};
use crate::school::{
    CreateBook, CreateNotification, CreateReminder, CreateSchedule, CreateStudent, CreateSubject,
    CreateTeacher, School,
};
use crate::validate::{DATE_FORMAT, split_comma_separated_string};

const LOAN_PERIOD_DAYS: u32 = 15;

#[derive(Debug, Default)]
pub struct SeedStats {
    pub created: i32,
    pub skipped: i32,
    pub failed: i32,
}

impl SeedStats {
    fn record<T>(&mut self, result: StoreResult<T>, entity: &str, key: &str) {
        match result {
            Ok(_) => self.created += 1,
            Err(e) => {
                tracing::error!("Failed to seed {} {}: {}", entity, key, e);
                self.failed += 1;
            }
        }
    }
}

async fn is_empty(conn: &Connection, table: &str) -> Result<bool> {
    let mut rows = conn.query(&format!("SELECT COUNT(*) FROM {table}"), ()).await?;
    let count: i64 = match rows.next().await? {
        Some(row) => row.get(0)?,
        None => 0,
    };
    Ok(count == 0)
}

fn days_ago(today: NaiveDate, days: u64) -> String {
    today
        .checked_sub_days(Days::new(days))
        .unwrap_or(today)
        .format(DATE_FORMAT)
        .to_string()
}

fn opt(s: &str) -> Option<String> {
    Some(s.to_string())
}

pub async fn seed(db: &Database, today: NaiveDate) -> Result<SeedStats> {
    let conn = db.connection();
    let school = School::new(conn);
    let mut stats = SeedStats::default();

    if is_empty(conn, "subjects").await? {
        let subjects = [
            ("Matemática", "Exatas", "Álgebra, geometria e aritmética", 5),
            ("Português", "Linguagens", "Gramática, leitura e produção de texto", 5),
            ("História", "Humanas", "História do Brasil e geral", 3),
            ("Geografia", "Humanas", "Geografia física e humana", 3),
            ("Ciências", "Natureza", "Ciências da natureza", 3),
        ];
        for (name, area, description, hours) in subjects {
            let result = school
                .create_subject(CreateSubject {
                    name: name.to_string(),
                    area: opt(area),
                    description: opt(description),
                    weekly_hours: Some(hours),
                })
                .await;
            stats.record(result, "subject", name);
        }
    } else {
        stats.skipped += 1;
    }

    if is_empty(conn, "teachers").await? {
        let teachers = [
            ("João Silva", "joao.silva@escola.edu.br", "(11) 98765-4321", "Matemática", "Licenciatura em Matemática"),
            ("Maria Santos", "maria.santos@escola.edu.br", "(11) 97654-3210", "Português", "Licenciatura em Letras"),
            ("Carlos Pereira", "carlos.pereira@escola.edu.br", "(11) 96543-2109", "História,Geografia", "Licenciatura em História"),
        ];
        for (name, email, phone, subjects, education) in teachers {
            let result = school
                .create_teacher(CreateTeacher {
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: opt(phone),
                    subjects: split_comma_separated_string(subjects),
                    education: opt(education),
                    notes: None,
                })
                .await;
            stats.record(result, "teacher", email);
        }
    } else {
        stats.skipped += 1;
    }

    if is_empty(conn, "students").await? {
        let students = [
            ("Ana Silva", "2024001", "6º Ano A", "6º Ano", "(85) 99123-4567"),
            ("João Oliveira", "2024002", "7º Ano A", "7º Ano", "(85) 98765-4321"),
            ("Maria Santos", "2024003", "8º Ano B", "8º Ano", "(85) 99876-5432"),
            ("Pedro Lima", "2024004", "9º Ano A", "9º Ano", "(85) 99765-4322"),
            ("Carla Souza", "2024005", "1º Ano EM", "1º Ano EM", "(85) 99888-7777"),
        ];
        for (name, registration, class_name, grade, phone) in students {
            let result = school
                .create_student(CreateStudent {
                    name: name.to_string(),
                    registration: registration.to_string(),
                    class_name: class_name.to_string(),
                    grade: opt(grade),
                    phone: opt(phone),
                    ..Default::default()
                })
                .await;
            stats.record(result, "student", registration);
        }
    } else {
        stats.skipped += 1;
    }

    if is_empty(conn, "books").await? {
        let books = [
            ("Matemática - 6º Ano", "Matemática", "6º Ano", "João Silva", "Educativa", 30),
            ("Português e Literatura", "Português", "7º Ano", "Maria Santos", "Saber", 25),
            ("História do Brasil", "História", "8º Ano", "Carlos Pereira", "Nacional", 20),
            ("Geografia Mundial", "Geografia", "9º Ano", "Ana Costa", "Moderna", 20),
            ("Ciências da Natureza", "Ciências", "6º Ano", "Roberto Lima", "Educativa", 2),
        ];
        for (title, subject, grade, author, publisher, quantity) in books {
            let result = school
                .create_book(CreateBook {
                    title: title.to_string(),
                    subject: subject.to_string(),
                    grade: opt(grade),
                    author: opt(author),
                    publisher: opt(publisher),
                    quantity: Some(quantity),
                    ..Default::default()
                })
                .await;
            stats.record(result, "book", title);
        }
    } else {
        stats.skipped += 1;
    }

    if is_empty(conn, "schedules").await? {
        let schedules = [
            ("6º Ano A", "monday", "07:30", "08:20", "Matemática", "João Silva"),
            ("6º Ano A", "monday", "08:20", "09:10", "Português", "Maria Santos"),
            ("7º Ano A", "tuesday", "07:30", "08:20", "História", "Carlos Pereira"),
            ("8º Ano B", "wednesday", "07:30", "08:20", "Ciências", "Roberto Lima"),
            ("9º Ano A", "thursday", "08:20", "09:10", "Geografia", "Carlos Pereira"),
        ];
        for (class_name, weekday, starts_at, ends_at, subject, teacher) in schedules {
            let result = school
                .create_schedule(CreateSchedule {
                    class_name: class_name.to_string(),
                    weekday: weekday.to_string(),
                    starts_at: starts_at.to_string(),
                    ends_at: ends_at.to_string(),
                    subject: subject.to_string(),
                    teacher: teacher.to_string(),
                })
                .await;
            stats.record(result, "schedule", class_name);
        }
    } else {
        stats.skipped += 1;
    }

    if is_empty(conn, "notifications").await? {
        let notifications = [
            ("Reunião de Pais e Mestres", "Reunião no auditório às 19h.", "Todos", 2),
            ("Entrega de livros didáticos", "Retirada dos livros na biblioteca.", "Alunos", 0),
        ];
        for (title, message, audience, age) in notifications {
            let result = school
                .create_notification(
                    CreateNotification {
                        title: title.to_string(),
                        message: message.to_string(),
                        audience: audience.to_string(),
                        date: Some(days_ago(today, age)),
                    },
                    today,
                )
                .await;
            stats.record(result, "notification", title);
        }
    } else {
        stats.skipped += 1;
    }

    if is_empty(conn, "reminders").await? {
        let result = school
            .create_reminder(CreateReminder {
                title: "Cobrar devoluções atrasadas".to_string(),
                description: "Conferir a lista de empréstimos vencidos.".to_string(),
                date: today.format(DATE_FORMAT).to_string(),
                priority: "high".to_string(),
                status: None,
            })
            .await;
        stats.record(result, "reminder", "overdue follow-up");
    } else {
        stats.skipped += 1;
    }

    if is_empty(conn, "loans").await? {
        seed_loans(db, today, &mut stats).await?;
    } else {
        stats.skipped += 1;
    }

    Ok(stats)
}

/// One loan still running and one already past its due date.
async fn seed_loans(db: &Database, today: NaiveDate, stats: &mut SeedStats) -> Result<()> {
    let school = School::new(db.connection());
    let students = school.list_students().await?;
    let books = school.list_books(&Default::default()).await?;
    if students.len() < 2 || books.len() < 2 {
        tracing::warn!("not enough students or books to seed loans");
        return Ok(());
    }

    let loans = Loans::new(db);
    let plans = [
        (&books[0], &students[0], days_ago(today, 3)),
        (&books[1], &students[1], days_ago(today, 20)),
    ];
    for (book, student, loan_date) in plans {
        let result = loans
            .create_loan(
                CreateLoan {
                    book_id: Some(book.id),
                    student_id: Some(student.id),
                    loan_date: Some(loan_date),
                    ..Default::default()
                },
                today,
                LOAN_PERIOD_DAYS,
            )
            .await;
        stats.record(result, "loan", &book.title);
    }

    Ok(())
}
