//! School Registry
//!
//! The single-table resources of the school: students, teachers, subjects,
//! books, class schedules, notifications and reminders. Each resource follows
//! the same flow: trim and validate the submission, persist it, hand back the
//! stored row.
//!
//! # Usage
//!
//! ```rust,ignore
//! use schoolbooks::school::{School, CreateStudent};
//!
//! let school = School::new(db.connection());
//! let student = school.create_student(input).await?;
//!
//! let app = Router::new()
//!     .merge(school::routes())
//!     .with_state(app_state);
//! ```
//!
//! Updates are partial: fields absent from the payload keep their stored
//! value, and the merged record is validated exactly like a new one.

mod books;
mod handler;
mod notifications;
mod reminders;
mod routes;
mod schedules;
mod students;
mod subjects;
mod teachers;

use libsql::Connection;

pub use books::{Book, BookFilter, CreateBook, UpdateBook};
pub use notifications::{CreateNotification, Notification, NotificationFilter, UpdateNotification};
pub use reminders::{CreateReminder, Reminder, ReminderPriority, ReminderStatus, UpdateReminder};
pub use routes::routes;
pub use schedules::{CreateSchedule, Schedule, ScheduleFilter, UpdateSchedule, Weekday};
pub use students::{CreateStudent, Student, UpdateStudent};
pub use subjects::{CreateSubject, Subject, UpdateSubject};
pub use teachers::{CreateTeacher, Teacher, UpdateTeacher};

pub struct School<'a> {
    conn: &'a Connection,
}

impl<'a> School<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

/// Replaces `current` when the patch carries a value.
fn patch<T>(current: &mut T, update: Option<T>) {
    if let Some(value) = update {
        *current = value;
    }
}

/// Like [`patch`] for optional columns; blank strings later collapse to `None`.
fn patch_opt<T>(current: &mut Option<T>, update: Option<T>) {
    if let Some(value) = update {
        *current = Some(value);
    }
}
