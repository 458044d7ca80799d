//! HTTP Handlers for the school registry

use axum::{extract::State, response::Response};

use super::{
    BookFilter, CreateBook, CreateNotification, CreateReminder, CreateSchedule, CreateStudent,
    CreateSubject, CreateTeacher, NotificationFilter, ScheduleFilter, School, UpdateBook,
    UpdateNotification, UpdateReminder, UpdateSchedule, UpdateStudent, UpdateSubject, UpdateTeacher,
};
use crate::handler::{
    AppState, JsonBody, PathParam, QueryParams, created, failure, listed, no_content, not_found,
    success, today,
};

// ============================================================================
// Student Handlers
// ============================================================================

pub async fn create_student(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateStudent>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.create_student(payload).await {
        Ok(student) => {
            tracing::info!(id = student.id, "student registered");
            created(student)
        }
        Err(e) => failure("create student", e),
    }
}

pub async fn list_students(State(state): State<AppState>) -> Response {
    let school = School::new(state.db.connection());

    match school.list_students().await {
        Ok(students) => listed(students),
        Err(e) => failure("list students", e),
    }
}

pub async fn get_student(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Response {
    let school = School::new(state.db.connection());

    match school.get_student(id).await {
        Ok(Some(student)) => success(student),
        Ok(None) => not_found("Student not found"),
        Err(e) => failure("get student", e),
    }
}

pub async fn update_student(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateStudent>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.update_student(id, payload).await {
        Ok(Some(student)) => success(student),
        Ok(None) => not_found("Student not found"),
        Err(e) => failure("update student", e),
    }
}

pub async fn delete_student(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.delete_student(id).await {
        Ok(true) => no_content(),
        Ok(false) => not_found("Student not found"),
        Err(e) => failure("delete student", e),
    }
}

// ============================================================================
// Teacher Handlers
// ============================================================================

pub async fn create_teacher(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateTeacher>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.create_teacher(payload).await {
        Ok(teacher) => created(teacher),
        Err(e) => failure("create teacher", e),
    }
}

pub async fn list_teachers(State(state): State<AppState>) -> Response {
    let school = School::new(state.db.connection());

    match school.list_teachers().await {
        Ok(teachers) => listed(teachers),
        Err(e) => failure("list teachers", e),
    }
}

pub async fn get_teacher(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Response {
    let school = School::new(state.db.connection());

    match school.get_teacher(id).await {
        Ok(Some(teacher)) => success(teacher),
        Ok(None) => not_found("Teacher not found"),
        Err(e) => failure("get teacher", e),
    }
}

pub async fn update_teacher(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateTeacher>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.update_teacher(id, payload).await {
        Ok(Some(teacher)) => success(teacher),
        Ok(None) => not_found("Teacher not found"),
        Err(e) => failure("update teacher", e),
    }
}

pub async fn delete_teacher(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.delete_teacher(id).await {
        Ok(true) => no_content(),
        Ok(false) => not_found("Teacher not found"),
        Err(e) => failure("delete teacher", e),
    }
}

// ============================================================================
// Subject Handlers
// ============================================================================

pub async fn create_subject(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateSubject>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.create_subject(payload).await {
        Ok(subject) => created(subject),
        Err(e) => failure("create subject", e),
    }
}

pub async fn list_subjects(State(state): State<AppState>) -> Response {
    let school = School::new(state.db.connection());

    match school.list_subjects().await {
        Ok(subjects) => listed(subjects),
        Err(e) => failure("list subjects", e),
    }
}

pub async fn get_subject(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Response {
    let school = School::new(state.db.connection());

    match school.get_subject(id).await {
        Ok(Some(subject)) => success(subject),
        Ok(None) => not_found("Subject not found"),
        Err(e) => failure("get subject", e),
    }
}

pub async fn update_subject(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateSubject>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.update_subject(id, payload).await {
        Ok(Some(subject)) => success(subject),
        Ok(None) => not_found("Subject not found"),
        Err(e) => failure("update subject", e),
    }
}

pub async fn delete_subject(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.delete_subject(id).await {
        Ok(true) => no_content(),
        Ok(false) => not_found("Subject not found"),
        Err(e) => failure("delete subject", e),
    }
}

// ============================================================================
// Book Handlers
// ============================================================================

pub async fn create_book(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateBook>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.create_book(payload).await {
        Ok(book) => {
            tracing::info!(id = book.id, quantity = book.quantity, "book added to collection");
            created(book)
        }
        Err(e) => failure("create book", e),
    }
}

pub async fn list_books(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<BookFilter>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.list_books(&filter).await {
        Ok(books) => listed(books),
        Err(e) => failure("list books", e),
    }
}

pub async fn get_book(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Response {
    let school = School::new(state.db.connection());

    match school.get_book(id).await {
        Ok(Some(book)) => success(book),
        Ok(None) => not_found("Book not found"),
        Err(e) => failure("get book", e),
    }
}

pub async fn update_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateBook>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.update_book(id, payload).await {
        Ok(Some(book)) => success(book),
        Ok(None) => not_found("Book not found"),
        Err(e) => failure("update book", e),
    }
}

pub async fn delete_book(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Response {
    let school = School::new(state.db.connection());

    match school.delete_book(id).await {
        Ok(true) => no_content(),
        Ok(false) => not_found("Book not found"),
        Err(e) => failure("delete book", e),
    }
}

// ============================================================================
// Schedule Handlers
// ============================================================================

pub async fn create_schedule(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateSchedule>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.create_schedule(payload).await {
        Ok(schedule) => created(schedule),
        Err(e) => failure("create schedule", e),
    }
}

pub async fn list_schedules(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ScheduleFilter>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.list_schedules(&filter).await {
        Ok(schedules) => listed(schedules),
        Err(e) => failure("list schedules", e),
    }
}

pub async fn get_schedule(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.get_schedule(id).await {
        Ok(Some(schedule)) => success(schedule),
        Ok(None) => not_found("Schedule not found"),
        Err(e) => failure("get schedule", e),
    }
}

pub async fn update_schedule(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateSchedule>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.update_schedule(id, payload).await {
        Ok(Some(schedule)) => success(schedule),
        Ok(None) => not_found("Schedule not found"),
        Err(e) => failure("update schedule", e),
    }
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.delete_schedule(id).await {
        Ok(true) => no_content(),
        Ok(false) => not_found("Schedule not found"),
        Err(e) => failure("delete schedule", e),
    }
}

// ============================================================================
// Notification Handlers
// ============================================================================

pub async fn create_notification(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateNotification>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.create_notification(payload, today()).await {
        Ok(notification) => created(notification),
        Err(e) => failure("create notification", e),
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<NotificationFilter>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.list_notifications(&filter).await {
        Ok(notifications) => listed(notifications),
        Err(e) => failure("list notifications", e),
    }
}

pub async fn get_notification(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.get_notification(id).await {
        Ok(Some(notification)) => success(notification),
        Ok(None) => not_found("Notification not found"),
        Err(e) => failure("get notification", e),
    }
}

pub async fn update_notification(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateNotification>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.update_notification(id, payload).await {
        Ok(Some(notification)) => success(notification),
        Ok(None) => not_found("Notification not found"),
        Err(e) => failure("update notification", e),
    }
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.mark_notification_read(id).await {
        Ok(Some(notification)) => success(notification),
        Ok(None) => not_found("Notification not found"),
        Err(e) => failure("mark notification read", e),
    }
}

pub async fn delete_notification(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.delete_notification(id).await {
        Ok(true) => no_content(),
        Ok(false) => not_found("Notification not found"),
        Err(e) => failure("delete notification", e),
    }
}

// ============================================================================
// Reminder Handlers
// ============================================================================

pub async fn create_reminder(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateReminder>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.create_reminder(payload).await {
        Ok(reminder) => created(reminder),
        Err(e) => failure("create reminder", e),
    }
}

pub async fn list_reminders(State(state): State<AppState>) -> Response {
    let school = School::new(state.db.connection());

    match school.list_reminders().await {
        Ok(reminders) => listed(reminders),
        Err(e) => failure("list reminders", e),
    }
}

pub async fn get_reminder(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.get_reminder(id).await {
        Ok(Some(reminder)) => success(reminder),
        Ok(None) => not_found("Reminder not found"),
        Err(e) => failure("get reminder", e),
    }
}

pub async fn update_reminder(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateReminder>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.update_reminder(id, payload).await {
        Ok(Some(reminder)) => success(reminder),
        Ok(None) => not_found("Reminder not found"),
        Err(e) => failure("update reminder", e),
    }
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let school = School::new(state.db.connection());

    match school.delete_reminder(id).await {
        Ok(true) => no_content(),
        Ok(false) => not_found("Reminder not found"),
        Err(e) => failure("delete reminder", e),
    }
}
