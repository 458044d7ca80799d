use axum::{
    Router,
    routing::{get, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(handler::list_students).post(handler::create_student))
        .route(
            "/students/:id",
            get(handler::get_student)
                .put(handler::update_student)
                .delete(handler::delete_student),
        )
        .route("/teachers", get(handler::list_teachers).post(handler::create_teacher))
        .route(
            "/teachers/:id",
            get(handler::get_teacher)
                .put(handler::update_teacher)
                .delete(handler::delete_teacher),
        )
        .route("/subjects", get(handler::list_subjects).post(handler::create_subject))
        .route(
            "/subjects/:id",
            get(handler::get_subject)
                .put(handler::update_subject)
                .delete(handler::delete_subject),
        )
        .route("/books", get(handler::list_books).post(handler::create_book))
        .route(
            "/books/:id",
            get(handler::get_book)
                .put(handler::update_book)
                .delete(handler::delete_book),
        )
        .route("/schedules", get(handler::list_schedules).post(handler::create_schedule))
        .route(
            "/schedules/:id",
            get(handler::get_schedule)
                .put(handler::update_schedule)
                .delete(handler::delete_schedule),
        )
        .route(
            "/notifications",
            get(handler::list_notifications).post(handler::create_notification),
        )
        .route(
            "/notifications/:id",
            get(handler::get_notification)
                .put(handler::update_notification)
                .delete(handler::delete_notification),
        )
        .route("/notifications/:id/read", post(handler::mark_notification_read))
        .route("/reminders", get(handler::list_reminders).post(handler::create_reminder))
        .route(
            "/reminders/:id",
            get(handler::get_reminder)
                .put(handler::update_reminder)
                .delete(handler::delete_reminder),
        )
}
