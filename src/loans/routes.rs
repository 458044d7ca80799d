use axum::{
    Router,
    routing::{get, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loans", get(handler::list_loans).post(handler::create_loan))
        .route("/loans/overdue", get(handler::list_overdue_loans))
        .route("/loans/:id", get(handler::get_loan).delete(handler::delete_loan))
        .route("/loans/:id/return", post(handler::return_loan))
        .route("/students/:id/loans", get(handler::list_student_loans))
        .route("/books/:id/loans", get(handler::list_book_loans))
}
