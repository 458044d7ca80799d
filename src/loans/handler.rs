//! HTTP Handlers for loans

use axum::{extract::State, response::Response};

use super::{CreateLoan, LoanFilter, Loans, ReturnLoan};
use crate::handler::{
    AppState, JsonBody, JsonOrDefault, PathParam, QueryParams, created, failure, listed,
    no_content, not_found, success, today,
};

pub async fn create_loan(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateLoan>,
) -> Response {
    let loans = Loans::new(&state.db);

    match loans.create_loan(payload, today(), state.loan_period_days).await {
        Ok(loan) => created(loan),
        Err(e) => failure("create loan", e),
    }
}

pub async fn list_loans(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<LoanFilter>,
) -> Response {
    let loans = Loans::new(&state.db);

    match loans.list_loans(&filter, today()).await {
        Ok(list) => listed(list),
        Err(e) => failure("list loans", e),
    }
}

pub async fn list_overdue_loans(State(state): State<AppState>) -> Response {
    let loans = Loans::new(&state.db);

    match loans.overdue_loans(today()).await {
        Ok(list) => listed(list),
        Err(e) => failure("list overdue loans", e),
    }
}

pub async fn get_loan(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Response {
    let loans = Loans::new(&state.db);

    match loans.get_loan(id, today()).await {
        Ok(Some(loan)) => success(loan),
        Ok(None) => not_found("Loan not found"),
        Err(e) => failure("get loan", e),
    }
}

/// The body is optional; without one the loan is returned today.
pub async fn return_loan(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonOrDefault(input): JsonOrDefault<ReturnLoan>,
) -> Response {
    let loans = Loans::new(&state.db);

    match loans.return_loan(id, input, today()).await {
        Ok(Some(loan)) => success(loan),
        Ok(None) => not_found("Loan not found"),
        Err(e) => failure("return loan", e),
    }
}

pub async fn delete_loan(State(state): State<AppState>, PathParam(id): PathParam<i32>) -> Response {
    let loans = Loans::new(&state.db);

    match loans.delete_loan(id).await {
        Ok(true) => no_content(),
        Ok(false) => not_found("Loan not found"),
        Err(e) => failure("delete loan", e),
    }
}

pub async fn list_student_loans(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let loans = Loans::new(&state.db);

    match loans.loans_for_student(id, today()).await {
        Ok(list) => listed(list),
        Err(e) => failure("list student loans", e),
    }
}

pub async fn list_book_loans(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let loans = Loans::new(&state.db);

    match loans.loans_for_book(id, today()).await {
        Ok(list) => listed(list),
        Err(e) => failure("list book loans", e),
    }
}
