use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::error::StoreResult;
use crate::handler::today;
use crate::loans::Loans;

/// Logs every overdue loan once and returns how many there were.
pub async fn report_overdue(db: &Database, today: NaiveDate) -> StoreResult<usize> {
    let overdue = Loans::new(db).overdue_loans(today).await?;

    for view in &overdue {
        tracing::warn!(
            loan_id = view.loan.id,
            book = %view.book_title,
            student = %view.student_name,
            due_date = %view.loan.due_date,
            "loan overdue"
        );
    }
    tracing::info!(count = overdue.len(), "overdue report");

    Ok(overdue.len())
}

/// Runs [`report_overdue`] on a fixed interval until the token is cancelled.
pub async fn run_overdue_report(db: Arc<Database>, every: Duration, token: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = report_overdue(&db, today()).await {
                    tracing::warn!(error = %crate::unpack_error(&e), "failed to build overdue report");
                }
            }
            _ = token.cancelled() => {
                tracing::info!("overdue report task shutting down");
                break;
            }
        }
    }
}
