//! Loans Module
//!
//! Tracks textbook copies lent to students. A loan is `active` until the
//! explicit return action stamps its return date and flips it to `returned`;
//! nothing else changes the status.
//!
//! Overdue is derived at read time, never stored: an active loan without a
//! return date whose due date lies before today. A returned loan is never
//! overdue, whatever its dates say.
//!
//! # Usage
//!
//! ```rust,ignore
//! use schoolbooks::loans::{CreateLoan, Loans};
//!
//! let loans = Loans::new(&db);
//! let loan = loans.create_loan(input, today, 15).await?;
//! let late = loans.overdue_loans(today).await?;
//!
//! let app = Router::new()
//!     .merge(loans::routes())
//!     .with_state(app_state);
//! ```

mod handler;
mod ledger;
mod routes;

pub use ledger::*;
pub use routes::routes;
