//! Library loan service.
//!
//! Books are registered in the [`BookRegistry`](modules::books::registry::BookRegistry),
//! lent through the [`LoanLedger`](modules::loans::ledger::LoanLedger), browsed with the
//! [`QueryEngine`](query::QueryEngine), and overdue loans are announced daily by the
//! [`OverdueNotifier`](modules::notifier::OverdueNotifier).

#![recursion_limit = "256"]

pub mod app;
pub mod error;
pub mod modules;
pub mod query;
pub mod store;

pub use app::Library;
pub use error::{LibraryError, LibraryResult};
