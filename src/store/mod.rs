//! Persistence ports for books and loans.
//!
//! Every call is durable once it returns. Failures are infrastructure
//! failures only; business rules live in the registry and the ledger.

pub mod memory;

use async_trait::async_trait;
use time::Date;

use crate::modules::books::models::{Book, BookId, NewBook};
use crate::modules::loans::models::{Loan, LoanId, NewLoan};
use crate::query::{BookFilter, LoanQuery, Page, PageRequest};

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, book: NewBook) -> anyhow::Result<Book>;

    async fn get(&self, id: BookId) -> anyhow::Result<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> anyhow::Result<Option<Book>>;

    /// Replace title and author; `None` when the book does not exist.
    async fn update(&self, id: BookId, title: String, author: String)
        -> anyhow::Result<Option<Book>>;

    /// Returns whether a book was removed.
    async fn delete(&self, id: BookId) -> anyhow::Result<bool>;

    async fn query(&self, filter: &BookFilter, page: PageRequest) -> anyhow::Result<Page<Book>>;
}

#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Persist a new loan with `returned` unset.
    async fn insert(&self, loan: NewLoan) -> anyhow::Result<Loan>;

    async fn get(&self, id: LoanId) -> anyhow::Result<Option<Loan>>;

    async fn set_returned(&self, id: LoanId, returned: bool) -> anyhow::Result<Option<Loan>>;

    /// Whether the book has a loan whose `returned` is unset or false.
    async fn has_active_loan(&self, book_id: BookId) -> anyhow::Result<bool>;

    async fn query(&self, query: &LoanQuery, page: PageRequest) -> anyhow::Result<Page<Loan>>;

    /// Active loans taken on or before `cutoff`.
    async fn late(&self, cutoff: Date) -> anyhow::Result<Vec<Loan>>;
}
