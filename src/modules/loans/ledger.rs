//! Loan lifecycle, the one-active-loan-per-book invariant and overdue windows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lending_kernel::Clock;
use time::{Date, Duration};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::models::{Loan, LoanId, NewLoan};
use crate::error::{require_text, LibraryError, LibraryResult};
use crate::modules::books::models::BookId;
use crate::modules::books::registry::BookRegistry;
use crate::query::{Page, PageRequest, QueryEngine};
use crate::store::LoanStore;

/// Days after which an unreturned loan counts as overdue.
pub const OVERDUE_DAYS: i64 = 4;

/// Latest loan date that is overdue on `today`.
pub fn overdue_cutoff(today: Date) -> Date {
    today.saturating_sub(Duration::days(OVERDUE_DAYS))
}

/// One async lock per book id.
#[derive(Debug, Default)]
struct BookLocks {
    locks: Mutex<HashMap<BookId, Arc<AsyncMutex<()>>>>,
}

impl BookLocks {
    async fn acquire(&self, book_id: BookId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(book_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop the lock of a book that no longer exists. Tasks already
    /// holding a clone still serialize on it.
    fn forget(&self, book_id: BookId) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.remove(&book_id);
    }
}

pub struct LoanLedger {
    books: Arc<BookRegistry>,
    store: Arc<dyn LoanStore>,
    query: QueryEngine,
    clock: Arc<dyn Clock>,
    locks: BookLocks,
}

impl LoanLedger {
    pub fn new(
        books: Arc<BookRegistry>,
        store: Arc<dyn LoanStore>,
        query: QueryEngine,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            books,
            store,
            query,
            clock,
            locks: BookLocks::default(),
        }
    }

    /// Lend the book with `isbn`, dated today.
    ///
    /// The existence check, the availability check and the insert run under
    /// the book's lock, so two requests for the same book cannot both succeed
    /// and a book retired meanwhile is never lent.
    pub async fn create_loan(
        &self,
        isbn: &str,
        customer_name: String,
        customer_email: Option<String>,
    ) -> LibraryResult<Loan> {
        require_text("customer", &customer_name)?;

        let book = self
            .books
            .get_by_isbn(isbn)
            .await?
            .ok_or(LibraryError::BookNotFound)?;

        let _guard = self.locks.acquire(book.id).await;
        if self.books.get_by_id(book.id).await?.is_none() {
            tracing::debug!(book_id = %book.id, "book retired before the loan was taken");
            return Err(LibraryError::BookNotFound);
        }
        if self.store.has_active_loan(book.id).await? {
            tracing::debug!(book_id = %book.id, "rejected loan of a book already on loan");
            return Err(LibraryError::BookAlreadyLoaned);
        }

        let loan = self
            .store
            .insert(NewLoan {
                book_id: book.id,
                customer_name,
                customer_email,
                loan_date: self.clock.today(),
            })
            .await?;
        tracing::info!(loan_id = %loan.id, book_id = %book.id, "loan created");
        Ok(loan)
    }

    pub async fn mark_returned(&self, loan_id: LoanId, returned: bool) -> LibraryResult<Loan> {
        let loan = self
            .store
            .set_returned(loan_id, returned)
            .await?
            .ok_or(LibraryError::LoanNotFound)?;
        tracing::info!(loan_id = %loan.id, returned, "loan return status updated");
        Ok(loan)
    }

    pub async fn get_by_id(&self, loan_id: LoanId) -> LibraryResult<Option<Loan>> {
        Ok(self.store.get(loan_id).await?)
    }

    /// Every loan of the book, active or not, in id order.
    pub async fn list_by_book(
        &self,
        book_id: BookId,
        page: PageRequest,
    ) -> LibraryResult<Page<Loan>> {
        self.query.loans_for_book(book_id, page).await
    }

    /// Loans overdue as of today; recomputed on every call.
    pub async fn list_late(&self) -> LibraryResult<Vec<Loan>> {
        let cutoff = overdue_cutoff(self.clock.today());
        Ok(self.store.late(cutoff).await?)
    }

    /// Remove a book only when none of its loans is active.
    pub async fn retire_book(&self, book_id: BookId) -> LibraryResult<()> {
        let _guard = self.locks.acquire(book_id).await;
        if self.store.has_active_loan(book_id).await? {
            tracing::warn!(book_id = %book_id, "refused to remove a book that is on loan");
            return Err(LibraryError::BookAlreadyLoaned);
        }
        self.books.remove(book_id).await?;
        self.locks.forget(book_id);
        Ok(())
    }
}
