//! Store adapters over `lending_db::MemoryTable`.

use async_trait::async_trait;
use lending_db::MemoryTable;
use time::Date;

use super::{BookStore, LoanStore};
use crate::modules::books::models::{Book, BookId, NewBook};
use crate::modules::loans::models::{Loan, LoanId, NewLoan};
use crate::query::{BookFilter, LoanQuery, Page, PageRequest};

#[derive(Debug)]
pub struct MemoryBookStore {
    table: MemoryTable<Book>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("book"),
        }
    }
}

impl Default for MemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, book: NewBook) -> anyhow::Result<Book> {
        Ok(self
            .table
            .insert_with(|id| Book {
                id: BookId(id),
                title: book.title,
                author: book.author,
                isbn: book.isbn,
            })
            .await)
    }

    async fn get(&self, id: BookId) -> anyhow::Result<Option<Book>> {
        Ok(self.table.get(id.0).await)
    }

    async fn find_by_isbn(&self, isbn: &str) -> anyhow::Result<Option<Book>> {
        Ok(self.table.find(|book| book.isbn == isbn).await)
    }

    async fn update(
        &self,
        id: BookId,
        title: String,
        author: String,
    ) -> anyhow::Result<Option<Book>> {
        Ok(self
            .table
            .update(id.0, |book| {
                book.title = title;
                book.author = author;
            })
            .await)
    }

    async fn delete(&self, id: BookId) -> anyhow::Result<bool> {
        Ok(self.table.remove(id.0).await.is_some())
    }

    async fn query(&self, filter: &BookFilter, page: PageRequest) -> anyhow::Result<Page<Book>> {
        let slice = self
            .table
            .scan(|book| filter.matches(book), page.offset(), page.size())
            .await;
        Ok(Page::new(slice.rows, slice.total, page))
    }
}

#[derive(Debug)]
pub struct MemoryLoanStore {
    table: MemoryTable<Loan>,
}

impl MemoryLoanStore {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("loan"),
        }
    }
}

impl Default for MemoryLoanStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoanStore for MemoryLoanStore {
    async fn insert(&self, loan: NewLoan) -> anyhow::Result<Loan> {
        Ok(self
            .table
            .insert_with(|id| Loan {
                id: LoanId(id),
                book_id: loan.book_id,
                customer_name: loan.customer_name,
                customer_email: loan.customer_email,
                loan_date: loan.loan_date,
                returned: None,
            })
            .await)
    }

    async fn get(&self, id: LoanId) -> anyhow::Result<Option<Loan>> {
        Ok(self.table.get(id.0).await)
    }

    async fn set_returned(&self, id: LoanId, returned: bool) -> anyhow::Result<Option<Loan>> {
        Ok(self
            .table
            .update(id.0, |loan| loan.returned = Some(returned))
            .await)
    }

    async fn has_active_loan(&self, book_id: BookId) -> anyhow::Result<bool> {
        Ok(self
            .table
            .any(|loan| loan.book_id == book_id && loan.is_active())
            .await)
    }

    async fn query(&self, query: &LoanQuery, page: PageRequest) -> anyhow::Result<Page<Loan>> {
        let slice = self
            .table
            .scan(|loan| query.matches(loan), page.offset(), page.size())
            .await;
        Ok(Page::new(slice.rows, slice.total, page))
    }

    async fn late(&self, cutoff: Date) -> anyhow::Result<Vec<Loan>> {
        Ok(self
            .table
            .filter(|loan| loan.is_late(cutoff))
            .await)
    }
}
