//! Filtered, paginated views over books and loans.

pub mod filter;
pub mod page;

use std::sync::Arc;

pub use filter::{BookFilter, LoanFilter, LoanQuery};
pub use page::{Page, PageRequest};

use crate::error::LibraryResult;
use crate::modules::books::models::{Book, BookId};
use crate::modules::loans::models::Loan;
use crate::store::{BookStore, LoanStore};

#[derive(Clone)]
pub struct QueryEngine {
    books: Arc<dyn BookStore>,
    loans: Arc<dyn LoanStore>,
}

impl QueryEngine {
    pub fn new(books: Arc<dyn BookStore>, loans: Arc<dyn LoanStore>) -> Self {
        Self { books, loans }
    }

    pub async fn filter_books(
        &self,
        criteria: &BookFilter,
        page: PageRequest,
    ) -> LibraryResult<Page<Book>> {
        Ok(self.books.query(criteria, page).await?)
    }

    /// Loans matching the isbn OR the customer name.
    ///
    /// An isbn that names no book contributes no matches.
    pub async fn filter_loans(
        &self,
        criteria: &LoanFilter,
        page: PageRequest,
    ) -> LibraryResult<Page<Loan>> {
        let book_id = match criteria.isbn.as_deref() {
            Some(isbn) => self.books.find_by_isbn(isbn).await?.map(|book| book.id),
            None => None,
        };
        let query = LoanQuery::BookOrCustomer {
            book_id,
            customer: criteria.customer.clone(),
        };
        Ok(self.loans.query(&query, page).await?)
    }

    pub async fn loans_for_book(
        &self,
        book_id: BookId,
        page: PageRequest,
    ) -> LibraryResult<Page<Loan>> {
        Ok(self.loans.query(&LoanQuery::ForBook(book_id), page).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::NewBook;
    use crate::modules::loans::models::NewLoan;
    use crate::store::memory::{MemoryBookStore, MemoryLoanStore};
    use time::macros::date;

    async fn fixture() -> (QueryEngine, Arc<MemoryBookStore>, Arc<MemoryLoanStore>) {
        let books = Arc::new(MemoryBookStore::new());
        let loans = Arc::new(MemoryLoanStore::new());
        (QueryEngine::new(books.clone(), loans.clone()), books, loans)
    }

    async fn add_book(store: &MemoryBookStore, title: &str, author: &str, isbn: &str) -> Book {
        store
            .insert(NewBook {
                title: title.into(),
                author: author.into(),
                isbn: isbn.into(),
            })
            .await
            .unwrap()
    }

    async fn add_loan(store: &MemoryLoanStore, book_id: BookId, customer: &str) -> Loan {
        store
            .insert(NewLoan {
                book_id,
                customer_name: customer.into(),
                customer_email: None,
                loan_date: date!(2024 - 06 - 01),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn filter_books_paginates_matches() {
        let (engine, books, _) = fixture().await;
        add_book(&books, "Rust in Action", "McNamara", "1").await;
        add_book(&books, "Programming Rust", "Blandy", "2").await;
        add_book(&books, "Dune", "Herbert", "3").await;
        add_book(&books, "Rust Atomics and Locks", "Bos", "4").await;

        let criteria = BookFilter {
            title: Some("rust".into()),
            author: None,
        };
        let page = engine
            .filter_books(&criteria, PageRequest::new(0, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.content[0].isbn, "1");

        let all = engine
            .filter_books(&BookFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total_elements, 4);
    }

    #[tokio::test]
    async fn filter_loans_matches_isbn_or_customer() {
        let (engine, books, loans) = fixture().await;
        let wanted = add_book(&books, "A", "B", "120").await;
        let other = add_book(&books, "C", "D", "999").await;
        let by_isbn = add_loan(&loans, wanted.id, "Carol").await;
        let by_customer = add_loan(&loans, other.id, "Bob").await;
        add_loan(&loans, other.id, "Dave").await;

        let criteria = LoanFilter {
            isbn: Some("120".into()),
            customer: Some("Bob".into()),
        };
        let page = engine
            .filter_loans(&criteria, PageRequest::default())
            .await
            .unwrap();

        let ids: Vec<_> = page.content.iter().map(|loan| loan.id).collect();
        assert_eq!(ids, vec![by_isbn.id, by_customer.id]);
        assert_eq!(page.total_elements, 2);
    }

    #[tokio::test]
    async fn unknown_isbn_still_matches_customer() {
        let (engine, books, loans) = fixture().await;
        let book = add_book(&books, "A", "B", "1").await;
        add_loan(&loans, book.id, "Bob").await;

        let criteria = LoanFilter {
            isbn: Some("nope".into()),
            customer: Some("Bob".into()),
        };
        let page = engine
            .filter_loans(&criteria, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn loans_for_book_lists_every_loan_in_id_order() {
        let (engine, books, loans) = fixture().await;
        let book = add_book(&books, "A", "B", "1").await;
        let other = add_book(&books, "C", "D", "2").await;
        let first = add_loan(&loans, book.id, "Alice").await;
        loans.set_returned(first.id, true).await.unwrap();
        add_loan(&loans, other.id, "Bob").await;
        let second = add_loan(&loans, book.id, "Carol").await;

        let page = engine
            .loans_for_book(book.id, PageRequest::default())
            .await
            .unwrap();
        let ids: Vec<_> = page.content.iter().map(|loan| loan.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }
}
