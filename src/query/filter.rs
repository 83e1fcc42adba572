//! Predicates over the filterable fields of books and loans.

use serde::Deserialize;

use crate::modules::books::models::{Book, BookId};
use crate::modules::loans::models::Loan;

/// Partial, case-insensitive match on title and author; unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookFilter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        field_contains(&book.title, self.title.as_deref())
            && field_contains(&book.author, self.author.as_deref())
    }
}

fn field_contains(value: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

/// Loans whose book has `isbn` or whose customer is `customer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoanFilter {
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
}

/// Loan selection handed to the loan store, with isbn already resolved to a book id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanQuery {
    /// Every loan of one book.
    ForBook(BookId),
    /// Either side matching is enough; an unset side never matches.
    BookOrCustomer {
        book_id: Option<BookId>,
        customer: Option<String>,
    },
}

impl LoanQuery {
    pub fn matches(&self, loan: &Loan) -> bool {
        match self {
            LoanQuery::ForBook(book_id) => loan.book_id == *book_id,
            LoanQuery::BookOrCustomer { book_id, customer } => {
                *book_id == Some(loan.book_id)
                    || customer.as_deref() == Some(loan.customer_name.as_str())
            }
        }
    }
}
