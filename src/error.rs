//! Typed failures of the book registry and loan ledger.

use thiserror::Error;

/// Business-rule violations plus a single bucket for infrastructure failures.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("a book with isbn '{0}' is already registered")]
    DuplicateIsbn(String),

    #[error("book not found")]
    BookNotFound,

    #[error("loan not found")]
    LoanNotFound,

    #[error("book is already loaned")]
    BookAlreadyLoaned,

    #[error("invalid page request: {0}")]
    InvalidPage(String),

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

impl LibraryError {
    /// Stable machine-readable code for the failure kind
    pub fn code(&self) -> &'static str {
        match self {
            LibraryError::DuplicateIsbn(_) => "duplicate_isbn",
            LibraryError::BookNotFound => "book_not_found",
            LibraryError::LoanNotFound => "loan_not_found",
            LibraryError::BookAlreadyLoaned => "book_already_loaned",
            LibraryError::InvalidPage(_) => "invalid_page",
            LibraryError::EmptyField { .. } => "empty_field",
            LibraryError::Storage(_) => "storage_failure",
        }
    }
}

/// Reject blank values for fields that must carry text.
pub(crate) fn require_text(field: &'static str, value: &str) -> LibraryResult<()> {
    if value.trim().is_empty() {
        return Err(LibraryError::EmptyField { field });
    }
    Ok(())
}

impl From<LibraryError> for lending_http::error::AppError {
    fn from(err: LibraryError) -> Self {
        use lending_http::error::AppError;

        let code = err.code();
        let message = err.to_string();
        let mapped = match err {
            LibraryError::DuplicateIsbn(isbn) => AppError::conflict(
                vec![serde_json::json!({ "field": "isbn", "value": isbn })],
                message,
            ),
            LibraryError::BookAlreadyLoaned => AppError::conflict(Vec::new(), message),
            LibraryError::BookNotFound | LibraryError::LoanNotFound => AppError::not_found(message),
            LibraryError::InvalidPage(_) => AppError::bad_request(message),
            LibraryError::EmptyField { field } => AppError::validation(
                vec![serde_json::json!({ "field": field, "error": "required" })],
                message,
            ),
            LibraryError::Storage(source) => return AppError::Internal(source),
        };
        mapped.with_code(code)
    }
}
