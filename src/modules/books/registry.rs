//! Book identity and isbn uniqueness.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::models::{Book, BookId, NewBook};
use crate::error::{require_text, LibraryError, LibraryResult};
use crate::store::BookStore;

pub struct BookRegistry {
    store: Arc<dyn BookStore>,
    // Serializes the isbn check with the insert
    registration: Mutex<()>,
}

impl BookRegistry {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            store,
            registration: Mutex::new(()),
        }
    }

    /// Register a book; the isbn must not belong to any existing book.
    pub async fn register(&self, book: NewBook) -> LibraryResult<Book> {
        require_text("title", &book.title)?;
        require_text("author", &book.author)?;
        require_text("isbn", &book.isbn)?;

        let _guard = self.registration.lock().await;
        if self.store.find_by_isbn(&book.isbn).await?.is_some() {
            tracing::debug!(isbn = %book.isbn, "rejected duplicate isbn");
            return Err(LibraryError::DuplicateIsbn(book.isbn));
        }

        let book = self.store.insert(book).await?;
        tracing::info!(book_id = %book.id, isbn = %book.isbn, "book registered");
        Ok(book)
    }

    pub async fn get_by_id(&self, id: BookId) -> LibraryResult<Option<Book>> {
        Ok(self.store.get(id).await?)
    }

    pub async fn get_by_isbn(&self, isbn: &str) -> LibraryResult<Option<Book>> {
        Ok(self.store.find_by_isbn(isbn).await?)
    }

    pub async fn update(&self, id: BookId, title: String, author: String) -> LibraryResult<Book> {
        require_text("title", &title)?;
        require_text("author", &author)?;

        let book = self
            .store
            .update(id, title, author)
            .await?
            .ok_or(LibraryError::BookNotFound)?;
        tracing::info!(book_id = %book.id, "book updated");
        Ok(book)
    }

    /// Delete a book. Outstanding loans are not consulted here;
    /// see `LoanLedger::retire_book` for the guarded path.
    pub async fn remove(&self, id: BookId) -> LibraryResult<()> {
        if !self.store.delete(id).await? {
            return Err(LibraryError::BookNotFound);
        }
        tracing::info!(book_id = %id, "book removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBookStore;

    fn registry() -> BookRegistry {
        BookRegistry::new(Arc::new(MemoryBookStore::new()))
    }

    fn new_book(title: &str, author: &str, isbn: &str) -> NewBook {
        NewBook {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
        }
    }

    #[tokio::test]
    async fn register_then_lookup_by_isbn() {
        let registry = registry();
        let book = registry
            .register(new_book("The Hobbit", "Tolkien", "55475"))
            .await
            .unwrap();

        let found = registry.get_by_isbn("55475").await.unwrap();
        assert_eq!(found, Some(book.clone()));
        assert_eq!(registry.get_by_id(book.id).await.unwrap(), Some(book));
    }

    #[tokio::test]
    async fn duplicate_isbn_is_rejected_without_insert() {
        let registry = registry();
        let first = registry.register(new_book("X", "Y", "1")).await.unwrap();

        let err = registry.register(new_book("Z", "W", "1")).await.unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateIsbn(ref isbn) if isbn == "1"));

        // The original book is untouched and no second id was handed out
        assert_eq!(registry.get_by_isbn("1").await.unwrap(), Some(first));
        assert!(registry.get_by_id(BookId(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn isbn_uniqueness_is_case_sensitive() {
        let registry = registry();
        registry.register(new_book("X", "Y", "abc")).await.unwrap();
        assert!(registry.register(new_book("X", "Y", "ABC")).await.is_ok());
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let registry = registry();
        let err = registry.register(new_book("", "Y", "1")).await.unwrap_err();
        assert!(matches!(err, LibraryError::EmptyField { field: "title" }));
    }

    #[tokio::test]
    async fn update_keeps_isbn_and_id() {
        let registry = registry();
        let book = registry.register(new_book("Old", "Anon", "9")).await.unwrap();

        let updated = registry
            .update(book.id, "New".into(), "Known".into())
            .await
            .unwrap();
        assert_eq!(updated.id, book.id);
        assert_eq!(updated.isbn, "9");
        assert_eq!(updated.title, "New");
        assert_eq!(updated.author, "Known");
    }

    #[tokio::test]
    async fn update_and_remove_unknown_book_fail() {
        let registry = registry();
        assert!(matches!(
            registry.update(BookId(42), "T".into(), "A".into()).await,
            Err(LibraryError::BookNotFound)
        ));
        assert!(matches!(
            registry.remove(BookId(42)).await,
            Err(LibraryError::BookNotFound)
        ));
    }

    #[tokio::test]
    async fn remove_deletes_book() {
        let registry = registry();
        let book = registry.register(new_book("T", "A", "5")).await.unwrap();
        registry.remove(book.id).await.unwrap();
        assert!(registry.get_by_id(book.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_of_one_isbn_admit_one() {
        let registry = Arc::new(registry());
        let mut handles = Vec::new();
        for n in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .register(new_book(&format!("Copy {n}"), "A", "same"))
                    .await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }
}
