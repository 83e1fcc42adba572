use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use lending_http::error::AppError;
use serde::Deserialize;

use super::models::{Book, BookId, NewBook, UpdateBook};
use crate::modules::loans::models::Loan;
use crate::app::Library;
use crate::error::LibraryError;
use crate::query::{BookFilter, Page, PageRequest};

#[derive(Debug, Default, Deserialize)]
pub struct ListBooksParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

pub fn router(library: Library) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/{id}/loans", get(book_loans))
        .with_state(library)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn create_book(
    State(library): State<Library>,
    Json(request): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = library.books.register(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn list_books(
    State(library): State<Library>,
    Query(params): Query<ListBooksParams>,
) -> Result<Json<Page<Book>>, AppError> {
    let page = PageRequest::from_query(params.page, params.size)?;
    let criteria = BookFilter {
        title: params.title,
        author: params.author,
    };
    Ok(Json(library.query.filter_books(&criteria, page).await?))
}

async fn get_book(
    State(library): State<Library>,
    Path(id): Path<u64>,
) -> Result<Json<Book>, AppError> {
    let book = library
        .books
        .get_by_id(BookId(id))
        .await?
        .ok_or(LibraryError::BookNotFound)?;
    Ok(Json(book))
}

async fn update_book(
    State(library): State<Library>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateBook>,
) -> Result<Json<Book>, AppError> {
    let book = library
        .books
        .update(BookId(id), request.title, request.author)
        .await?;
    Ok(Json(book))
}

async fn delete_book(
    State(library): State<Library>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    library.loans.retire_book(BookId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn book_loans(
    State(library): State<Library>,
    Path(id): Path<u64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Loan>>, AppError> {
    let page = PageRequest::from_query(params.page, params.size)?;
    let book_id = BookId(id);
    if library.books.get_by_id(book_id).await?.is_none() {
        return Err(LibraryError::BookNotFound.into());
    }
    Ok(Json(library.loans.list_by_book(book_id, page).await?))
}
