use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use lending_http::error::AppError;
use serde::Deserialize;

use super::models::{Loan, LoanId, LoanRequest, LoanView, ReturnRequest};
use crate::app::Library;
use crate::error::LibraryError;
use crate::query::{LoanFilter, Page, PageRequest};

#[derive(Debug, Default, Deserialize)]
pub struct ListLoansParams {
    pub isbn: Option<String>,
    pub customer: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

pub fn router(library: Library) -> Router {
    Router::new()
        .route("/", get(list_loans).post(create_loan))
        .route("/health", get(health_check))
        .route("/late", get(late_loans))
        .route("/{id}", get(get_loan).patch(return_loan))
        .with_state(library)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "loans module is healthy"
}

async fn create_loan(
    State(library): State<Library>,
    Json(request): Json<LoanRequest>,
) -> Result<(StatusCode, Json<Loan>), AppError> {
    let loan = library
        .loans
        .create_loan(&request.isbn, request.customer, request.email)
        .await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

async fn get_loan(
    State(library): State<Library>,
    Path(id): Path<u64>,
) -> Result<Json<LoanView>, AppError> {
    let loan = library
        .loans
        .get_by_id(LoanId(id))
        .await?
        .ok_or(LibraryError::LoanNotFound)?;
    Ok(Json(library.loan_view(loan).await?))
}

async fn return_loan(
    State(library): State<Library>,
    Path(id): Path<u64>,
    Json(request): Json<ReturnRequest>,
) -> Result<Json<LoanView>, AppError> {
    let loan = library
        .loans
        .mark_returned(LoanId(id), request.returned)
        .await?;
    Ok(Json(library.loan_view(loan).await?))
}

async fn list_loans(
    State(library): State<Library>,
    Query(params): Query<ListLoansParams>,
) -> Result<Json<Page<LoanView>>, AppError> {
    let page = PageRequest::from_query(params.page, params.size)?;
    let criteria = LoanFilter {
        isbn: params.isbn,
        customer: params.customer,
    };
    let found = library.query.filter_loans(&criteria, page).await?;
    let views = library.loan_views(found.content).await?;
    Ok(Json(Page::new(views, found.total_elements, page)))
}

async fn late_loans(State(library): State<Library>) -> Result<Json<Vec<LoanView>>, AppError> {
    let late = library.loans.list_late().await?;
    Ok(Json(library.loan_views(late).await?))
}
