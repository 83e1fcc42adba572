//! Service wiring and process lifecycle.

use std::sync::Arc;

use anyhow::Context;
use lending_kernel::{settings::Settings, Clock, InitCtx, ModuleRegistry, SystemClock};

use crate::error::LibraryResult;
use crate::modules::books::registry::BookRegistry;
use crate::modules::loans::ledger::LoanLedger;
use crate::modules::loans::models::{Loan, LoanView};
use crate::modules::notifier::mailer::{LogMailer, Mailer};
use crate::modules::notifier::OverdueNotifier;
use crate::query::QueryEngine;
use crate::store::memory::{MemoryBookStore, MemoryLoanStore};
use crate::store::{BookStore, LoanStore};

/// The core services, shared by every module.
#[derive(Clone)]
pub struct Library {
    pub books: Arc<BookRegistry>,
    pub loans: Arc<LoanLedger>,
    pub query: QueryEngine,
}

impl Library {
    pub fn new(
        book_store: Arc<dyn BookStore>,
        loan_store: Arc<dyn LoanStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let query = QueryEngine::new(book_store.clone(), loan_store.clone());
        let books = Arc::new(BookRegistry::new(book_store));
        let loans = Arc::new(LoanLedger::new(
            books.clone(),
            loan_store,
            query.clone(),
            clock,
        ));
        Self {
            books,
            loans,
            query,
        }
    }

    /// Services over fresh in-memory stores.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(MemoryBookStore::new()),
            Arc::new(MemoryLoanStore::new()),
            clock,
        )
    }

    /// Attach the loaned book to a loan.
    pub async fn loan_view(&self, loan: Loan) -> LibraryResult<LoanView> {
        let book = self.books.get_by_id(loan.book_id).await?;
        Ok(LoanView { loan, book })
    }

    pub async fn loan_views(&self, loans: Vec<Loan>) -> LibraryResult<Vec<LoanView>> {
        let mut views = Vec::with_capacity(loans.len());
        for loan in loans {
            views.push(self.loan_view(loan).await?);
        }
        Ok(views)
    }
}

/// Register every service module in start order.
pub fn build_registry(
    library: &Library,
    settings: &Settings,
    mailer: Arc<dyn Mailer>,
) -> ModuleRegistry {
    let notifier = Arc::new(OverdueNotifier::new(
        library.loans.clone(),
        mailer,
        settings.mail.late_loans_message.clone(),
    ));

    let mut registry = ModuleRegistry::new();
    crate::modules::register_all(&mut registry, library, notifier);
    registry
}

/// Run the service until Ctrl-C.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let library = Library::in_memory(Arc::new(SystemClock::new()));
    let mailer = Arc::new(LogMailer::from_settings(&settings.mail));
    let registry = build_registry(&library, &settings, mailer);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry
        .init_modules(&ctx)
        .await
        .context("module initialization failed")?;
    registry
        .start_modules(&ctx)
        .await
        .context("module start failed")?;

    let served = lending_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry
        .stop_modules()
        .await
        .context("module shutdown failed")?;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
