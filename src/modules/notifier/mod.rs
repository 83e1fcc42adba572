//! Daily sweep that mails the borrowers of overdue loans.

pub mod mailer;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lending_kernel::{InitCtx, Module};
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::modules::loans::ledger::LoanLedger;
use mailer::Mailer;

/// What a single sweep did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    /// Nothing was overdue; no mail was sent.
    Idle,
    /// One batch went out to these recipients.
    Dispatched { recipients: Vec<String> },
}

pub struct OverdueNotifier {
    ledger: Arc<LoanLedger>,
    mailer: Arc<dyn Mailer>,
    message: String,
}

impl OverdueNotifier {
    pub fn new(ledger: Arc<LoanLedger>, mailer: Arc<dyn Mailer>, message: String) -> Self {
        Self {
            ledger,
            mailer,
            message,
        }
    }

    /// Run one sweep. Reads the ledger fresh every time, so a failed sweep
    /// loses nothing: the next one sees the same loans.
    pub async fn tick(&self) -> anyhow::Result<TickReport> {
        let late = self
            .ledger
            .list_late()
            .await
            .context("failed to list late loans")?;
        if late.is_empty() {
            tracing::debug!("no overdue loans");
            return Ok(TickReport::Idle);
        }

        let recipients: Vec<String> = late
            .iter()
            .map(|loan| loan.recipient().to_string())
            .collect();
        self.mailer
            .send_mails(&self.message, &recipients)
            .await
            .context("failed to dispatch overdue notices")?;

        tracing::info!(recipients = recipients.len(), "overdue notices dispatched");
        Ok(TickReport::Dispatched { recipients })
    }
}

/// Time left until the next 00:00 UTC.
pub fn until_next_midnight(now: OffsetDateTime) -> std::time::Duration {
    let now = now.to_offset(UtcOffset::UTC);
    match now.date().next_day() {
        Some(tomorrow) => (tomorrow.midnight().assume_utc() - now).unsigned_abs(),
        None => std::time::Duration::from_secs(24 * 60 * 60),
    }
}

async fn run_daily(notifier: Arc<OverdueNotifier>, mut stop: watch::Receiver<bool>) {
    loop {
        let wait = until_next_midnight(OffsetDateTime::now_utc());
        tracing::debug!(wait_secs = wait.as_secs(), "next overdue sweep scheduled");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = stop.changed() => break,
        }

        if let Err(err) = notifier.tick().await {
            tracing::warn!(
                error = %format!("{err:#}"),
                "overdue sweep abandoned until next cycle"
            );
        }
    }
    tracing::info!("overdue sweep loop stopped");
}

struct Scheduled {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the daily schedule for the overdue sweep
pub struct NotifierModule {
    notifier: Arc<OverdueNotifier>,
    scheduled: Mutex<Option<Scheduled>>,
}

impl NotifierModule {
    pub fn new(notifier: Arc<OverdueNotifier>) -> Self {
        Self {
            notifier,
            scheduled: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.scheduled
            .lock()
            .await
            .as_ref()
            .is_some_and(|scheduled| !scheduled.handle.is_finished())
    }
}

#[async_trait]
impl Module for NotifierModule {
    fn name(&self) -> &'static str {
        "notifier"
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if !ctx.settings.notifier.enabled {
            tracing::info!(module = self.name(), "overdue notifier disabled");
            return Ok(());
        }

        let mut scheduled = self.scheduled.lock().await;
        if scheduled.is_some() {
            anyhow::bail!("overdue notifier already started");
        }

        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_daily(self.notifier.clone(), stop_rx));
        *scheduled = Some(Scheduled { stop, handle });

        tracing::info!(module = self.name(), "overdue notifier scheduled daily at 00:00 UTC");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let Some(scheduled) = self.scheduled.lock().await.take() else {
            return Ok(());
        };

        // The receiver may already be gone if the loop ended on its own
        let _ = scheduled.stop.send(true);
        scheduled
            .handle
            .await
            .context("overdue sweep task panicked")?;

        tracing::info!(module = self.name(), "notifier module stopped");
        Ok(())
    }
}

/// Create a new instance of the notifier module
pub fn create_module(notifier: Arc<OverdueNotifier>) -> Arc<dyn Module> {
    Arc::new(NotifierModule::new(notifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Library;
    use crate::modules::books::models::{BookId, NewBook};
    use crate::modules::loans::models::{Loan, LoanId, NewLoan};
    use crate::query::{LoanQuery, Page, PageRequest};
    use crate::store::memory::MemoryBookStore;
    use crate::store::LoanStore;
    use lending_kernel::{settings::Settings, FixedClock};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use time::macros::{date, datetime};
    use time::Date;

    /// Records batches; fails the first `failures` sends.
    #[derive(Default)]
    struct RecordingMailer {
        batches: StdMutex<Vec<(String, Vec<String>)>>,
        failures: AtomicUsize,
        attempts: AtomicUsize,
    }

    impl RecordingMailer {
        fn failing_once() -> Self {
            Self {
                failures: AtomicUsize::new(1),
                ..Self::default()
            }
        }

        fn batches(&self) -> Vec<(String, Vec<String>)> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_mails(&self, message: &str, recipients: &[String]) -> anyhow::Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                anyhow::bail!("smtp relay unreachable");
            }
            self.batches
                .lock()
                .unwrap()
                .push((message.to_string(), recipients.to_vec()));
            Ok(())
        }
    }

    /// Loan table whose every call fails.
    struct OfflineLoanStore;

    #[async_trait]
    impl LoanStore for OfflineLoanStore {
        async fn insert(&self, _loan: NewLoan) -> anyhow::Result<Loan> {
            anyhow::bail!("loan table offline")
        }

        async fn get(&self, _id: LoanId) -> anyhow::Result<Option<Loan>> {
            anyhow::bail!("loan table offline")
        }

        async fn set_returned(&self, _id: LoanId, _returned: bool) -> anyhow::Result<Option<Loan>> {
            anyhow::bail!("loan table offline")
        }

        async fn has_active_loan(&self, _book_id: BookId) -> anyhow::Result<bool> {
            anyhow::bail!("loan table offline")
        }

        async fn query(&self, _query: &LoanQuery, _page: PageRequest) -> anyhow::Result<Page<Loan>> {
            anyhow::bail!("loan table offline")
        }

        async fn late(&self, _cutoff: Date) -> anyhow::Result<Vec<Loan>> {
            anyhow::bail!("loan table offline")
        }
    }

    async fn library_with_loans(clock: &FixedClock) -> Library {
        let library = Library::in_memory(Arc::new(clock.clone()));
        for isbn in ["1", "2", "3"] {
            library
                .books
                .register(NewBook {
                    title: "T".into(),
                    author: "A".into(),
                    isbn: isbn.into(),
                })
                .await
                .unwrap();
        }

        clock.set(date!(2024 - 06 - 01));
        library
            .loans
            .create_loan("1", "Alice".into(), Some("alice@example.com".into()))
            .await
            .unwrap();
        library
            .loans
            .create_loan("2", "Bob".into(), None)
            .await
            .unwrap();
        clock.set(date!(2024 - 06 - 05));
        library
            .loans
            .create_loan("3", "Carol".into(), Some("carol@example.com".into()))
            .await
            .unwrap();
        library
    }

    #[tokio::test]
    async fn empty_ledger_sends_nothing() {
        let clock = FixedClock::new(date!(2024 - 06 - 10));
        let library = Library::in_memory(Arc::new(clock));
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = OverdueNotifier::new(library.loans.clone(), mailer.clone(), "late".into());

        assert_eq!(notifier.tick().await.unwrap(), TickReport::Idle);
        assert!(mailer.batches().is_empty());
    }

    #[tokio::test]
    async fn one_batch_with_email_or_name() {
        let clock = FixedClock::new(date!(2024 - 06 - 01));
        let library = library_with_loans(&clock).await;
        clock.set(date!(2024 - 06 - 06));

        let mailer = Arc::new(RecordingMailer::default());
        let notifier = OverdueNotifier::new(
            library.loans.clone(),
            mailer.clone(),
            "Please return your book".into(),
        );

        let report = notifier.tick().await.unwrap();
        let expected = vec!["alice@example.com".to_string(), "Bob".to_string()];
        assert_eq!(
            report,
            TickReport::Dispatched {
                recipients: expected.clone()
            }
        );
        assert_eq!(
            mailer.batches(),
            vec![("Please return your book".to_string(), expected)]
        );
    }

    #[tokio::test]
    async fn failed_dispatch_is_retried_next_tick() {
        let clock = FixedClock::new(date!(2024 - 06 - 01));
        let library = library_with_loans(&clock).await;
        clock.set(date!(2024 - 06 - 06));

        let mailer = Arc::new(RecordingMailer::failing_once());
        let notifier = OverdueNotifier::new(library.loans.clone(), mailer.clone(), "late".into());

        let err = notifier.tick().await.unwrap_err();
        assert!(format!("{err:#}").contains("smtp relay unreachable"));
        assert!(mailer.batches().is_empty());

        // Three days on, the third loan is overdue too
        clock.advance_days(3);
        let report = notifier.tick().await.unwrap();
        assert!(matches!(report, TickReport::Dispatched { ref recipients } if recipients.len() == 3));
        assert_eq!(mailer.batches().len(), 1);
    }

    #[tokio::test]
    async fn unreadable_ledger_fails_tick_without_mailing() {
        let library = Library::new(
            Arc::new(MemoryBookStore::new()),
            Arc::new(OfflineLoanStore),
            Arc::new(FixedClock::new(date!(2024 - 06 - 10))),
        );
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = OverdueNotifier::new(library.loans.clone(), mailer.clone(), "late".into());

        let err = notifier.tick().await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("failed to list late loans"));
        assert!(message.contains("loan table offline"));
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 0);
        assert!(mailer.batches().is_empty());
    }

    #[test]
    fn midnight_wait_is_measured_in_utc() {
        let wait = until_next_midnight(datetime!(2024-06-01 22:30 UTC));
        assert_eq!(wait, std::time::Duration::from_secs(90 * 60));

        let wait = until_next_midnight(datetime!(2024-06-01 23:30 -02:00));
        assert_eq!(wait, std::time::Duration::from_secs(22 * 60 * 60 + 30 * 60));

        let wait = until_next_midnight(datetime!(2024-06-01 00:00 UTC));
        assert_eq!(wait, std::time::Duration::from_secs(24 * 60 * 60));
    }

    #[tokio::test]
    async fn module_schedules_and_stops() {
        let library = Library::in_memory(Arc::new(FixedClock::new(date!(2024 - 06 - 01))));
        let notifier = Arc::new(OverdueNotifier::new(
            library.loans.clone(),
            Arc::new(RecordingMailer::default()),
            "late".into(),
        ));
        let module = NotifierModule::new(notifier);
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        module.start(&ctx).await.unwrap();
        assert!(module.is_running().await);
        assert!(module.start(&ctx).await.is_err());

        module.stop().await.unwrap();
        assert!(!module.is_running().await);
        module.stop().await.unwrap();
    }

    #[tokio::test]
    async fn disabled_module_does_not_schedule() {
        let library = Library::in_memory(Arc::new(FixedClock::new(date!(2024 - 06 - 01))));
        let notifier = Arc::new(OverdueNotifier::new(
            library.loans.clone(),
            Arc::new(RecordingMailer::default()),
            "late".into(),
        ));
        let module = NotifierModule::new(notifier);
        let mut settings = Settings::default();
        settings.notifier.enabled = false;
        let ctx = InitCtx {
            settings: &settings,
        };

        module.start(&ctx).await.unwrap();
        assert!(!module.is_running().await);
    }
}
