use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use clanboard_shared::permissions::{AccessLevel, GuardedAction};
use clanboard_shared::{FetchError, IngestionJob, IngestionStatus, RosterScope};

use crate::api;
use crate::app::RosterData;
use crate::toast::{ToastKind, Toasts};

pub const POLL_INTERVAL_MS: u32 = 2_000;
pub const MAX_POLL_ATTEMPTS: u32 = 90;

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Finished(IngestionJob),
    TimedOut,
    Failed(FetchError),
}

pub fn describe(outcome: &PollOutcome) -> (ToastKind, String) {
    match outcome {
        PollOutcome::Finished(job) if job.status == IngestionStatus::Completed => {
            (ToastKind::Success, "Clan data refreshed".to_string())
        }
        PollOutcome::Finished(job) => (
            ToastKind::Error,
            format!(
                "Refresh failed: {}",
                job.error.as_deref().unwrap_or("the ingestion job reported an error")
            ),
        ),
        PollOutcome::TimedOut => (
            ToastKind::Info,
            "Refresh is still running; new data will show up on the next reload".to_string(),
        ),
        PollOutcome::Failed(e) => (ToastKind::Error, format!("Couldn't check refresh status: {e}")),
    }
}

/// Counts status checks and decides when polling stops.
#[derive(Debug, Default)]
pub struct PollTracker {
    attempts: u32,
}

impl PollTracker {
    /// Record one status check; `Some` ends the poll loop.
    pub fn record(&mut self, result: Result<IngestionJob, FetchError>) -> Option<PollOutcome> {
        self.attempts += 1;
        match result {
            Ok(job) if job.status.is_terminal() => return Some(PollOutcome::Finished(job)),
            Err(e) if !e.is_transient() => return Some(PollOutcome::Failed(e)),
            Ok(_) | Err(_) => {}
        }
        (self.attempts >= MAX_POLL_ATTEMPTS).then_some(PollOutcome::TimedOut)
    }
}

async fn poll(job: IngestionJob) -> PollOutcome {
    if job.status.is_terminal() {
        return PollOutcome::Finished(job);
    }
    let mut tracker = PollTracker::default();
    loop {
        TimeoutFuture::new(POLL_INTERVAL_MS).await;
        let result = api::fetch_ingestion_job(&job.job_id).await;
        if let Err(e) = &result
            && e.is_transient()
        {
            web_sys::console::warn_1(&format!("ingestion poll failed: {e}").into());
        }
        if let Some(outcome) = tracker.record(result) {
            return outcome;
        }
    }
}

/// Start an ingestion job, poll it to completion and refetch on success.
pub(crate) fn trigger(
    access: AccessLevel,
    data: RosterData,
    running: RwSignal<bool>,
    toasts: Toasts,
    scope: RosterScope,
) {
    if let Err(denied) = access.check(GuardedAction::TriggerIngestion) {
        toasts.error(denied.to_string());
        return;
    }
    if running.get_untracked() {
        return;
    }
    running.set(true);

    spawn_local(async move {
        let clan = data.clan_tag.get_untracked();
        let outcome = match api::start_ingestion(clan.as_deref()).await {
            Ok(job) => {
                web_sys::console::info_1(&format!("ingestion job {} queued", job.job_id).into());
                toasts.info("Refreshing clan data\u{2026}");
                poll(job).await
            }
            Err(e) => PollOutcome::Failed(e),
        };

        let (kind, message) = describe(&outcome);
        match kind {
            ToastKind::Success => toasts.success(message),
            ToastKind::Info => toasts.info(message),
            ToastKind::Error => toasts.error(message),
        }
        if matches!(&outcome, PollOutcome::Finished(job) if job.status == IngestionStatus::Completed)
        {
            data.refresh(scope);
        }
        running.set(false);
    });
}

#[cfg(test)]
mod tests {
    use clanboard_shared::{FetchError, IngestionJob, IngestionStatus};

    use super::{MAX_POLL_ATTEMPTS, PollOutcome, PollTracker, describe};
    use crate::toast::ToastKind;

    fn job(status: IngestionStatus, error: Option<&str>) -> IngestionJob {
        IngestionJob {
            job_id: "job-1".into(),
            status,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn completed_job_reports_success() {
        let (kind, message) = describe(&PollOutcome::Finished(job(IngestionStatus::Completed, None)));
        assert_eq!(kind, ToastKind::Success);
        assert_eq!(message, "Clan data refreshed");
    }

    #[test]
    fn failed_job_surfaces_upstream_reason() {
        let (kind, message) = describe(&PollOutcome::Finished(job(
            IngestionStatus::Failed,
            Some("Clash API rate limited"),
        )));
        assert_eq!(kind, ToastKind::Error);
        assert_eq!(message, "Refresh failed: Clash API rate limited");
    }

    #[test]
    fn exhausted_poll_budget_is_informational() {
        let (kind, _) = describe(&PollOutcome::TimedOut);
        assert_eq!(kind, ToastKind::Info);
    }

    #[test]
    fn status_errors_are_reported() {
        let (kind, message) = describe(&PollOutcome::Failed(FetchError::Http { status: 404 }));
        assert_eq!(kind, ToastKind::Error);
        assert_eq!(message, "Couldn't check refresh status: HTTP 404");
    }

    #[test]
    fn terminal_status_stops_polling() {
        let mut tracker = PollTracker::default();
        assert_eq!(tracker.record(Ok(job(IngestionStatus::Queued, None))), None);
        assert_eq!(tracker.record(Ok(job(IngestionStatus::Running, None))), None);
        assert_eq!(
            tracker.record(Ok(job(IngestionStatus::Completed, None))),
            Some(PollOutcome::Finished(job(IngestionStatus::Completed, None)))
        );

        let mut tracker = PollTracker::default();
        assert_eq!(
            tracker.record(Ok(job(IngestionStatus::Failed, Some("boom")))),
            Some(PollOutcome::Finished(job(IngestionStatus::Failed, Some("boom"))))
        );
    }

    #[test]
    fn transient_errors_keep_polling_and_others_stop() {
        let mut tracker = PollTracker::default();
        assert_eq!(tracker.record(Err(FetchError::Network("offline".into()))), None);
        assert_eq!(tracker.record(Err(FetchError::Http { status: 503 })), None);
        assert_eq!(tracker.record(Err(FetchError::Http { status: 429 })), None);
        assert_eq!(
            tracker.record(Err(FetchError::Http { status: 404 })),
            Some(PollOutcome::Failed(FetchError::Http { status: 404 }))
        );
    }

    #[test]
    fn budget_runs_out_on_the_last_attempt() {
        let mut tracker = PollTracker::default();
        for attempt in 1..MAX_POLL_ATTEMPTS {
            let result = if attempt % 2 == 0 {
                Ok(job(IngestionStatus::Running, None))
            } else {
                Err(FetchError::Network("flaky".into()))
            };
            assert_eq!(tracker.record(result), None, "attempt {attempt}");
        }
        assert_eq!(
            tracker.record(Ok(job(IngestionStatus::Running, None))),
            Some(PollOutcome::TimedOut)
        );
    }

    #[test]
    fn completion_on_the_last_attempt_wins_over_timeout() {
        let mut tracker = PollTracker::default();
        for _ in 1..MAX_POLL_ATTEMPTS {
            assert_eq!(tracker.record(Ok(job(IngestionStatus::Running, None))), None);
        }
        assert_eq!(
            tracker.record(Ok(job(IngestionStatus::Completed, None))),
            Some(PollOutcome::Finished(job(IngestionStatus::Completed, None)))
        );
    }
}
