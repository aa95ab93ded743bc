//! Background quarantine sweeps.
//!
//! Deleted short codes sit in quarantine until their release time. A
//! [`Worker`] owns the receiving end of a job channel and frees expired codes
//! whenever a [`Job::ReleaseQuarantined`] arrives; [`spawn_release_ticker`]
//! submits one on a fixed interval.

use crate::services::ShortenerService;
use anyhow::{anyhow, Context};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum Job {
    /// Free quarantined short codes whose safety delay has elapsed.
    /// `done` receives the number of codes released, when present.
    ReleaseQuarantined { done: Option<oneshot::Sender<usize>> },
}

/// Drains the job channel until every [`JobSender`] is dropped.
pub struct Worker {
    shortener: ShortenerService,
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl Worker {
    pub fn new(shortener: ShortenerService, receiver: mpsc::UnboundedReceiver<Job>) -> Self {
        Self {
            shortener,
            receiver,
        }
    }

    pub async fn run(mut self) {
        info!("Quarantine worker started");

        let mut total_released = 0usize;
        while let Some(job) = self.receiver.recv().await {
            match self.handle(job).await {
                Ok(released) => total_released += released,
                Err(e) => warn!("Job did not complete cleanly: {:#}", e),
            }
        }

        info!(total_released, "Quarantine worker stopped");
    }

    async fn handle(&self, job: Job) -> anyhow::Result<usize> {
        match job {
            Job::ReleaseQuarantined { done } => {
                let released = self.shortener.release_quarantined(Utc::now()).await;
                debug!(released, "Quarantine sweep finished");

                if let Some(done) = done {
                    done.send(released)
                        .map_err(|_| anyhow!("sweep requester went away"))?;
                }
                Ok(released)
            }
        }
    }
}

/// Cloneable handle for submitting jobs to the [`Worker`].
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::UnboundedSender<Job>,
}

impl JobSender {
    pub fn new(sender: mpsc::UnboundedSender<Job>) -> Self {
        Self { sender }
    }

    /// Fire-and-forget submission. Logs when the worker is gone.
    pub fn send(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!("Job channel closed, worker is no longer running");
        }
    }

    /// Queue a sweep without waiting for it.
    pub fn release_quarantined(&self) {
        self.send(Job::ReleaseQuarantined { done: None });
    }

    /// Queue a sweep and wait for the number of codes it released.
    pub async fn sweep_now(&self) -> anyhow::Result<usize> {
        let (done, result) = oneshot::channel();
        self.sender
            .send(Job::ReleaseQuarantined { done: Some(done) })
            .map_err(|_| anyhow!("job channel closed"))?;

        result.await.context("worker dropped the sweep")
    }
}

pub fn create_job_channel() -> (JobSender, mpsc::UnboundedReceiver<Job>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (JobSender::new(sender), receiver)
}

/// Submit a sweep every `interval` until the returned task is aborted.
pub fn spawn_release_ticker(sender: JobSender, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sender.release_quarantined();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ShortenerSettings;

    fn shortener_without_delay() -> ShortenerService {
        ShortenerService::new(ShortenerSettings {
            release_delay: chrono::Duration::zero(),
            ..ShortenerSettings::default()
        })
    }

    #[test]
    fn test_release_quarantined_queues_job() {
        let (sender, mut receiver) = create_job_channel();

        sender.release_quarantined();

        assert!(matches!(
            receiver.try_recv(),
            Ok(Job::ReleaseQuarantined { done: None })
        ));
    }

    #[tokio::test]
    async fn test_sweep_now_reports_released_codes() {
        let shortener = shortener_without_delay();
        for url in ["https://a.example", "https://b.example"] {
            let record = shortener.shorten(url).await.unwrap();
            shortener.delete(&record.short_code).await.unwrap();
        }
        assert_eq!(shortener.stats().await.quarantined, 2);

        let (sender, receiver) = create_job_channel();
        let handle = tokio::spawn(Worker::new(shortener.clone(), receiver).run());

        assert_eq!(sender.sweep_now().await.unwrap(), 2);
        assert_eq!(sender.sweep_now().await.unwrap(), 0);

        drop(sender);
        handle.await.unwrap();
        assert_eq!(shortener.stats().await.quarantined, 0);
    }

    #[tokio::test]
    async fn test_sweep_now_without_worker_fails() {
        let (sender, receiver) = create_job_channel();
        drop(receiver);

        assert!(sender.sweep_now().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_ticker_sends_jobs() {
        let (sender, mut receiver) = create_job_channel();
        let ticker = spawn_release_ticker(sender, Duration::from_secs(60));

        let job = receiver.recv().await;
        assert!(matches!(job, Some(Job::ReleaseQuarantined { done: None })));

        ticker.abort();
    }
}
