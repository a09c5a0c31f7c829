//! Scan execution.
//!
//! A fixed pool of workers drains a bounded queue of `ScanTarget`s. For each
//! target a worker tries every port with every credential, in order, until
//! one pair authenticates, then runs the target's commands on that session.
//! Every target yields exactly one `ScanOutcome`; transport failures are
//! recorded in the outcome and never abort the scan.

pub mod rate_limiter;
mod report;
pub mod ssh;
mod target;
pub mod traits;

use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::commands::CommandResult;
use crate::error::TransportError;

pub use rate_limiter::RateLimiter;
pub use report::{FailureReason, ReportAggregator, ScanOutcome, ScanReport, ScanSummary};
pub use ssh::SshTransport;
pub use target::{ScanTarget, DEFAULT_TIMEOUT};
pub use traits::{Session, SharedTransport, Transport};

type Queue = Arc<Mutex<mpsc::Receiver<(usize, ScanTarget)>>>;

/// Worker pool settings.
///
/// The timeout lives on each target and bounds a single connection attempt,
/// not the whole target: a target with `p` ports and `c` credentials may
/// take up to `p * c * timeout` before it fails, plus one timeout per
/// command once a login succeeds.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of workers.
    pub concurrency: usize,
    /// Targets buffered ahead of the workers before submission waits.
    pub queue_capacity: usize,
    /// Connection attempts per second across all workers, 0 for unlimited.
    pub rate_limit: u32,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

impl ExecutorConfig {
    /// Settings with `concurrency` workers and a queue of the same size.
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            concurrency,
            queue_capacity: concurrency,
            rate_limit: 0,
            show_progress: false,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_rate_limit(mut self, rate: u32) -> Self {
        self.rate_limit = rate;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Runs scan targets on a fixed pool of workers.
pub struct Executor {
    transport: SharedTransport,
    config: ExecutorConfig,
    cancel: CancellationToken,
}

impl Executor {
    pub fn new(transport: SharedTransport, config: ExecutorConfig) -> Self {
        Self {
            transport,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned stop signal.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the scan when cancelled.
    ///
    /// Workers observe it between connection attempts. Targets not yet
    /// picked up are reported as `Skipped`; a target interrupted between
    /// attempts is reported as `Cancelled`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Scan every target and return the report.
    ///
    /// Targets are submitted as the iterator yields them, so submission and
    /// execution overlap. Returns once every target has an outcome.
    pub async fn run<I>(&self, targets: I) -> ScanReport
    where
        I: IntoIterator<Item = ScanTarget>,
    {
        let targets = targets.into_iter();
        let (lower, upper) = targets.size_hint();
        let progress = self.progress_bar(upper.unwrap_or(lower));

        let aggregator = Arc::new(ReportAggregator::new());
        let limiter = RateLimiter::new(self.config.rate_limit);
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let queue: Queue = Arc::new(Mutex::new(rx));

        info!(
            workers = self.config.concurrency,
            rate_limit = self.config.rate_limit,
            "starting scan"
        );

        let mut workers = JoinSet::new();
        for id in 0..self.config.concurrency.max(1) {
            workers.spawn(worker(
                id,
                Arc::clone(&self.transport),
                Arc::clone(&queue),
                Arc::clone(&aggregator),
                self.cancel.clone(),
                limiter.clone(),
                progress.clone(),
            ));
        }
        drop(queue);

        // Keep enough to account for targets lost with a failed worker.
        let mut submitted: Vec<(String, String)> = Vec::new();

        for (seq, target) in targets.enumerate() {
            submitted.push((target.host.clone(), target.profile.clone()));

            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = tx.reserve() => permit.ok(),
            };

            match permit {
                Some(permit) => permit.send((seq, target)),
                None => {
                    debug!(host = %target.host, "not submitted");
                    aggregator.record(seq, ScanOutcome::failure(&target, FailureReason::Skipped));
                    if let Some(pb) = &progress {
                        pb.inc(1);
                    }
                }
            }
        }
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "scan worker stopped unexpectedly");
            }
        }

        for (seq, (host, profile)) in submitted.into_iter().enumerate() {
            if !aggregator.contains(seq) {
                let target = ScanTarget::new(host, profile);
                aggregator.record(
                    seq,
                    ScanOutcome::failure(&target, FailureReason::Cancelled)
                        .with_detail("worker stopped before finishing this target"),
                );
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("scan complete");
        }

        let report = aggregator.finalize();

        let summary = report.summary();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            duration_ms = report.duration_ms,
            "scan finished"
        );
        report
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    }
}

async fn worker(
    id: usize,
    transport: SharedTransport,
    queue: Queue,
    aggregator: Arc<ReportAggregator>,
    cancel: CancellationToken,
    limiter: Option<RateLimiter>,
    progress: Option<ProgressBar>,
) {
    loop {
        let next = { queue.lock().await.recv().await };
        let Some((seq, target)) = next else {
            break;
        };

        let outcome = if cancel.is_cancelled() {
            ScanOutcome::failure(&target, FailureReason::Skipped)
        } else {
            debug!(worker = id, host = %target.host, "scanning");
            scan_target(transport.as_ref(), &target, &cancel, limiter.as_ref()).await
        };

        if let Some(pb) = &progress {
            pb.inc(1);
            if outcome.succeeded {
                pb.set_message(format!("logged in to {}", outcome.host));
            }
        }
        aggregator.record(seq, outcome);
    }

    debug!(worker = id, "queue drained");
}

/// Try each (port, credential) pair in order and run commands on the first
/// session that authenticates.
async fn scan_target(
    transport: &dyn Transport,
    target: &ScanTarget,
    cancel: &CancellationToken,
    limiter: Option<&RateLimiter>,
) -> ScanOutcome {
    let started = Instant::now();

    if target.ports.is_empty() || target.credentials.is_empty() {
        return ScanOutcome::failure(target, FailureReason::NoCandidates)
            .with_duration(started.elapsed());
    }

    let mut attempts = 0u32;
    let mut last_error = TransportError::Unreachable("no attempt made".to_string());

    for &port in &target.ports {
        for credential in &target.credentials {
            // The rate limiter can hold a worker for seconds; stop waiting
            // as soon as the scan is cancelled.
            let admitted = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = async {
                    if let Some(limiter) = limiter {
                        limiter.wait().await;
                    }
                } => true,
            };
            if !admitted {
                return ScanOutcome::failure(target, FailureReason::Cancelled)
                    .with_detail(last_error.to_string())
                    .with_attempts(attempts)
                    .with_duration(started.elapsed());
            }

            attempts += 1;
            let connected = tokio::time::timeout(
                target.timeout,
                transport.connect(&target.host, port, credential, target.timeout),
            )
            .await
            .unwrap_or(Err(TransportError::Timeout));

            match connected {
                Ok(mut session) => {
                    info!(
                        host = %target.host,
                        port = %port,
                        credential = credential.name(),
                        "login accepted"
                    );
                    let commands = run_commands(session.as_mut(), target).await;
                    session.close().await;

                    return ScanOutcome::success(target, port, credential.name(), commands)
                        .with_attempts(attempts)
                        .with_duration(started.elapsed());
                }
                Err(e) => {
                    debug!(
                        host = %target.host,
                        port = %port,
                        credential = credential.name(),
                        error = %e,
                        "attempt failed"
                    );
                    last_error = e;
                }
            }
        }
    }

    ScanOutcome::failure(target, FailureReason::from(&last_error))
        .with_detail(last_error.to_string())
        .with_attempts(attempts)
        .with_duration(started.elapsed())
}

async fn run_commands(session: &mut dyn Session, target: &ScanTarget) -> Vec<CommandResult> {
    let mut results = Vec::with_capacity(target.commands.len());

    for command in target.commands.iter() {
        let result = match tokio::time::timeout(target.timeout, session.run(command)).await {
            Ok(Ok(output)) => CommandResult::completed(command, output),
            Ok(Err(e)) => CommandResult::failed(command, e.to_string()),
            Err(_) => CommandResult::failed(command, TransportError::Timeout.to_string()),
        };
        if let Some(error) = &result.error {
            debug!(host = %target.host, command = %command, error = %error, "command failed");
        }
        results.push(result);
    }

    results
}
