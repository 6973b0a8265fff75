// ── Bulk fan-out ──
//
// One spawned task per target, gated by a semaphore sized to the pool.
// Every task inherits a child of the call's cancellation token and the
// optional per-device deadline. Whatever happens inside a task (error,
// panic, cancellation, deadline) comes back as a failed outcome for
// that address; siblings are never affected.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::command::{CommandExecutor, CommandPlan};
use crate::error::CoreError;
use crate::model::{BulkResult, CommandOutcome};

/// Bounded concurrent executor for one command over many devices.
pub struct BulkOrchestrator {
    executor: Arc<CommandExecutor>,
    workers: Option<usize>,
    deadline: Option<Duration>,
}

impl BulkOrchestrator {
    /// `workers: None` sizes the pool to the number of targets.
    pub fn new(executor: Arc<CommandExecutor>, workers: Option<usize>, deadline: Option<Duration>) -> Self {
        Self {
            executor,
            workers,
            deadline,
        }
    }

    /// Run `plan` on every target and wait for all of them.
    pub async fn run(
        &self,
        targets: Vec<String>,
        plan: &CommandPlan,
        cancel: &CancellationToken,
    ) -> BulkResult {
        let started = Instant::now();
        let pool = self.workers.unwrap_or(targets.len()).max(1);
        let semaphore = Arc::new(Semaphore::new(pool));

        tracing::info!(
            command = %plan.name,
            targets = targets.len(),
            pool,
            "starting bulk execution"
        );

        let mut tasks = FuturesUnordered::new();
        for address in targets {
            let handle = tokio::spawn(run_one(
                Arc::clone(&self.executor),
                Arc::clone(&semaphore),
                cancel.child_token(),
                self.deadline,
                address.clone(),
                plan.clone(),
            ));
            tasks.push(async move { (address, handle.await) });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some((address, joined)) = tasks.next().await {
            let outcome = joined.unwrap_or_else(|e| {
                let fault = join_failure(e);
                tracing::warn!(address = %address, error = %fault, "device task failed");
                self.executor
                    .outcome(&address, &plan.name, Err(fault), started.elapsed())
            });
            outcomes.push(outcome);
        }

        let result = BulkResult::new(plan.name.clone(), outcomes, started.elapsed());
        tracing::info!(
            command = %result.command,
            succeeded = result.success_count,
            failed = result.failure_count,
            total_ms = u64::try_from(result.total_time.as_millis()).unwrap_or(u64::MAX),
            "bulk execution finished"
        );
        result
    }
}

async fn run_one(
    executor: Arc<CommandExecutor>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    deadline: Option<Duration>,
    address: String,
    plan: CommandPlan,
) -> CommandOutcome {
    let started = Instant::now();

    let work = async {
        let _permit = semaphore
            .acquire()
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        match deadline {
            Some(limit) => tokio::time::timeout(limit, executor.execute(&address, &plan))
                .await
                .map_err(|_| CoreError::DeadlineExceeded {
                    timeout_secs: tvfleet_api::error::ceil_secs(limit),
                }),
            None => Ok(executor.execute(&address, &plan).await),
        }
    };

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CoreError::Cancelled),
        result = work => result,
    };

    result.unwrap_or_else(|e| executor.outcome(&address, &plan.name, Err(e), started.elapsed()))
}

/// Convert a join failure into a domain error carrying the panic message.
fn join_failure(err: JoinError) -> CoreError {
    if err.is_cancelled() {
        return CoreError::Cancelled;
    }
    match err.try_into_panic() {
        Ok(payload) => CoreError::Internal(format!("task panicked: {}", panic_message(&*payload))),
        Err(err) => CoreError::Internal(err.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
