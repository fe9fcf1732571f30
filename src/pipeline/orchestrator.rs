//! Two-tier orchestration: one thread per shard group, each feeding a bounded
//! work queue drained by a fixed pool of search workers.

use anyhow::{Context as _, Result};
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;

use crate::engine::partition::{effective_threads, partition};
use crate::pipeline::context::JobContext;
use crate::pipeline::worker::spawn_search_workers;
use crate::remote::Remote;
use crate::sink::{ErrorLog, OutputSink};
use crate::types::{Identity, JobConfig, JobSummary};

/// Run a whole job: validate, shard, open the sinks, fan out shard groups, and
/// join them. Returns once every shard's queue has drained and every worker
/// has exited.
pub fn run_job<R: Remote + 'static>(
    remote: Arc<R>,
    config: JobConfig,
    identities: Vec<Identity>,
) -> Result<JobSummary> {
    config.validate()?;
    let shards = partition(identities, config.process_count)?;

    let output = OutputSink::open(&config.output_path)
        .with_context(|| format!("opening output {}", config.output_path.display()))?;
    let errors = ErrorLog::open(&config.error_log_path)
        .with_context(|| format!("opening error log {}", config.error_log_path.display()))?;
    let ctx = Arc::new(JobContext::new(config, output, errors));

    let mut groups = Vec::new();
    for (index, shard) in shards.into_iter().enumerate() {
        if shard.is_empty() {
            continue;
        }
        let remote = Arc::clone(&remote);
        let ctx = Arc::clone(&ctx);
        groups.push(thread::spawn(move || run_shard(index, shard, &remote, &ctx)));
    }
    for group in groups {
        group
            .join()
            .map_err(|_| anyhow::anyhow!("shard group thread panicked"))?;
    }

    let summary = JobSummary {
        identities: ctx.identities_done.load(Ordering::Relaxed),
        records: ctx.output.written(),
        errors: ctx.errors.count(),
    };
    log::info!(
        "done: {} identities searched, {} records written, {} errors logged",
        summary.identities,
        summary.records,
        summary.errors
    );
    Ok(summary)
}

/// One process group. Workers are spawned first, then the shard's identities
/// are fed through a queue whose capacity equals the pool size: `send` blocks
/// on a full queue, which is the job's only backpressure. Dropping the sender
/// and joining the pool is the queue-join barrier.
fn run_shard<R: Remote + 'static>(
    index: usize,
    shard: Vec<Identity>,
    remote: &Arc<R>,
    ctx: &Arc<JobContext>,
) {
    let threads = effective_threads(ctx.config.thread_count, shard.len());
    log::debug!("shard {index}: {} identities, {threads} workers", shard.len());

    let (tx, rx) = bounded::<Identity>(threads);
    let workers = spawn_search_workers(remote, ctx, &rx, threads);
    drop(rx);

    for identity in shard {
        if tx.send(identity).is_err() {
            // Send only fails when every worker has exited (output failure).
            log::error!("shard {index}: all workers stopped, remaining identities skipped");
            break;
        }
    }
    drop(tx);

    for worker in workers {
        let _ = worker.join();
    }
}
