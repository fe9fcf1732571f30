//! Worker loop: own one identity at a time, driving authorize → paginate
//! search → fetch → append, with failure isolation at each level.

use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use crate::pipeline::context::JobContext;
use crate::remote::{Pages, Remote, Session};
use crate::sink::WriteError;
use crate::types::{ErrorRecord, Identity};

/// Spawn the fixed worker pool for one shard. Each worker blocks on the queue
/// when it is empty and exits when the feeder drops the sender.
pub fn spawn_search_workers<R: Remote + 'static>(
    remote: &Arc<R>,
    ctx: &Arc<JobContext>,
    rx: &Receiver<Identity>,
    count: usize,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|_| {
            let remote = Arc::clone(remote);
            let ctx = Arc::clone(ctx);
            let rx = rx.clone();
            thread::spawn(move || worker_loop(remote.as_ref(), &ctx, &rx))
        })
        .collect()
}

fn worker_loop<R: Remote>(remote: &R, ctx: &JobContext, rx: &Receiver<Identity>) {
    while let Ok(identity) = rx.recv() {
        let result = process_identity(remote, &identity, ctx);
        // The item is complete either way, so the shard join cannot hang on it.
        ctx.identities_done.fetch_add(1, Ordering::Relaxed);
        if let Err(err) = result {
            // Output failure: stop this worker rather than keep consuming
            // against a broken shared sink. Remaining queued items fall to the
            // surviving workers; nothing replaces a stopped one.
            ctx.errors.record(&ErrorRecord::write(&identity, &err));
            log::error!("worker stopping after output failure on {identity}: {err}");
            break;
        }
    }
}

/// Process one identity end to end. Only an output-sink failure propagates;
/// authorization and listing failures abandon the identity with one error
/// record, and a fetch failure abandons just that message.
pub fn process_identity<R: Remote>(
    remote: &R,
    identity: &str,
    ctx: &JobContext,
) -> Result<(), WriteError> {
    let config = &ctx.config;
    let tuning = &config.tuning;
    log::info!("searching mail for {identity}");

    let session = match tuning
        .auth_retry
        .run("authorize", || remote.authorize(identity))
    {
        Ok(session) => session,
        Err(err) => {
            ctx.errors.record(&ErrorRecord::auth(identity, &err));
            return Ok(());
        }
    };

    // References are consumed page by page: at most one page of references and
    // one fetched body per worker, no matter how large the result set.
    let pages = Pages::new(tuning.page_delay, |cursor| {
        session.list_matching(&config.query, config.page_size, cursor)
    });
    for page in pages {
        let references = match page {
            Ok(references) => references,
            Err(err) => {
                ctx.errors.record(&ErrorRecord::list(identity, &err));
                return Ok(());
            }
        };
        for reference in references {
            match tuning.fetch_retry.run("fetch", || session.fetch(&reference)) {
                Ok(record) => ctx.output.append(&record)?,
                Err(err) => ctx
                    .errors
                    .record(&ErrorRecord::fetch(identity, &reference, &err)),
            }
        }
    }
    Ok(())
}
