//! Run handler: resolve settings and identities, build the job config, run.

use anyhow::{Result, bail};
use std::sync::Arc;

use crate::engine::arg_parser::Cli;
use crate::pipeline::run_job;
use crate::remote::{HttpRemote, enumerate_identities};
use crate::types::{Identity, JobConfig, Tuning};
use crate::utils::config::PagingConsts;
use crate::utils::{
    default_output_path, identities_from_file, load_settings, resolve_token, setup_logging,
};

pub fn handle_run(cli: &Cli) -> Result<()> {
    setup_logging(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;
    let Some(base_url) = settings.remote.base_url.clone() else {
        bail!("remote.base_url is not configured; add it to mailsweep.toml");
    };
    let Some(token) = resolve_token(&settings) else {
        bail!("no service token; set MAILSWEEP_TOKEN or remote.token in mailsweep.toml");
    };

    let available = num_cpus::get();
    let process_count = cli.procs.unwrap_or(available);
    if process_count > available {
        log::warn!("{process_count} shard groups requested but only {available} cores available");
    }
    if cli.query.is_empty() {
        log::warn!("no query string; this matches every message in every selected mailbox");
    }

    let config = JobConfig {
        query: cli.query.clone(),
        page_size: cli.results,
        process_count,
        thread_count: cli.threads,
        output_path: cli.outfile.clone().unwrap_or_else(default_output_path),
        error_log_path: cli.errfile.clone(),
        tuning: Tuning::default(),
    };
    config.validate()?;

    let remote = Arc::new(HttpRemote::new(
        &base_url,
        &token,
        settings.remote.domain.clone(),
    )?);
    let identities = resolve_identities(cli, &remote)?;
    log::info!(
        "searching {} identities with {} x {} workers",
        identities.len(),
        config.process_count,
        config.thread_count
    );
    log::info!("writing matches to {}", config.output_path.display());

    let summary = run_job(remote, config, identities)?;
    if summary.errors > 0 {
        log::warn!("{} failures logged to the error log", summary.errors);
    }
    Ok(())
}

fn resolve_identities(cli: &Cli, remote: &HttpRemote) -> Result<Vec<Identity>> {
    if let Some(user) = &cli.user {
        return Ok(vec![user.clone()]);
    }
    if let Some(infile) = &cli.infile {
        return identities_from_file(infile);
    }
    if cli.all {
        return enumerate_identities(
            remote,
            PagingConsts::DIRECTORY_PAGE_SIZE,
            PagingConsts::PAGE_DELAY,
        )
        .map_err(|e| anyhow::anyhow!("directory enumeration failed: {e}"));
    }
    bail!("no identities selected; pass --user, --infile, or --all");
}
