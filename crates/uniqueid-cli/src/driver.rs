use std::{
    collections::HashSet,
    io::{self, BufWriter, Write},
    thread::scope,
    time::Instant,
};

use anyhow::{Context, bail};
use crossbeam_channel::unbounded;
use tracing::{debug, info, warn};
use uniqueid::{MonotonicClock, SystemClock, TimeSource, UniqueId, UniqueIdGenerator};

use crate::config::{ClockKind, GenerateConfig};

/// Outcome of a `generate` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub issued: usize,
    pub distinct: usize,
}

/// Builds a generator for the configured clock and runs the workers.
pub fn generate(config: &GenerateConfig, out: impl Write) -> anyhow::Result<Report> {
    match config.clock {
        ClockKind::System => {
            let generator = UniqueIdGenerator::new(config.server, config.machine, SystemClock)
                .context("failed to create id generator")?;
            run_workers(&generator, config, out)
        }
        ClockKind::Monotonic => {
            let clock = MonotonicClock::try_new().context("failed to start monotonic clock")?;
            let generator = UniqueIdGenerator::new(config.server, config.machine, clock)
                .context("failed to create id generator")?;
            run_workers(&generator, config, out)
        }
    }
}

/// Issues `config.count` IDs from `config.workers` threads sharing
/// `generator`, writing each rendering to `out` as it arrives.
///
/// Fails if any ID is seen twice.
pub fn run_workers<T>(
    generator: &UniqueIdGenerator<T>,
    config: &GenerateConfig,
    out: impl Write,
) -> anyhow::Result<Report>
where
    T: TimeSource + Sync,
{
    let shares = config.worker_shares();
    let (tx, rx) = unbounded::<UniqueId>();
    let mut out = BufWriter::new(out);
    let mut seen = HashSet::with_capacity(config.count);
    let mut issued = 0;
    let start = Instant::now();

    info!(
        server = config.server,
        machine = config.machine,
        count = config.count,
        workers = config.workers,
        clock = ?config.clock,
        "issuing ids"
    );

    scope(|s| -> anyhow::Result<()> {
        for (worker, share) in shares.into_iter().enumerate() {
            let tx = tx.clone();
            s.spawn(move || {
                for _ in 0..share {
                    if tx.send(generator.next_id()).is_err() {
                        break;
                    }
                }
                debug!(worker, share, "worker finished");
            });
        }
        // Close our end so the receive loop ends with the last worker.
        drop(tx);

        for id in rx {
            issued += 1;
            if !seen.insert(id) {
                warn!(id = %id, "duplicate id");
            }
            if !config.quiet {
                writeln!(out, "{id}")?;
            }
        }
        Ok(())
    })?;
    out.flush()?;

    let report = Report {
        issued,
        distinct: seen.len(),
    };
    info!(
        issued = report.issued,
        distinct = report.distinct,
        elapsed = ?start.elapsed(),
        "done"
    );

    if report.distinct != report.issued {
        bail!(
            "{} duplicate ids out of {}",
            report.issued - report.distinct,
            report.issued
        );
    }
    Ok(report)
}

/// Writes the decoded fields of each raw ID.
pub fn inspect(ids: &[u64], mut out: impl Write) -> io::Result<()> {
    for &raw in ids {
        let id = UniqueId::from_raw(raw);
        writeln!(
            out,
            "{id}\n  timestamp: {}\n  server:    {}\n  machine:   {}\n  sequence:  {}",
            id.timestamp(),
            id.server(),
            id.machine(),
            id.sequence()
        )?;
    }
    Ok(())
}
