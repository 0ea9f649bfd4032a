use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use uniqueid::Tag;

/// Command-line interface for the `uniqueid` binary.
///
/// Every `generate` option can also be set through the environment (or a
/// `.env` file in the working directory).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "uniqueid",
    version,
    about = "Issue and inspect 64-bit IDs tagged with a server and machine number"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Issue IDs from concurrent workers sharing one generator and print them.
    Generate(GenerateArgs),
    /// Decode raw IDs into their tick, server, machine and sequence fields.
    Inspect {
        /// Raw IDs in decimal.
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Server tag embedded in every ID, between 0 and 31.
    ///
    /// Environment variable: `UNIQUEID_SERVER`
    #[arg(long, env = "UNIQUEID_SERVER", default_value_t = 1)]
    pub server: u32,

    /// Machine tag embedded in every ID, between 0 and 31.
    ///
    /// Environment variable: `UNIQUEID_MACHINE`
    #[arg(long, env = "UNIQUEID_MACHINE", default_value_t = 1)]
    pub machine: u32,

    /// Total number of IDs to issue across all workers.
    ///
    /// Environment variable: `UNIQUEID_COUNT`
    #[arg(long, env = "UNIQUEID_COUNT", default_value_t = 8190)]
    pub count: usize,

    /// Number of worker threads sharing the generator.
    ///
    /// Environment variable: `UNIQUEID_WORKERS`
    #[arg(long, env = "UNIQUEID_WORKERS", default_value_t = 10)]
    pub workers: usize,

    /// Time source used by the generator.
    ///
    /// Environment variable: `UNIQUEID_CLOCK`
    #[arg(long, env = "UNIQUEID_CLOCK", value_enum, default_value_t = ClockKind::System)]
    pub clock: ClockKind,

    /// Only log the summary; do not print each ID.
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Wall clock, read on every call.
    System,
    /// Ticker thread anchored to the wall clock at startup; never regresses.
    Monotonic,
}

/// Validated settings for a `generate` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateConfig {
    pub server: u32,
    pub machine: u32,
    pub count: usize,
    pub workers: usize,
    pub clock: ClockKind,
    pub quiet: bool,
}

impl GenerateConfig {
    /// Number of IDs each worker requests.
    ///
    /// The remainder of `count / workers` goes to the first workers, so the
    /// shares always add up to exactly `count`.
    pub fn worker_shares(&self) -> Vec<usize> {
        let base = self.count / self.workers;
        let extra = self.count % self.workers;
        (0..self.workers)
            .map(|worker| base + usize::from(worker < extra))
            .collect()
    }
}

impl TryFrom<GenerateArgs> for GenerateConfig {
    type Error = anyhow::Error;

    fn try_from(args: GenerateArgs) -> Result<Self, Self::Error> {
        Tag::Server
            .validate(args.server)
            .context("invalid server tag (--server / UNIQUEID_SERVER)")?;
        Tag::Machine
            .validate(args.machine)
            .context("invalid machine tag (--machine / UNIQUEID_MACHINE)")?;

        if args.count == 0 {
            bail!("UNIQUEID_COUNT must be greater than 0");
        }

        if args.workers == 0 {
            bail!("UNIQUEID_WORKERS must be greater than 0");
        }

        if args.workers > args.count {
            bail!(
                "UNIQUEID_WORKERS ({}) exceeds UNIQUEID_COUNT ({})",
                args.workers,
                args.count
            );
        }

        Ok(Self {
            server: args.server,
            machine: args.machine,
            count: args.count,
            workers: args.workers,
            clock: args.clock,
            quiet: args.quiet,
        })
    }
}
