use core::time::Duration;
use std::collections::BTreeSet;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use sonyflake::{MAX_MACHINE_ID, SONYFLAKE_EPOCH, random_machine_ids};

/// Command-line arguments for the `sonyflake` binary.
///
/// Every `generate` option can also be supplied through the environment (or a
/// `.env` file in the working directory).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sonyflake",
    version,
    about = "Generate and inspect Sonyflake IDs"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print freshly generated IDs, one per line.
    Generate(GenerateArgs),
    /// Split IDs into their time, sequence and machine ID fields.
    Decompose(DecomposeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of IDs to print.
    ///
    /// Environment variable: `SONYFLAKE_COUNT`
    #[arg(short = 'n', long, env = "SONYFLAKE_COUNT", default_value_t = 1)]
    pub count: usize,

    /// Explicit machine IDs, one generator each. Repeat the flag or pass a
    /// comma separated list.
    ///
    /// Takes precedence over `--generators`.
    ///
    /// Environment variable: `SONYFLAKE_MACHINE_IDS`
    #[arg(
        short,
        long = "machine-id",
        env = "SONYFLAKE_MACHINE_IDS",
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    pub machine_ids: Vec<i64>,

    /// Number of generators with distinct random machine IDs, used when no
    /// machine ID is given.
    ///
    /// Environment variable: `SONYFLAKE_GENERATORS`
    #[arg(short, long, env = "SONYFLAKE_GENERATORS", default_value_t = 1)]
    pub generators: usize,

    /// Epoch in whole seconds since the Unix epoch. Defaults to 2014-09-01.
    ///
    /// Environment variable: `SONYFLAKE_START_TIME`
    #[arg(long, env = "SONYFLAKE_START_TIME")]
    pub start_time: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct DecomposeArgs {
    /// IDs to decompose.
    #[arg(required = true)]
    pub ids: Vec<u64>,

    /// Print one JSON object per line instead of a table.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Validated options for `sonyflake generate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateConfig {
    pub count: usize,
    pub machine_ids: Vec<u16>,
    pub start_time: Duration,
}

impl TryFrom<GenerateArgs> for GenerateConfig {
    type Error = anyhow::Error;

    fn try_from(args: GenerateArgs) -> Result<Self, Self::Error> {
        let pool_limit = usize::from(MAX_MACHINE_ID);

        if args.count == 0 {
            bail!("SONYFLAKE_COUNT must be greater than 0");
        }

        let machine_ids = if args.machine_ids.is_empty() {
            if args.generators == 0 {
                bail!("SONYFLAKE_GENERATORS must be greater than 0");
            }
            if args.generators > pool_limit {
                bail!(
                    "SONYFLAKE_GENERATORS ({}) exceeds the machine ID space (max = {})",
                    args.generators,
                    pool_limit
                );
            }
            random_machine_ids(args.generators).context("failed to draw machine IDs")?
        } else {
            explicit_machine_ids(&args.machine_ids)?
        };

        let start_time = args
            .start_time
            .map_or(SONYFLAKE_EPOCH, Duration::from_secs);

        Ok(Self {
            count: args.count,
            machine_ids,
            start_time,
        })
    }
}

fn explicit_machine_ids(raw: &[i64]) -> anyhow::Result<Vec<u16>> {
    let mut seen = BTreeSet::new();
    let mut machine_ids = Vec::with_capacity(raw.len());
    for &id in raw {
        let Ok(machine_id) = u16::try_from(id) else {
            bail!("machine ID {id} is outside [0x0000, 0xFFFF]");
        };
        if !seen.insert(machine_id) {
            bail!("machine ID {machine_id} was given more than once");
        }
        machine_ids.push(machine_id);
    }
    Ok(machine_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(argv: &[&str]) -> anyhow::Result<GenerateConfig> {
        let args = CliArgs::try_parse_from(
            ["sonyflake", "generate"].iter().chain(argv).copied(),
        )?;
        match args.command {
            Command::Generate(args) => GenerateConfig::try_from(args),
            Command::Decompose(_) => unreachable!(),
        }
    }

    #[test]
    fn defaults_to_one_random_generator() {
        let config = generate(&[]).unwrap();
        assert_eq!(config.count, 1);
        assert_eq!(config.machine_ids.len(), 1);
        assert_eq!(config.start_time, SONYFLAKE_EPOCH);
    }

    #[test]
    fn explicit_machine_ids_keep_their_order() {
        let config = generate(&["-m", "7,3", "--machine-id", "65535"]).unwrap();
        assert_eq!(config.machine_ids, [7, 3, 0xFFFF]);
    }

    #[test]
    fn random_generators_are_distinct() {
        let config = generate(&["--generators", "32"]).unwrap();
        let distinct: BTreeSet<_> = config.machine_ids.iter().collect();
        assert_eq!(distinct.len(), 32);
    }

    #[test]
    fn start_time_is_read_in_seconds() {
        let config = generate(&["--start-time", "1700000000"]).unwrap();
        assert_eq!(config.start_time, Duration::from_secs(1_700_000_000));
    }

    #[test]
    fn rejects_invalid_options() {
        assert!(generate(&["--count", "0"]).is_err());
        assert!(generate(&["--generators", "0"]).is_err());
        assert!(generate(&["--generators", "65536"]).is_err());
        assert!(generate(&["-m", "65536"]).is_err());
        assert!(generate(&["-m", "-1"]).is_err());
        assert!(generate(&["-m", "5,5"]).is_err());
    }

    #[test]
    fn decompose_requires_an_id() {
        assert!(CliArgs::try_parse_from(["sonyflake", "decompose"]).is_err());
        let args = CliArgs::try_parse_from(["sonyflake", "decompose", "1", "--json"]).unwrap();
        match args.command {
            Command::Decompose(args) => {
                assert_eq!(args.ids, [1]);
                assert!(args.json);
            }
            Command::Generate(_) => unreachable!(),
        }
    }
}
