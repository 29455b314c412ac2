#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::io::{BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, Command, DecomposeArgs, GenerateConfig};
use sonyflake::{IdGenerator, RoundRobin, SonyFlake, decompose};
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    init_telemetry()?;

    match args.command {
        Command::Generate(args) => generate(&GenerateConfig::try_from(args)?),
        Command::Decompose(args) => decompose_ids(&args),
    }
}

fn generate(config: &GenerateConfig) -> anyhow::Result<()> {
    let generator = build_generator(config)?;
    tracing::info!(
        count = config.count,
        generators = config.machine_ids.len(),
        start_time_secs = config.start_time.as_secs(),
        "generating ids"
    );

    let mut out = BufWriter::new(std::io::stdout().lock());
    for id in generator.ids().take(config.count) {
        writeln!(out, "{}", id.context("id generation failed")?)?;
    }
    out.flush()?;
    Ok(())
}

/// One generator per machine ID, rotated when there is more than one.
fn build_generator(config: &GenerateConfig) -> anyhow::Result<Box<dyn IdGenerator>> {
    let generators = config
        .machine_ids
        .iter()
        .map(|&machine_id| {
            SonyFlake::builder()
                .start_time(config.start_time)
                .machine_id(i64::from(machine_id))
                .build()
                .with_context(|| format!("failed to create generator for machine ID {machine_id}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    match <[_; 1]>::try_from(generators) {
        Ok([generator]) => Ok(Box::new(generator)),
        Err(generators) => Ok(Box::new(RoundRobin::new(generators)?)),
    }
}

fn decompose_ids(args: &DecomposeArgs) -> anyhow::Result<()> {
    let mut out = BufWriter::new(std::io::stdout().lock());
    for &id in &args.ids {
        let parts = decompose(id);
        if args.json {
            serde_json::to_writer(&mut out, &parts)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{parts}")?;
        }
    }
    out.flush()?;
    Ok(())
}
