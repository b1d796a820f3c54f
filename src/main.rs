// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::fs;
use std::process::ExitCode;

use the_layercake::config::{load_and_validate_config, RuntimeBuilder};
use the_layercake::pipeline::{BartData, ProfileInput, ProfileReport};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: the-layercake [--json] [--bart <rounds.json>] <config.yaml> <message> [message ...]

Options:
  --json          print the full report as JSON
  --bart <file>   balloon task results, e.g. {\"rounds\": [{\"pumps\": 12, \"exploded\": false}]}

Example: the-layercake configs/offline-demo.yaml \"I keep planning trips I never take.\"";

struct Args {
    json: bool,
    bart: Option<String>,
    config: String,
    messages: Vec<String>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut json = false;
    let mut bart = None;
    let mut positional = Vec::new();

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--bart" => bart = Some(raw.next().ok_or("--bart needs a file path")?),
            "-h" | "--help" => return Err(String::new()),
            _ => positional.push(arg),
        }
    }

    if positional.len() < 2 {
        return Err("expected a config file and at least one message".into());
    }
    let config = positional.remove(0);
    Ok(Args {
        json,
        bart,
        config,
        messages: positional,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(reason) => {
            if !reason.is_empty() {
                eprintln!("❌ {reason}\n");
            }
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_and_validate_config(&args.config)?;
    let pipeline = RuntimeBuilder::from_config(&config)?;

    let mut input = ProfileInput::new(args.messages);
    if let Some(path) = &args.bart {
        let bart: BartData = serde_json::from_str(&fs::read_to_string(path)?)?;
        input = input.with_bart(bart);
    }

    let report = pipeline.run(input).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &ProfileReport) {
    let summary = &report.profile["summary"];
    let primary = &report.profile["personality"]["primary"];

    println!("🎂 Layered profile {}", report.session_id);
    println!("═══════════════════════════════════════════");
    println!(
        "Lens: {} ({})",
        report.cultural_context,
        report.cultural_context.framework()
    );
    println!("Headline: {}", summary["headline"].as_str().unwrap_or("-"));
    println!(
        "Dominant trait: {}   Archetype: {}",
        primary["dominantTrait"].as_str().unwrap_or("-"),
        primary["archetype"].as_str().unwrap_or("-")
    );
    if let Some(strengths) = report.profile["strengths"].as_array() {
        println!("Strengths: {}", join(strengths));
    }
    if let Some(growth) = report.profile["growthAreas"].as_array() {
        println!("Growth areas: {}", join(growth));
    }
    if let Some(films) = report.recommendations["films"].as_array() {
        let titles: Vec<_> = films.iter().map(|f| f["title"].clone()).collect();
        println!("Films: {}", join(&titles));
    }
    println!();
    println!(
        "⏱️  {} of {} analyses in {} ms",
        report.metrics.completed_tasks,
        report.metrics.total_tasks,
        report.duration.as_millis()
    );
    if !report.degraded_analyses.is_empty() {
        println!("⚠️  Placeholder data: {}", report.degraded_analyses.join(", "));
    }
    if !report.missing_analyses.is_empty() {
        println!("❌ Missing: {}", report.missing_analyses.join(", "));
    }
}

fn join(values: &[serde_json::Value]) -> String {
    let items: Vec<&str> = values.iter().filter_map(|v| v.as_str()).collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
