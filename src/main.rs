// numasim: how far is your memory? A small NUMA placement simulator.
// Models a handful of nodes, places blocks under a policy and lets workers measure what it costs them.

// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use numasim::prelude::*;
use numasim::metrics::analyzer::{self, ExperimentResult};
use numasim::simulation::config::PRESETS;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct RunArgs {
    /// Number of NUMA nodes (1-8)
    #[arg(default_value_t = 4)]
    nodes: usize,
    /// Number of concurrent workers
    #[arg(default_value_t = 4)]
    workers: usize,
    /// Blocks allocated per worker
    #[arg(default_value_t = 20)]
    blocks: usize,
    /// 0 = random, 1 = first-touch, 2 = interleaved (names work too)
    #[arg(default_value = "0", value_parser = parse_policy)]
    policy: PolicyKind,
    /// 0 = unpinned, anything else pinned
    #[arg(default_value_t = 1)]
    pinning: u8,

    #[arg(long, conflicts_with_all = ["nodes", "workers", "blocks", "policy", "pinning"])]
    preset: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "results.csv")]
    log: PathBuf,
    #[arg(long, conflicts_with = "strict_log")]
    no_log: bool,
    /// Abort if the result log cannot be opened instead of warning
    #[arg(long)]
    strict_log: bool,
    /// Skip the per-worker console blocks
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the latency matrix for a topology
    Matrix {
        #[arg(default_value_t = 4)]
        nodes: usize,
    },

    /// Run the benchmark experiment matrix
    Bench {
        #[arg(short, long, default_value = "data")]
        output: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },

    List,
}

fn parse_policy(s: &str) -> std::result::Result<PolicyKind, String> {
    s.parse::<PolicyKind>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        None => run_single_simulation(cli.run)?,

        Some(Commands::Matrix { nodes }) => {
            let topology = Topology::build(nodes)?;
            println!("\n{}", topology);
        }

        Some(Commands::Bench { output, seed }) => run_benchmarks(&output, seed)?,

        Some(Commands::List) => {
            println!("\nAvailable Allocation Policies");
            for kind in PolicyKind::ALL {
                println!("  {} - {}", kind.code(), kind);
            }
            println!("  aliases: {}", PolicyRegistry::global().list().join(", "));

            println!("\nPresets");
            for name in PRESETS {
                let preset = SimConfig::preset(name)?;
                println!(
                    "  - {:<7} {} nodes, {} workers, {} blocks, {}, {:?}",
                    name, preset.node_count, preset.worker_count, preset.block_count,
                    preset.policy, preset.pinning
                );
            }

            println!("\nUsage: numasim [nodes] [workers] [blocks] [policy] [pinning]");
            println!("Example: numasim 4 8 50 2 0\n");
        }
    }

    info!("Total runtime: {:.3}s", program_start.elapsed().as_secs_f64());

    Ok(())
}

fn run_single_simulation(args: RunArgs) -> Result<()> {
    let mut config = match &args.preset {
        Some(name) => SimConfig::preset(name)?,
        None => SimConfig::default()
            .with_shape(args.nodes, args.workers, args.blocks)
            .with_policy(args.policy)
            .with_pinning(Pinning::from_flag(args.pinning)),
    };

    config = config.with_console(!args.quiet).with_log_path(&args.log);
    if args.no_log {
        config = config.without_log();
    }
    if args.strict_log {
        config = config.with_log_policy(LogPolicy::Strict);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    info!("NumaSim: Parallel Run");
    if !args.quiet {
        println!("\n=== PARALLEL NUMA SIMULATION ===");
    }

    let report = Simulation::new(config).run()?;

    if let Some(path) = &report.config.log_path {
        if report.emitted > 0 && path.exists() {
            info!("Results saved to: {}", path.display());
        }
    }

    Ok(())
}

fn run_benchmarks(output: &Path, seed: Option<u64>) -> Result<()> {
    let experiments = [
        ("baseline_4n_ft", SimConfig::default().with_shape(4, 4, 20).with_policy(PolicyKind::FirstTouch).with_pinning(Pinning::Pinned)),
        ("baseline_4n_int", SimConfig::default().with_shape(4, 4, 20).with_policy(PolicyKind::Interleaved).with_pinning(Pinning::Pinned)),
        ("stress_8n_rand", SimConfig::default().with_shape(8, 16, 50).with_policy(PolicyKind::Random).with_pinning(Pinning::Unpinned)),
    ];

    std::fs::create_dir_all(output)?;

    info!("NumaSim: Benchmarks");
    info!("Experiments: {}", experiments.len());
    info!("Output: {}", output.display());

    let pb = ProgressBar::new(experiments.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("█▓░")
    );

    let mut results = Vec::new();

    for (name, base) in experiments {
        pb.set_message(name);

        let mut config = base
            .with_name(name)
            .with_console(false)
            .with_log_path(output.join(format!("{}.csv", name)));
        if let Some(seed) = seed {
            config = config.with_seed(seed);
        }

        let start = Instant::now();
        let report = Simulation::new(config.clone()).run()?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        analyzer::export_json(&report.workers, output.join(format!("{}.json", name)))?;

        pb.println(format!(
            "  -> {}: LAR={:.4}, Latency={:.2}ns",
            name, report.summary.local_access_ratio, report.summary.avg_latency_ns
        ));

        results.push(ExperimentResult {
            experiment: name.to_string(),
            config,
            summary: report.summary,
            duration_ms,
            timestamp: chrono::Local::now(),
        });
        pb.inc(1);
    }

    pb.finish_with_message("Benchmarks complete");

    comparison_table(&results);

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let summary_path = output.join(format!("benchmark_summary_{}.json", timestamp));
    analyzer::export_json(&results, &summary_path)?;
    info!("Summary saved to: {}", summary_path.display());

    Ok(())
}

fn comparison_table(results: &[ExperimentResult]) {
    println!("\n╔══════════════════════════════════════════════════════════════════╗");
    println!("║                       BENCHMARK COMPARISON                       ║");
    println!("╠═════════════════╦═════════════╦══════════╦═══════════╦═══════════╣");
    println!("║ Experiment      ║ Policy      ║ Local    ║ Latency   ║ Time/wkr  ║");
    println!("║                 ║             ║ (%)      ║ (ns)      ║ (ns)      ║");
    println!("╠═════════════════╬═════════════╬══════════╬═══════════╬═══════════╣");

    for result in results {
        println!(
            "║ {:<15} ║ {:<11} ║ {:>7.2}% ║ {:>9.2} ║ {:>9.1} ║",
            result.experiment,
            result.config.policy.name(),
            result.summary.local_access_ratio * 100.0,
            result.summary.avg_latency_ns,
            result.summary.avg_time_per_worker,
        );
    }

    println!("╚═════════════════╩═════════════╩══════════╩═══════════╩═══════════╝\n");

    if let Some(best) = results
        .iter()
        .min_by(|a, b| a.summary.avg_latency_ns.total_cmp(&b.summary.avg_latency_ns))
    {
        println!("Lowest Latency: {} ({:.2} ns)", best.experiment, best.summary.avg_latency_ns);
    }

    if let Some(best) = results
        .iter()
        .max_by(|a, b| a.summary.local_access_ratio.total_cmp(&b.summary.local_access_ratio))
    {
        println!("Best Locality: {} ({:.2}%)", best.experiment, best.summary.local_access_ratio * 100.0);
    }

    println!();
}
