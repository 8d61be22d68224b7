//! CLI driver for the random fault-tree generator: builds a synthetic
//! `Model` of a requested scale, writes it out as OPSA-MEF XML, and
//! optionally runs it through `scram-core`'s own combinatorial cut-set
//! engine as a quick stress-test/soak benchmark, with no external solver
//! dependency to shell out to.

use std::fs;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scram_core::context::AnalysisContext;
use scram_core::cutset::combinatorial::CombinatorialEngine;
use scram_core::cutset::CutSetMode;
use scram_core::expr::EvalContext;
use scram_core::model::validate::ValidationOptions;
use scram_core::quantify::{build_probability_vector, top_probability, Approximation};

use scram_rft::generator::{generate, RftConfig};
use scram_rft::xml_out::to_opsa_mef_xml;

#[derive(Parser, Debug)]
#[command(
    author = "Nazareno Garagiola",
    version,
    about = "Generates a random fault tree of a requested scale for stress-testing the scram-core cut-set engines."
)]
struct Args {
    /// Total number of nodes (basic events + gates, excluding the root).
    #[arg(short, long)]
    n_nodes: usize,
    /// Output file (written as OPSA-MEF XML); ".xml" is appended.
    #[arg(short, long)]
    output: String,
    /// Proportion of nodes that are basic events, in (0,1).
    #[arg(long, default_value_t = 0.5)]
    rate_be: f64,
    /// Proportion of gates that are AND, in (0,1].
    #[arg(long, default_value_t = 0.5)]
    rate_and: f64,
    /// Proportion of gates that are OR, in (0,1].
    #[arg(long, default_value_t = 0.5)]
    rate_or: f64,
    /// Proportion of gates that are at-least(k), in [0,1). rate_and + rate_or + rate_vot must sum to 1.
    #[arg(long, default_value_t = 0.0)]
    rate_vot: f64,
    /// Multiplies each basic event's raw [0,1) probability draw, so the generated tree stays rare-event-scaled.
    #[arg(long, default_value_t = 1e-4)]
    prob_multiplier: f64,
    /// Fraction (from the end) of the gate chain eligible to pick up basic events no earlier gate referenced.
    #[arg(long, default_value_t = 0.6)]
    perc_last: f64,
    /// Max number of children a single gate's formula may take.
    #[arg(long, default_value_t = 5)]
    max_n_children: usize,
    /// PRNG seed; a random one is drawn if omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// After generating, run the combinatorial cut-set engine up to this order and report timing and MCS count.
    #[arg(long)]
    bench_order: Option<usize>,
    /// Increase log verbosity (-v, -vv); also honours RUST_LOG.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let seed = args.seed.unwrap_or_else(|| rand::random::<u64>());
    let config = RftConfig::new(args.rate_be, args.rate_and, args.rate_or, args.rate_vot);

    tracing::info!(n_nodes = args.n_nodes, seed, "generating random fault tree");
    let start = Instant::now();
    let mut model = generate(args.n_nodes, config, args.prob_multiplier, args.perc_last, seed, args.max_n_children);
    let generated_in = start.elapsed();

    if let Err(e) = model.validate(ValidationOptions { require_probabilities: true }) {
        eprintln!("generated model failed validation: {e}");
        std::process::exit(2);
    }

    let output_filename = format!("{}.xml", args.output);
    let xml = to_opsa_mef_xml(&model);
    if let Err(e) = fs::write(&output_filename, xml) {
        eprintln!("failed to write {output_filename}: {e}");
        std::process::exit(1);
    }

    println!(
        "generated {} basic events, {} gates (+ root). seed={seed}. generated in {generated_in:?}. wrote {output_filename}",
        model.basic_events.len(),
        model.gates.len()
    );

    if let Some(max_order) = args.bench_order {
        let bench_start = Instant::now();
        let engine = CombinatorialEngine::new(&model, CutSetMode::MinimalCutSets, max_order);
        let mut ctx = AnalysisContext::new(seed, model.mission_time);
        match engine.compute(&mut ctx) {
            Ok(sop) => {
                let elapsed = bench_start.elapsed();
                let eval_ctx = EvalContext::new(model.mission_time);
                match build_probability_vector(&model, &eval_ctx) {
                    Ok(probs) => {
                        let result = top_probability(&sop, &probs, Approximation::Exact, max_order, 0, false);
                        println!(
                            "order<= {max_order}: {} cut sets in {elapsed:?}; P(top) ~= {:.6e}",
                            sop.count(),
                            result.value
                        );
                    }
                    Err(e) => eprintln!("probability vector build failed: {e}"),
                }
            }
            Err(e) => {
                eprintln!("cut-set computation failed: {e}");
                std::process::exit(2);
            }
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
