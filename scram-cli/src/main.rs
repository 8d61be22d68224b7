//! `scram-cli`: loads an OPSA-MEF XML model, runs the requested analyses
//! over `scram-core`, and writes a JSON report.
//!
//! Orchestration only — every algorithm lives in `scram-core`; this
//! binary's job is argument parsing, the XML-to-`Model` translation
//! (`xml.rs`), wiring `scram-core`'s passes together in the right order,
//! and turning `ScramError` into a process exit code.

mod project;
mod structs;
mod xml;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;

use scram_core::context::{AnalysisContext, NullProgress, Progress, ProgressSink};
use scram_core::cutset::algebraic::AlgebraicEngine;
use scram_core::cutset::combinatorial::CombinatorialEngine;
use scram_core::cutset::CutSetMode;
use scram_core::error::{ScramError, ScramResult};
use scram_core::expr::EvalContext;
use scram_core::model::ids::GateId;
use scram_core::model::validate::ValidationOptions;
use scram_core::model::{Lifecycle, Model};
use scram_core::montecarlo::{self, UncertaintyOptions};
use scram_core::quantify::{self, Approximation};
use scram_core::report::{self, Information, Report, Results};
use scram_core::sop::Expr;
use scram_core::{ccf_expand, modularize, persist};

use project::ProjectConfig;
use structs::{Arguments, Method};

/// Fully resolved settings: CLI flags win over a loaded `ProjectConfig`
/// field-by-field, with the core's own defaults applied last.
struct Settings {
    method: Method,
    probability: bool,
    importance: bool,
    uncertainty: bool,
    ccf: bool,
    sil: bool,
    prime_implicants: bool,
    limit_order: usize,
    cut_off: Option<f64>,
    mission_time: Option<f64>,
    time_step: Option<f64>,
    num_trials: u64,
    num_quantiles: Option<usize>,
    num_bins: usize,
    seed: u64,
    approximation: Option<Approximation>,
    mcs_file: Option<PathBuf>,
    output: Option<PathBuf>,
    display: bool,
}

impl Settings {
    fn merge(args: &Arguments, project: &ProjectConfig) -> ScramResult<Settings> {
        if args.bdd || args.zbdd {
            return Err(ScramError::settings("--bdd/--zbdd select engines this core does not implement; use --mocus"));
        }
        let method = args.algorithm.unwrap_or_else(|| match project.algorithm.as_deref() {
            Some("combinatorial") => Method::Combinatorial,
            _ => Method::Algebraic,
        });
        let approximation = if args.rare_event {
            Some(Approximation::RareEvent)
        } else if args.mcub {
            Some(Approximation::Mcub)
        } else {
            match project.approximation.as_deref() {
                Some("rare-event") => Some(Approximation::RareEvent),
                Some("mcub") => Some(Approximation::Mcub),
                _ => None,
            }
        };
        let prime_implicants = args.prime_implicants || project.prime_implicants.unwrap_or(false);
        if prime_implicants && matches!(approximation, Some(Approximation::Mcub)) {
            return Err(ScramError::settings("--prime-implicants is incompatible with --mcub, which assumes a coherent model"));
        }

        Ok(Settings {
            method,
            probability: args.probability || project.probability.unwrap_or(false),
            importance: args.importance || project.importance.unwrap_or(false),
            uncertainty: args.uncertainty || project.uncertainty.unwrap_or(false),
            ccf: args.ccf || project.ccf.unwrap_or(false),
            sil: args.sil || project.sil.unwrap_or(false),
            prime_implicants,
            limit_order: args.limit_order.or(project.limit_order).unwrap_or(0),
            cut_off: args.cut_off.or(project.cut_off),
            mission_time: args.mission_time.or(project.mission_time),
            time_step: args.time_step.or(project.time_step),
            num_trials: args.num_trials.or(project.num_trials).unwrap_or(10_000),
            num_quantiles: args.num_quantiles.or(project.num_quantiles),
            num_bins: args.num_bins.or(project.num_bins).unwrap_or(10),
            seed: args.seed.or(project.seed).unwrap_or(0),
            approximation,
            mcs_file: args.mcs_file.clone(),
            output: args.output.clone(),
            display: args.display,
        })
    }
}

fn main() {
    let args = Arguments::parse();

    let filter = match args.verbosity {
        0 => std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        1 => "info".into(),
        _ => "debug".into(),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match run(args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("scram-cli: {err:#}");
            let code = err.downcast_ref::<ScramError>().map(ScramError::exit_code).unwrap_or(1);
            std::process::exit(code);
        }
    }
}

fn run(args: Arguments) -> anyhow::Result<()> {
    let project = match &args.project {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };
    let settings = Settings::merge(&args, &project)?;

    let inputs: Vec<PathBuf> = if !args.inputs.is_empty() { args.inputs.clone() } else { project.input_files.clone() };
    if inputs.is_empty() {
        return Err(ScramError::settings("no input model given: pass a file, or --project with input_files").into());
    }

    let results: Vec<anyhow::Result<()>> = inputs
        .par_iter()
        .map(|input| analyse_one(input, &settings, args.prime_implicants || settings.prime_implicants))
        .collect();
    for result in results {
        result?;
    }
    Ok(())
}

fn analyse_one(input: &Path, settings: &Settings, prime_implicants: bool) -> anyhow::Result<()> {
    let model_name = input.file_stem().and_then(|s| s.to_str()).unwrap_or("model").to_string();
    info!(model = %model_name, "loading model");
    let bytes = fs::read(input)?;
    let mut model = xml::parse_model(&bytes, &model_name)?;
    model.advance_lifecycle(Lifecycle::Parsed);

    if let Some(t) = settings.mission_time {
        model.mission_time = t;
    }
    model.set_top_gate(find_top_gate(&model)?);

    model.validate(ValidationOptions { require_probabilities: settings.probability || settings.importance || settings.uncertainty || settings.sil })?;

    let eval_ctx = build_eval_context(&model, model.mission_time)?;

    if settings.ccf {
        info!(model = %model_name, "expanding CCF groups");
        ccf_expand::expand(&mut model, &eval_ctx)?;
    }
    model.advance_lifecycle(Lifecycle::Preprocessed);

    let modules = modularize::find_modules(&model).unwrap_or_default();
    info!(model = %model_name, modules = modules.len(), "modularisation complete (informational only)");
    model.advance_lifecycle(Lifecycle::Analysable);

    let mode = if prime_implicants { CutSetMode::PrimeImplicants } else { CutSetMode::MinimalCutSets };
    let progress = progress_bar(settings.display, &model_name);
    let mut ctx = AnalysisContext::new(settings.seed, model.mission_time).with_progress(progress_sink(progress.clone()));

    let sop = match settings.method {
        Method::Algebraic => AlgebraicEngine::new(&model, mode, settings.limit_order).compute(&mut ctx)?,
        Method::Combinatorial => CombinatorialEngine::new(&model, mode, settings.limit_order).compute(&mut ctx)?,
    };
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }
    info!(model = %model_name, count = sop.count(), "cut-set generation complete");

    let mut results = Results::default();
    results.sum_of_products = Some(render_products(&model, &sop, mode, settings.cut_off, &eval_ctx)?);

    let mut probability_value = None;
    if settings.probability || settings.importance || settings.sil {
        let probs = quantify::build_probability_vector(&model, &eval_ctx)?;
        let approximation = settings.approximation.unwrap_or(Approximation::Exact);
        let non_coherent = scram_core::cutset::sop_is_non_coherent(&sop);
        let result = quantify::top_probability(&sop, &probs, approximation, settings.limit_order, 0, non_coherent);
        probability_value = Some(result.value);
        if settings.probability {
            results.probability = Some(report::render_probability(&result));
        }
        if settings.importance {
            let importance = quantify::importance_measures(&sop, &probs, result.value, settings.limit_order);
            results.importance = Some(report::render_importance(&model, &importance));
        }
    }

    if settings.sil || settings.time_step.is_some() {
        let times = time_series(model.mission_time, settings.time_step, settings.num_quantiles.or(Some(settings.num_bins)));
        let approximation = settings.approximation.unwrap_or(Approximation::Exact);
        let non_coherent = scram_core::cutset::sop_is_non_coherent(&sop);
        let curve = quantify::time_curve(&times, |t| {
            let ctx_t = EvalContext { parameters: eval_ctx.parameters.clone(), time: t };
            let probs = quantify::build_probability_vector(&model, &ctx_t)?;
            Ok(quantify::top_probability(&sop, &probs, approximation, settings.limit_order, 0, non_coherent).value)
        })?;
        if settings.time_step.is_some() {
            results.curve = Some(report::render_curve(&curve));
        }
        if settings.sil {
            let values: Vec<f64> = curve.iter().map(|&(_, p)| p).collect();
            let fractions = quantify::sil_time_fractions(&values);
            results.safety_integrity_levels = Some(report::render_sil(&fractions));
        }
    }

    if settings.uncertainty {
        let options = UncertaintyOptions { num_trials: settings.num_trials, compress_modes: true };
        let uncertainty = montecarlo::propagate(&model, &eval_ctx, &mut ctx, &options)?;
        results.uncertainty = Some(report::render_uncertainty(&model, &uncertainty));
    }

    if let Some(path) = &settings.mcs_file {
        let mut file = fs::File::create(path)?;
        persist::write(&sop, &mut file)?;
    }

    let generated_at = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| format!("{}s", d.as_secs())).unwrap_or_default();
    let report = Report {
        information: Information {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at,
            model_name: model.name.clone(),
            settings: serde_json::json!({
                "mission_time": model.mission_time,
                "limit_order": settings.limit_order,
                "prime_implicants": prime_implicants,
                "approximation": settings.approximation.map(|a| format!("{a:?}")),
                "probability": probability_value,
            }),
        },
        results,
    };

    let out_path = settings.output.clone().unwrap_or_else(|| input.with_extension("report.json"));
    fs::write(&out_path, serde_json::to_string_pretty(&report)?)?;
    info!(model = %model_name, report = %out_path.display(), "report written");
    Ok(())
}

/// The gate never referenced as a child of another gate (or by a
/// transfer-in) is the model's top gate; real OPSA-MEF input has exactly
/// one such gate per fault tree.
fn find_top_gate(model: &Model) -> ScramResult<GateId> {
    use scram_core::model::formula::{Arg, Connective};
    use std::collections::HashSet;

    let mut referenced: HashSet<GateId> = HashSet::new();
    fn walk(formula: &scram_core::model::formula::Formula, referenced: &mut HashSet<GateId>) {
        if let Connective::TransferIn(target) = formula.connective {
            referenced.insert(target);
        }
        for lit in &formula.args {
            match &lit.arg {
                Arg::Event(scram_core::model::ids::EventRef::Gate(g)) => {
                    referenced.insert(*g);
                }
                Arg::Nested(f) => walk(f, referenced),
                _ => {}
            }
        }
    }
    for gate in model.gates.iter() {
        walk(&gate.formula, &mut referenced);
    }

    let roots: Vec<GateId> = model.gates.iter_enumerated().filter(|(id, _)| !referenced.contains(id)).map(|(id, _)| *id).collect();
    match roots.len() {
        0 => Err(ScramError::validity("no top gate found: every gate is referenced as a child of another gate", scram_core::Locus::default())),
        1 => Ok(roots[0]),
        _ => {
            let names: Vec<String> = roots.iter().map(|&id| model.gates[id].id.clone()).collect();
            Err(ScramError::validity(format!("ambiguous top gate: multiple un-referenced gates {names:?}"), scram_core::Locus::default()))
        }
    }
}

/// Resolve every parameter's value once, in dependency order. Validation
/// has already rejected parameter cycles, so a fixed-point pass over the
/// (small) parameter list always converges.
fn build_eval_context(model: &Model, time: f64) -> ScramResult<EvalContext> {
    let mut ctx = EvalContext::new(time);
    let mut remaining: Vec<usize> = (0..model.parameters.len()).collect();
    while !remaining.is_empty() {
        let before = remaining.len();
        remaining.retain(|&idx| {
            let param = &model.parameters[scram_core::model::ids::ParameterId::new(idx as u32)];
            match param.expression.mean(&ctx) {
                Ok(value) => {
                    ctx.parameters.insert(param.id.clone(), value);
                    false
                }
                Err(_) => true,
            }
        });
        if remaining.len() == before {
            return Err(ScramError::logic("parameter evaluation did not converge; check for an undetected cycle"));
        }
    }
    Ok(ctx)
}

fn render_products(model: &Model, sop: &Expr, mode: CutSetMode, cut_off: Option<f64>, eval_ctx: &EvalContext) -> ScramResult<report::SumOfProductsReport> {
    let rendered = report::render_sum_of_products(model, sop, mode);
    let Some(threshold) = cut_off else { return Ok(rendered) };
    let probs = quantify::build_probability_vector(model, eval_ctx)?;
    let kept: Vec<Vec<String>> = sop
        .groups()
        .iter()
        .zip(rendered.products.iter())
        .filter(|(g, _)| g.bits().iter_ones().map(|b| probs[b]).product::<f64>() >= threshold)
        .map(|(_, names)| names.clone())
        .collect();
    Ok(report::SumOfProductsReport { count: kept.len(), products: kept, ..rendered })
}

/// Equally spaced time points from 0 to `mission_time`: `step` wins when
/// given, otherwise `points` equally spaced samples (see
/// `--time-step`/`--num-quantiles`/`--num-bins`).
fn time_series(mission_time: f64, step: Option<f64>, points: Option<usize>) -> Vec<f64> {
    if let Some(step) = step {
        if step <= 0.0 {
            return vec![mission_time];
        }
        let mut t = 0.0;
        let mut out = Vec::new();
        while t <= mission_time {
            out.push(t);
            t += step;
        }
        out
    } else {
        let n = points.unwrap_or(10).max(1);
        (0..n).map(|i| mission_time * i as f64 / (n - 1).max(1) as f64).collect()
    }
}

fn progress_bar(display: bool, model_name: &str) -> Option<ProgressBar> {
    if !display {
        return None;
    }
    let bar = ProgressBar::new(100);
    bar.set_style(ProgressStyle::with_template("{prefix} [{bar:40}] {pos}/{len}").unwrap().progress_chars("=> "));
    bar.set_prefix(model_name.to_string());
    Some(bar)
}

fn progress_sink(bar: Option<ProgressBar>) -> Box<dyn scram_core::context::ProgressSink> {
    match bar {
        Some(bar) => Box::new(move |progress: Progress| {
            if progress.total > 0 {
                bar.set_length(progress.total);
                bar.set_position(progress.done);
            }
        }),
        None => Box::new(scram_core::context::NullProgress),
    }
}
