//! Trellis - hidden Markov model inference CLI
//!
//! The main entry point for trellis, handling:
//! - Forward-backward smoothing and Viterbi decoding of observation files
//! - Seeded trajectory generation from a model
//! - Naive-Bayes classification of document directories
//! - Mutual information of a joint distribution
//! - Model validation

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use trellis_core::classify::{evaluate, train_from_dirs, Category};
use trellis_core::config::{load_model, load_observations, ConfigError, ResolvedModel};
use trellis_core::exit_codes::ExitCode;
use trellis_core::inference::{ForwardBackward, Viterbi};
use trellis_core::log_event;
use trellis_core::logging::{
    event_names, generate_run_id, init_logging, level_from_flags, LogConfig, LogContext,
    LogFormat, Stage,
};
use trellis_core::model::TabularModel;
use trellis_core::output::{emit, envelope, json_f64, OutputFormat, SCHEMA_VERSION};
use trellis_core::sampling::SequenceGenerator;

/// Trellis - discrete hidden Markov model inference
#[derive(Parser)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log format on stderr (human or jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Smooth and/or decode an observation sequence
    Infer(InferArgs),

    /// Sample a hidden path and its observations from a model
    Generate(GenerateArgs),

    /// Train a two-category Naive-Bayes classifier and evaluate it
    Classify(ClassifyArgs),

    /// Mutual information of a joint distribution table
    MutualInfo(MutualInfoArgs),

    /// Validate a model file
    Check(CheckArgs),

    /// Print shell completions
    Completions(CompletionsArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct InferArgs {
    /// Model file (falls back to TRELLIS_MODEL, TRELLIS_CONFIG_DIR, XDG config)
    #[arg(long, short = 'm')]
    model: Option<PathBuf>,

    /// Observation file: {"observations": [..], "states": [..]?}
    #[arg(long, short = 'o')]
    observations: PathBuf,

    /// Which engine(s) to run
    #[arg(long, value_enum, default_value_t = Algorithm::Both)]
    algorithm: Algorithm,

    /// Only report the K most probable states per step
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    Both,
    Marginals,
    Viterbi,
}

impl Algorithm {
    fn marginals(self) -> bool {
        matches!(self, Algorithm::Both | Algorithm::Marginals)
    }

    fn viterbi(self) -> bool {
        matches!(self, Algorithm::Both | Algorithm::Viterbi)
    }
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Model file (falls back to TRELLIS_MODEL, TRELLIS_CONFIG_DIR, XDG config)
    #[arg(long, short = 'm')]
    model: Option<PathBuf>,

    /// Number of time steps
    #[arg(long, short = 'n')]
    steps: usize,

    /// RNG seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Probability of dropping each observation after the first
    #[arg(long, default_value_t = 0.0)]
    drop_prob: f64,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Training documents of the first category
    #[arg(long)]
    first: PathBuf,

    /// Training documents of the second category
    #[arg(long)]
    second: PathBuf,

    /// Test documents; names containing the second label are labelled second
    #[arg(long)]
    test: PathBuf,

    /// Category labels
    #[arg(long, value_delimiter = ',', default_values_t = ["spam".to_string(), "ham".to_string()])]
    labels: Vec<String>,
}

#[derive(Args, Debug)]
struct MutualInfoArgs {
    /// JSON file holding a 2-D array of joint probabilities
    #[arg(long)]
    joint: PathBuf,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Model file (falls back to TRELLIS_MODEL, TRELLIS_CONFIG_DIR, XDG config)
    #[arg(long, short = 'm')]
    model: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CompletionsArgs {
    /// Target shell
    shell: clap_complete::Shell,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        level_from_flags(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    let span = tracing::info_span!("run", run_id = %ctx.run_id);
    let _entered = span.enter();
    log_event!(ctx, DEBUG, event_names::RUN_STARTED, Stage::Init, "run started");

    let exit_code = match &cli.command {
        Commands::Infer(args) => run_infer(&cli.global, &ctx, args),
        Commands::Generate(args) => run_generate(&cli.global, &ctx, args),
        Commands::Classify(args) => run_classify(&cli.global, &ctx, args),
        Commands::MutualInfo(args) => run_mutual_info(&cli.global, &ctx, args),
        Commands::Check(args) => run_check(&cli.global, &ctx, args),
        Commands::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "trellis", &mut std::io::stdout());
            ExitCode::Clean
        }
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Output,
        "run finished",
        exit_code = exit_code.as_i32(),
        success = exit_code.is_success()
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_infer(global: &GlobalOpts, ctx: &LogContext, args: &InferArgs) -> ExitCode {
    let loaded = match load_logged(ctx, args.model.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => return fail(global, ctx, "infer", ExitCode::from(&e), e.code(), &e),
    };
    let observations = match load_observations(&args.observations, &loaded.file) {
        Ok(obs) => obs,
        Err(e) => return fail(global, ctx, "infer", ExitCode::from(&e), e.code(), &e),
    };
    log_event!(
        ctx,
        INFO,
        event_names::OBSERVATIONS_LOADED,
        Stage::Load,
        "observations loaded",
        steps = observations.observations.len(),
        missing = observations.missing_count()
    );

    let model = match TabularModel::from_config(&loaded.file) {
        Ok(model) => model,
        Err(e) => return fail(global, ctx, "infer", ExitCode::from(&e), e.code(), &e),
    };

    let mut body = json!({
        "model": &loaded.snapshot,
        "steps": observations.observations.len(),
        "missing": observations.missing_count(),
    });

    let mut summary = Vec::new();

    if args.algorithm.marginals() {
        let result = match ForwardBackward::new(&model).run_detailed(&observations.observations) {
            Ok(result) => result,
            Err(e) => return fail(global, ctx, "infer", ExitCode::from(&e), e.code(), &e),
        };
        let top = args.top.unwrap_or(usize::MAX);
        let marginals: Vec<_> = result
            .marginals
            .iter()
            .zip(&observations.observations)
            .enumerate()
            .map(|(t, (marginal, obs))| {
                let states: Vec<_> = marginal
                    .top(top)
                    .into_iter()
                    .map(|(state, weight)| json!({"state": state, "weight": weight}))
                    .collect();
                json!({
                    "t": t,
                    "observation": obs,
                    "map_state": marginal.argmax(),
                    "states": states,
                })
            })
            .collect();
        log_event!(
            ctx,
            INFO,
            event_names::INFER_FINISHED,
            Stage::Infer,
            "marginals computed",
            degenerate = result.degenerate_steps.len()
        );
        summary.push(format!(
            "{} marginals ({} degenerate)",
            marginals.len(),
            result.degenerate_steps.len()
        ));
        body["marginals"] = json!(marginals);
        body["degenerate_steps"] = json!(result.degenerate_steps);
    }

    if args.algorithm.viterbi() {
        let path = match Viterbi::new(&model).decode(&observations.observations) {
            Ok(path) => path,
            Err(e) => return fail(global, ctx, "infer", ExitCode::from(&e), e.code(), &e),
        };
        let mismatches = observations.states.as_ref().map(|truth| path.mismatches(truth));
        log_event!(
            ctx,
            INFO,
            event_names::DECODE_FINISHED,
            Stage::Decode,
            "viterbi path decoded",
            feasible = path.is_feasible(),
            cost = path.cost
        );
        summary.push(match mismatches {
            Some(m) => format!("viterbi cost {:.4}, {} mismatches", path.cost, m),
            None => format!("viterbi cost {:.4}", path.cost),
        });
        body["viterbi"] = json!({
            "states": path.states,
            "cost": json_f64(path.cost),
            "log_probability": json_f64(path.log_probability),
            "feasible": path.is_feasible(),
            "mismatches": mismatches,
        });
    }

    let payload = envelope("infer", &ctx.run_id, body);
    emit(global.format, &payload, || format!("infer: {}", summary.join("; ")));
    ExitCode::Clean
}

fn run_generate(global: &GlobalOpts, ctx: &LogContext, args: &GenerateArgs) -> ExitCode {
    let loaded = match load_logged(ctx, args.model.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => return fail(global, ctx, "generate", ExitCode::from(&e), e.code(), &e),
    };
    let model = match TabularModel::from_config(&loaded.file) {
        Ok(model) => model,
        Err(e) => return fail(global, ctx, "generate", ExitCode::from(&e), e.code(), &e),
    };

    let generator = SequenceGenerator::new(&model);
    let trajectory = match generator.generate(args.steps, args.seed, args.drop_prob) {
        Ok(trajectory) => trajectory,
        Err(e) => return fail(global, ctx, "generate", ExitCode::from(&e), e.code(), &e),
    };
    log_event!(
        ctx,
        INFO,
        event_names::SAMPLE_FINISHED,
        Stage::Sample,
        "trajectory sampled",
        steps = trajectory.len(),
        missing = trajectory.missing_count()
    );

    // Top-level keys match the observation file format so the payload can
    // be fed straight back to `infer`.
    let payload = envelope(
        "generate",
        &ctx.run_id,
        json!({
            "model_hash": loaded.snapshot.model_hash,
            "seed": args.seed,
            "drop_prob": args.drop_prob,
            "states": trajectory.states,
            "observations": trajectory.observations,
        }),
    );
    emit(global.format, &payload, || {
        format!(
            "generate: {} steps, {} missing (seed {})",
            trajectory.len(),
            trajectory.missing_count(),
            args.seed
        )
    });
    ExitCode::Clean
}

fn run_classify(global: &GlobalOpts, ctx: &LogContext, args: &ClassifyArgs) -> ExitCode {
    let labels = match args.labels.as_slice() {
        [first, second] if first != second => [first.as_str(), second.as_str()],
        _ => {
            let msg = "--labels needs two distinct labels";
            return fail(global, ctx, "classify", ExitCode::ArgsError, 0, &msg);
        }
    };

    let model = match train_from_dirs(labels, &args.first, &args.second) {
        Ok(model) => model,
        Err(e) => return fail(global, ctx, "classify", ExitCode::from(&e), e.code(), &e),
    };
    let evaluation = match evaluate(&model, &args.test) {
        Ok(evaluation) => evaluation,
        Err(e) => return fail(global, ctx, "classify", ExitCode::from(&e), e.code(), &e),
    };
    log_event!(
        ctx,
        INFO,
        event_names::CLASSIFY_FINISHED,
        Stage::Classify,
        "test documents classified",
        total = evaluation.total(),
        correct = evaluation.correct()
    );

    let label = |c: Category| model.label(c).to_string();
    let files: Vec<_> = evaluation
        .files
        .iter()
        .map(|f| {
            json!({
                "path": f.path.display().to_string(),
                "actual": label(f.actual),
                "predicted": label(f.predicted),
            })
        })
        .collect();
    let [[ff, fs], [sf, ss]] = evaluation.confusion;

    let payload = envelope(
        "classify",
        &ctx.run_id,
        json!({
            "labels": labels,
            "vocabulary_size": model.vocabulary_size(),
            "confusion": {
                "rows": "actual",
                "columns": "predicted",
                "matrix": evaluation.confusion,
            },
            "accuracy": evaluation.accuracy(),
            "files": files,
        }),
    );
    emit(global.format, &payload, || {
        format!(
            "classify: {} of {} {} and {} of {} {} correct",
            ff,
            ff + fs,
            labels[0],
            ss,
            sf + ss,
            labels[1]
        )
    });
    ExitCode::Clean
}

fn run_mutual_info(global: &GlobalOpts, ctx: &LogContext, args: &MutualInfoArgs) -> ExitCode {
    let content = match std::fs::read_to_string(&args.joint) {
        Ok(content) => content,
        Err(e) => {
            let err = ConfigError::IoError {
                path: args.joint.clone(),
                source: e,
            };
            return fail(global, ctx, "mutual-info", ExitCode::IoError, err.code(), &err);
        }
    };
    let joint: Vec<Vec<f64>> = match serde_json::from_str(&content) {
        Ok(joint) => joint,
        Err(e) => {
            let err = ConfigError::ParseError {
                path: args.joint.clone(),
                source: e,
            };
            return fail(global, ctx, "mutual-info", ExitCode::ConfigError, err.code(), &err);
        }
    };

    let summary = match trellis_math::analyze_joint(&joint) {
        Ok(summary) => summary,
        Err(e) => return fail(global, ctx, "mutual-info", ExitCode::from(&e), e.code(), &e),
    };

    let payload = envelope(
        "mutual-info",
        &ctx.run_id,
        json!({
            "mutual_information_bits": json_f64(summary.mutual_information),
            "entropy_x_bits": json_f64(summary.entropy_x),
            "entropy_y_bits": json_f64(summary.entropy_y),
            "marginal_x": summary.marginal_x,
            "marginal_y": summary.marginal_y,
        }),
    );
    emit(global.format, &payload, || {
        format!("mutual-info: {:.6} bits", summary.mutual_information)
    });
    ExitCode::Clean
}

fn run_check(global: &GlobalOpts, ctx: &LogContext, args: &CheckArgs) -> ExitCode {
    match load_logged(ctx, args.model.as_deref()) {
        Ok(loaded) => {
            let payload = envelope(
                "check",
                &ctx.run_id,
                json!({
                    "status": "ok",
                    "model": &loaded.snapshot,
                    "description": loaded.file.description,
                }),
            );
            emit(global.format, &payload, || {
                format!(
                    "check: ok ({} states, {} observations, sha256 {})",
                    loaded.snapshot.summary.hidden_states,
                    loaded.snapshot.summary.observations,
                    &loaded.snapshot.model_hash[..12]
                )
            });
            ExitCode::Clean
        }
        Err(e) => fail(global, ctx, "check", ExitCode::from(&e), e.code(), &e),
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = json!({
        "schema_version": SCHEMA_VERSION,
        "config_schema_version": trellis_config::CONFIG_SCHEMA_VERSION,
        "trellis_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });
    emit(global.format, &version_info, || {
        format!("trellis {} (schema {})", env!("CARGO_PKG_VERSION"), SCHEMA_VERSION)
    });
}

// ============================================================================
// Helpers
// ============================================================================

fn load_logged(
    ctx: &LogContext,
    cli_path: Option<&std::path::Path>,
) -> Result<ResolvedModel, ConfigError> {
    let loaded = load_model(cli_path)?;
    let path = loaded.path.display().to_string();
    log_event!(
        ctx,
        INFO,
        event_names::MODEL_LOADED,
        Stage::Load,
        "model loaded",
        path = path.as_str(),
        source = loaded.snapshot.model_source.as_str(),
        model_hash = loaded.snapshot.model_hash.as_str()
    );
    Ok(loaded)
}

/// Report a failed command on stdout and stderr, returning its exit code.
fn fail(
    global: &GlobalOpts,
    ctx: &LogContext,
    command: &str,
    exit_code: ExitCode,
    error_code: u32,
    err: &dyn std::fmt::Display,
) -> ExitCode {
    let message = err.to_string();
    if exit_code.is_user_error() {
        log_event!(
            ctx,
            ERROR,
            event_names::CONFIG_ERROR,
            Stage::Load,
            "command failed",
            error = message.as_str()
        );
    } else {
        log_event!(
            ctx,
            ERROR,
            event_names::INTERNAL_ERROR,
            Stage::Output,
            "command failed",
            error = message.as_str()
        );
    }

    let payload = envelope(
        command,
        &ctx.run_id,
        json!({
            "status": "error",
            "error": {
                "code": error_code,
                "exit_code": exit_code.as_i32(),
                "kind": exit_code.code_name(),
                "message": message,
            },
        }),
    );
    emit(global.format, &payload, || format!("{}: error: {}", command, message));
    exit_code
}
