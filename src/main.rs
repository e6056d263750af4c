mod cli;

use clap::Parser;
use std::path::PathBuf;

use cli::train::TrainOptions;

#[derive(Parser)]
#[command(
    name = "nnets",
    version,
    about = "Grow arithmetic neuron graphs that classify short strings",
    after_help = "Modes: train (default), --load (inference), --retrain with --config, \
                  --load with --config --verify"
)]
struct Cli {
    /// Training configuration (JSON); the built-in classes are used without it
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Save the trained model (JSON)
    #[arg(short, long, value_name = "PATH")]
    save: Option<PathBuf>,
    /// Load a trained model for inference
    #[arg(short, long, value_name = "PATH", conflicts_with = "retrain")]
    load: Option<PathBuf>,
    /// Continue training a saved model with the classes of --config
    #[arg(short, long, value_name = "PATH", requires = "config")]
    retrain: Option<PathBuf>,
    /// Classify one string and exit instead of prompting
    #[arg(short, long, value_name = "TEXT")]
    input: Option<String>,
    /// Check a loaded model against --config (exit 1 on any miss)
    #[arg(long, requires_all = ["load", "config"])]
    verify: bool,
    /// Print training speed metrics and exit
    #[arg(long)]
    benchmark: bool,
    /// List the available training functions
    #[arg(long)]
    list_funcs: bool,
    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
    #[command(flatten)]
    search: cli::SearchArgs,
}

fn main() {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);

    if cli.list_funcs {
        cli::funcs::cmd_list_funcs();
        return;
    }

    let opts = TrainOptions {
        save: cli.save.as_deref(),
        input: cli.input.as_deref(),
        benchmark: cli.benchmark,
        description: None,
    };

    if let Some(model) = &cli.retrain {
        // `requires = "config"` guarantees the config
        let config = cli.config.as_deref().unwrap_or_else(|| cli::fail("--retrain needs --config"));
        cli::train::cmd_retrain(model, config, &cli.search, opts);
    } else if let Some(model) = &cli.load {
        if cli.verify {
            let config = cli.config.as_deref().unwrap_or_else(|| cli::fail("--verify needs --config"));
            cli::verify::cmd_verify(model, config);
        } else {
            cli::classify::cmd_classify(model, cli.input.as_deref(), !cli.search.no_simd);
        }
    } else {
        cli::train::cmd_train(cli.config.as_deref(), &cli.search, opts);
    }
}
