use std::path::Path;
use std::process;

use nnets::config::merge;
use nnets::grow::SearchSettings;
use nnets::training::interrupt;
use nnets::{model, ImageSet, Network, StopReason, TrainReport, Trainer};

use super::SearchArgs;

/// Flags that decide what happens after training.
pub struct TrainOptions<'a> {
    pub save: Option<&'a Path>,
    pub input: Option<&'a str>,
    pub benchmark: bool,
    pub description: Option<String>,
}

/// Default mode: train every class of the configuration from scratch.
pub fn cmd_train(config: Option<&Path>, search: &SearchArgs, opts: TrainOptions<'_>) {
    let config = super::load_config(config);
    let data = config.build().unwrap_or_else(|e| super::fail(e));
    let settings = search.settings();
    super::report_runtime(&settings);
    eprintln!(
        "Training {} classes on {} images ({} receptors)",
        data.classes.len(),
        data.images.len(),
        config.receptors
    );

    let mut net = Network::new(config.receptors, data.classes);
    let all: Vec<usize> = (0..net.classes().len()).collect();
    let opts = TrainOptions {
        description: opts.description.or(config.description.clone()),
        ..opts
    };
    let report = run(&mut net, &data.images, &all, settings.clone(), config.strategies());
    finish(net, &data.images, &report, &settings, search, opts, None);
}

/// `--retrain MODEL --config CONFIG`: grow the classes the model lacks.
pub fn cmd_retrain(model_path: &Path, config: &Path, search: &SearchArgs, opts: TrainOptions<'_>) {
    let mut net = super::load_model(model_path);
    let config = super::load_config(Some(config));
    let plan = merge(&mut net, &config).unwrap_or_else(|e| super::fail(e));

    if plan.schedule.is_empty() {
        println!("All classes are already trained. Nothing to do.");
        println!("Use --verify to check accuracy or --load for inference.");
        return;
    }
    let settings = search.settings();
    super::report_runtime(&settings);
    eprintln!(
        "Retraining: {} new class(es), {} images, starting from {} neurons",
        plan.schedule.len(),
        plan.images.len(),
        net.len()
    );
    let report = run(&mut net, &plan.images, &plan.schedule, settings.clone(), config.strategies());
    finish(net, &plan.images, &report, &settings, search, opts, Some(model_path));
}

fn run(
    net: &mut Network,
    images: &ImageSet,
    schedule: &[usize],
    settings: SearchSettings,
    sequence: Vec<nnets::StrategySpec>,
) -> TrainReport {
    if let Err(e) = interrupt::install_ctrl_c_handler() {
        tracing::warn!("{e}; Ctrl-C will abort without saving");
    }
    let mut trainer = Trainer::new(settings, sequence).on_step(|step| {
        eprintln!(
            "train class {} : {} / {} trained, {} neurons",
            step.class,
            step.trained(),
            step.class_errors.len(),
            step.nodes
        );
    });
    trainer
        .train_classes(net, images, schedule)
        .unwrap_or_else(|e| super::fail(e))
}

fn finish(
    mut net: Network,
    images: &ImageSet,
    report: &TrainReport,
    settings: &SearchSettings,
    search: &SearchArgs,
    opts: TrainOptions<'_>,
    retrained_from: Option<&Path>,
) {
    match report.stop {
        StopReason::Converged => eprintln!("\nTraining completed!"),
        StopReason::Interrupted => {
            eprintln!("\nTraining interrupted after {} iterations.", report.iterations)
        }
        StopReason::CapacityExhausted => eprintln!(
            "\nNeuron limit ({}) nearly reached, training stopped.",
            settings.max_neurons
        ),
    }
    eprintln!("Errors per class:");
    let mut untrained = 0;
    for (class, error) in net.classes().iter().zip(&report.class_errors) {
        let trained = *error <= settings.tolerance;
        if !trained {
            untrained += 1;
        }
        eprintln!(
            "  Class {} ({}): error = {} [{}]",
            class.id,
            class.name,
            error,
            if trained { "trained" } else { "not trained" }
        );
    }

    let stopped_early = report.stop != StopReason::Converged;
    match opts.save {
        Some(path) => {
            if let Err(e) = model::save(&net, path, opts.description.as_deref()) {
                eprintln!("warning: failed to save network: {e}");
            } else if stopped_early && untrained > 0 {
                eprintln!("\nNetwork state saved. To continue training, use:");
                eprintln!(
                    "  nnets --retrain {} --config <config.json> --save <output.json>",
                    path.display()
                );
            }
        }
        None if stopped_early => {
            eprintln!("\nwarning: network state not saved (no --save given).");
            eprintln!("Progress will be lost. Use --save to keep it for --retrain.");
        }
        None => {
            if let Some(origin) = retrained_from {
                eprintln!("note: retrained model not saved; '{}' is unchanged", origin.display());
            }
        }
    }

    if opts.benchmark {
        print_benchmark(&net, images, report, settings);
        return;
    }
    if search.test {
        super::verify::check_or_exit("Test Summary", &mut net, images);
        println!("\nAll tests PASSED!");
        return;
    }
    if report.stop == StopReason::Interrupted {
        process::exit(0);
    }
    super::classify::run(&mut net, opts.input);
}

fn print_benchmark(net: &Network, images: &ImageSet, report: &TrainReport, settings: &SearchSettings) {
    let ms = report.elapsed.as_secs_f64() * 1000.0;
    let created = report.nodes_created();
    println!();
    println!("=== Training Speed Benchmark Results ===");
    println!("Configuration:");
    println!("  Receptors (inputs): {}", net.receptors());
    println!("  Classes: {}", net.classes().len());
    println!("  Images: {}", images.len());
    println!("  Neurons created: {created}");
    println!(
        "  Threads: {}{}",
        settings.workers(),
        if settings.parallel { " (multithreaded)" } else { " (single-threaded)" }
    );
    println!(
        "  SIMD: {}{}",
        nnets::Kernel::select(settings.simd).describe(),
        if settings.simd { " (enabled)" } else { " (disabled)" }
    );
    println!("Timing:");
    println!("  Training time: {ms:.0} ms");
    println!("  Training iterations: {}", report.iterations);
    if report.iterations > 0 {
        println!("  Time per iteration: {:.3} ms", ms / report.iterations as f64);
    }
    if ms > 0.0 {
        println!(
            "  Training speed: {:.3} classes/sec",
            net.classes().len() as f64 * 1000.0 / ms
        );
        println!("  Neuron creation speed: {:.1} neurons/sec", created as f64 * 1000.0 / ms);
    }
    println!("  Model fingerprint: {}", model::fingerprint(net));
    println!("=== End Benchmark ===");
}
