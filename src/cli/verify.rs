use std::path::Path;
use std::process;

use nnets::infer::{self, Verification};
use nnets::{Error, ImageSet, Network};

/// Print failures and the summary; true when every image passed.
pub fn print_report(title: &str, report: &Verification) -> bool {
    for f in &report.failures {
        let predicted = f.predicted.map_or_else(|| "none".to_string(), |p| p.to_string());
        println!(
            "[FAIL] \"{}...\" expected class {}, predicted {} (conf={}%)",
            f.prefix(),
            f.expected,
            predicted,
            infer::clamp_percent(f.output * 100.0)
        );
    }
    println!();
    println!("=== {title} ===");
    println!("Total samples: {}", report.total);
    println!("Passed: {}", report.passed);
    println!("Failed: {}", report.failed());
    println!("Accuracy: {:.2}%", report.accuracy());
    report.all_passed()
}

/// Check `net` on `images`, exiting 1 on any miss.
pub fn check_or_exit(title: &str, net: &mut Network, images: &ImageSet) {
    let report = infer::verify(net, images);
    if !print_report(title, &report) {
        process::exit(1);
    }
}

/// `--load --config --verify`
pub fn cmd_verify(model: &Path, config: &Path) {
    let mut net = super::load_model(model);
    let config = super::load_config(Some(config));
    if config.receptors != net.receptors() {
        super::fail(Error::ConfigMismatch {
            model: net.receptors(),
            config: config.receptors,
        });
    }
    let data = config.build().unwrap_or_else(|e| super::fail(e));
    eprintln!("Verifying {} on {} images", model.display(), data.images.len());
    check_or_exit("Verification Summary", &mut net, &data.images);
}
