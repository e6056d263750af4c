use std::io::{self, BufRead, Write};
use std::path::Path;

use nnets::infer;
use nnets::Network;

/// Print `<pct>% - <name>` for every class.
pub fn print_scores(net: &mut Network, word: &str) {
    let scores = infer::classify(net, word);
    for score in &scores {
        let name = &net.classes()[score.class].name;
        println!("{}% - {}", score.percent(), name);
    }
}

/// Classify `input` once, or run the prompt loop until `Q`, `q` or EOF.
pub fn run(net: &mut Network, input: Option<&str>) {
    if let Some(word) = input {
        print_scores(net, word);
        return;
    }
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("input word:");
        let _ = io::stdout().flush();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("error: {e}");
                break;
            }
            None => break,
        };
        let word = line.trim_end_matches(['\r', '\n']);
        if word == "Q" || word == "q" {
            break;
        }
        print_scores(net, word);
    }
}

/// `--load`: inference with a saved model.
pub fn cmd_classify(model: &Path, input: Option<&str>, simd: bool) {
    let mut net = super::load_model(model);
    net.set_kernel(nnets::Kernel::select(simd));
    let pending = net.classes().iter().filter(|c| c.is_pending()).count();
    eprintln!(
        "Loaded {} ({} classes, {} neurons, {} pending)",
        model.display(),
        net.classes().len(),
        net.len(),
        pending
    );
    run(&mut net, input);
}
