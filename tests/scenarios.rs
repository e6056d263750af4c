use nnets::config::merge;
use nnets::grow::{exhaustive, SearchSettings, Sweep};
use nnets::training::StepReport;
use nnets::{infer, model, Class, InterruptFlag, Network, Op, StopReason, Trainer, TrainingConfig};

fn settings() -> SearchSettings {
    SearchSettings {
        seed: 42,
        ..SearchSettings::default()
    }
}

fn trainer() -> Trainer<'static> {
    Trainer::new(settings(), Vec::new()).with_interrupt(InterruptFlag::new())
}

/// Train `config` from scratch and return the network.
fn train(config: &TrainingConfig) -> (Network, nnets::ImageSet, nnets::TrainReport) {
    let data = config.build().unwrap();
    let mut net = Network::new(config.receptors, data.classes);
    let report = trainer().train(&mut net, &data.images).unwrap();
    (net, data.images, report)
}

fn best(net: &mut Network, word: &str) -> (usize, u8) {
    let scores = infer::classify(net, word);
    let top = infer::argmax(&scores).unwrap();
    (top, scores[top].percent())
}

// ── default configuration ──

#[test]
fn default_config_trains_and_recognizes_words() {
    let (mut net, images, report) = train(&TrainingConfig::default());
    assert_eq!(images.len(), 52);
    assert_eq!(report.stop, StopReason::Converged);
    assert!(report.class_errors.iter().sum::<f32>() < 4.0 * 0.01);
    assert!(report.iterations < 10_000, "{} iterations", report.iterations);

    for (word, class) in [("time", 1), ("hour", 2), ("main", 3), (" time ", 1), ("    ", 0)] {
        let (top, pct) = best(&mut net, word);
        assert_eq!(top, class, "{word:?}");
        assert!(pct >= 50, "{word:?} scored {pct}%");
    }
    assert!(infer::verify(&mut net, &images).all_passed());
}

// ── retraining ──

#[test]
fn retraining_adds_a_class_without_touching_old_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two.json");

    let first = TrainingConfig::from_json(
        r#"{"receptors": 12, "classes": [{"id": 0, "word": ""}, {"id": 1, "word": "time"}]}"#,
    )
    .unwrap();
    let (net, _, report) = train(&first);
    assert_eq!(report.stop, StopReason::Converged);
    model::save(&net, &path, None).unwrap();
    let saved: Vec<Option<usize>> = net.classes().iter().map(|c| c.output).collect();

    let second = TrainingConfig::from_json(
        r#"{"receptors": 12, "classes": [
            {"id": 0, "word": ""}, {"id": 1, "word": "time"}, {"id": 2, "word": "date"}]}"#,
    )
    .unwrap();
    let mut net = model::load(&path).unwrap();
    let nodes = net.len();
    let plan = merge(&mut net, &second).unwrap();
    assert_eq!(plan.schedule, vec![2]);

    let report = trainer()
        .train_classes(&mut net, &plan.images, &plan.schedule)
        .unwrap();
    assert_eq!(report.stop, StopReason::Converged);
    assert_eq!(net.classes()[0].output, saved[0]);
    assert_eq!(net.classes()[1].output, saved[1]);
    let fresh = net.classes()[2].output.unwrap();
    assert!(fresh >= nodes);

    let scores = infer::classify(&mut net, "date");
    assert!(scores[2].percent() >= 50, "{}%", scores[2].percent());
    assert!(infer::classify(&mut net, "time")[2].percent() < 50);
}

// ── persistence ──

#[test]
fn reloaded_model_keeps_its_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("four.json");
    let (net, images, _) = train(&TrainingConfig::default());
    model::save(&net, &path, Some("default classes")).unwrap();

    let mut back = model::load(&path).unwrap();
    assert_eq!(model::fingerprint(&back), model::fingerprint(&net));
    for image in images.images() {
        let scores = infer::classify(&mut back, &image.word);
        assert!(
            scores[image.class].percent() >= 50,
            "{:?} gave {}%",
            image.word,
            scores[image.class].percent()
        );
    }
}

// ── degenerate outputs ──

#[test]
fn nan_output_prints_zero_percent() {
    let mut net = Network::new(2, vec![Class::pending(0, "nan"), Class::pending(1, "inf")]);
    let eight = 2 + 6;
    assert_eq!(net.basis()[6], 8.0);
    // 8^2, 8^4, ... overflows to +inf on the sixth squaring
    let mut square = net.push(eight, eight, Op::Mul).unwrap();
    for _ in 0..5 {
        square = net.push(square, square, Op::Mul).unwrap();
    }
    let nan = net.push(square, square, Op::Sub).unwrap();
    net.set_output(0, nan);
    net.set_output(1, square);

    let scores = infer::classify(&mut net, "ab");
    assert!(scores[0].raw.unwrap().is_nan());
    assert!(scores[1].raw.unwrap().is_infinite());
    assert_eq!(scores[0].percent(), 0);
    assert_eq!(scores[1].percent(), 0);

    let back = model::from_json(&model::to_json(&net, None).unwrap()).unwrap();
    assert_eq!(back.classes()[0].output, Some(nan));
}

// ── interrupt and resume ──

#[test]
fn interrupted_run_resumes_remaining_classes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.json");
    let config = TrainingConfig::from_json(
        r#"{"receptors": 8, "classes": [
            {"id": 0, "word": "one"}, {"id": 1, "word": "two"}, {"id": 2, "word": "six"},
            {"id": 3, "word": "ten"}, {"id": 4, "word": "red"}, {"id": 5, "word": "sun"},
            {"id": 6, "word": "cat"}, {"id": 7, "word": "dog"}, {"id": 8, "word": "map"},
            {"id": 9, "word": "box"}]}"#,
    )
    .unwrap();
    let data = config.build().unwrap();
    let mut net = Network::new(config.receptors, data.classes);

    let flag = InterruptFlag::new();
    let hook_flag = flag.clone();
    let report = Trainer::new(settings(), Vec::new())
        .with_interrupt(flag)
        .on_step(move |step: &StepReport<'_>| {
            if step.trained() >= 5 {
                hook_flag.raise();
            }
        })
        .train(&mut net, &data.images)
        .unwrap();
    assert_eq!(report.stop, StopReason::Interrupted);
    assert_eq!(report.trained(0.01), 5);
    model::save(&net, &path, None).unwrap();

    let mut net = model::load(&path).unwrap();
    let done: Vec<Option<usize>> = net.classes().iter().map(|c| c.output).collect();
    assert_eq!(done.iter().filter(|o| o.is_some()).count(), 5);
    let plan = merge(&mut net, &config).unwrap();
    assert_eq!(plan.schedule.len(), 5);

    let report = trainer()
        .train_classes(&mut net, &plan.images, &plan.schedule)
        .unwrap();
    assert_eq!(report.stop, StopReason::Converged);
    for (class, before) in net.classes().iter().zip(&done) {
        if before.is_some() {
            assert_eq!(class.output, *before);
        }
        assert!(class.output.is_some());
    }
    let check = infer::verify(&mut net, &plan.images);
    assert!(check.all_passed(), "{:?}", check.failures);
}

// ── parallel / serial equivalence ──

#[test]
fn exhaustive_parallel_matches_serial_at_fifty_nodes() {
    let config = TrainingConfig::from_json(
        r#"{"receptors": 36, "classes": [{"id": 0, "word": "left"}, {"id": 1, "word": "right"}]}"#,
    )
    .unwrap();
    let data = config.build().unwrap();
    let mut serial = Network::new(36, data.classes);
    serial.load_images(&data.images);
    assert_eq!(serial.len(), 50);
    let mut parallel = serial.clone();
    let target = data.images.target(1);

    let opts = SearchSettings {
        threads: 4,
        ..settings()
    };
    let a = exhaustive(&mut serial, &target, Sweep::Full, false, &opts).unwrap();
    let b = exhaustive(&mut parallel, &target, Sweep::Full, true, &opts).unwrap();
    assert_eq!(a, b);
    let x = serial.neuron(50);
    let y = parallel.neuron(50);
    assert_eq!((x.left, x.right, x.op), (y.left, y.right, y.op));
}
