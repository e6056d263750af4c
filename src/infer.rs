//! Classification of single strings and accuracy checks.

use crate::data::{encode, ImageSet};
use crate::grow::BIG;
use crate::net::Network;

/// Per-class output for one input. `raw` is `None` for pending classes.
#[derive(Clone, Debug, PartialEq)]
pub struct Score {
    pub class: usize,
    pub raw: Option<f32>,
}

impl Score {
    /// Integer confidence in `[0, 100]`; pending classes read as 0.
    pub fn percent(&self) -> u8 {
        self.raw.map_or(0, |r| clamp_percent(r * 100.0))
    }
}

/// `floor(raw)` clamped to `[0, 100]`, with non-finite values mapped to 0.
pub fn clamp_percent(raw: f32) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.clamp(0.0, 100.0).floor() as u8
}

/// Evaluate every class output for `word`.
pub fn classify(net: &mut Network, word: &str) -> Vec<Score> {
    let input = encode(word, net.receptors());
    classify_encoded(net, &input)
}

/// Evaluate every class output for already encoded receptor values.
pub fn classify_encoded(net: &mut Network, input: &[f32]) -> Vec<Score> {
    net.set_input(input);
    let outputs: Vec<(usize, Option<usize>)> = net.classes().iter().map(|c| (c.id, c.output)).collect();
    outputs
        .into_iter()
        .map(|(class, output)| Score {
            class,
            raw: output.map(|id| net.scalar(id)),
        })
        .collect()
}

/// Class with the largest raw output; the first wins ties, NaN and values
/// at or below `-BIG` never win.
pub fn argmax(scores: &[Score]) -> Option<usize> {
    let mut best = None;
    let mut top = -BIG;
    for s in scores {
        if let Some(raw) = s.raw {
            if raw > top {
                top = raw;
                best = Some(s.class);
            }
        }
    }
    best
}

/// A labelled image that was not recognized.
#[derive(Clone, Debug, PartialEq)]
pub struct Failure {
    pub index: usize,
    pub word: String,
    pub expected: usize,
    pub predicted: Option<usize>,
    /// Raw output of the expected class.
    pub output: f32,
}

impl Failure {
    /// First ten characters of the word, for listings.
    pub fn prefix(&self) -> String {
        self.word.chars().take(10).collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Verification {
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<Failure>,
}

impl Verification {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        self.passed as f32 / self.total as f32 * 100.0
    }

    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Check every image: it passes when its class is the argmax or that
/// class's raw output is at least 0.5.
pub fn verify(net: &mut Network, images: &ImageSet) -> Verification {
    let mut report = Verification {
        total: images.len(),
        ..Verification::default()
    };
    for (index, (image, row)) in images.images().iter().zip(images.rows()).enumerate() {
        let scores = classify_encoded(net, row);
        let predicted = argmax(&scores);
        let output = scores
            .get(image.class)
            .and_then(|s| s.raw)
            .unwrap_or(0.0);
        if predicted == Some(image.class) || output >= 0.5 {
            report.passed += 1;
        } else {
            report.failures.push(Failure {
                index,
                word: image.word.clone(),
                expected: image.class,
                predicted,
                output,
            });
        }
    }
    report
}
