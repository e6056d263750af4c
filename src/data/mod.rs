//! Text images and their receptor encoding.
//!
//! A word is normalized to exactly `receptors` bytes (clipped, or padded
//! with spaces; an embedded NUL ends the word) and each byte `b` becomes
//! the receptor value `b / 256`.

/// Normalize `word` to `width` bytes.
pub fn normalize(word: &str, width: usize) -> Vec<u8> {
    let mut out = vec![b' '; width];
    for (slot, &b) in out.iter_mut().zip(word.as_bytes()) {
        if b == 0 {
            break;
        }
        *slot = b;
    }
    out
}

/// Receptor values for `word`.
pub fn encode(word: &str, width: usize) -> Vec<f32> {
    normalize(word, width)
        .into_iter()
        .map(|b| b as f32 / 256.0)
        .collect()
}

/// Every placement of `word` inside a `width`-wide field.
///
/// An empty word yields one blank image, a word at least as wide as the
/// field yields itself once.
pub fn shifts(word: &str, width: usize) -> Vec<String> {
    let len = word.len();
    if len == 0 || len >= width {
        return vec![word.to_string()];
    }
    (0..=width - len)
        .map(|s| format!("{}{}", " ".repeat(s), word))
        .collect()
}

/// A labelled training string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub class: usize,
    pub word: String,
}

/// Training images plus their encoded rows (`vx`).
#[derive(Clone, Debug, Default)]
pub struct ImageSet {
    receptors: usize,
    images: Vec<Image>,
    rows: Vec<Vec<f32>>,
}

impl ImageSet {
    pub fn new(receptors: usize) -> Self {
        Self {
            receptors,
            images: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, class: usize, word: &str) {
        self.rows.push(encode(word, self.receptors));
        self.images.push(Image {
            class,
            word: word.to_string(),
        });
    }

    /// Push every shifted placement of `word`.
    pub fn push_shifted(&mut self, class: usize, word: &str) {
        for placed in shifts(word, self.receptors) {
            self.push(class, &placed);
        }
    }

    pub fn receptors(&self) -> usize {
        self.receptors
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Encoded rows, one per image.
    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    /// Target vector `vz`: 1 for images of `class`, 0 elsewhere.
    pub fn target(&self, class: usize) -> Vec<f32> {
        self.images
            .iter()
            .map(|img| if img.class == class { 1.0 } else { 0.0 })
            .collect()
    }

    /// Number of images labelled `class`.
    pub fn count(&self, class: usize) -> usize {
        self.images.iter().filter(|img| img.class == class).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pads_and_clips() {
        assert_eq!(normalize("ab", 4), b"ab  ".to_vec());
        assert_eq!(normalize("abcdef", 4), b"abcd".to_vec());
        assert_eq!(normalize("", 3), b"   ".to_vec());
    }

    #[test]
    fn nul_forces_padding() {
        assert_eq!(normalize("ab\0cd", 5), b"ab   ".to_vec());
    }

    #[test]
    fn encoding_divides_by_256() {
        let v = encode("A", 2);
        assert_eq!(v, vec![65.0 / 256.0, 32.0 / 256.0]);
    }

    #[test]
    fn shift_counts() {
        assert_eq!(shifts("time", 20).len(), 17);
        assert_eq!(shifts("time", 20)[3], "   time");
        assert_eq!(shifts("", 20), vec![String::new()]);
        assert_eq!(shifts("abcdef", 4), vec!["abcdef".to_string()]);
        assert_eq!(shifts("abcd", 4), vec!["abcd".to_string()]);
    }

    #[test]
    fn target_marks_class_members() {
        let mut set = ImageSet::new(6);
        set.push_shifted(1, "ab");
        set.push(0, "");
        assert_eq!(set.len(), 6);
        assert_eq!(set.count(1), 5);
        assert_eq!(set.target(1), vec![1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(set.target(0), vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }
}
