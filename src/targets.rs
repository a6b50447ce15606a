//! Training targets derived from distilled labels.
//!
//! Only images whose majority is a real emotion are trainable. Their target
//! covers the emotion categories alone (the two special categories are dropped
//! and the rest renormalized), shaped according to the training mode.

use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{CategorySchema, LabelDistribution};

/// Floor added to every entry of a multi-target label.
pub const MULTI_TARGET_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// One-hot at the majority emotion.
    Majority,
    /// One-hot at an emotion drawn from the label distribution.
    Probability,
    /// The label distribution itself.
    #[value(name = "crossentropy")]
    #[serde(rename = "crossentropy")]
    CrossEntropy,
    /// Every emotion with votes marked as an acceptable answer.
    MultiTarget,
}

/// Whether a label can be used for training.
pub fn is_trainable(schema: &CategorySchema, dist: &LabelDistribution) -> bool {
    !schema.is_special(dist.argmax())
}

/// Build the training target for `dist`, or `None` if the label's majority is
/// unknown or not-a-face, or if `dist` does not match the schema's length.
pub fn training_target<R: Rng>(
    schema: &CategorySchema,
    dist: &LabelDistribution,
    mode: TrainingMode,
    rng: &mut R,
) -> Option<Vec<f64>> {
    if dist.len() != schema.len() || !is_trainable(schema, dist) {
        return None;
    }

    let emotions = &dist.as_slice()[..schema.emotion_count()];
    let sum: f64 = emotions.iter().sum();
    if sum <= 0.0 {
        return None;
    }
    let probs: Vec<f64> = emotions.iter().map(|p| p / sum).collect();

    let target = match mode {
        TrainingMode::CrossEntropy => probs,
        TrainingMode::Majority => one_hot(probs.len(), dist.argmax()),
        TrainingMode::Probability => one_hot(probs.len(), sample_index(&probs, rng)),
        TrainingMode::MultiTarget => probs
            .iter()
            .map(|&p| {
                let mask = if p > 0.0 { 1.0 } else { 0.0 };
                (1.0 - MULTI_TARGET_EPSILON) * mask + MULTI_TARGET_EPSILON
            })
            .collect(),
    };
    Some(target)
}

fn one_hot(len: usize, index: usize) -> Vec<f64> {
    let mut v = vec![0.0; len];
    v[index] = 1.0;
    v
}

fn sample_index<R: Rng>(probs: &[f64], rng: &mut R) -> usize {
    let draw: f64 = rng.random();
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if draw < cumulative {
            return i;
        }
    }
    // rounding left the draw past the last bucket
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mixed() -> LabelDistribution {
        // neutral 0.6, happiness 0.4
        LabelDistribution::new(vec![0.6, 0.4, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
    }

    #[test]
    fn special_majority_is_not_trainable() {
        let schema = CategorySchema::ferplus();
        let mut rng = StdRng::seed_from_u64(7);

        let unknown = LabelDistribution::unknown(10);
        assert!(!is_trainable(&schema, &unknown));
        assert_eq!(
            training_target(&schema, &unknown, TrainingMode::Majority, &mut rng),
            None
        );

        let mut nf = vec![0.0; 10];
        nf[9] = 1.0;
        assert!(!is_trainable(&schema, &LabelDistribution::new(nf)));
    }

    #[test]
    fn mismatched_label_has_no_target() {
        let schema = CategorySchema::ferplus();
        let mut rng = StdRng::seed_from_u64(7);

        let short = LabelDistribution::new(vec![0.6, 0.4, 0.0]);
        assert_eq!(
            training_target(&schema, &short, TrainingMode::CrossEntropy, &mut rng),
            None
        );
        let long = LabelDistribution::new(vec![1.0; 12]);
        assert_eq!(
            training_target(&schema, &long, TrainingMode::Majority, &mut rng),
            None
        );
    }

    #[test]
    fn majority_target() {
        let schema = CategorySchema::ferplus();
        let mut rng = StdRng::seed_from_u64(7);
        let target = training_target(&schema, &mixed(), TrainingMode::Majority, &mut rng).unwrap();
        assert_eq!(target, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn crossentropy_target_drops_specials() {
        let schema = CategorySchema::ferplus();
        let mut rng = StdRng::seed_from_u64(7);
        let target =
            training_target(&schema, &mixed(), TrainingMode::CrossEntropy, &mut rng).unwrap();
        assert_eq!(target.len(), 8);
        assert!((target[0] - 0.6).abs() < 1e-9);
        assert!((target[1] - 0.4).abs() < 1e-9);
        assert!((target.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn multi_target_marks_all_voted_emotions() {
        let schema = CategorySchema::ferplus();
        let mut rng = StdRng::seed_from_u64(7);
        let target =
            training_target(&schema, &mixed(), TrainingMode::MultiTarget, &mut rng).unwrap();
        assert!((target[0] - 1.0).abs() < 1e-12);
        assert!((target[1] - 1.0).abs() < 1e-12);
        assert_eq!(target[2], MULTI_TARGET_EPSILON);
    }

    #[test]
    fn probability_target_is_one_hot_on_voted_emotion() {
        let schema = CategorySchema::ferplus();
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits = [0usize; 8];
        for _ in 0..500 {
            let target =
                training_target(&schema, &mixed(), TrainingMode::Probability, &mut rng).unwrap();
            assert_eq!(target.iter().sum::<f64>(), 1.0);
            let idx = target.iter().position(|&v| v == 1.0).unwrap();
            hits[idx] += 1;
        }
        assert_eq!(hits[0] + hits[1], 500);
        assert!(hits[0] > 0 && hits[1] > 0);
    }

    #[test]
    fn probability_target_is_reproducible() {
        let schema = CategorySchema::ferplus();
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| {
                    training_target(&schema, &mixed(), TrainingMode::Probability, &mut rng)
                        .unwrap()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(3), draw(3));
    }
}
