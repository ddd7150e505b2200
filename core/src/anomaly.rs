//! Isolation forest anomaly detector.
//!
//! Each tree isolates a random sub-sample with random axis-aligned cuts.
//! Points that isolate in few cuts are unusual. The anomaly score is
//! `2^(-E[h(x)] / c(ψ))` where `h` is the path length and `c(ψ)` the
//! expected path length of an unsuccessful BST search over the sub-sample
//! size ψ. The decision threshold is the `(1 - contamination)` quantile
//! of the training scores, so roughly `contamination` of the training
//! rows are labelled outliers.

use crate::{
    config::AnomalyConfig,
    error::{EngineError, EngineResult},
    rng::StreamRng,
    signals::{SignalVector, SIGNAL_COUNT},
};
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Detector verdict, with the conventional -1 / 1 encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyLabel {
    Outlier,
    Inlier,
}

impl AnomalyLabel {
    pub fn code(&self) -> i8 {
        match self {
            Self::Outlier => -1,
            Self::Inlier  => 1,
        }
    }

    pub fn is_outlier(&self) -> bool {
        matches!(self, Self::Outlier)
    }
}

#[derive(Debug, Clone)]
enum IsoNode {
    External {
        size: usize,
    },
    Internal {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<IsoNode>,
}

impl IsolationTree {
    fn fit(x: &[SignalVector], sample: Vec<usize>, height_limit: usize, rng: &mut StreamRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, sample, 0, height_limit, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &[SignalVector],
        indices: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StreamRng,
    ) -> usize {
        let external = |nodes: &mut Vec<IsoNode>, size: usize| {
            nodes.push(IsoNode::External { size });
            nodes.len() - 1
        };

        if depth >= height_limit || indices.len() <= 1 {
            return external(&mut self.nodes, indices.len());
        }

        // Only features that still vary inside this node can cut it.
        let mut ranges = Vec::with_capacity(SIGNAL_COUNT);
        for feature in 0..SIGNAL_COUNT {
            let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                let v = x[i].feature(feature);
                (lo.min(v), hi.max(v))
            });
            if hi > lo {
                ranges.push((feature, lo, hi));
            }
        }
        if ranges.is_empty() {
            return external(&mut self.nodes, indices.len());
        }

        let (feature, lo, hi) = *rng.choose(&ranges);
        let threshold = lo + rng.next_f64() * (hi - lo);
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[i].feature(feature) <= threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return external(&mut self.nodes, indices.len());
        }

        let id = self.nodes.len();
        self.nodes.push(IsoNode::External { size: 0 });
        let left = self.grow(x, left_idx, depth + 1, height_limit, rng);
        let right = self.grow(x, right_idx, depth + 1, height_limit, rng);
        self.nodes[id] = IsoNode::Internal { feature, threshold, left, right };
        id
    }

    fn path_length(&self, x: &SignalVector) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[id] {
                IsoNode::External { size } => return depth + average_path_length(*size),
                IsoNode::Internal { feature, threshold, left, right } => {
                    id = if x.feature(*feature) <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// c(n): average path length of an unsuccessful search in a BST of n nodes.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees:       Vec<IsolationTree>,
    sample_size: usize,
    threshold:   f64,
}

impl IsolationForest {
    pub fn fit(x: &[SignalVector], params: &AnomalyConfig, rng: &mut StreamRng) -> EngineResult<Self> {
        if x.len() < 2 {
            return Err(EngineError::InsufficientData { required: 2, actual: x.len() });
        }
        if let Some(row) = x.iter().position(|v| v.first_non_finite().is_some()) {
            return Err(EngineError::NonFinite { context: format!("feature row {row}") });
        }
        if params.n_trees == 0 {
            return Err(EngineError::Training("isolation forest needs at least one tree".into()));
        }

        let sample_size = params.max_samples.clamp(2, x.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let trees: Vec<IsolationTree> = (0..params.n_trees)
            .map(|_| {
                let sample = rng.sample_indices(x.len(), sample_size);
                IsolationTree::fit(x, sample, height_limit, rng)
            })
            .collect();

        let mut forest = Self { trees, sample_size, threshold: f64::INFINITY };
        let scores: Vec<f64> = x.iter().map(|row| forest.score(row)).collect();
        forest.threshold = quantile(&scores, 1.0 - params.contamination);
        Ok(forest)
    }

    /// Anomaly score in (0, 1]; higher is more unusual.
    pub fn score(&self, x: &SignalVector) -> f64 {
        let mean_path =
            self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        2f64.powf(-mean_path / average_path_length(self.sample_size))
    }

    pub fn predict(&self, x: &SignalVector) -> AnomalyLabel {
        if self.score(x) > self.threshold {
            AnomalyLabel::Outlier
        } else {
            AnomalyLabel::Inlier
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Linear-interpolated quantile, `q` in [0, 1].
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};
    use crate::signals::Signal;

    fn population(bank: &RngBank, n: usize) -> Vec<SignalVector> {
        let mut rng = bank.for_stream(StreamSlot::Population);
        (0..n)
            .map(|_| {
                let mut v = SignalVector::default();
                for s in Signal::ALL {
                    v.set(s, rng.int_in(40, 60));
                }
                v
            })
            .collect()
    }

    #[test]
    fn path_length_constants() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!((c256 - 10.2448).abs() < 0.01, "c(256) = {c256}");
    }

    #[test]
    fn far_outlier_is_flagged() {
        let bank = RngBank::new(3);
        let x = population(&bank, 500);
        let mut rng = bank.for_stream(StreamSlot::AnomalyForest);
        let forest = IsolationForest::fit(&x, &AnomalyConfig::default(), &mut rng).unwrap();

        let mut extreme = SignalVector::default();
        for s in Signal::ALL {
            extreme.set(s, 500.0);
        }
        assert_eq!(forest.predict(&extreme), AnomalyLabel::Outlier);
        assert_eq!(forest.predict(&extreme).code(), -1);

        let mut typical = SignalVector::default();
        for s in Signal::ALL {
            typical.set(s, 50.0);
        }
        assert_eq!(forest.predict(&typical), AnomalyLabel::Inlier);
    }

    #[test]
    fn flags_roughly_contamination_share_of_training_rows() {
        let bank = RngBank::new(5);
        let x = population(&bank, 1000);
        let mut rng = bank.for_stream(StreamSlot::AnomalyForest);
        let forest = IsolationForest::fit(&x, &AnomalyConfig::default(), &mut rng).unwrap();
        let flagged = x.iter().filter(|v| forest.predict(v).is_outlier()).count();
        assert!(flagged <= 30, "flagged {flagged} of 1000");
        assert!(flagged >= 15, "flagged {flagged} of 1000");
    }

    #[test]
    fn same_seed_same_verdicts() {
        let bank = RngBank::new(8);
        let x = population(&bank, 300);
        let a = IsolationForest::fit(&x, &AnomalyConfig::default(), &mut bank.for_stream(StreamSlot::AnomalyForest)).unwrap();
        let b = IsolationForest::fit(&x, &AnomalyConfig::default(), &mut bank.for_stream(StreamSlot::AnomalyForest)).unwrap();
        assert_eq!(a.threshold(), b.threshold());
        for row in &x {
            assert_eq!(a.score(row), b.score(row));
        }
    }

    #[test]
    fn needs_two_rows() {
        let mut rng = RngBank::new(1).for_stream(StreamSlot::AnomalyForest);
        let err = IsolationForest::fit(&[SignalVector::default()], &AnomalyConfig::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData { required: 2, actual: 1 }));
    }

    #[test]
    fn quantile_interpolates() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5), 3.0);
        assert!((quantile(&[0.0, 10.0], 0.97) - 9.7).abs() < 1e-9);
    }
}
