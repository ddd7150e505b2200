//! Gradient-boosted regression trees (least-squares loss).
//!
//! Each stage fits a depth-limited tree to the current residuals and adds
//! `learning_rate * tree(x)` to the running prediction. The initial
//! prediction is the target mean. Splits minimize the summed squared error
//! of the two children; thresholds sit halfway between adjacent distinct
//! feature values and route `x <= threshold` left.

use crate::{
    config::RegressorConfig,
    error::{EngineError, EngineResult},
    signals::{SignalVector, SIGNAL_COUNT},
};

// Splits must improve SSE by more than this to be taken.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature:   usize,
    threshold: f64,
    gain:      f64,
}

impl RegressionTree {
    fn fit(x: &[SignalVector], residuals: &[f64], params: &RegressorConfig) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let indices: Vec<usize> = (0..x.len()).collect();
        tree.grow(x, residuals, indices, 0, params);
        tree
    }

    fn grow(
        &mut self,
        x: &[SignalVector],
        residuals: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &RegressorConfig,
    ) -> usize {
        let split = if depth < params.max_depth && indices.len() >= params.min_samples_split {
            best_split(x, residuals, &indices, params.min_samples_leaf.max(1))
        } else {
            None
        };

        let Some(split) = split else {
            let value = indices.iter().map(|&i| residuals[i]).sum::<f64>() / indices.len() as f64;
            self.nodes.push(Node::Leaf { value });
            return self.nodes.len() - 1;
        };

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i].feature(split.feature) <= split.threshold);
        let left = self.grow(x, residuals, left_idx, depth + 1, params);
        let right = self.grow(x, residuals, right_idx, depth + 1, params);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn predict(&self, x: &SignalVector) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    id = if x.feature(*feature) <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Exhaustive search over every feature and every boundary between
/// distinct sorted values.
fn best_split(
    x: &[SignalVector],
    residuals: &[f64],
    indices: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    if n < 2 * min_leaf {
        return None;
    }
    let total: f64 = indices.iter().map(|&i| residuals[i]).sum();
    let parent_score = total * total / n as f64;

    let mut best: Option<SplitCandidate> = None;
    let mut order = indices.to_vec();
    for feature in 0..SIGNAL_COUNT {
        order.sort_by(|&a, &b| x[a].feature(feature).total_cmp(&x[b].feature(feature)));

        let mut left_sum = 0.0;
        for k in 1..n {
            left_sum += residuals[order[k - 1]];
            if k < min_leaf || n - k < min_leaf {
                continue;
            }
            let lo = x[order[k - 1]].feature(feature);
            let hi = x[order[k]].feature(feature);
            if lo == hi {
                continue;
            }
            let right_sum = total - left_sum;
            let score = left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;
            let gain = score - parent_score;
            if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                let mid = lo + (hi - lo) / 2.0;
                // Guard against the midpoint rounding up onto `hi`.
                let threshold = if mid >= hi { lo } else { mid };
                best = Some(SplitCandidate { feature, threshold, gain });
            }
        }
    }
    best
}

/// A fitted boosted ensemble.
#[derive(Debug, Clone)]
pub struct GradientBoostedRegressor {
    init:          f64,
    learning_rate: f64,
    trees:         Vec<RegressionTree>,
}

impl GradientBoostedRegressor {
    pub fn fit(x: &[SignalVector], y: &[f64], params: &RegressorConfig) -> EngineResult<Self> {
        if x.is_empty() {
            return Err(EngineError::InsufficientData { required: 1, actual: 0 });
        }
        if x.len() != y.len() {
            return Err(EngineError::Training(format!(
                "feature rows ({}) and targets ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        if let Some(row) = x.iter().position(|v| v.first_non_finite().is_some()) {
            return Err(EngineError::NonFinite { context: format!("feature row {row}") });
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::NonFinite { context: format!("target row {row}") });
        }
        if params.n_estimators == 0 || params.learning_rate <= 0.0 {
            return Err(EngineError::Training(
                "regressor needs at least one stage and a positive learning rate".into(),
            ));
        }

        let init = y.iter().sum::<f64>() / y.len() as f64;
        let mut current = vec![init; y.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, p)| t - p).collect();
            let tree = RegressionTree::fit(x, &residuals, params);
            for (pred, row) in current.iter_mut().zip(x) {
                *pred += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    pub fn predict(&self, x: &SignalVector) -> f64 {
        self.init
            + self.learning_rate * self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    /// Coefficient of determination on (x, y).
    pub fn r_squared(&self, x: &[SignalVector], y: &[f64]) -> f64 {
        let predictions: Vec<f64> = x.iter().map(|row| self.predict(row)).collect();
        r_squared(y, &predictions)
    }

    pub fn stage_count(&self) -> usize {
        self.trees.len()
    }
}

/// 1 − SS_res / SS_tot. A constant target scores 1.0 when predicted
/// exactly and 0.0 otherwise.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Signal;

    fn row(a: f64, b: f64) -> SignalVector {
        let mut v = SignalVector::default();
        v.set(Signal::CreationOutput, a);
        v.set(Signal::LearningBehavior, b);
        v
    }

    #[test]
    fn learns_step_function_exactly() {
        let x: Vec<SignalVector> = (0..40).map(|i| row(i as f64, 0.0)).collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 30.0 } else { 80.0 }).collect();
        let model = GradientBoostedRegressor::fit(&x, &y, &RegressorConfig::default()).unwrap();

        assert!((model.predict(&row(5.0, 0.0)) - 30.0).abs() < 0.01);
        assert!((model.predict(&row(35.0, 0.0)) - 80.0).abs() < 0.01);
        assert!(model.r_squared(&x, &y) > 0.999);
    }

    #[test]
    fn fits_additive_signal_well() {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for a in 0..15 {
            for b in 0..15 {
                x.push(row(a as f64 * 5.0, b as f64 * 5.0));
                y.push(20.0 + a as f64 * 2.0 + b as f64);
            }
        }
        let model = GradientBoostedRegressor::fit(&x, &y, &RegressorConfig::default()).unwrap();
        assert!(model.r_squared(&x, &y) > 0.95);
        assert_eq!(model.stage_count(), 100);
    }

    #[test]
    fn constant_target_predicts_constant() {
        let x: Vec<SignalVector> = (0..10).map(|i| row(i as f64, 1.0)).collect();
        let y = vec![150.0; 10];
        let model = GradientBoostedRegressor::fit(&x, &y, &RegressorConfig::default()).unwrap();
        assert_eq!(model.predict(&row(3.0, 1.0)), 150.0);
        assert_eq!(model.r_squared(&x, &y), 1.0);
    }

    #[test]
    fn rejects_empty_and_non_finite_input() {
        let params = RegressorConfig::default();
        assert!(matches!(
            GradientBoostedRegressor::fit(&[], &[], &params),
            Err(EngineError::InsufficientData { .. })
        ));

        let x = vec![row(f64::INFINITY, 0.0), row(1.0, 0.0)];
        assert!(matches!(
            GradientBoostedRegressor::fit(&x, &[1.0, 2.0], &params),
            Err(EngineError::NonFinite { .. })
        ));
    }

    #[test]
    fn r_squared_edge_cases() {
        assert_eq!(r_squared(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r_squared(&[5.0, 5.0], &[4.0, 5.0]), 0.0);
        assert_eq!(r_squared(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
    }
}
