//! Random forest classifier over sparse non-negative features.
//!
//! CART trees with Gini impurity, bootstrap resampling, `sqrt(n_features)`
//! candidate features per split and balanced class weights recomputed on
//! each tree's bootstrap sample. Everything is driven by one seeded
//! `ChaCha8Rng`, so two fits with the same seed produce identical forests.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::vectorizer::{sparse_value, SparseVector};

/// Splits that do not lower impurity by more than this are not taken.
const MIN_IMPURITY_DECREASE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        proba: Vec<f32>,
    },
    Split {
        feature: u32,
        threshold: f32,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn predict_proba(&self, row: &[(u32, f32)]) -> &[f32] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if sparse_value(row, *feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

/// Training matrix in both row and column form.
struct TrainingSet<'a> {
    rows: &'a [SparseVector],
    labels: &'a [usize],
    /// Column-major view: per feature, `(row, value)` for non-zero entries.
    columns: Vec<Vec<(u32, f32)>>,
    n_classes: usize,
}

impl<'a> TrainingSet<'a> {
    fn new(rows: &'a [SparseVector], labels: &'a [usize], n_features: usize, n_classes: usize) -> Self {
        let mut columns = vec![Vec::new(); n_features];
        for (r, row) in rows.iter().enumerate() {
            for &(f, v) in row {
                if let Some(col) = columns.get_mut(f as usize) {
                    col.push((r as u32, v));
                }
            }
        }
        Self {
            rows,
            labels,
            columns,
            n_classes,
        }
    }
}

struct BestSplit {
    feature: u32,
    threshold: f32,
    impurity: f64,
}

struct TreeBuilder<'a> {
    data: &'a TrainingSet<'a>,
    params: &'a ForestParams,
    weights: Vec<f64>,
    row_stamp: Vec<u32>,
    feature_stamp: Vec<u32>,
    stamp: u32,
    max_features: usize,
}

impl RandomForest {
    /// Fit a forest. `labels[i]` is the class index of `rows[i]`, in `0..n_classes`.
    pub fn fit(
        rows: &[SparseVector],
        labels: &[usize],
        n_features: usize,
        n_classes: usize,
        params: &ForestParams,
    ) -> Self {
        let data = TrainingSet::new(rows, labels, n_features, n_classes);
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let n = rows.len();

        let mut trees = Vec::with_capacity(params.n_trees);
        if n == 0 || n_classes == 0 {
            return Self { trees, n_classes };
        }

        for _ in 0..params.n_trees {
            let mut draws = vec![0u32; n];
            for _ in 0..n {
                draws[rng.gen_range(0..n)] += 1;
            }
            let weights = balanced_subsample_weights(&draws, labels, n_classes);

            let builder = TreeBuilder {
                data: &data,
                params,
                weights,
                row_stamp: vec![0; n],
                feature_stamp: vec![0; n_features],
                stamp: 0,
                max_features,
            };
            trees.push(builder.build(&mut rng));
        }

        Self { trees, n_classes }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the per-tree leaf class distributions.
    pub fn predict_proba(&self, row: &[(u32, f32)]) -> Vec<f32> {
        let mut acc = vec![0.0f32; self.n_classes];
        if self.trees.is_empty() {
            return acc;
        }
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.predict_proba(row)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f32;
        for a in &mut acc {
            *a /= n;
        }
        acc
    }

    /// Most probable class and its probability. Ties go to the lower index.
    pub fn predict(&self, row: &[(u32, f32)]) -> Option<(usize, f32)> {
        let proba = self.predict_proba(row);
        let mut best: Option<(usize, f32)> = None;
        for (i, &p) in proba.iter().enumerate() {
            if best.map_or(true, |(_, bp)| p > bp) {
                best = Some((i, p));
            }
        }
        best
    }
}

/// Per-row weights: bootstrap draw count times `n / (classes_present * class_draws)`.
fn balanced_subsample_weights(draws: &[u32], labels: &[usize], n_classes: usize) -> Vec<f64> {
    let mut class_draws = vec![0u64; n_classes];
    for (&d, &y) in draws.iter().zip(labels) {
        class_draws[y] += d as u64;
    }
    let total: u64 = class_draws.iter().sum();
    let present = class_draws.iter().filter(|&&c| c > 0).count() as f64;
    let class_weight: Vec<f64> = class_draws
        .iter()
        .map(|&c| if c > 0 { total as f64 / (present * c as f64) } else { 0.0 })
        .collect();

    draws
        .iter()
        .zip(labels)
        .map(|(&d, &y)| d as f64 * class_weight[y])
        .collect()
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total) * (c / total)).sum::<f64>()
}

impl<'a> TreeBuilder<'a> {
    fn build(mut self, rng: &mut ChaCha8Rng) -> DecisionTree {
        let root_rows: Vec<u32> = (0..self.weights.len() as u32)
            .filter(|&r| self.weights[r as usize] > 0.0)
            .collect();

        let mut nodes = vec![Node::Leaf { proba: Vec::new() }];
        let mut stack = vec![(0usize, root_rows, 0usize)];

        while let Some((idx, rows, depth)) = stack.pop() {
            let counts = self.class_counts(&rows);
            let total: f64 = counts.iter().sum();
            let impurity = gini(&counts, total);

            let can_split = impurity > 0.0
                && rows.len() >= self.params.min_samples_split
                && self.params.max_depth.map_or(true, |d| depth < d);

            let split = if can_split {
                self.find_split(&rows, &counts, total, rng)
                    .filter(|s| s.impurity < impurity - MIN_IMPURITY_DECREASE)
            } else {
                None
            };

            match split {
                Some(split) => {
                    let (left_rows, right_rows): (Vec<u32>, Vec<u32>) =
                        rows.iter().partition(|&&r| {
                            sparse_value(&self.data.rows[r as usize], split.feature) <= split.threshold
                        });
                    let left = nodes.len();
                    nodes.push(Node::Leaf { proba: Vec::new() });
                    let right = nodes.len();
                    nodes.push(Node::Leaf { proba: Vec::new() });
                    nodes[idx] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };
                    stack.push((right, right_rows, depth + 1));
                    stack.push((left, left_rows, depth + 1));
                }
                None => {
                    let proba = counts
                        .iter()
                        .map(|c| if total > 0.0 { (c / total) as f32 } else { 0.0 })
                        .collect();
                    nodes[idx] = Node::Leaf { proba };
                }
            }
        }

        DecisionTree { nodes }
    }

    fn class_counts(&self, rows: &[u32]) -> Vec<f64> {
        let mut counts = vec![0.0; self.data.n_classes];
        for &r in rows {
            counts[self.data.labels[r as usize]] += self.weights[r as usize];
        }
        counts
    }

    /// Best threshold split among up to `max_features` non-constant features,
    /// visited in random order. Only features present in the node can vary.
    fn find_split(
        &mut self,
        rows: &[u32],
        counts: &[f64],
        total: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        self.stamp += 1;
        let stamp = self.stamp;

        let mut candidates = Vec::new();
        for &r in rows {
            self.row_stamp[r as usize] = stamp;
            for &(f, _) in &self.data.rows[r as usize] {
                if self.feature_stamp[f as usize] != stamp {
                    self.feature_stamp[f as usize] = stamp;
                    candidates.push(f);
                }
            }
        }
        candidates.sort_unstable();
        candidates.shuffle(rng);

        let n_classes = self.data.n_classes;
        let mut best: Option<BestSplit> = None;
        let mut evaluated = 0;

        for &f in &candidates {
            if evaluated >= self.max_features {
                break;
            }

            let mut nonzero: Vec<(f32, usize, f64)> = Vec::new();
            let column = &self.data.columns[f as usize];
            if column.len() <= rows.len() {
                for &(r, v) in column {
                    if self.row_stamp[r as usize] == stamp {
                        nonzero.push((v, self.data.labels[r as usize], self.weights[r as usize]));
                    }
                }
            } else {
                for &r in rows {
                    let v = sparse_value(&self.data.rows[r as usize], f);
                    if v != 0.0 {
                        nonzero.push((v, self.data.labels[r as usize], self.weights[r as usize]));
                    }
                }
            }

            let has_zero = nonzero.len() < rows.len();
            nonzero.sort_by(|a, b| a.0.total_cmp(&b.0));
            let distinct_nonzero = 1 + nonzero.windows(2).filter(|w| w[0].0 != w[1].0).count();
            if nonzero.is_empty() || (distinct_nonzero + usize::from(has_zero)) < 2 {
                continue;
            }
            evaluated += 1;

            // Left side starts as the zero group (zeros sort before any positive value).
            let mut left = counts.to_vec();
            for &(_, y, w) in &nonzero {
                left[y] -= w;
            }
            let mut left_total: f64 = left.iter().sum();
            let mut prev = 0.0f32;
            let mut left_has_rows = has_zero;

            let mut i = 0;
            while i < nonzero.len() {
                let value = nonzero[i].0;
                if left_has_rows {
                    let threshold = midpoint(prev, value);
                    let right: Vec<f64> = (0..n_classes).map(|k| counts[k] - left[k]).collect();
                    let right_total = total - left_total;
                    let impurity = (left_total * gini(&left, left_total)
                        + right_total * gini(&right, right_total))
                        / total;
                    if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                        best = Some(BestSplit {
                            feature: f,
                            threshold,
                            impurity,
                        });
                    }
                }
                while i < nonzero.len() && nonzero[i].0 == value {
                    let (_, y, w) = nonzero[i];
                    left[y] += w;
                    left_total += w;
                    i += 1;
                }
                prev = value;
                left_has_rows = true;
            }
        }

        best
    }
}

/// Threshold between two adjacent distinct values; never rounds up to `hi`.
fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi {
        lo
    } else {
        mid
    }
}
