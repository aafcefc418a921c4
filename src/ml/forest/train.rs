use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::model::{DecisionTree, Node, RandomForestModel};
use crate::config::TrainingSettings;
use crate::error::TrainingError;

/// Forest hyperparameters.
#[derive(Debug, Clone)]
pub struct ForestOptions {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` uses `sqrt(n_features)`.
    pub max_features: Option<usize>,
    pub balance_classes: bool,
    pub seed: u64,
    /// Worker threads; `0` uses every available core.
    pub threads: usize,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self::from(&TrainingSettings::default())
    }
}

impl From<&TrainingSettings> for ForestOptions {
    fn from(settings: &TrainingSettings) -> Self {
        Self {
            n_estimators: settings.n_estimators,
            max_depth: settings.max_depth,
            min_samples_split: settings.min_samples_split,
            min_samples_leaf: settings.min_samples_leaf,
            max_features: None,
            balance_classes: settings.balance_classes,
            seed: settings.seed,
            threads: settings.threads,
        }
    }
}

/// In-memory dataset used for training and evaluation.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Number of `f32` values in each feature vector.
    pub feature_len_f32: usize,
    /// Ordered list of class labels.
    pub classes: Vec<String>,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Class indices aligned with `x`.
    pub y: Vec<usize>,
}

/// Per-class weights `n / (k * count)` over the `k` classes present in `y`.
///
/// Classes absent from `y` get weight `0`.
pub fn balanced_class_weights(y: &[usize], n_classes: usize) -> Vec<f32> {
    let mut counts = vec![0f32; n_classes];
    for &label in y {
        if label < n_classes {
            counts[label] += 1.0;
        }
    }
    let present = counts.iter().filter(|&&count| count > 0.0).count() as f32;
    let total: f32 = counts.iter().sum();
    counts
        .into_iter()
        .map(|count| {
            if count == 0.0 {
                0.0
            } else {
                total / (present * count)
            }
        })
        .collect()
}

/// Fit a random forest on `dataset`.
pub fn train_forest(
    dataset: &TrainDataset,
    options: &ForestOptions,
) -> Result<RandomForestModel, TrainingError> {
    if dataset.x.len() != dataset.y.len() {
        return Err(TrainingError::MismatchedRows {
            rows: dataset.x.len(),
            labels: dataset.y.len(),
        });
    }
    if dataset.x.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }
    let n_classes = dataset.classes.len();
    if let Some(&index) = dataset.y.iter().find(|&&label| label >= n_classes) {
        return Err(TrainingError::UnknownClassIndex {
            index,
            classes: n_classes,
        });
    }
    let class_weights = if options.balance_classes {
        balanced_class_weights(&dataset.y, n_classes)
    } else {
        vec![1.0; n_classes]
    };
    let n_features = dataset.feature_len_f32;
    let max_features = options
        .max_features
        .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
        .clamp(1, n_features.max(1));
    let params = TreeParams {
        n_classes,
        max_depth: options.max_depth,
        min_samples_split: options.min_samples_split.max(2),
        min_samples_leaf: options.min_samples_leaf.max(1),
        max_features,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()
        .map_err(|err| TrainingError::ThreadPool(err.to_string()))?;
    let trees = pool.install(|| {
        (0..options.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(tree_seed(options.seed, tree_idx));
                fit_tree(dataset, &class_weights, &params, &mut rng)
            })
            .collect::<Vec<_>>()
    });

    let model = RandomForestModel {
        classes: dataset.classes.clone(),
        n_features,
        trees,
    };
    debug_assert!(model.validate().is_ok());
    Ok(model)
}

fn tree_seed(seed: u64, tree_idx: usize) -> u64 {
    seed ^ (tree_idx as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[derive(Debug, Clone)]
struct TreeParams {
    n_classes: usize,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: usize,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f32>],
    y: &'a [usize],
    /// Class weight times bootstrap multiplicity.
    weights: Vec<f32>,
    params: &'a TreeParams,
    nodes: Vec<Node>,
    features: Vec<usize>,
}

fn fit_tree(
    dataset: &TrainDataset,
    class_weights: &[f32],
    params: &TreeParams,
    rng: &mut StdRng,
) -> DecisionTree {
    let n = dataset.x.len();
    let mut draws = vec![0u32; n];
    for _ in 0..n {
        draws[rng.random_range(0..n)] += 1;
    }
    let weights: Vec<f32> = draws
        .iter()
        .zip(&dataset.y)
        .map(|(&count, &label)| count as f32 * class_weights.get(label).copied().unwrap_or(0.0))
        .collect();
    let mut rows: Vec<usize> = (0..n).filter(|&i| weights[i] > 0.0).collect();

    let mut builder = TreeBuilder {
        x: &dataset.x,
        y: &dataset.y,
        weights,
        params,
        nodes: Vec::new(),
        features: (0..dataset.feature_len_f32).collect(),
    };
    builder.build(&mut rows, 0, rng);
    DecisionTree {
        nodes: builder.nodes,
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f32,
    score: f64,
}

impl TreeBuilder<'_> {
    fn build(&mut self, rows: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let dist = self.class_distribution(rows);
        let node_idx = self.nodes.len();
        let is_pure = dist.iter().filter(|&&w| w > 0.0).count() <= 1;
        if depth >= self.params.max_depth || rows.len() < self.params.min_samples_split || is_pure {
            self.nodes.push(leaf(&dist));
            return node_idx;
        }
        let Some(split) = self.best_split(rows, &dist, rng) else {
            self.nodes.push(leaf(&dist));
            return node_idx;
        };

        self.nodes.push(Node::Leaf { proba: Vec::new() });
        let mid = partition(rows, |row| self.x[row][split.feature] <= split.threshold);
        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.build(left_rows, depth + 1, rng);
        let right = self.build(right_rows, depth + 1, rng);
        self.nodes[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_idx
    }

    fn class_distribution(&self, rows: &[usize]) -> Vec<f64> {
        let mut dist = vec![0.0f64; self.params.n_classes];
        for &row in rows {
            dist[self.y[row]] += f64::from(self.weights[row]);
        }
        dist
    }

    /// Best Gini split over a random subset of non-constant features.
    fn best_split(&mut self, rows: &[usize], dist: &[f64], rng: &mut StdRng) -> Option<SplitCandidate> {
        let total: f64 = dist.iter().sum();
        let parent_score = dist.iter().map(|w| w * w).sum::<f64>() / total;
        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0usize;

        let mut features = std::mem::take(&mut self.features);
        features.shuffle(rng);
        let mut sorted: Vec<usize> = rows.to_vec();
        for &feature in &features {
            if visited >= self.params.max_features {
                break;
            }
            sorted.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));
            let first = self.x[sorted[0]][feature];
            let last = self.x[sorted[sorted.len() - 1]][feature];
            if first == last {
                continue;
            }
            visited += 1;
            if let Some(candidate) = self.scan_feature(&sorted, feature, dist, total)
                && best.is_none_or(|b| candidate.score > b.score)
            {
                best = Some(candidate);
            }
        }
        self.features = features;

        // Zero-gain splits are kept; children may still separate the classes.
        best.filter(|b| b.score + 1e-9 >= parent_score)
    }

    /// Sweep sorted rows and score every admissible threshold.
    ///
    /// The score is `sum(left_c^2)/left_w + sum(right_c^2)/right_w`, which grows as the
    /// weighted Gini impurity of the children shrinks.
    fn scan_feature(
        &self,
        sorted: &[usize],
        feature: usize,
        dist: &[f64],
        total: f64,
    ) -> Option<SplitCandidate> {
        let n = sorted.len();
        let min_leaf = self.params.min_samples_leaf;
        let mut left = vec![0.0f64; dist.len()];
        let mut left_w = 0.0f64;
        let mut best: Option<SplitCandidate> = None;

        for pos in 0..n - 1 {
            let row = sorted[pos];
            let w = f64::from(self.weights[row]);
            left[self.y[row]] += w;
            left_w += w;

            let left_count = pos + 1;
            if left_count < min_leaf || n - left_count < min_leaf {
                continue;
            }
            let here = self.x[row][feature];
            let next = self.x[sorted[pos + 1]][feature];
            if here >= next {
                continue;
            }
            let right_w = total - left_w;
            if left_w <= 0.0 || right_w <= 0.0 {
                continue;
            }
            let mut left_sq = 0.0f64;
            let mut right_sq = 0.0f64;
            for (class, &l) in left.iter().enumerate() {
                let r = dist[class] - l;
                left_sq += l * l;
                right_sq += r * r;
            }
            let score = left_sq / left_w + right_sq / right_w;
            if best.is_none_or(|b| score > b.score) {
                let mut threshold = here + (next - here) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    score,
                });
            }
        }
        best
    }
}

fn leaf(dist: &[f64]) -> Node {
    let total: f64 = dist.iter().sum();
    let proba = if total > 0.0 {
        dist.iter().map(|&w| (w / total) as f32).collect()
    } else {
        vec![1.0 / dist.len().max(1) as f32; dist.len()]
    };
    Node::Leaf { proba }
}

/// Reorder `rows` so every row satisfying `goes_left` comes first; returns the boundary.
fn partition(rows: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut boundary = 0usize;
    for idx in 0..rows.len() {
        if goes_left(rows[idx]) {
            rows.swap(boundary, idx);
            boundary += 1;
        }
    }
    boundary
}
