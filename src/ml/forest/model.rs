/// Tree node stored in a flat arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Internal node routing `feature <= threshold` to `left`.
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    /// Weighted class distribution of the training rows that reached this leaf.
    Leaf { proba: Vec<f32> },
}

/// Single fitted CART tree. Node `0` is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    /// Class distribution of the leaf `features` falls into.
    pub fn leaf_proba(&self, features: &[f32]) -> &[f32] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }
}

/// Fitted forest plus the class labels its probability vectors refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestModel {
    /// Class labels in the order of every probability vector.
    pub classes: Vec<String>,
    /// Feature vector width the trees were fitted on.
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("Model must contain at least 1 class".to_string());
        }
        if self.trees.is_empty() {
            return Err("Model must contain at least 1 tree".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("Tree {tree_idx} has no nodes"));
            }
            for node in &tree.nodes {
                match node {
                    Node::Leaf { proba } if proba.len() != self.classes.len() => {
                        return Err(format!(
                            "Tree {tree_idx} has a leaf with {} classes but expected {}",
                            proba.len(),
                            self.classes.len()
                        ));
                    }
                    Node::Split {
                        feature,
                        left,
                        right,
                        ..
                    } if *feature >= self.n_features
                        || *left >= tree.nodes.len()
                        || *right >= tree.nodes.len() =>
                    {
                        return Err(format!("Tree {tree_idx} has an out-of-range split"));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Mean of the per-tree leaf distributions; sums to 1.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f64> {
        let mut sum = vec![0.0f64; self.classes.len()];
        for tree in &self.trees {
            for (acc, &p) in sum.iter_mut().zip(tree.leaf_proba(features)) {
                *acc += f64::from(p);
            }
        }
        let total: f64 = sum.iter().sum();
        if total <= 0.0 {
            return vec![1.0 / self.classes.len().max(1) as f64; self.classes.len()];
        }
        for v in &mut sum {
            *v /= total;
        }
        sum
    }

    /// Index of the most probable class; ties resolve to the lowest index.
    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f64::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}
