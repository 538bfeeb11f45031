//! CART-style binary decision trees.
//!
//! A tree is stored as an arena of [`Node`]s with the root at index 0; children always have
//! larger indices than their parent. Splits send `x[feature] <= threshold` to the left child.
//!
//! # Growing
//!
//! A node becomes a leaf when any of these hold:
//!
//! - its depth reached [`ForestParams::max_depth`]
//! - it holds fewer than [`ForestParams::min_samples_split`] samples
//! - all of its samples share one label
//! - no examined feature takes more than one value inside the node
//!
//! Otherwise features are visited in random order until
//! [`ForestParams::features_per_split`] non-constant ones have been examined, and the split
//! with the lowest weighted Gini impurity wins (earlier candidates win ties).

use lifeline_features::label::Label;
use rand::{Rng, seq::SliceRandom as _};
use serde::{Deserialize, Serialize};

use crate::{ForestError, params::ForestParams};

/// Number of training samples of each class that reached a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub alive: usize,
    pub dead: usize,
}

impl ClassCounts {
    fn from_samples(samples: &[usize], labels: &[Label]) -> Self {
        let mut counts = Self::default();
        for &i in samples {
            counts.add(labels[i]);
        }
        counts
    }

    fn add(&mut self, label: Label) {
        match label {
            Label::Alive => self.alive += 1,
            Label::Dead => self.dead += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.alive + self.dead
    }

    fn is_pure(&self) -> bool {
        self.alive == 0 || self.dead == 0
    }

    #[expect(clippy::cast_precision_loss)]
    fn gini(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let alive = self.alive as f64 / total as f64;
        let dead = self.dead as f64 / total as f64;
        1.0 - alive * alive - dead * dead
    }

    /// Majority class; an even split votes [`Label::Dead`].
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn majority(&self) -> Label {
        if self.total() == 0 {
            return Label::Dead;
        }
        Label::from_alive_share(self.alive as f64 / self.total() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        counts: ClassCounts,
        vote: Label,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

impl Node {
    fn leaf(counts: ClassCounts) -> Self {
        Self::Leaf {
            counts,
            vote: counts.majority(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// A single fitted tree of the ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grows a tree over the rows listed in `samples` (indices may repeat).
    ///
    /// `rows` must all have `feature_count` columns and `labels` must be parallel to `rows`.
    pub fn fit<R>(
        rows: &[Vec<f64>],
        labels: &[Label],
        samples: Vec<usize>,
        feature_count: usize,
        params: &ForestParams,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut builder = TreeBuilder {
            rows,
            labels,
            params,
            feature_count,
            features_per_split: ForestParams::features_per_split(feature_count),
            rng,
            nodes: vec![],
        };
        builder.grow(samples, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Predicts the leaf vote for `x`. `x` must have the fitted number of features.
    #[must_use]
    pub fn predict(&self, x: &[f64]) -> Label {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { vote, .. } => return *vote,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => index = if x[*feature] <= *threshold { *left } else { *right },
            }
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Length of the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depths = vec![0; self.nodes.len()];
        let mut max_depth = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            max_depth = max_depth.max(depths[i]);
            if let Node::Split { left, right, .. } = node {
                depths[*left] = depths[i] + 1;
                depths[*right] = depths[i] + 1;
            }
        }
        max_depth
    }

    /// Checks the structural invariants a deserialized tree must uphold before it is walked.
    pub(crate) fn validate(&self, tree: usize, feature_count: usize) -> Result<(), ForestError> {
        if self.nodes.is_empty() {
            return Err(ForestError::CorruptTree { tree, node: 0 });
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                let in_range = |child: usize| child > i && child < self.nodes.len();
                if *feature >= feature_count || !in_range(*left) || !in_range(*right) {
                    return Err(ForestError::CorruptTree { tree, node: i });
                }
            }
        }
        Ok(())
    }
}

struct TreeBuilder<'a, R: ?Sized> {
    rows: &'a [Vec<f64>],
    labels: &'a [Label],
    params: &'a ForestParams,
    feature_count: usize,
    features_per_split: usize,
    rng: &'a mut R,
    nodes: Vec<Node>,
}

impl<R> TreeBuilder<'_, R>
where
    R: Rng + ?Sized,
{
    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = ClassCounts::from_samples(&samples, self.labels);
        let splittable = depth < self.params.max_depth
            && samples.len() >= self.params.min_samples_split
            && !counts.is_pure();
        let split = if splittable {
            self.best_split(&samples, counts)
        } else {
            None
        };
        let Some(split) = split else {
            return self.push(Node::leaf(counts));
        };

        // placeholder, replaced once both children exist
        let index = self.push(Node::leaf(counts));
        let rows = self.rows;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| rows[i][split.feature] <= split.threshold);
        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    fn best_split(&mut self, samples: &[usize], parent: ClassCounts) -> Option<Split> {
        let mut features = (0..self.feature_count).collect::<Vec<_>>();
        features.shuffle(&mut *self.rng);

        let mut best: Option<Split> = None;
        let mut examined = 0;
        let mut column = Vec::with_capacity(samples.len());
        for feature in features {
            if examined >= self.features_per_split {
                break;
            }
            column.clear();
            column.extend(samples.iter().map(|&i| (self.rows[i][feature], self.labels[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let Some(candidate) = best_threshold(&column, parent, feature) else {
                // constant inside this node
                continue;
            };
            examined += 1;
            if best.is_none_or(|b| candidate.impurity < b.impurity) {
                best = Some(candidate);
            }
        }
        best
    }
}

#[expect(clippy::cast_precision_loss)]
fn best_threshold(column: &[(f64, Label)], parent: ClassCounts, feature: usize) -> Option<Split> {
    let n = column.len() as f64;
    let mut left = ClassCounts::default();
    let mut best: Option<Split> = None;
    for pair in column.windows(2) {
        let (value, label) = pair[0];
        let next = pair[1].0;
        left.add(label);
        if next <= value {
            continue;
        }
        let right = ClassCounts {
            alive: parent.alive - left.alive,
            dead: parent.dead - left.dead,
        };
        let impurity =
            (left.total() as f64 * left.gini() + right.total() as f64 * right.gini()) / n;
        if best.is_none_or(|b| impurity < b.impurity) {
            let mut threshold = value / 2.0 + next / 2.0;
            if threshold >= next {
                threshold = value;
            }
            best = Some(Split {
                feature,
                threshold,
                impurity,
            });
        }
    }
    best
}
