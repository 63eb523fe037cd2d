//! Greedy binary decision tree grown by Gini-impurity reduction.
//!
//! Nodes live in a flat arena and refer to their children by index, so
//! growing, walking and predicting never recurse. Split search shares one
//! counter with progress reporting: every candidate threshold examined costs
//! one unit of `parameters.iterations`, and once the budget is spent no
//! further node is split.

use serde::{Deserialize, Serialize};

use crate::data::{DataPoint, Feature, Parameters};
use crate::error::{SimError, ensure_not_empty};
use crate::training::callbacks::{ProgressReporter, ProgressTracker};
use crate::training::metrics::{gini_impurity, majority_label};

/// Hard ceiling on tree depth regardless of budget.
pub const MAX_DEPTH_CAP: usize = 10;

/// Subsets this small always become leaves.
pub const MIN_SPLIT_SIZE: usize = 5;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    Leaf {
        prediction: u8,
        depth: usize,
    },
    Split {
        feature: Feature,
        threshold: f64,
        left: NodeId,
        right: NodeId,
        depth: usize,
    },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { depth, .. } | Self::Split { depth, .. } => *depth,
        }
    }
}

/// A fitted tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> usize {
        self.leaves().map(|(_, depth)| depth).max().unwrap_or(0)
    }

    /// `(prediction, depth)` of every leaf, left to right.
    pub fn leaves(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.preorder().filter_map(move |id| match self.nodes[id] {
            TreeNode::Leaf { prediction, depth } => Some((prediction, depth)),
            TreeNode::Split { .. } => None,
        })
    }

    /// Node ids in root, left, right order.
    pub fn preorder(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = if self.nodes.is_empty() { vec![] } else { vec![0] };
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            if let TreeNode::Split { left, right, .. } = self.nodes[id] {
                stack.push(right);
                stack.push(left);
            }
            Some(id)
        })
    }

    /// Descend from the root: `value <= threshold` goes left.
    pub fn predict(&self, point: &DataPoint) -> u8 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                TreeNode::Leaf { prediction, .. } => return prediction,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    id = if point.feature(feature) <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Split segments clipped to `bounds` and to every ancestor's split.
    pub fn boundaries(&self, bounds: Bounds) -> Vec<Boundary> {
        let mut out = Vec::new();
        let mut stack = vec![(0, bounds)];
        while let Some((id, region)) = stack.pop() {
            let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
                depth,
            } = self.nodes[id]
            else {
                continue;
            };
            let (left_region, right_region) = match feature {
                Feature::X => {
                    out.push(Boundary::Vertical {
                        x: threshold,
                        y_min: region.y_min,
                        y_max: region.y_max,
                        depth,
                    });
                    (
                        Bounds {
                            x_max: threshold,
                            ..region
                        },
                        Bounds {
                            x_min: threshold,
                            ..region
                        },
                    )
                }
                Feature::Y => {
                    out.push(Boundary::Horizontal {
                        y: threshold,
                        x_min: region.x_min,
                        x_max: region.x_max,
                        depth,
                    });
                    (
                        Bounds {
                            y_max: threshold,
                            ..region
                        },
                        Bounds {
                            y_min: threshold,
                            ..region
                        },
                    )
                }
            };
            stack.push((right, right_region));
            stack.push((left, left_region));
        }
        out
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn of(data: &[DataPoint]) -> Self {
        data.iter().fold(
            Self {
                x_min: f64::INFINITY,
                x_max: f64::NEG_INFINITY,
                y_min: f64::INFINITY,
                y_max: f64::NEG_INFINITY,
            },
            |b, p| Self {
                x_min: b.x_min.min(p.x),
                x_max: b.x_max.max(p.x),
                y_min: b.y_min.min(p.y),
                y_max: b.y_max.max(p.y),
            },
        )
    }
}

/// One drawn split line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Boundary {
    Vertical {
        x: f64,
        y_min: f64,
        y_max: f64,
        depth: usize,
    },
    Horizontal {
        y: f64,
        x_min: f64,
        x_max: f64,
        depth: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeResult {
    pub accuracy: f64,
    pub depth: usize,
    pub nodes: usize,
    /// Mean Gini impurity over leaves, each leaf scored on every point that
    /// shares its predicted label.
    pub gini: f64,
    pub boundaries: Vec<Boundary>,
    pub predictions: Vec<u8>,
    pub tree: DecisionTree,
}

/// `min(10, iterations / 10)`.
pub fn max_depth_for(iterations: usize) -> usize {
    MAX_DEPTH_CAP.min(iterations / 10)
}

struct Pending {
    id: NodeId,
    indices: Vec<usize>,
    depth: usize,
}

struct Candidate {
    feature: Feature,
    threshold: f64,
    gain: f64,
}

struct Grower<'d, 'p> {
    data: &'d [DataPoint],
    max_depth: usize,
    regularization: f64,
    budget: usize,
    spent: usize,
    progress: ProgressTracker<'p>,
}

impl Grower<'_, '_> {
    async fn spend(&mut self) {
        self.spent += 1;
        // A split search already under way may run past the budget; progress
        // stays within it.
        if self.spent <= self.budget && (self.spent % 5 == 0 || self.spent == self.budget) {
            self.progress.report(self.spent).await;
        }
    }

    fn labels(&self, indices: &[usize]) -> Vec<u8> {
        indices.iter().map(|&i| self.data[i].target()).collect()
    }

    fn is_leaf(&self, task: &Pending, labels: &[u8]) -> bool {
        task.depth >= self.max_depth
            || labels.iter().all(|&l| Some(&l) == labels.first())
            || task.indices.len() <= MIN_SPLIT_SIZE
            || self.spent >= self.budget
    }

    async fn best_split(&mut self, indices: &[usize], labels: &[u8]) -> Option<Candidate> {
        let parent = gini_impurity(labels.iter().copied());
        let total = indices.len() as f64;
        let min_side = (total * self.regularization).floor() as usize;
        let mut best: Option<Candidate> = None;

        for feature in Feature::ALL {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| {
                self.data[a]
                    .feature(feature)
                    .total_cmp(&self.data[b].feature(feature))
            });

            for pos in 0..sorted.len().saturating_sub(1) {
                self.spend().await;

                let current = self.data[sorted[pos]].feature(feature);
                let next = self.data[sorted[pos + 1]].feature(feature);
                if current == next {
                    continue;
                }

                let (left, right) = sorted.split_at(pos + 1);
                if left.len() < min_side || right.len() < min_side {
                    continue;
                }

                let weighted = left.len() as f64 / total
                    * gini_impurity(left.iter().map(|&i| self.data[i].target()))
                    + right.len() as f64 / total
                        * gini_impurity(right.iter().map(|&i| self.data[i].target()));
                let gain = parent - weighted;

                if best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(Candidate {
                        feature,
                        threshold: (current + next) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }

    async fn grow(mut self) -> DecisionTree {
        let root = Pending {
            id: 0,
            indices: (0..self.data.len()).collect(),
            depth: 0,
        };
        let mut nodes = vec![TreeNode::Leaf {
            prediction: 0,
            depth: 0,
        }];
        let mut stack = vec![root];
        let mut exhausted = false;

        while let Some(task) = stack.pop() {
            let labels = self.labels(&task.indices);
            let leaf = TreeNode::Leaf {
                prediction: majority_label(labels.iter().copied()),
                depth: task.depth,
            };

            if self.is_leaf(&task, &labels) {
                if self.spent >= self.budget && !exhausted {
                    exhausted = true;
                    tracing::debug!(spent = self.spent, "split budget exhausted");
                }
                nodes[task.id] = leaf;
                continue;
            }

            let split = match self.best_split(&task.indices, &labels).await {
                Some(candidate) if candidate.gain > 0.0 => candidate,
                _ => {
                    nodes[task.id] = leaf;
                    continue;
                }
            };

            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = task
                .indices
                .iter()
                .partition(|&&i| self.data[i].feature(split.feature) <= split.threshold);
            if left_indices.is_empty() || right_indices.is_empty() {
                nodes[task.id] = leaf;
                continue;
            }

            let left = nodes.len();
            let right = left + 1;
            nodes.push(leaf);
            nodes.push(leaf);
            nodes[task.id] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
                depth: task.depth,
            };
            stack.push(Pending {
                id: right,
                indices: right_indices,
                depth: task.depth + 1,
            });
            stack.push(Pending {
                id: left,
                indices: left_indices,
                depth: task.depth + 1,
            });
        }

        while self.spent < self.budget {
            self.spend().await;
        }

        DecisionTree { nodes }
    }
}

/// Grow a tree over `data` and score it on the same points.
///
/// Depth is capped at `min(10, iterations / 10)` and every candidate
/// threshold costs one unit of the `iterations` budget. A split is rejected
/// when either side would hold fewer than `floor(size * regularization)`
/// points.
#[tracing::instrument(skip_all, fields(points = data.len(), iterations = params.iterations))]
pub async fn train(
    data: &[DataPoint],
    params: &Parameters,
    reporter: &mut dyn ProgressReporter,
) -> Result<DecisionTreeResult, SimError> {
    ensure_not_empty(data)?;
    let grower = Grower {
        data,
        max_depth: max_depth_for(params.iterations),
        regularization: params.regularization,
        budget: params.iterations,
        spent: 0,
        progress: ProgressTracker::new(reporter),
    };
    let tree = grower.grow().await;

    let predictions: Vec<u8> = data.iter().map(|p| tree.predict(p)).collect();
    let correct = data
        .iter()
        .zip(&predictions)
        .filter(|(p, predicted)| p.target() == **predicted)
        .count();
    let accuracy = correct as f64 / data.len() as f64;
    let gini = leaf_gini(&tree, data, &predictions);
    let boundaries = tree.boundaries(Bounds::of(data));

    tracing::info!(
        accuracy,
        depth = tree.depth(),
        nodes = tree.node_count(),
        "decision tree finished"
    );

    Ok(DecisionTreeResult {
        accuracy,
        depth: tree.depth(),
        nodes: tree.node_count(),
        gini,
        boundaries,
        predictions,
        tree,
    })
}

fn leaf_gini(tree: &DecisionTree, data: &[DataPoint], predictions: &[u8]) -> f64 {
    let group_gini = |label: u8| {
        gini_impurity(
            data.iter()
                .zip(predictions)
                .filter(|(_, predicted)| **predicted == label)
                .map(|(p, _)| p.target()),
        )
    };
    let (total, count) = tree
        .leaves()
        .fold((0.0, 0usize), |(total, count), (prediction, _)| {
            (total + group_gini(prediction), count + 1)
        });
    if count == 0 { 0.0 } else { total / count as f64 }
}
