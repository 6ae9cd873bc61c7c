//! Isolation tree implementation
//!
//! Trees are grown by recursively choosing a random feature and a uniform
//! random split between that feature's min and max, until a node holds a
//! single sample, all of its samples are identical, or the height limit is
//! reached.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{MLError, MLResult, Node, NodeType, Sample};

/// Isolation tree stored as a flat node array, root at index 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    /// Grow a tree on the given samples
    pub fn fit<R: Rng>(samples: &[Sample], max_depth: usize, rng: &mut R) -> MLResult<Self> {
        crate::common_width(samples)?;

        let mut tree = Self::default();
        tree.build(samples.to_vec(), 0, max_depth, rng)?;
        Ok(tree)
    }

    /// Build tree recursively, returning the index of the subtree root
    fn build<R: Rng>(
        &mut self,
        samples: Vec<Sample>,
        depth: u8,
        max_depth: usize,
        rng: &mut R,
    ) -> MLResult<u32> {
        let node_index = self.nodes.len() as u32;

        // Reserve the slot as a leaf, replaced below if the node splits
        self.nodes.push(Node::external(samples.len() as u32, depth));

        if depth as usize >= max_depth || samples.len() <= 1 {
            return Ok(node_index);
        }

        let Some((feature, split_value)) = Self::select_split(&samples, rng) else {
            return Ok(node_index);
        };

        let (left, right): (Vec<Sample>, Vec<Sample>) = samples
            .into_iter()
            .partition(|s| s.features[feature as usize] < split_value);

        // A split drawn exactly at the minimum isolates nothing
        if left.is_empty() || right.is_empty() {
            if let Some(node) = self.nodes.get_mut(node_index as usize) {
                *node = Node::external((left.len() + right.len()) as u32, depth);
            }
            return Ok(node_index);
        }

        let left_index = self.build(left, depth + 1, max_depth, rng)?;
        let right_index = self.build(right, depth + 1, max_depth, rng)?;

        let node = self
            .nodes
            .get_mut(node_index as usize)
            .ok_or(MLError::InvalidConfig("Tree node slot vanished during build"))?;
        *node = Node::internal(feature, split_value, left_index, right_index, depth);

        Ok(node_index)
    }

    /// Random feature among those that still vary, and a split inside its range
    ///
    /// `None` when every sample is identical on every feature.
    fn select_split<R: Rng>(samples: &[Sample], rng: &mut R) -> Option<(u8, f64)> {
        let num_features = samples[0].num_features;

        let candidates: Vec<(usize, f64, f64)> = (0..num_features)
            .filter_map(|feature| {
                let (min, max) = Self::feature_range(samples, feature);
                (max > min && (max - min).is_finite()).then_some((feature, min, max))
            })
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
        Some((feature as u8, rng.gen_range(min..max)))
    }

    /// Get min/max range for a feature
    fn feature_range(samples: &[Sample], feature: usize) -> (f64, f64) {
        samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), s| {
            let value = s.features[feature];
            (min.min(value), max.max(value))
        })
    }

    /// Path length for a sample, including the leaf's subtree estimate
    pub fn path_length(&self, sample: &Sample) -> MLResult<f64> {
        let mut current = self.nodes.first().ok_or(MLError::InsufficientData)?;

        loop {
            match current.node_type {
                NodeType::External { .. } => return Ok(current.path_length()),
                NodeType::Internal { .. } => {
                    let next = current.traverse(sample)?;
                    current = self
                        .nodes
                        .get(next as usize)
                        .ok_or(MLError::IncompatibleArtifact(format!("dangling child index {}", next)))?;
                }
            }
        }
    }

    /// Get the number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node depth
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth as usize).max().unwrap_or(0)
    }

    /// Nodes in storage order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_samples() -> Vec<Sample> {
        vec![
            Sample::new(&[20.0, 50.0, 1013.0]).unwrap(),
            Sample::new(&[22.0, 55.0, 1012.0]).unwrap(),
            Sample::new(&[21.0, 52.0, 1014.0]).unwrap(),
            Sample::new(&[19.0, 48.0, 1013.0]).unwrap(),
            // Anomaly
            Sample::new(&[35.0, 90.0, 1000.0]).unwrap(),
        ]
    }

    #[test]
    fn test_tree_fit() {
        let mut rng = StdRng::seed_from_u64(123);
        let tree = IsolationTree::fit(&create_test_samples(), 5, &mut rng).unwrap();

        assert!(tree.node_count() > 1);
        assert!(tree.depth() <= 5);
        assert!(!tree.nodes()[0].is_leaf());
    }

    #[test]
    fn leaves_account_for_every_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = create_test_samples();
        let tree = IsolationTree::fit(&samples, 8, &mut rng).unwrap();

        let total: u32 = tree
            .nodes()
            .iter()
            .filter_map(|n| match n.node_type {
                NodeType::External { size } => Some(size),
                NodeType::Internal { .. } => None,
            })
            .sum();
        assert_eq!(total as usize, samples.len());
    }

    #[test]
    fn identical_samples_make_a_leaf() {
        let mut rng = StdRng::seed_from_u64(1);
        let samples = vec![Sample::new(&[1.0, 1.0]).unwrap(); 6];
        let tree = IsolationTree::fit(&samples, 8, &mut rng).unwrap();

        assert_eq!(tree.node_count(), 1);
        let path = tree.path_length(&samples[0]).unwrap();
        assert!((path - crate::average_path_length(6)).abs() < 1e-12);
    }

    #[test]
    fn height_limit_respected() {
        let mut rng = StdRng::seed_from_u64(3);
        let samples: Vec<Sample> = (0..64).map(|i| Sample::new(&[i as f64]).unwrap()).collect();
        let tree = IsolationTree::fit(&samples, 3, &mut rng).unwrap();
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_path_length() {
        let samples = create_test_samples();
        let anomaly = Sample::new(&[35.0, 90.0, 1000.0]).unwrap();
        let normal = Sample::new(&[20.5, 51.0, 1013.0]).unwrap();

        // Averaged over many trees the outlier isolates faster
        let (mut anomaly_total, mut normal_total) = (0.0, 0.0);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let tree = IsolationTree::fit(&samples, 8, &mut rng).unwrap();
            anomaly_total += tree.path_length(&anomaly).unwrap();
            normal_total += tree.path_length(&normal).unwrap();
        }
        assert!(anomaly_total < normal_total);
    }

    #[test]
    fn empty_tree_cannot_score() {
        let tree = IsolationTree::default();
        let sample = Sample::new(&[1.0]).unwrap();
        assert!(matches!(tree.path_length(&sample), Err(MLError::InsufficientData)));
    }
}
