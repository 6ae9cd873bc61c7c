//! Isolation tree node implementation
//!
//! Nodes live in a flat array inside their tree and refer to children by
//! index, which keeps a whole forest serializable as plain JSON.

use serde::{Deserialize, Serialize};

use crate::{average_path_length, MLError, MLResult, Sample};

/// Node type in the isolation tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeType {
    /// Internal node with split condition
    Internal {
        /// Feature index to split on
        feature: u8,
        /// Values strictly below go left
        split_value: f64,
        /// Left child index
        left: u32,
        /// Right child index
        right: u32,
    },
    /// Leaf node (external)
    External {
        /// Number of training samples that reached this leaf
        size: u32,
    },
}

/// Tree node with its depth from the root
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node type and data
    pub node_type: NodeType,
    /// Path length from root
    pub depth: u8,
}

impl Node {
    /// Create an internal node
    pub fn internal(feature: u8, split_value: f64, left: u32, right: u32, depth: u8) -> Self {
        Self {
            node_type: NodeType::Internal {
                feature,
                split_value,
                left,
                right,
            },
            depth,
        }
    }

    /// Create an external (leaf) node
    pub fn external(size: u32, depth: u8) -> Self {
        Self {
            node_type: NodeType::External { size },
            depth,
        }
    }

    /// Check if node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self.node_type, NodeType::External { .. })
    }

    /// Path length credited to a sample ending at this node
    ///
    /// Leaves add `c(size)` for the subtree that was never grown.
    pub fn path_length(&self) -> f64 {
        match self.node_type {
            NodeType::External { size } => self.depth as f64 + average_path_length(size as usize),
            NodeType::Internal { .. } => self.depth as f64,
        }
    }

    /// Child index to visit next
    pub fn traverse(&self, sample: &Sample) -> MLResult<u32> {
        match self.node_type {
            NodeType::Internal { feature, split_value, left, right } => {
                let value = sample.get_feature(feature as usize).ok_or(MLError::DimensionMismatch {
                    expected: feature as usize + 1,
                    actual: sample.num_features,
                })?;

                if value < split_value {
                    Ok(left)
                } else {
                    Ok(right)
                }
            }
            NodeType::External { .. } => Err(MLError::InvalidConfig("Cannot traverse from leaf node")),
        }
    }
}
