//! Tree-ensemble classifier loaded from a JSON export
//!
//! The artifact lists the training columns, the class labels, and one node
//! array per tree. A split sends a sample left when `x[feature] <= threshold`.
//! A leaf holds per-class counts (or weights); each tree's leaf is normalized
//! and the ensemble averages them, as an extra-trees forest does.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    pub classes: Vec<i64>,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Model(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Reject artifacts that would index out of bounds or loop
    fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(Error::Model("no classes".into()));
        }
        if self.trees.is_empty() {
            return Err(Error::Model("no trees".into()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(Error::Model(format!("tree {} has no nodes", t)));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= self.feature_names.len() {
                            return Err(Error::Model(format!(
                                "tree {} node {} splits on unknown feature {}",
                                t, i, feature
                            )));
                        }
                        // Children must come later, which also rules out cycles
                        for child in [left, right] {
                            if *child <= i || *child >= tree.nodes.len() {
                                return Err(Error::Model(format!(
                                    "tree {} node {} has invalid child {}",
                                    t, i, child
                                )));
                            }
                        }
                    }
                    Node::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return Err(Error::Model(format!(
                                "tree {} leaf {} has {} values for {} classes",
                                t,
                                i,
                                value.len(),
                                self.classes.len()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Column index of a feature name
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|f| f == name)
    }

    /// Mean class distribution over all trees
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.n_features() {
            return Err(Error::Model(format!(
                "expected {} features, got {}",
                self.n_features(),
                features.len()
            )));
        }

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = Self::leaf(tree, features);
            let total: f64 = leaf.iter().sum();
            if total > 0.0 {
                for (p, v) in proba.iter_mut().zip(leaf) {
                    *p += v / total;
                }
            }
        }

        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        Ok(proba)
    }

    /// Class label with the highest mean probability; ties go to the first
    pub fn predict(&self, features: &[f64]) -> Result<i64> {
        let proba = self.predict_proba(features)?;
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        Ok(self.classes[best])
    }

    fn leaf<'a>(tree: &'a Tree, features: &[f64]) -> &'a [f64] {
        let mut idx = 0;
        loop {
            match &tree.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}
