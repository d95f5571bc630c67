//! Clustering of fingerprint matrices into named entity groups.
//!
//! The engine itself is a seam: anything that maps a numeric matrix to
//! 1-based integer labels qualifies. The default implementation wraps the
//! k-means estimator from `aprender`. Engines are passed explicitly so tests
//! and callers can substitute their own.

use aprender::cluster::KMeans;
use aprender::primitives::Matrix;
use aprender::traits::UnsupervisedEstimator;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::fingerprint::FingerprintStack;

/// Maps rows of a feature matrix to 1-based cluster labels.
pub trait ClusterEngine {
    /// Returns one label per input row; labels start at 1.
    fn cluster(&self, features: &DMatrix<f64>, k: usize) -> Result<Vec<usize>, AppError>;
}

/// K-means engine backed by `aprender`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KMeansEngine;

impl ClusterEngine for KMeansEngine {
    fn cluster(&self, features: &DMatrix<f64>, k: usize) -> Result<Vec<usize>, AppError> {
        if k == 0 {
            return Err(AppError::invalid_input("Cluster count must be >= 1."));
        }
        if features.nrows() < k {
            return Err(AppError::insufficient_data(format!(
                "Cannot form {k} clusters from {} rows.",
                features.nrows()
            )));
        }

        let (rows, cols) = (features.nrows(), features.ncols());
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(features[(i, j)] as f32);
            }
        }
        let matrix = Matrix::from_vec(rows, cols, data)
            .map_err(|e| AppError::internal(format!("Feature matrix conversion failed: {e:?}")))?;

        let mut kmeans = KMeans::new(k);
        kmeans
            .fit(&matrix)
            .map_err(|e| AppError::internal(format!("K-means fit failed: {e:?}")))?;
        let labels = kmeans.predict(&matrix);

        Ok(labels.into_iter().map(|l| l + 1).collect())
    }
}

/// A named group of entities sharing a cluster label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterGroup {
    pub label: usize,
    pub members: Vec<String>,
}

/// Cluster a fingerprint stack and partition its row names into groups.
///
/// The stack must be uniform (see [`FingerprintStack::to_matrix`]). A label
/// array that does not line up with the rows, or a partition that loses or
/// duplicates entities, indicates a broken engine and fails fast.
pub fn group_entities(
    stack: &FingerprintStack,
    engine: &dyn ClusterEngine,
    k: usize,
) -> Result<Vec<ClusterGroup>, AppError> {
    let features = stack.to_matrix()?;
    let labels = engine.cluster(&features, k)?;

    if labels.len() != stack.len() {
        return Err(AppError::internal(format!(
            "Cluster engine returned {} labels for {} rows.",
            labels.len(),
            stack.len()
        )));
    }

    let mut groups: Vec<ClusterGroup> = Vec::new();
    for (row, &label) in stack.rows.iter().zip(labels.iter()) {
        if label == 0 {
            return Err(AppError::internal(format!(
                "Cluster engine produced a 0 label for '{}'; labels are 1-based.",
                row.name
            )));
        }
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.members.push(row.name.clone()),
            None => groups.push(ClusterGroup {
                label,
                members: vec![row.name.clone()],
            }),
        }
    }
    groups.sort_by_key(|g| g.label);

    let assigned: usize = groups.iter().map(|g| g.members.len()).sum();
    if assigned != stack.len() {
        return Err(AppError::internal(format!(
            "Partition assigned {assigned} of {} entities.",
            stack.len()
        )));
    }

    tracing::info!(k, groups = groups.len(), entities = assigned, "clustered fingerprints");
    Ok(groups)
}
