//! Edge weights of a fully connected neighborhood graph.
//!
//! This is the graph construction step of random-walk spatial outlier
//! scoring: every object is connected to every other object, and the edge
//! from `i` to `j` is weighted by how much the objects' attribute values
//! differ relative to how close they are in space.
//!
//! Note: the weight uses `exp(|a_i - a_j|^alpha)`, not its inverse as in
//! the published formulation.

use tracing::warn;

use proxdb_core::{DbId, NumberVector, Relation};
use proxdb_vector::query::select_k_nearest;
use proxdb_vector::{DistanceQuery, Neighbor};

use crate::error::{Error, Result};

/// Column-normalized edge weights plus the k nearest neighbors of every object.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeWeights {
    ids: Vec<DbId>,
    matrix: Vec<Vec<f64>>,
    neighbors: Vec<Vec<Neighbor>>,
}

impl EdgeWeights {
    /// Object identifiers in matrix order.
    #[must_use]
    pub fn ids(&self) -> &[DbId] {
        &self.ids
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the graph has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Weight of the edge from object `col` to object `row`, by matrix position.
    #[must_use]
    pub fn weight(&self, row: usize, col: usize) -> Option<f64> {
        self.matrix.get(row)?.get(col).copied()
    }

    /// The weights of all edges leaving object `col`.
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.matrix.iter().filter_map(move |row| row.get(col).copied())
    }

    /// The k nearest other objects of the object at matrix position `i`.
    #[must_use]
    pub fn neighbors(&self, i: usize) -> Option<&[Neighbor]> {
        self.neighbors.get(i).map(Vec::as_slice)
    }

    /// The matrix position of `id`.
    #[must_use]
    pub fn position(&self, id: DbId) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }
}

/// Compute the edge weights between all objects of `attributes`.
///
/// `distances` measures spatial closeness; `attributes` supplies the value
/// compared between objects (the first component of each vector). For
/// `i != j` the weight `E[j][i]` is `exp(|a_i - a_j|^alpha) / dist(i, j)`;
/// each column is then divided by its sum. A zero distance contributes a
/// weight of 0 and is logged.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `k` is 0, `alpha` is not finite, or an
///   attribute vector is empty
/// - [`Error::NotFound`] if an attribute object is missing from the spatial relation
pub fn exhaustive_edge_weights(
    distances: &dyn DistanceQuery,
    attributes: &Relation<NumberVector>,
    alpha: f64,
    k: usize,
) -> Result<EdgeWeights> {
    if k == 0 {
        return Err(Error::invalid_argument("k must be at least 1"));
    }
    if !alpha.is_finite() {
        return Err(Error::invalid_argument(format!("alpha must be finite, got {alpha}")));
    }

    let ids: Vec<DbId> = attributes.ids().collect();
    let values = ids
        .iter()
        .map(|&id| {
            attributes
                .get(id)?
                .get(0)
                .ok_or_else(|| Error::invalid_argument(format!("attribute of {id} is empty")))
        })
        .collect::<Result<Vec<f64>>>()?;

    let n = ids.len();
    let mut matrix = vec![vec![0.0; n]; n];
    let mut neighbors = Vec::with_capacity(n);

    for (i, &id) in ids.iter().enumerate() {
        let mut candidates = Vec::with_capacity(n.saturating_sub(1));
        for (j, &other) in ids.iter().enumerate() {
            if i == j {
                continue;
            }
            let dist = distances.distance(id, other)?;
            candidates.push(Neighbor::new(other, dist));
            matrix[j][i] = if dist == 0.0 {
                warn!(%id, %other, "zero distance in edge weighting, using weight 0");
                0.0
            } else {
                (values[i] - values[j]).abs().powf(alpha).exp() / dist
            };
        }
        neighbors.push(select_k_nearest(candidates.into_iter().map(Ok), k)?);
    }

    for i in 0..n {
        let sum: f64 = matrix.iter().map(|row| row[i]).sum();
        let sum = if sum == 0.0 { 1.0 } else { sum };
        for row in &mut matrix {
            row[i] /= sum;
        }
    }

    Ok(EdgeWeights { ids, matrix, neighbors })
}
