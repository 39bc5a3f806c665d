//! Comparison Matrix - Reciprocal pairwise-comparison matrix and its builder.

use serde::{Deserialize, Serialize};
use std::ops::Index;

use super::AnalysisError;

/// Smallest judgment on the Saaty scale.
pub const SAATY_MIN: f64 = 1.0 / 9.0;

/// Largest judgment on the Saaty scale.
pub const SAATY_MAX: f64 = 9.0;

/// Allowed deviation of `m[i][j] * m[j][i]` from 1.
pub const RECIPROCAL_TOLERANCE: f64 = 1e-6;

/// An n×n matrix of positive pairwise judgment ratios.
///
/// Stored as a flat row-major buffer. Entries are immutable once built;
/// every transformation produces a new matrix. Serializes as a list of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct ComparisonMatrix {
    size: usize,
    values: Vec<f64>,
}

impl ComparisonMatrix {
    /// Creates an n×n matrix with every entry set to 1 (all elements equally important).
    pub fn identity(size: usize) -> Self {
        Self {
            size,
            values: vec![1.0; size * size],
        }
    }

    /// Creates a matrix from explicit rows.
    ///
    /// Only the shape is checked here. Reciprocity is checked by
    /// [`ComparisonMatrix::validate_reciprocal`] when the caller asks for it.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, AnalysisError> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(AnalysisError::invalid_matrix(format!(
                    "row {} has {} entries, expected {}",
                    index,
                    row.len(),
                    size
                )));
            }
            values.extend(row);
        }

        Ok(Self { size, values })
    }

    /// Builds the perfectly consistent matrix `m[i][j] = w[i] / w[j]`.
    pub fn from_weights(weights: &[f64]) -> Result<Self, AnalysisError> {
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(AnalysisError::invalid_parameter(
                "weights",
                format!("weights must be positive and finite, got {}", bad),
            ));
        }

        Ok(Self::from_fn(weights.len(), |i, j| weights[i] / weights[j]))
    }

    /// Builds a matrix by evaluating `f(row, col)` for every cell.
    pub(crate) fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                values.push(f(i, j));
            }
        }
        Self { size, values }
    }

    /// Returns the dimension n.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if the matrix has no elements.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the entry at (row, col), or None if out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.size && col < self.size {
            Some(self.values[row * self.size + col])
        } else {
            None
        }
    }

    /// Iterates rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.size.max(1))
    }

    /// Copies the matrix into nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(|r| r.to_vec()).collect()
    }

    /// Computes the matrix-vector product `M · v`.
    ///
    /// # Panics
    /// Panics if `vector.len()` differs from the matrix size.
    pub fn multiply(&self, vector: &[f64]) -> Vec<f64> {
        assert_eq!(
            vector.len(),
            self.size,
            "vector length must match matrix size"
        );
        self.rows()
            .map(|row| row.iter().zip(vector).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// Fails with `InvalidMatrix` when the matrix has no elements.
    pub fn require_non_empty(&self) -> Result<(), AnalysisError> {
        if self.is_empty() {
            return Err(AnalysisError::invalid_matrix(
                "matrix size must be positive",
            ));
        }
        Ok(())
    }

    /// Checks that every entry is positive and `m[i][j] * m[j][i] ≈ 1`.
    ///
    /// The diagonal is covered by the same rule (`m[i][i]² ≈ 1`).
    pub fn validate_reciprocal(&self) -> Result<(), AnalysisError> {
        if let Some(bad) = self.values.iter().find(|v| !v.is_finite() || **v <= 0.0) {
            return Err(AnalysisError::invalid_matrix(format!(
                "entries must be positive and finite, found {}",
                bad
            )));
        }

        for row in 0..self.size {
            for col in row..self.size {
                let value = self[(row, col)];
                let reciprocal = self[(col, row)];
                let product = value * reciprocal;
                if (product - 1.0).abs() > RECIPROCAL_TOLERANCE {
                    return Err(AnalysisError::ReciprocalViolation {
                        row,
                        col,
                        value,
                        reciprocal,
                        product,
                    });
                }
            }
        }

        Ok(())
    }
}

impl Index<(usize, usize)> for ComparisonMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(
            row < self.size && col < self.size,
            "index ({}, {}) out of bounds for size {}",
            row,
            col,
            self.size
        );
        &self.values[row * self.size + col]
    }
}

impl TryFrom<Vec<Vec<f64>>> for ComparisonMatrix {
    type Error = AnalysisError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<ComparisonMatrix> for Vec<Vec<f64>> {
    fn from(matrix: ComparisonMatrix) -> Self {
        matrix.to_rows()
    }
}

/// A single pairwise judgment: element `row` is `value` times as important as element `col`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl Judgment {
    /// Creates a new judgment.
    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self { row, col, value }
    }
}

/// Builder assembling a reciprocal comparison matrix from sparse judgments.
///
/// Unspecified pairs stay neutral (1). Judgments referring to unknown
/// elements, the diagonal, or non-positive values are skipped. When the same
/// pair is judged more than once the last judgment wins.
#[derive(Debug, Clone, Default)]
pub struct MatrixBuilder {
    elements: Vec<String>,
    judgments: Vec<Judgment>,
}

impl MatrixBuilder {
    /// Creates a builder for the given ordered elements.
    pub fn new(elements: Vec<impl Into<String>>) -> Self {
        Self {
            elements: elements.into_iter().map(Into::into).collect(),
            judgments: Vec::new(),
        }
    }

    /// Builds a matrix directly from elements and index-based judgments.
    pub fn build_from(elements: &[String], judgments: &[Judgment]) -> ComparisonMatrix {
        Self {
            elements: elements.to_vec(),
            judgments: judgments.to_vec(),
        }
        .build()
    }

    /// Returns the ordered elements.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Adds an index-based judgment.
    pub fn judgment(mut self, row: usize, col: usize, value: f64) -> Self {
        self.judgments.push(Judgment::new(row, col, value));
        self
    }

    /// Adds several index-based judgments.
    pub fn judgments(mut self, judgments: impl IntoIterator<Item = Judgment>) -> Self {
        self.judgments.extend(judgments);
        self
    }

    /// Adds a judgment addressed by element id.
    pub fn judge(self, preferred: &str, other: &str, value: f64) -> Self {
        let row = self.position(preferred);
        let col = self.position(other);
        match (row, col) {
            (Some(row), Some(col)) => self.judgment(row, col, value),
            _ => self,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e == id)
    }

    /// Builds the comparison matrix.
    pub fn build(&self) -> ComparisonMatrix {
        let size = self.elements.len();
        let mut values = vec![1.0; size * size];

        for judgment in &self.judgments {
            let Judgment { row, col, value } = *judgment;
            if row >= size || col >= size || row == col {
                continue;
            }
            if !value.is_finite() || value <= 0.0 {
                continue;
            }
            values[row * size + col] = value;
            values[col * size + row] = 1.0 / value;
        }

        ComparisonMatrix { size, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements() -> Vec<&'static str> {
        vec!["cost", "quality", "speed"]
    }

    #[test]
    fn builder_without_judgments_is_neutral() {
        let matrix = MatrixBuilder::new(elements()).build();
        assert_eq!(matrix.size(), 3);
        assert!(matrix.rows().flatten().all(|v| *v == 1.0));
    }

    #[test]
    fn builder_sets_value_and_reciprocal() {
        let matrix = MatrixBuilder::new(elements()).judgment(0, 2, 5.0).build();
        assert_eq!(matrix[(0, 2)], 5.0);
        assert!((matrix[(2, 0)] - 0.2).abs() < 1e-12);
        assert_eq!(matrix[(1, 1)], 1.0);
    }

    #[test]
    fn builder_ignores_out_of_range_and_diagonal() {
        let matrix = MatrixBuilder::new(elements())
            .judgment(0, 7, 3.0)
            .judgment(9, 1, 3.0)
            .judgment(1, 1, 4.0)
            .build();
        assert_eq!(matrix, ComparisonMatrix::identity(3));
    }

    #[test]
    fn builder_ignores_non_positive_values() {
        let matrix = MatrixBuilder::new(elements())
            .judgment(0, 1, 0.0)
            .judgment(0, 2, -3.0)
            .judgment(1, 2, f64::NAN)
            .build();
        assert_eq!(matrix, ComparisonMatrix::identity(3));
    }

    #[test]
    fn builder_last_write_wins() {
        let matrix = MatrixBuilder::new(elements())
            .judgment(0, 1, 3.0)
            .judgment(1, 0, 4.0)
            .build();
        assert_eq!(matrix[(1, 0)], 4.0);
        assert!((matrix[(0, 1)] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn builder_resolves_ids() {
        let matrix = MatrixBuilder::new(elements())
            .judge("quality", "cost", 3.0)
            .judge("quality", "unknown", 9.0)
            .build();
        assert_eq!(matrix[(1, 0)], 3.0);
        assert!(matrix.validate_reciprocal().is_ok());
    }

    #[test]
    fn build_from_matches_builder() {
        let ids: Vec<String> = elements().into_iter().map(String::from).collect();
        let judgments = [Judgment::new(0, 1, 3.0), Judgment::new(1, 2, 2.0)];
        let direct = MatrixBuilder::build_from(&ids, &judgments);
        let chained = MatrixBuilder::new(elements()).judgments(judgments).build();
        assert_eq!(direct, chained);
    }

    #[test]
    fn from_rows_rejects_non_square() {
        let err = ComparisonMatrix::from_rows(vec![vec![1.0, 2.0], vec![0.5]]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidMatrix { .. }));
    }

    #[test]
    fn from_rows_accepts_empty() {
        let matrix = ComparisonMatrix::from_rows(vec![]).unwrap();
        assert!(matrix.is_empty());
        assert!(matrix.require_non_empty().is_err());
        assert_eq!(matrix.rows().count(), 0);
    }

    #[test]
    fn validate_reciprocal_detects_violation() {
        let matrix =
            ComparisonMatrix::from_rows(vec![vec![1.0, 3.0], vec![0.5, 1.0]]).unwrap();
        match matrix.validate_reciprocal() {
            Err(AnalysisError::ReciprocalViolation { row, col, .. }) => {
                assert_eq!((row, col), (0, 1));
            }
            other => panic!("expected reciprocal violation, got {:?}", other),
        }
    }

    #[test]
    fn validate_reciprocal_tolerates_rounding() {
        let matrix = ComparisonMatrix::from_rows(vec![
            vec![1.0, 3.0],
            vec![0.333_333_333, 1.0],
        ])
        .unwrap();
        assert!(matrix.validate_reciprocal().is_ok());
    }

    #[test]
    fn validate_reciprocal_rejects_non_positive_entries() {
        let matrix =
            ComparisonMatrix::from_rows(vec![vec![1.0, -2.0], vec![-0.5, 1.0]]).unwrap();
        assert!(matches!(
            matrix.validate_reciprocal(),
            Err(AnalysisError::InvalidMatrix { .. })
        ));
    }

    #[test]
    fn from_weights_is_consistent() {
        let matrix = ComparisonMatrix::from_weights(&[0.5, 0.3, 0.2]).unwrap();
        assert!((matrix[(0, 1)] - 0.5 / 0.3).abs() < 1e-12);
        assert!(matrix.validate_reciprocal().is_ok());
        assert!(ComparisonMatrix::from_weights(&[0.5, 0.0]).is_err());
    }

    #[test]
    fn multiply_computes_product() {
        let matrix =
            ComparisonMatrix::from_rows(vec![vec![1.0, 2.0], vec![0.5, 1.0]]).unwrap();
        assert_eq!(matrix.multiply(&[1.0, 1.0]), vec![3.0, 1.5]);
    }

    #[test]
    fn get_is_bounds_checked() {
        let matrix = ComparisonMatrix::identity(2);
        assert_eq!(matrix.get(1, 1), Some(1.0));
        assert_eq!(matrix.get(2, 0), None);
    }

    #[test]
    fn matrix_serializes_as_rows() {
        let matrix = MatrixBuilder::new(vec!["a", "b"]).judgment(0, 1, 2.0).build();
        let json = serde_json::to_string(&matrix).unwrap();
        assert_eq!(json, "[[1.0,2.0],[0.5,1.0]]");

        let restored: ComparisonMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, matrix);
        assert!(serde_json::from_str::<ComparisonMatrix>("[[1.0,2.0]]").is_err());
    }
}
