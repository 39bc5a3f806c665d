//! Weight Map and Score Table - Identifier-keyed numeric data in canonical order.
//!
//! Matrix construction is index based, so every keyed collection here keeps
//! the order in which identifiers were supplied at the API boundary.

use serde::{Deserialize, Serialize};

use super::{AnalysisError, PriorityVector};

/// One identifier/value pair of a [`WeightMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: String,
    pub weight: f64,
}

/// Ordered map from a stable identifier to a weight.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap {
    entries: Vec<WeightEntry>,
}

impl WeightMap {
    /// Creates a map from ids and values of equal length.
    pub fn new(ids: &[String], values: &[f64]) -> Result<Self, AnalysisError> {
        if ids.len() != values.len() {
            return Err(AnalysisError::invalid_parameter(
                "weights",
                format!("{} ids but {} values", ids.len(), values.len()),
            ));
        }
        Ok(Self::from_pairs(
            ids.iter().cloned().zip(values.iter().copied()),
        ))
    }

    /// Creates a map from (id, weight) pairs, keeping their order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(id, weight)| WeightEntry { id, weight })
                .collect(),
        }
    }

    /// Labels a priority vector with the ids it was derived for.
    pub fn from_priorities(
        ids: &[String],
        priorities: &PriorityVector,
    ) -> Result<Self, AnalysisError> {
        Self::new(ids, priorities.values())
    }

    /// Returns the weight for an id.
    pub fn get(&self, id: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.weight)
    }

    /// Returns the position of an id in canonical order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &WeightEntry> {
        self.entries.iter()
    }

    /// Ids in canonical order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Weights in canonical order.
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.weight).collect()
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }
}

/// Local scores of each alternative under each criterion.
///
/// Stored criterion-major: row `c` holds every alternative's score under criterion `c`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreTable {
    criteria: Vec<String>,
    alternatives: Vec<String>,
    scores: Vec<Vec<f64>>,
}

impl ScoreTable {
    /// Creates a builder for constructing a score table.
    pub fn builder() -> ScoreTableBuilder {
        ScoreTableBuilder::new()
    }

    /// Creates a table from criterion-major rows.
    pub fn from_rows(
        criteria: Vec<String>,
        alternatives: Vec<String>,
        scores: Vec<Vec<f64>>,
    ) -> Result<Self, AnalysisError> {
        if scores.len() != criteria.len() {
            return Err(AnalysisError::invalid_parameter(
                "scores",
                format!(
                    "{} score rows for {} criteria",
                    scores.len(),
                    criteria.len()
                ),
            ));
        }
        if let Some((index, row)) = scores
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != alternatives.len())
        {
            return Err(AnalysisError::invalid_parameter(
                "scores",
                format!(
                    "criterion '{}' has {} scores for {} alternatives",
                    criteria[index],
                    row.len(),
                    alternatives.len()
                ),
            ));
        }

        Ok(Self {
            criteria,
            alternatives,
            scores,
        })
    }

    pub fn criteria(&self) -> &[String] {
        &self.criteria
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn criterion_count(&self) -> usize {
        self.criteria.len()
    }

    pub fn alternative_count(&self) -> usize {
        self.alternatives.len()
    }

    /// Scores of every alternative under criterion `criterion`.
    pub fn criterion_scores(&self, criterion: usize) -> &[f64] {
        &self.scores[criterion]
    }

    /// Criterion-major rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.scores
    }

    /// Gets a score by criterion and alternative ids.
    pub fn score(&self, criterion_id: &str, alternative_id: &str) -> Option<f64> {
        let c = self.criteria.iter().position(|id| id == criterion_id)?;
        let a = self.alternatives.iter().position(|id| id == alternative_id)?;
        Some(self.scores[c][a])
    }

    /// Weighted totals `Σ_c w_c · s_c[a]` for every alternative.
    ///
    /// `weights` must be in the table's criterion order.
    pub fn weighted_totals(&self, weights: &[f64]) -> Vec<f64> {
        weighted_totals(weights, &self.scores, self.alternatives.len())
    }

    /// Checks that `weights` covers exactly this table's criteria, in order.
    pub fn ensure_aligned(&self, weights: &WeightMap) -> Result<(), AnalysisError> {
        let aligned = weights.len() == self.criteria.len()
            && weights.iter().zip(&self.criteria).all(|(e, id)| &e.id == id);
        if !aligned {
            return Err(AnalysisError::invalid_parameter(
                "weights",
                format!(
                    "weights for {:?} do not match score criteria {:?}",
                    weights.ids(),
                    self.criteria
                ),
            ));
        }
        Ok(())
    }
}

/// Weighted sum of criterion-major score rows.
pub(crate) fn weighted_totals(weights: &[f64], rows: &[Vec<f64>], alternatives: usize) -> Vec<f64> {
    let mut totals = vec![0.0; alternatives];
    for (weight, row) in weights.iter().zip(rows) {
        for (total, score) in totals.iter_mut().zip(row) {
            *total += weight * score;
        }
    }
    totals
}

/// Index of the highest total; the earliest alternative wins ties.
pub(crate) fn top_index(totals: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, value) in totals.iter().enumerate() {
        match best {
            Some(b) if totals[b] >= *value => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Alternative indices ordered from best to worst; ties keep canonical order.
pub(crate) fn ranking(totals: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by(|a, b| totals[*b].total_cmp(&totals[*a]));
    order
}

/// Builder for constructing ScoreTable instances.
#[derive(Debug, Default)]
pub struct ScoreTableBuilder {
    criteria: Vec<String>,
    alternatives: Vec<String>,
    cells: Vec<(String, String, f64)>,
}

impl ScoreTableBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the criteria.
    pub fn criteria(mut self, ids: Vec<impl Into<String>>) -> Self {
        self.criteria = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the alternatives.
    pub fn alternatives(mut self, ids: Vec<impl Into<String>>) -> Self {
        self.alternatives = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets one alternative's score under one criterion.
    pub fn score(
        mut self,
        criterion_id: impl Into<String>,
        alternative_id: impl Into<String>,
        value: f64,
    ) -> Self {
        self.cells
            .push((criterion_id.into(), alternative_id.into(), value));
        self
    }

    /// Sets every alternative's score under one criterion, in alternative order.
    pub fn criterion_scores(mut self, criterion_id: impl Into<String>, values: &[f64]) -> Self {
        let criterion_id = criterion_id.into();
        for (alternative, value) in self.alternatives.clone().into_iter().zip(values) {
            self.cells.push((criterion_id.clone(), alternative, *value));
        }
        self
    }

    /// Builds the table. Missing cells score 0; cells naming unknown ids are rejected.
    pub fn build(self) -> Result<ScoreTable, AnalysisError> {
        let mut scores = vec![vec![0.0; self.alternatives.len()]; self.criteria.len()];

        for (criterion_id, alternative_id, value) in self.cells {
            let c = self
                .criteria
                .iter()
                .position(|id| *id == criterion_id)
                .ok_or_else(|| {
                    AnalysisError::invalid_parameter(
                        "scores",
                        format!("unknown criterion '{}'", criterion_id),
                    )
                })?;
            let a = self
                .alternatives
                .iter()
                .position(|id| *id == alternative_id)
                .ok_or_else(|| {
                    AnalysisError::invalid_parameter(
                        "scores",
                        format!("unknown alternative '{}'", alternative_id),
                    )
                })?;
            scores[c][a] = value;
        }

        ScoreTable::from_rows(self.criteria, self.alternatives, scores)
    }
}
