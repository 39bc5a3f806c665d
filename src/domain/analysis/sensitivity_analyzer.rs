//! Sensitivity Analyzer - One-at-a-time weight perturbation and rank reversal.
//!
//! Each criterion's weight is swept across `[w·(1−r), w·(1+r)]` (clamped to
//! `[0.01, 0.99]`) while the other weights are rescaled proportionally. The
//! sweep yields a tornado ordering by impact and the exact weights at which
//! the leading alternative changes.

use serde::{Deserialize, Serialize};

use super::weights::{ranking, top_index, weighted_totals};
use super::{AnalysisError, ScoreTable, WeightMap};

/// Lowest weight a criterion is swept down to.
pub const MIN_SWEEP_WEIGHT: f64 = 0.01;

/// Highest weight a criterion is swept up to.
pub const MAX_SWEEP_WEIGHT: f64 = 0.99;

fn default_variation_range() -> f64 {
    0.5
}

fn default_scan_steps() -> usize {
    100
}

fn default_bisection_tolerance() -> f64 {
    0.001
}

fn default_max_bisection_steps() -> usize {
    50
}

/// Sensitivity sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    /// Relative variation applied to each base weight.
    #[serde(default = "default_variation_range")]
    pub variation_range: f64,

    /// Equally spaced weights scanned per criterion (endpoints included).
    #[serde(default = "default_scan_steps")]
    pub scan_steps: usize,

    /// Bisection stops once the bracket is narrower than this.
    #[serde(default = "default_bisection_tolerance")]
    pub bisection_tolerance: f64,

    #[serde(default = "default_max_bisection_steps")]
    pub max_bisection_steps: usize,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            variation_range: default_variation_range(),
            scan_steps: default_scan_steps(),
            bisection_tolerance: default_bisection_tolerance(),
            max_bisection_steps: default_max_bisection_steps(),
        }
    }
}

impl SensitivityConfig {
    /// Checks every setting is inside its usable domain.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.variation_range.is_finite() || self.variation_range <= 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "variation_range",
                format!("must be positive, got {}", self.variation_range),
            ));
        }
        if self.scan_steps < 2 {
            return Err(AnalysisError::invalid_parameter(
                "scan_steps",
                format!("must be at least 2, got {}", self.scan_steps),
            ));
        }
        if !self.bisection_tolerance.is_finite() || self.bisection_tolerance <= 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "bisection_tolerance",
                format!("must be positive, got {}", self.bisection_tolerance),
            ));
        }
        if self.max_bisection_steps == 0 {
            return Err(AnalysisError::invalid_parameter(
                "max_bisection_steps",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// A weight at which the leading alternative changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalPoint {
    pub weight: f64,
    pub from_alternative: String,
    pub to_alternative: String,
}

/// Sweep outcome for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityEntry {
    pub criterion_id: String,
    pub base_weight: f64,
    pub weight_low: f64,
    /// Never below `weight_low`; a zero base weight sweeps the single point 0.01.
    pub weight_high: f64,
    /// Base leader's total score at `weight_low`.
    pub low_score: f64,
    /// Base leader's total score at `weight_high`.
    pub high_score: f64,
    pub impact_range: f64,
    pub has_rank_reversal: bool,
    pub reversal_points: Vec<ReversalPoint>,
}

/// An alternative's position under the base weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAlternative {
    pub alternative_id: String,
    pub score: f64,
    /// 1-based rank.
    pub rank: usize,
}

/// Tornado-ordered sensitivity entries plus the base ranking they perturb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    /// Sorted by `impact_range`, largest first.
    pub entries: Vec<SensitivityEntry>,
    pub base_ranking: Vec<RankedAlternative>,
}

impl SensitivityReport {
    pub fn most_sensitive(&self) -> Option<&SensitivityEntry> {
        self.entries.first()
    }

    pub fn least_sensitive(&self) -> Option<&SensitivityEntry> {
        self.entries.last()
    }

    /// Base leader, if there are any alternatives.
    pub fn top_alternative(&self) -> Option<&str> {
        self.base_ranking.first().map(|r| r.alternative_id.as_str())
    }

    /// Fraction of criteria whose sweep never changes the leader.
    ///
    /// `None` when there are no entries.
    pub fn stable_fraction(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let stable = self.entries.iter().filter(|e| !e.has_rank_reversal).count();
        Some(stable as f64 / self.entries.len() as f64)
    }
}

/// One-at-a-time sensitivity analysis.
#[derive(Debug, Clone, Default)]
pub struct SensitivityAnalyzer {
    config: SensitivityConfig,
}

impl SensitivityAnalyzer {
    pub fn new(config: SensitivityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SensitivityConfig {
        &self.config
    }

    /// Sweeps every criterion and returns the tornado-ordered report.
    ///
    /// # Errors
    /// `InvalidParameter` if the config is unusable or `weights` does not
    /// cover the table's criteria in order.
    pub fn analyze(
        &self,
        weights: &WeightMap,
        scores: &ScoreTable,
    ) -> Result<SensitivityReport, AnalysisError> {
        self.config.validate()?;
        scores.ensure_aligned(weights)?;

        let base = weights.values();
        let base_totals = scores.weighted_totals(&base);
        let base_top = top_index(&base_totals);

        let base_ranking = ranking(&base_totals)
            .into_iter()
            .enumerate()
            .map(|(position, index)| RankedAlternative {
                alternative_id: scores.alternatives()[index].clone(),
                score: base_totals[index],
                rank: position + 1,
            })
            .collect();

        let mut entries: Vec<SensitivityEntry> = scores
            .criteria()
            .iter()
            .enumerate()
            .map(|(c, id)| self.sweep(&base, c, id, base_top, scores))
            .collect();
        entries.sort_by(|a, b| b.impact_range.total_cmp(&a.impact_range));

        Ok(SensitivityReport {
            entries,
            base_ranking,
        })
    }

    fn sweep(
        &self,
        base: &[f64],
        criterion: usize,
        criterion_id: &str,
        base_top: Option<usize>,
        scores: &ScoreTable,
    ) -> SensitivityEntry {
        let base_weight = base[criterion];
        let r = self.config.variation_range;
        let weight_low = (base_weight * (1.0 - r)).max(MIN_SWEEP_WEIGHT);
        let weight_high = (base_weight * (1.0 + r))
            .min(MAX_SWEEP_WEIGHT)
            .max(weight_low);

        let totals_at = |target: f64| -> Vec<f64> {
            let adjusted = adjust_values(base, criterion, target);
            weighted_totals(&adjusted, scores.rows(), scores.alternative_count())
        };
        let leader_at = |target: f64| top_index(&totals_at(target));

        let (low_score, high_score) = match base_top {
            Some(top) => (totals_at(weight_low)[top], totals_at(weight_high)[top]),
            None => (0.0, 0.0),
        };

        let mut reversal_points = Vec::new();
        let steps = self.config.scan_steps;
        let step = (weight_high - weight_low) / (steps - 1) as f64;
        let mut previous_weight = weight_low;
        let mut previous_leader = leader_at(weight_low);

        for k in 1..steps {
            let weight = weight_low + step * k as f64;
            let leader = leader_at(weight);
            if leader != previous_leader {
                if let (Some(from), Some(to)) = (previous_leader, leader) {
                    let crossing = self.bisect(previous_weight, weight, previous_leader, &leader_at);
                    reversal_points.push(ReversalPoint {
                        weight: crossing,
                        from_alternative: scores.alternatives()[from].clone(),
                        to_alternative: scores.alternatives()[to].clone(),
                    });
                }
            }
            previous_weight = weight;
            previous_leader = leader;
        }

        SensitivityEntry {
            criterion_id: criterion_id.to_string(),
            base_weight,
            weight_low,
            weight_high,
            low_score,
            high_score,
            impact_range: (high_score - low_score).abs(),
            has_rank_reversal: !reversal_points.is_empty(),
            reversal_points,
        }
    }

    /// Narrows `[lo, hi]` around the weight where the leader stops being `lo_leader`.
    fn bisect(
        &self,
        mut lo: f64,
        mut hi: f64,
        lo_leader: Option<usize>,
        leader_at: &impl Fn(f64) -> Option<usize>,
    ) -> f64 {
        let mut steps = 0;
        while steps < self.config.max_bisection_steps
            && (hi - lo).abs() >= self.config.bisection_tolerance
        {
            let mid = (lo + hi) / 2.0;
            if leader_at(mid) == lo_leader {
                lo = mid;
            } else {
                hi = mid;
            }
            steps += 1;
        }
        (lo + hi) / 2.0
    }

    /// Sets `criterion_id` to `target` and rescales the others to sum to `1 − target`.
    ///
    /// The others are left at 0 when they summed to 0 or `target ≥ 1`.
    ///
    /// # Errors
    /// `InvalidParameter` if `criterion_id` is not in `weights`.
    pub fn adjust_weights(
        weights: &WeightMap,
        criterion_id: &str,
        target: f64,
    ) -> Result<WeightMap, AnalysisError> {
        let index = weights.position(criterion_id).ok_or_else(|| {
            AnalysisError::invalid_parameter(
                "criterion_id",
                format!("unknown criterion '{}'", criterion_id),
            )
        })?;
        let adjusted = adjust_values(&weights.values(), index, target);
        WeightMap::new(&weights.ids(), &adjusted)
    }
}

fn adjust_values(weights: &[f64], index: usize, target: f64) -> Vec<f64> {
    let others: f64 = weights
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, w)| w)
        .sum();
    let scale = if others <= 0.0 || target >= 1.0 {
        0.0
    } else {
        (1.0 - target) / others
    };

    weights
        .iter()
        .enumerate()
        .map(|(i, w)| if i == index { target } else { w * scale })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn crossing_table() -> ScoreTable {
        ScoreTable::builder()
            .criteria(vec!["c1", "c2"])
            .alternatives(vec!["A", "B"])
            .criterion_scores("c1", &[0.8, 0.2])
            .criterion_scores("c2", &[0.2, 0.8])
            .build()
            .unwrap()
    }

    #[test]
    fn default_config_values() {
        let config = SensitivityConfig::default();
        assert_eq!(config.variation_range, 0.5);
        assert_eq!(config.scan_steps, 100);
        assert_eq!(config.bisection_tolerance, 0.001);
        assert_eq!(config.max_bisection_steps, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_bad_values() {
        let config = SensitivityConfig {
            scan_steps: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SensitivityConfig {
            variation_range: -0.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn adjust_weights_rescales_others() {
        let weights = WeightMap::new(&ids(&["a", "b", "c"]), &[0.5, 0.3, 0.2]).unwrap();
        let adjusted = SensitivityAnalyzer::adjust_weights(&weights, "a", 0.8).unwrap();

        assert_eq!(adjusted.get("a"), Some(0.8));
        assert!((adjusted.get("b").unwrap() - 0.12).abs() < 1e-12);
        assert!((adjusted.get("c").unwrap() - 0.08).abs() < 1e-12);
        assert!((adjusted.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn adjust_weights_leaves_zero_remainder_at_zero() {
        let weights = WeightMap::new(&ids(&["a", "b"]), &[1.0, 0.0]).unwrap();
        let adjusted = SensitivityAnalyzer::adjust_weights(&weights, "a", 0.4).unwrap();
        assert_eq!(adjusted.values(), vec![0.4, 0.0]);

        let weights = WeightMap::new(&ids(&["a", "b"]), &[0.5, 0.5]).unwrap();
        let adjusted = SensitivityAnalyzer::adjust_weights(&weights, "a", 1.0).unwrap();
        assert_eq!(adjusted.values(), vec![1.0, 0.0]);
    }

    #[test]
    fn adjust_weights_rejects_unknown_criterion() {
        let weights = WeightMap::new(&ids(&["a"]), &[1.0]).unwrap();
        assert!(SensitivityAnalyzer::adjust_weights(&weights, "zzz", 0.5).is_err());
    }

    #[test]
    fn detects_reversal_between_sweep_bounds() {
        let weights = WeightMap::new(&ids(&["c1", "c2"]), &[0.6, 0.4]).unwrap();
        let report = SensitivityAnalyzer::default()
            .analyze(&weights, &crossing_table())
            .unwrap();

        let c1 = report
            .entries
            .iter()
            .find(|e| e.criterion_id == "c1")
            .unwrap();
        assert!(c1.has_rank_reversal);
        let point = &c1.reversal_points[0];
        assert!(point.weight > c1.weight_low && point.weight < c1.weight_high);
        assert!((point.weight - 0.5).abs() < 0.002);
        assert_eq!(point.from_alternative, "B");
        assert_eq!(point.to_alternative, "A");
    }

    #[test]
    fn zero_weight_criterion_sweeps_a_single_point() {
        let weights = WeightMap::new(&ids(&["c1", "c2"]), &[0.0, 1.0]).unwrap();
        let report = SensitivityAnalyzer::default()
            .analyze(&weights, &crossing_table())
            .unwrap();

        let c1 = report
            .entries
            .iter()
            .find(|e| e.criterion_id == "c1")
            .unwrap();
        assert_eq!(c1.weight_low, MIN_SWEEP_WEIGHT);
        assert_eq!(c1.weight_high, c1.weight_low);
        assert_eq!(c1.impact_range, 0.0);
        assert!(!c1.has_rank_reversal);
    }

    #[test]
    fn sweep_bounds_are_clamped() {
        let weights = WeightMap::new(&ids(&["c1", "c2"]), &[0.9, 0.1]).unwrap();
        let report = SensitivityAnalyzer::default()
            .analyze(&weights, &crossing_table())
            .unwrap();
        let c1 = report
            .entries
            .iter()
            .find(|e| e.criterion_id == "c1")
            .unwrap();
        assert!((c1.weight_low - 0.45).abs() < 1e-12);
        assert_eq!(c1.weight_high, MAX_SWEEP_WEIGHT);

        let c2 = report
            .entries
            .iter()
            .find(|e| e.criterion_id == "c2")
            .unwrap();
        assert!((c2.weight_low - 0.05).abs() < 1e-12);
    }

    #[test]
    fn entries_sorted_by_impact() {
        let table = ScoreTable::builder()
            .criteria(vec!["cost", "quality", "speed"])
            .alternatives(vec!["A", "B"])
            .criterion_scores("cost", &[0.9, 0.1])
            .criterion_scores("quality", &[0.5, 0.5])
            .criterion_scores("speed", &[0.6, 0.4])
            .build()
            .unwrap();
        let weights =
            WeightMap::new(&ids(&["cost", "quality", "speed"]), &[0.5, 0.3, 0.2]).unwrap();

        let report = SensitivityAnalyzer::default().analyze(&weights, &table).unwrap();
        let impacts: Vec<f64> = report.entries.iter().map(|e| e.impact_range).collect();

        assert!(impacts.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(report.most_sensitive().unwrap().criterion_id, "cost");
        assert_eq!(report.top_alternative(), Some("A"));
        assert_eq!(report.base_ranking[1].rank, 2);
        assert_eq!(report.stable_fraction(), Some(1.0));
    }

    #[test]
    fn no_reversal_when_leader_dominates() {
        let table = ScoreTable::builder()
            .criteria(vec!["c1", "c2"])
            .alternatives(vec!["A", "B"])
            .criterion_scores("c1", &[0.9, 0.1])
            .criterion_scores("c2", &[0.7, 0.3])
            .build()
            .unwrap();
        let weights = WeightMap::new(&ids(&["c1", "c2"]), &[0.5, 0.5]).unwrap();

        let report = SensitivityAnalyzer::default().analyze(&weights, &table).unwrap();
        assert!(report.entries.iter().all(|e| !e.has_rank_reversal));
    }

    #[test]
    fn misaligned_weights_are_rejected() {
        let weights = WeightMap::new(&ids(&["c2", "c1"]), &[0.5, 0.5]).unwrap();
        let result = SensitivityAnalyzer::default().analyze(&weights, &crossing_table());
        assert!(matches!(result, Err(AnalysisError::InvalidParameter { .. })));
    }

    #[test]
    fn empty_alternatives_produce_flat_entries() {
        let table = ScoreTable::builder()
            .criteria(vec!["c1"])
            .alternatives(Vec::<String>::new())
            .build()
            .unwrap();
        let weights = WeightMap::new(&ids(&["c1"]), &[1.0]).unwrap();

        let report = SensitivityAnalyzer::default().analyze(&weights, &table).unwrap();
        assert_eq!(report.entries[0].impact_range, 0.0);
        assert!(report.top_alternative().is_none());
    }
}
