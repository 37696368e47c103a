//! Top-K ranking of class scores.
//!
//! Scores are converted to percentages rounded to two decimals. Classes with
//! exactly equal scores are ordered by ascending taxonomy index.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::taxonomy::Taxonomy;
use crate::utils::error::{PlantVillageError, Result};
use crate::utils::round2;

/// Number of predictions in every prediction set
pub const TOP_K: usize = 5;

/// One ranked class. `class` and `index` always name the same taxonomy entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class: String,
    /// Percentage in `[0, 100]`, two decimals
    pub confidence: f64,
    pub index: usize,
}

impl Prediction {
    /// Build a prediction for a taxonomy index, rounding the confidence
    pub fn new(taxonomy: &Taxonomy, index: usize, confidence: f64) -> Result<Self> {
        let class = taxonomy.class_name(index).ok_or_else(|| {
            PlantVillageError::Ranking(format!(
                "class index {} outside taxonomy of {} classes",
                index,
                taxonomy.len()
            ))
        })?;

        Ok(Self {
            class: class.to_string(),
            confidence: round2(confidence),
            index,
        })
    }
}

/// Ordered set of exactly [`TOP_K`] predictions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionSet(Vec<Prediction>);

impl PredictionSet {
    /// Wrap ranked predictions, enforcing the set size
    pub fn new(predictions: Vec<Prediction>) -> Result<Self> {
        if predictions.len() != TOP_K {
            return Err(PlantVillageError::Ranking(format!(
                "expected {} predictions, got {}",
                TOP_K,
                predictions.len()
            )));
        }
        Ok(Self(predictions))
    }

    /// Highest-ranked prediction
    pub fn top(&self) -> &Prediction {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[Prediction] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.0.iter()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.0.iter().map(|p| p.index).collect()
    }

    pub fn confidences(&self) -> Vec<f64> {
        self.0.iter().map(|p| p.confidence).collect()
    }
}

/// Descending score, ascending index on ties
fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

/// Select the `TOP_K` highest-scoring classes of a probability vector
pub fn top_k(probabilities: &[f32], taxonomy: &Taxonomy) -> Result<PredictionSet> {
    if probabilities.len() != taxonomy.len() {
        return Err(PlantVillageError::Ranking(format!(
            "model produced {} scores but the taxonomy has {} classes",
            probabilities.len(),
            taxonomy.len()
        )));
    }
    if taxonomy.len() < TOP_K {
        return Err(PlantVillageError::Ranking(format!(
            "taxonomy has {} classes, need at least {}",
            taxonomy.len(),
            TOP_K
        )));
    }
    if let Some((index, score)) = probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite())
    {
        return Err(PlantVillageError::Ranking(format!(
            "non-finite score {} for class index {}",
            score, index
        )));
    }

    let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    indexed.sort_by(rank_order);

    let predictions = indexed
        .into_iter()
        .take(TOP_K)
        .map(|(index, score)| Prediction::new(taxonomy, index, score as f64 * 100.0))
        .collect::<Result<Vec<_>>>()?;

    PredictionSet::new(predictions)
}
