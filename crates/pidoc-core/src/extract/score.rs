//! Candidate scoring and selection.
//!
//! Every candidate gets a score in [0, 1]: the weighted fraction of
//! evidence it captured. Weights are tunable through
//! [`ExtractionConfig`]; the defaults put most mass on clean position
//! rows because a wrong product table is costlier to fix by hand than
//! a missing header field.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::record::{ParseCandidate, RawPosition, Strategy};

use super::rules::patterns::INVOICE_NO_STRUCTURED;
use super::rules::{parse_amount, parse_date};

/// Prefixes of tokens that are column debris masquerading as a product
/// code: tax numbers and manufacture/expiry date fragments.
const CODE_DEBRIS_PREFIXES: &[&str] = &["TIN", "GST", "MFG", "EXP"];

/// Score attached to one strategy's candidate during selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub strategy: Strategy,
    pub score: f32,
}

pub struct CandidateScorer {
    config: ExtractionConfig,
}

impl CandidateScorer {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Score one candidate in [0, 1].
    pub fn score(&self, candidate: &ParseCandidate) -> f32 {
        let w = &self.config.weights;
        let total = w.total();
        if total == 0.0 {
            return 0.0;
        }

        let mut earned = 0.0f32;
        if !candidate.invoice_no.is_empty() {
            // A well-shaped number earns full weight, anything else half.
            earned += if INVOICE_NO_STRUCTURED.is_match(&candidate.invoice_no) {
                w.invoice_no
            } else {
                w.invoice_no * 0.5
            };
        }
        if parse_date(&candidate.invoice_date).is_some() {
            earned += w.invoice_date;
        }
        if !candidate.buyer_name.is_empty() {
            earned += w.buyer_name;
        }
        if !candidate.terms_of_delivery.is_empty() {
            earned += w.terms_of_delivery;
        }

        if !candidate.positions.is_empty() {
            earned += w.has_positions;
            let n = candidate.positions.len() as f32;
            let tolerance = f64::from(self.config.price_tolerance);
            let clean = candidate.positions.iter().filter(|p| is_clean_row(p)).count() as f32;
            let consistent = candidate
                .positions
                .iter()
                .filter(|p| is_consistent_row(p, tolerance))
                .count() as f32;
            // Above the clean-row threshold the block earns its full
            // weight; below it the weight scales down linearly.
            let clean_fraction = clean / n;
            earned += if clean_fraction >= self.config.min_clean_row_fraction {
                w.clean_rows
            } else {
                w.clean_rows * clean_fraction
            };
            earned += w.consistency * (consistent / n);
        }

        (earned / total).clamp(0.0, 1.0)
    }

    /// Pick the best candidate. On a tie the native strategy wins
    /// because its text needed no recognition step. When every score
    /// is zero an empty candidate is returned so the caller can offer
    /// a blank form.
    pub fn select(
        &self,
        candidates: Vec<ParseCandidate>,
    ) -> (ParseCandidate, Vec<ScoredCandidate>) {
        let scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|c| ScoredCandidate {
                strategy: c.strategy,
                score: self.score(c),
            })
            .collect();
        for s in &scored {
            debug!("candidate {:?} scored {:.3}", s.strategy, s.score);
        }

        let mut best: Option<(usize, f32)> = None;
        for (idx, s) in scored.iter().enumerate() {
            let wins = match best {
                None => true,
                Some((best_idx, best_score)) => {
                    s.score > best_score
                        || (s.score == best_score
                            && s.strategy == Strategy::Native
                            && candidates[best_idx].strategy != Strategy::Native)
                }
            };
            if wins {
                best = Some((idx, s.score));
            }
        }

        match best {
            Some((idx, score)) if score > 0.0 => (candidates[idx].clone(), scored),
            _ => (ParseCandidate::empty(Strategy::Native), scored),
        }
    }
}

/// A clean row names its product, and its numeric columns all parse.
fn is_clean_row(row: &RawPosition) -> bool {
    let identified = !row.name_en.is_empty() || (!row.code.is_empty() && !is_code_debris(&row.code));
    identified
        && parse_amount(&row.quantity).is_some()
        && parse_amount(&row.unit_price).is_some()
        && parse_amount(&row.total_price).is_some()
}

fn is_code_debris(code: &str) -> bool {
    let upper = code.to_uppercase();
    code.contains(' ') || CODE_DEBRIS_PREFIXES.iter().any(|p| upper.starts_with(p))
}

/// quantity * unit price lands within tolerance of the row total.
fn is_consistent_row(row: &RawPosition, tolerance: f64) -> bool {
    let (Some(qty), Some(unit), Some(total)) = (
        parse_amount(&row.quantity),
        parse_amount(&row.unit_price),
        parse_amount(&row.total_price),
    ) else {
        return false;
    };
    if total == Decimal::ZERO {
        return false;
    }
    let expected = qty * unit;
    let diff = (expected - total).abs() / total.abs();
    diff.to_f64().is_some_and(|d| d <= tolerance)
}
