//! Stock status classification.

use serde::Serialize;

/// Derived stock-level bucket. Recomputed on every query, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockStatus {
    Critical,
    Low,
    Sufficient,
}

/// Classification thresholds. Boundaries are closed: a measure exactly at
/// the threshold belongs to the lower bucket.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub critical: f64,
    pub low: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical: 5.0,
            low: 20.0,
        }
    }
}

/// Classify a measure (quantity or monetary amount) against the thresholds.
pub fn classify(measure: f64, thresholds: &Thresholds) -> StockStatus {
    if measure <= thresholds.critical {
        StockStatus::Critical
    } else if measure <= thresholds.low {
        StockStatus::Low
    } else {
        StockStatus::Sufficient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_closed() {
        let t = Thresholds::default();
        assert_eq!(classify(5.0, &t), StockStatus::Critical);
        assert_eq!(classify(20.0, &t), StockStatus::Low);
        assert_eq!(classify(21.0, &t), StockStatus::Sufficient);
    }

    #[test]
    fn below_and_above() {
        let t = Thresholds::default();
        assert_eq!(classify(0.0, &t), StockStatus::Critical);
        assert_eq!(classify(5.1, &t), StockStatus::Low);
        assert_eq!(classify(1000.0, &t), StockStatus::Sufficient);
    }

    #[test]
    fn custom_thresholds() {
        let t = Thresholds {
            critical: 1.0,
            low: 2.0,
        };
        assert_eq!(classify(1.5, &t), StockStatus::Low);
        assert_eq!(classify(3.0, &t), StockStatus::Sufficient);
    }
}
