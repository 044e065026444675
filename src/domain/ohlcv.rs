//! OHLCV bar representation.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, high - prev_close, prev_close - low)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = self.high - prev_close;
        let lc = prev_close - self.low;
        hl.max(hc).max(lc)
    }

    /// All four prices are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Split a host history into its completed bars and the trailing in-progress bar.
pub fn split_in_progress(history: &[Bar]) -> Option<(&[Bar], &Bar)> {
    history
        .split_last()
        .map(|(in_progress, completed)| (completed, in_progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, 110-100=10, 100-90=10 → 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, 110-70=40, 70-90=-20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=20, 110-130=-20, 130-90=40 → 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nan_price_is_not_finite() {
        let mut bar = sample_bar();
        assert!(bar.is_finite());
        bar.low = f64::NAN;
        assert!(!bar.is_finite());
    }

    #[test]
    fn split_in_progress_takes_last() {
        let mut later = sample_bar();
        later.close = 120.0;
        let history = vec![sample_bar(), later];
        let (completed, in_progress) = split_in_progress(&history).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(in_progress.close, 120.0);
    }

    #[test]
    fn split_in_progress_empty() {
        assert!(split_in_progress(&[]).is_none());
    }
}
