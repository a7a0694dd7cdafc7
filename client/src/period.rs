//! Process-wide period selection state.
//!
//! Holds the currently selected (month, year) and the last summary fetched
//! for it. Switching periods drives which cache bucket the endpoints read.
//! Summary refreshes are token-guarded the same way cache fetches are, so a
//! late response for an abandoned period never overwrites a newer one.

use shared::{FullSummary, Period};

/// Proof that a summary refresh was started; redeemed with
/// [`PeriodContext::apply_summary`] when the response arrives.
#[derive(Debug)]
pub struct SummaryToken {
    period: Period,
    generation: u64,
}

impl SummaryToken {
    pub fn period(&self) -> Period {
        self.period
    }
}

/// Currently selected period plus its fetched summary.
#[derive(Debug)]
pub struct PeriodContext {
    selected: Period,
    summary: Option<FullSummary>,
    years: Vec<i32>,
    generation: u64,
}

impl PeriodContext {
    pub fn new(initial: Period) -> Self {
        Self {
            selected: initial,
            summary: None,
            years: Vec::new(),
            generation: 0,
        }
    }

    pub fn selected(&self) -> Period {
        self.selected
    }

    pub fn summary(&self) -> Option<&FullSummary> {
        self.summary.as_ref()
    }

    /// Years with any data, as reported by summaries seen so far.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Switch the selected period. The stale summary is dropped and any
    /// in-flight refresh is superseded.
    pub fn select(&mut self, period: Period) {
        if period == self.selected {
            return;
        }
        self.selected = period;
        self.summary = None;
        self.generation += 1;
    }

    /// Record that a summary refresh for the selected period is starting.
    pub fn begin_refresh(&mut self) -> SummaryToken {
        self.generation += 1;
        SummaryToken {
            period: self.selected,
            generation: self.generation,
        }
    }

    /// Store a fetched summary if its token is still current. Returns
    /// whether it was applied; a response for a superseded refresh (the
    /// user already switched periods) is dropped.
    pub fn apply_summary(&mut self, token: &SummaryToken, summary: FullSummary) -> bool {
        if token.generation != self.generation {
            return false;
        }
        for year in &summary.years {
            if !self.years.contains(year) {
                self.years.push(*year);
            }
        }
        self.years.sort_unstable();
        self.summary = Some(summary);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(total_incomes: f64, years: Vec<i32>) -> FullSummary {
        FullSummary {
            total_incomes,
            total_expenses: 0.0,
            total_commitments: 0.0,
            received_incomes: 0.0,
            paid_commitments: 0.0,
            accumulated_balance: 0.0,
            years,
        }
    }

    #[test]
    fn test_apply_summary_with_current_token() {
        let mut context = PeriodContext::new(Period::new(1, 2026));
        let token = context.begin_refresh();

        assert!(context.apply_summary(&token, summary(100.0, vec![2026])));
        assert_eq!(context.summary().unwrap().total_incomes, 100.0);
        assert_eq!(context.years(), &[2026]);
    }

    #[test]
    fn test_stale_summary_is_dropped_after_period_switch() {
        let mut context = PeriodContext::new(Period::new(1, 2026));
        let token = context.begin_refresh();
        context.select(Period::new(2, 2026));

        assert!(!context.apply_summary(&token, summary(100.0, vec![2026])));
        assert!(context.summary().is_none());
    }

    #[test]
    fn test_newer_refresh_supersedes_older_one() {
        let mut context = PeriodContext::new(Period::new(1, 2026));
        let old_token = context.begin_refresh();
        let new_token = context.begin_refresh();

        assert!(context.apply_summary(&new_token, summary(200.0, vec![])));
        assert!(!context.apply_summary(&old_token, summary(100.0, vec![])));
        assert_eq!(context.summary().unwrap().total_incomes, 200.0);
    }

    #[test]
    fn test_reselecting_same_period_keeps_summary() {
        let mut context = PeriodContext::new(Period::new(1, 2026));
        let token = context.begin_refresh();
        context.apply_summary(&token, summary(100.0, vec![2026]));

        context.select(Period::new(1, 2026));
        assert!(context.summary().is_some());
    }

    #[test]
    fn test_years_accumulate_without_duplicates() {
        let mut context = PeriodContext::new(Period::new(1, 2026));
        let token = context.begin_refresh();
        context.apply_summary(&token, summary(1.0, vec![2026, 2025]));
        let token = context.begin_refresh();
        context.apply_summary(&token, summary(2.0, vec![2026, 2024]));

        assert_eq!(context.years(), &[2024, 2025, 2026]);
    }
}
