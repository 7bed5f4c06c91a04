use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::schema::{MonthlyRollupPoint, PaymentDirection};
use crate::sources::{DateWindow, PaymentTotals};
use crate::utils::{month_label, month_span, month_window, prev_month_start};
use chrono::NaiveDate;
use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, info};
use std::sync::Arc;

/// Month-by-month income, outcome and profit over a date span.
#[derive(Clone)]
pub struct RollupEngine {
    totals: Arc<dyn PaymentTotals>,
    month_label_format: String,
    concurrency: usize,
}

impl RollupEngine {
    pub fn new(totals: Arc<dyn PaymentTotals>, config: &AggregatorConfig) -> Self {
        Self {
            totals,
            month_label_format: config.month_label_format.clone(),
            concurrency: config.rollup_concurrency.max(1),
        }
    }

    /// Calendar-month windows walked backward from `to`, newest first.
    ///
    /// The count is the absolute month distance plus one, and the walk always
    /// starts at `to`, so a range with `from` after `to` reaches back past `to`
    /// instead of forward to `from`.
    pub fn month_windows(from: NaiveDate, to: NaiveDate) -> Result<Vec<DateWindow>> {
        let iterations = month_span(from, to) as usize + 1;
        let mut windows = Vec::with_capacity(iterations);
        let mut cursor = to;

        for _ in 0..iterations {
            let (start, end) = month_window(cursor)?;
            windows.push(DateWindow { start, end });
            cursor = prev_month_start(cursor)?;
        }
        Ok(windows)
    }

    /// Oldest-first rollup points. Either date missing yields an empty result.
    pub async fn rollup(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        customer_ids: &[i64],
    ) -> Result<Vec<MonthlyRollupPoint>> {
        let (from, to) = match (from, to) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                debug!("Rollup requested without both dates; returning no points");
                return Ok(Vec::new());
            }
        };

        let windows = Self::month_windows(from, to)?;
        info!(
            "Computing {} monthly rollup points from {} back to {} for {} customer(s)",
            windows.len(),
            to,
            from,
            if customer_ids.is_empty() {
                "all".to_string()
            } else {
                customer_ids.len().to_string()
            }
        );

        // `buffered` yields in input order, so the accumulator stays newest first.
        let mut points: Vec<MonthlyRollupPoint> = stream::iter(windows)
            .map(|window| self.point(window, customer_ids))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        points.reverse();
        Ok(points)
    }

    async fn point(&self, window: DateWindow, customer_ids: &[i64]) -> Result<MonthlyRollupPoint> {
        let total_incomes = self
            .totals
            .total(PaymentDirection::Income, window, customer_ids)
            .await?;
        let total_outcomes = self
            .totals
            .total(PaymentDirection::Outcome, window, customer_ids)
            .await?;

        debug!(
            "Month {}..{}: income {:.2}, outcome {:.2}",
            window.start, window.end, total_incomes, total_outcomes
        );

        Ok(MonthlyRollupPoint {
            month_label: month_label(window.start, &self.month_label_format),
            total_incomes,
            total_outcomes,
            total_profit: total_incomes - total_outcomes,
        })
    }
}
