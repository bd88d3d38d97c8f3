use std::collections::BTreeSet;

use serde::Serialize;

use super::model::CellValue;
use super::view::FilteredView;

/// Shown in place of an aggregate that is undefined for an empty view.
pub const NO_DATA: &str = "no data";

// ---------------------------------------------------------------------------
// Summary – scalar aggregates over the filtered view
// ---------------------------------------------------------------------------

/// Aggregates over a [`FilteredView`]. Means are `None` when there is no
/// defined value to average, never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// Distinct non-missing customer identifiers.
    pub total_customers: usize,
    pub avg_income: Option<f64>,
    pub avg_spending_score: Option<f64>,
    pub avg_family_size: Option<f64>,
}

impl Summary {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let total_customers = view
            .iter()
            .map(|c| &c.id)
            .filter(|id| !id.is_null())
            .map(CellValue::identity_key)
            .collect::<BTreeSet<CellValue>>()
            .len();

        Summary {
            total_customers,
            avg_income: mean(view.iter().map(|c| c.annual_income)),
            avg_spending_score: mean(view.iter().map(|c| c.spending_score)),
            avg_family_size: mean(view.iter().map(|c| c.family_size)),
        }
    }

    /// True when no aggregate could be computed.
    pub fn is_empty(&self) -> bool {
        self.total_customers == 0
            && self.avg_income.is_none()
            && self.avg_spending_score.is_none()
            && self.avg_family_size.is_none()
    }

    /// Display strings for the KPI cards and the report.
    pub fn formatted(&self) -> FormattedSummary {
        FormattedSummary {
            total_customers: self.total_customers.to_string(),
            avg_income: self.avg_income.map_or_else(|| NO_DATA.to_string(), format_currency),
            avg_score: self
                .avg_spending_score
                .map_or_else(|| NO_DATA.to_string(), |v| format!("{v:.1}")),
            avg_family: self
                .avg_family_size
                .map_or_else(|| NO_DATA.to_string(), |v| format!("{v:.1}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedSummary {
    pub total_customers: String,
    pub avg_income: String,
    pub avg_score: String,
    pub avg_family: String,
}

/// Mean of the defined values, skipping missing ones.
fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// `$1,234,567.89`
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilterSelection;
    use crate::data::model::fixtures::{customer, dataset};
    use crate::data::view::render;

    #[test]
    fn empty_view_has_undefined_means() {
        let ds = dataset(vec![customer(1, "M", 30.0, "Artist")]);
        let (view, summary) = render(&ds, &FilterSelection::none());
        assert!(view.is_empty());
        assert_eq!(summary.total_customers, 0);
        assert_eq!(summary.avg_income, None);
        assert_eq!(summary.avg_spending_score, None);
        assert_eq!(summary.avg_family_size, None);
        assert!(summary.is_empty());

        let text = summary.formatted();
        assert_eq!(text.total_customers, "0");
        assert_eq!(text.avg_income, NO_DATA);
        assert_eq!(text.avg_score, NO_DATA);
        assert_eq!(text.avg_family, NO_DATA);
    }

    #[test]
    fn means_skip_missing_values_and_ids_are_distinct() {
        let mut a = customer(1, "M", 30.0, "Artist");
        let mut b = customer(2, "M", 30.0, "Artist");
        let mut c = customer(3, "M", 30.0, "Artist");
        b.id = a.id.clone();
        c.annual_income = None;
        a.family_size = Some(2.0);
        b.family_size = Some(3.0);
        c.family_size = Some(7.0);
        let ds = dataset(vec![a, b, c]);

        let (_, summary) = render(&ds, &FilterSelection::all(&ds));
        assert_eq!(summary.total_customers, 2);
        assert_eq!(summary.avg_income, Some(15_000.0));
        assert_eq!(summary.avg_spending_score, Some(20.0));
        assert_eq!(summary.avg_family_size, Some(4.0));
    }

    #[test]
    fn integral_float_ids_match_integer_ids() {
        let mut a = customer(1, "M", 30.0, "Artist");
        let mut b = customer(2, "M", 30.0, "Artist");
        let mut c = customer(3, "M", 30.0, "Artist");
        a.id = CellValue::Integer(7);
        b.id = CellValue::Float(7.0);
        c.id = CellValue::Float(7.5);
        let ds = dataset(vec![a, b, c]);

        let (_, summary) = render(&ds, &FilterSelection::all(&ds));
        assert_eq!(summary.total_customers, 2);
    }

    #[test]
    fn formats_like_the_kpi_cards() {
        let summary = Summary {
            total_customers: 12,
            avg_income: Some(110731.8215),
            avg_spending_score: Some(50.96),
            avg_family_size: Some(3.768),
        };
        let text = summary.formatted();
        assert_eq!(text.avg_income, "$110,731.82");
        assert_eq!(text.avg_score, "51.0");
        assert_eq!(text.avg_family, "3.8");
    }

    #[test]
    fn currency_grouping() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-1500.0), "-$1,500.00");
    }
}
