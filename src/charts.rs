use std::collections::BTreeMap;

use crate::color::ColorMap;
use crate::data::bucket::{AGE_GROUPS, SPENDER_TIERS};
use crate::data::model::{CellValue, CustomerDataset, FilterField};
use crate::data::view::FilteredView;

/// Legend label for customers without a spender tier.
pub const UNASSIGNED: &str = "Unassigned";

// ---------------------------------------------------------------------------
// Series data shared by the on-screen plots and the report images
// ---------------------------------------------------------------------------

/// Mean spending score per age group, one bar group per gender.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedBars {
    /// Age groups present in the view, in bucket order.
    pub categories: Vec<&'static str>,
    pub series: Vec<BarSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub key: CellValue,
    /// One entry per category; `None` when the group has no score there.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub income: f64,
    pub spending_score: f64,
    pub age: Option<f64>,
    pub profession: CellValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub spending_by_age_group: GroupedBars,
    pub income_vs_spending: Vec<ScatterPoint>,
    pub spender_breakdown: Vec<Slice>,
}

impl ChartSeries {
    pub fn from_view(view: &FilteredView<'_>, dataset: &CustomerDataset) -> Self {
        ChartSeries {
            spending_by_age_group: spending_by_age_group(view, dataset),
            income_vs_spending: income_vs_spending(view),
            spender_breakdown: spender_breakdown(view),
        }
    }
}

fn spending_by_age_group(view: &FilteredView<'_>, dataset: &CustomerDataset) -> GroupedBars {
    // (age group index, gender) → (sum, count)
    let mut sums: BTreeMap<(usize, CellValue), (f64, usize)> = BTreeMap::new();
    let mut present = vec![false; AGE_GROUPS.labels().len()];

    for customer in view.iter() {
        let Some(group) = customer.age_group.and_then(|g| AGE_GROUPS.position(g)) else {
            continue;
        };
        present[group] = true;
        if let Some(score) = customer.spending_score {
            let entry = sums.entry((group, customer.gender.clone())).or_default();
            entry.0 += score;
            entry.1 += 1;
        }
    }

    let groups: Vec<usize> = (0..present.len()).filter(|&i| present[i]).collect();
    let series = dataset
        .domain(FilterField::Gender)
        .iter()
        .filter(|gender| sums.keys().any(|(_, g)| g == *gender))
        .map(|gender| BarSeries {
            key: gender.clone(),
            values: groups
                .iter()
                .map(|&group| {
                    sums.get(&(group, gender.clone()))
                        .map(|(sum, count)| sum / *count as f64)
                })
                .collect(),
        })
        .collect();

    GroupedBars {
        categories: groups.iter().filter_map(|&i| AGE_GROUPS.label(i)).collect(),
        series,
    }
}

fn income_vs_spending(view: &FilteredView<'_>) -> Vec<ScatterPoint> {
    view.iter()
        .filter_map(|c| {
            Some(ScatterPoint {
                income: c.annual_income?,
                spending_score: c.spending_score?,
                age: c.age,
                profession: c.profession.clone(),
            })
        })
        .collect()
}

fn spender_breakdown(view: &FilteredView<'_>) -> Vec<Slice> {
    let mut counts = vec![0usize; SPENDER_TIERS.labels().len()];
    let mut unassigned = 0;
    for customer in view.iter() {
        match customer.spender_type.and_then(|t| SPENDER_TIERS.position(t)) {
            Some(tier) => counts[tier] += 1,
            None => unassigned += 1,
        }
    }

    let mut slices: Vec<Slice> = SPENDER_TIERS
        .labels()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| Slice { label, count })
        .collect();
    if unassigned > 0 {
        slices.push(Slice {
            label: UNASSIGNED,
            count: unassigned,
        });
    }
    slices
}

// ---------------------------------------------------------------------------
// Stable colours per series, built once per dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ChartPalette {
    pub gender: ColorMap,
    pub profession: ColorMap,
    pub spender: ColorMap,
}

impl ChartPalette {
    pub fn for_dataset(dataset: &CustomerDataset) -> Self {
        let spender: Vec<CellValue> = SPENDER_TIERS
            .labels()
            .chain(std::iter::once(UNASSIGNED))
            .map(CellValue::from_label)
            .collect();
        ChartPalette {
            gender: ColorMap::new(dataset.domain(FilterField::Gender)),
            profession: ColorMap::new(dataset.domain(FilterField::Profession)),
            spender: ColorMap::new(&spender),
        }
    }
}

/// Marker radius for the scatter plot, scaled by age.
pub fn point_radius(age: Option<f64>) -> f32 {
    age.map_or(3.0, |a| (2.0 + a as f32 / 12.0).clamp(2.0, 10.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilterSelection;
    use crate::data::model::fixtures::{customer, dataset};
    use crate::data::view::render;

    #[test]
    fn bars_average_scores_per_gender_and_group() {
        let mut a = customer(1, "M", 20.0, "Artist");
        let mut b = customer(2, "M", 22.0, "Artist");
        let mut c = customer(3, "F", 50.0, "Artist");
        a.spending_score = Some(10.0);
        b.spending_score = Some(30.0);
        c.spending_score = Some(80.0);
        let ds = dataset(vec![a, b, c]);
        let (view, _) = render(&ds, &FilterSelection::all(&ds));

        let bars = ChartSeries::from_view(&view, &ds).spending_by_age_group;
        assert_eq!(bars.categories, vec!["<25", "46-60"]);
        assert_eq!(bars.series.len(), 2);
        assert_eq!(bars.series[0].key, CellValue::String("M".into()));
        assert_eq!(bars.series[0].values, vec![Some(20.0), None]);
        assert_eq!(bars.series[1].values, vec![None, Some(80.0)]);
    }

    #[test]
    fn breakdown_counts_tiers_in_order() {
        let mut customers: Vec<_> = (1..=4).map(|i| customer(i, "M", 30.0, "Artist")).collect();
        // scores 10, 20, 30 → Low; 0 → no tier
        customers[3].spending_score = Some(0.0);
        customers.push({
            let mut c = customer(9, "F", 30.0, "Artist");
            c.spending_score = Some(95.0);
            c
        });
        let ds = dataset(customers);
        let (view, _) = render(&ds, &FilterSelection::all(&ds));

        let slices = ChartSeries::from_view(&view, &ds).spender_breakdown;
        assert_eq!(
            slices,
            vec![
                Slice { label: "Low", count: 3 },
                Slice { label: "High", count: 1 },
                Slice { label: UNASSIGNED, count: 1 },
            ]
        );
    }

    #[test]
    fn scatter_skips_missing_coordinates() {
        let mut a = customer(1, "M", 30.0, "Artist");
        a.annual_income = None;
        let ds = dataset(vec![a, customer(2, "F", 30.0, "Doctor")]);
        let (view, _) = render(&ds, &FilterSelection::all(&ds));

        let points = ChartSeries::from_view(&view, &ds).income_vs_spending;
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].income, 20_000.0);
    }

    #[test]
    fn empty_view_gives_empty_series() {
        let ds = dataset(vec![customer(1, "M", 30.0, "Artist")]);
        let (view, _) = render(&ds, &FilterSelection::none());
        assert_eq!(ChartSeries::from_view(&view, &ds), ChartSeries::default());
    }
}
