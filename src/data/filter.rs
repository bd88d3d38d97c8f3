use std::collections::{BTreeMap, BTreeSet};

use super::model::{CellValue, Customer, CustomerDataset, FilterField};

// ---------------------------------------------------------------------------
// Filter selection: which values are permitted per governed attribute
// ---------------------------------------------------------------------------

/// Per-attribute selection state: maps each [`FilterField`] to the set of
/// permitted values. A field with an empty or absent set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    sets: BTreeMap<FilterField, BTreeSet<CellValue>>,
}

impl FilterSelection {
    /// Every field selects its full observed domain (i.e., show everything
    /// that has a defined age group).
    pub fn all(dataset: &CustomerDataset) -> Self {
        let sets = FilterField::ALL
            .into_iter()
            .map(|field| (field, dataset.domain(field).iter().cloned().collect()))
            .collect();
        FilterSelection { sets }
    }

    /// Selection with nothing selected for any field.
    pub fn none() -> Self {
        Self::default()
    }

    /// Replace the permitted values for `field`.
    pub fn set<I>(&mut self, field: FilterField, values: I)
    where
        I: IntoIterator<Item = CellValue>,
    {
        self.sets.insert(field, values.into_iter().collect());
    }

    pub fn is_selected(&self, field: FilterField, value: &CellValue) -> bool {
        self.sets.get(&field).is_some_and(|set| set.contains(value))
    }

    /// Toggle a single value in a field's selection.
    pub fn toggle(&mut self, field: FilterField, value: &CellValue) {
        let selected = self.sets.entry(field).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
    }

    /// Select the full observed domain of one field.
    pub fn select_all(&mut self, field: FilterField, dataset: &CustomerDataset) {
        self.set(field, dataset.domain(field).iter().cloned());
    }

    /// Deselect every value of one field.
    pub fn select_none(&mut self, field: FilterField) {
        self.sets.insert(field, BTreeSet::new());
    }

    /// `(selected, total)` counts for a sidebar header.
    pub fn counts(&self, field: FilterField, dataset: &CustomerDataset) -> (usize, usize) {
        let domain = dataset.domain(field);
        let selected = domain
            .iter()
            .filter(|v| self.is_selected(field, v))
            .count();
        (selected, domain.len())
    }

    /// A customer passes when every governed attribute is defined and its
    /// value is in that attribute's selection.
    pub fn matches(&self, customer: &Customer) -> bool {
        FilterField::ALL.into_iter().all(|field| {
            match (customer.field(field), self.sets.get(&field)) {
                (Some(value), Some(selected)) => selected.contains(&value),
                // Undefined bucket, or nothing selected for this field.
                _ => false,
            }
        })
    }
}

/// Return indices of customers that pass all filters, in dataset order.
pub fn filtered_indices(dataset: &CustomerDataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .customers
        .iter()
        .enumerate()
        .filter(|(_, customer)| selection.matches(customer))
        .map(|(i, _)| i)
        .collect()
}
