use std::borrow::Cow;

use super::filter::{filtered_indices, FilterSelection};
use super::model::{Customer, CustomerDataset};
use super::schema::Schema;
use super::summary::Summary;

/// The customers passing the current selection, borrowed from the dataset.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a CustomerDataset,
    indices: Cow<'a, [usize]>,
}

impl<'a> FilteredView<'a> {
    /// Wrap indices previously produced by [`filtered_indices`].
    pub fn from_indices(dataset: &'a CustomerDataset, indices: &'a [usize]) -> Self {
        FilteredView {
            dataset,
            indices: Cow::Borrowed(indices),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Customer> + '_ {
        let customers = &self.dataset.customers;
        self.indices.iter().map(move |&i| &customers[i])
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn schema(&self) -> &'a Schema {
        &self.dataset.schema
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Apply `selection` to `dataset` and summarize the result.
///
/// Pure: the dataset is never modified and identical inputs give identical,
/// order-preserving output.
pub fn render<'a>(
    dataset: &'a CustomerDataset,
    selection: &FilterSelection,
) -> (FilteredView<'a>, Summary) {
    let view = FilteredView {
        dataset,
        indices: Cow::Owned(filtered_indices(dataset, selection)),
    };
    let summary = Summary::compute(&view);
    log::debug!("Filtered view: {} of {} customers", view.len(), dataset.len());
    (view, summary)
}
