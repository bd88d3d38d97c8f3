use std::sync::LazyLock;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Fixed-bin bucketing of numeric attributes
// ---------------------------------------------------------------------------

/// Age groups used by the sidebar filter and the spending chart.
pub static AGE_GROUPS: LazyLock<Bucketer> = LazyLock::new(|| {
    Bucketer::try_new(
        [0.0, 25.0, 35.0, 45.0, 60.0, 100.0],
        ["<25", "26-35", "36-45", "46-60", "60+"],
    )
    .expect("age group edges are increasing")
});

/// Spender tiers derived from the 1–100 spending score.
pub static SPENDER_TIERS: LazyLock<Bucketer> = LazyLock::new(|| {
    Bucketer::try_new([0.0, 40.0, 70.0, 100.0], ["Low", "Medium", "High"])
        .expect("spender tier edges are increasing")
});

#[derive(Debug, Error, PartialEq)]
pub enum BucketError {
    #[error("expected {expected} labels for {edges} bin edges, got {labels}")]
    LabelCount {
        edges: usize,
        labels: usize,
        expected: usize,
    },

    #[error("bin edges must be strictly increasing (edge {index} is {value})")]
    NotIncreasing { index: usize, value: f64 },
}

/// Maps a numeric value onto one of N half-open bins `(edges[i], edges[i+1]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucketer {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl Bucketer {
    /// Build a bucketer from N+1 strictly increasing edges and N labels.
    pub fn try_new<E, L>(edges: E, labels: L) -> Result<Self, BucketError>
    where
        E: Into<Vec<f64>>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let edges = edges.into();
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if edges.len() < 2 || labels.len() != edges.len() - 1 {
            return Err(BucketError::LabelCount {
                edges: edges.len(),
                labels: labels.len(),
                expected: edges.len().saturating_sub(1).max(1),
            });
        }
        for (index, pair) in edges.windows(2).enumerate() {
            // `!(a < b)` also rejects NaN edges.
            if !(pair[0] < pair[1]) {
                return Err(BucketError::NotIncreasing {
                    index: index + 1,
                    value: pair[1],
                });
            }
        }
        Ok(Bucketer { edges, labels })
    }

    /// Label of the bin containing `value`, or `None` when `value` is outside
    /// `(edges[0], edges[N]]` or NaN.
    pub fn assign(&self, value: f64) -> Option<&str> {
        if value.is_nan() {
            return None;
        }
        // First edge >= value; the bin is the one ending at that edge.
        let upper = self.edges.partition_point(|&edge| edge < value);
        if upper == 0 || upper >= self.edges.len() {
            return None;
        }
        self.labels.get(upper - 1).map(String::as_str)
    }

    pub fn assign_opt(&self, value: Option<f64>) -> Option<&str> {
        value.and_then(|v| self.assign(v))
    }

    pub fn labels(&self) -> impl ExactSizeIterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Label of bin `index`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Bin index of a label, used to keep bucket order in charts and filters.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}
