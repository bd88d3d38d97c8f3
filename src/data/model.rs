use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::bucket::{AGE_GROUPS, SPENDER_TIERS};
use super::schema::{RequiredColumn, Schema};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the raw table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

/// Text form used by the table view and the tabular exports. Floats use the
/// shortest representation that parses back to the same value; `Null` is an
/// empty cell.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Key under which two identifiers name the same customer: an integral
    /// float matches the equal integer, so `7` and `7.0` count once.
    pub fn identity_key(&self) -> CellValue {
        match self {
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                CellValue::Integer(*v as i64)
            }
            other => other.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Label shown next to filter checkboxes and in chart legends.
    pub fn label(&self) -> String {
        match self {
            CellValue::Null => "<missing>".to_string(),
            other => other.to_string(),
        }
    }

    pub fn from_label(label: &'static str) -> Self {
        CellValue::String(label.to_string())
    }

    fn from_optional_f64(value: Option<f64>) -> Self {
        value.map_or(CellValue::Null, CellValue::Float)
    }
}

// ---------------------------------------------------------------------------
// FilterField – the categorical attributes the sidebar governs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    Gender,
    Profession,
    AgeGroup,
}

impl FilterField {
    pub const ALL: [FilterField; 3] = [
        FilterField::Gender,
        FilterField::Profession,
        FilterField::AgeGroup,
    ];

    /// Heading used by the sidebar.
    pub fn title(self) -> &'static str {
        match self {
            FilterField::Gender => "Gender",
            FilterField::Profession => "Profession",
            FilterField::AgeGroup => "Age Group",
        }
    }
}

// ---------------------------------------------------------------------------
// Customer – one row of the dataset
// ---------------------------------------------------------------------------

/// A single customer record with validated, typed attributes.
///
/// Numeric attributes are `None` when the source cell was blank. Categorical
/// attributes keep blanks as [`CellValue::Null`] so they stay selectable.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: CellValue,
    pub gender: CellValue,
    pub age: Option<f64>,
    pub annual_income: Option<f64>,
    pub spending_score: Option<f64>,
    pub profession: CellValue,
    pub family_size: Option<f64>,
    /// Non-required columns, in the order of the `ColumnKind::Extra` schema columns.
    pub extra: Vec<CellValue>,
    /// Derived from `age`; `None` when the age falls outside every bin.
    pub age_group: Option<&'static str>,
    /// Derived from `spending_score`.
    pub spender_type: Option<&'static str>,
}

impl Customer {
    /// Value of a governed attribute, or `None` when it is undefined.
    ///
    /// Only derived buckets can be undefined; blank categorical cells are
    /// reported as `Some(CellValue::Null)`.
    pub fn field(&self, field: FilterField) -> Option<CellValue> {
        match field {
            FilterField::Gender => Some(self.gender.clone()),
            FilterField::Profession => Some(self.profession.clone()),
            FilterField::AgeGroup => self.age_group.map(CellValue::from_label),
        }
    }

    /// Cell for a required column, in the same shape it was loaded.
    pub fn required(&self, column: RequiredColumn) -> CellValue {
        match column {
            RequiredColumn::CustomerId => self.id.clone(),
            RequiredColumn::Gender => self.gender.clone(),
            RequiredColumn::Age => CellValue::from_optional_f64(self.age),
            RequiredColumn::AnnualIncome => CellValue::from_optional_f64(self.annual_income),
            RequiredColumn::SpendingScore => CellValue::from_optional_f64(self.spending_score),
            RequiredColumn::Profession => self.profession.clone(),
            RequiredColumn::FamilySize => CellValue::from_optional_f64(self.family_size),
        }
    }

    /// Recompute the derived bucket attributes from `age` and `spending_score`.
    pub fn derive_buckets(&mut self) {
        self.age_group = AGE_GROUPS.assign_opt(self.age);
        self.spender_type = SPENDER_TIERS.assign_opt(self.spending_score);
    }
}

// ---------------------------------------------------------------------------
// CustomerDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full validated dataset with pre-computed filter domains.
#[derive(Debug, Clone)]
pub struct CustomerDataset {
    /// All customers (rows), in file order.
    pub customers: Vec<Customer>,
    /// Normalized column layout shared by every row.
    pub schema: Schema,
    /// For each filterable attribute the distinct values present.
    /// Gender and profession keep first-appearance order; age groups follow
    /// bucket order. Undefined buckets are never part of a domain.
    pub domains: BTreeMap<FilterField, Vec<CellValue>>,
}

impl CustomerDataset {
    /// Derive buckets for every customer and build the filter domains.
    pub fn from_customers(schema: Schema, mut customers: Vec<Customer>) -> Self {
        for customer in &mut customers {
            customer.derive_buckets();
        }

        let mut domains = BTreeMap::new();
        for field in FilterField::ALL {
            let mut seen = BTreeSet::new();
            let mut values = Vec::new();
            for value in customers.iter().filter_map(|c| c.field(field)) {
                if seen.insert(value.clone()) {
                    values.push(value);
                }
            }
            if field == FilterField::AgeGroup {
                values.sort_by_key(|v| match v {
                    CellValue::String(s) => AGE_GROUPS.position(s),
                    _ => None,
                });
            }
            domains.insert(field, values);
        }

        CustomerDataset {
            customers,
            schema,
            domains,
        }
    }

    /// Observed domain of a filterable attribute.
    pub fn domain(&self, field: FilterField) -> &[CellValue] {
        self.domains.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of customers.
    pub fn len(&self) -> usize {
        self.customers.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a customer with the required attributes only.
    pub fn customer(id: i64, gender: &str, age: f64, profession: &str) -> Customer {
        Customer {
            id: CellValue::Integer(id),
            gender: CellValue::String(gender.to_string()),
            age: Some(age),
            annual_income: Some(10_000.0 * id as f64),
            spending_score: Some(10.0 * id as f64),
            profession: CellValue::String(profession.to_string()),
            family_size: Some(id as f64),
            extra: Vec::new(),
            age_group: None,
            spender_type: None,
        }
    }

    pub fn dataset(customers: Vec<Customer>) -> CustomerDataset {
        CustomerDataset::from_customers(Schema::required_only(), customers)
    }
}
