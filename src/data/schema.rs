use std::collections::BTreeSet;

use thiserror::Error;

use super::columns::normalize_columns;
use super::model::{CellValue, Customer};

/// Column written for the derived age bucket.
pub const AGE_GROUP_COLUMN: &str = "Age_Group";
/// Column written for the derived spender tier.
pub const SPENDER_TYPE_COLUMN: &str = "Spender_Type";

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("column {position} ({raw:?}) has an empty name after normalization")]
    EmptyColumnName { position: usize, raw: String },

    #[error("column '{0}' appears more than once after normalization")]
    DuplicateColumn(String),

    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),

    #[error("row {row}, column '{column}': {value:?} is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Required columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredColumn {
    CustomerId,
    Gender,
    Age,
    AnnualIncome,
    SpendingScore,
    Profession,
    FamilySize,
}

impl RequiredColumn {
    pub const ALL: [RequiredColumn; 7] = [
        RequiredColumn::CustomerId,
        RequiredColumn::Gender,
        RequiredColumn::Age,
        RequiredColumn::AnnualIncome,
        RequiredColumn::SpendingScore,
        RequiredColumn::Profession,
        RequiredColumn::FamilySize,
    ];

    /// Normalized column name.
    pub fn name(self) -> &'static str {
        match self {
            RequiredColumn::CustomerId => "CustomerID",
            RequiredColumn::Gender => "Gender",
            RequiredColumn::Age => "Age",
            RequiredColumn::AnnualIncome => "Annual_Income_",
            RequiredColumn::SpendingScore => "Spending_Score_1100",
            RequiredColumn::Profession => "Profession",
            RequiredColumn::FamilySize => "Family_Size",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            RequiredColumn::Age
                | RequiredColumn::AnnualIncome
                | RequiredColumn::SpendingScore
                | RequiredColumn::FamilySize
        )
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Where a normalized column's values live on a [`Customer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Required(RequiredColumn),
    /// Index into [`Customer::extra`].
    Extra(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

// ---------------------------------------------------------------------------
// Schema – validated once at load time
// ---------------------------------------------------------------------------

/// Column layout of a loaded dataset, validated against the required set.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Source columns in file order, excluding derived columns.
    columns: Vec<Column>,
    /// Raw cell index of each column in `columns`.
    sources: Vec<usize>,
}

impl Schema {
    /// Validate raw header labels.
    ///
    /// Headers are normalized first. Input columns named like a derived
    /// column are dropped; the deriver recomputes them.
    pub fn from_headers<S: AsRef<str>>(raw: &[S]) -> Result<Self, SchemaError> {
        let names = normalize_columns(raw);

        let mut seen = BTreeSet::new();
        let mut columns = Vec::new();
        let mut sources = Vec::new();
        let mut extra = 0;

        for (position, name) in names.into_iter().enumerate() {
            if name.is_empty() {
                return Err(SchemaError::EmptyColumnName {
                    position,
                    raw: raw[position].as_ref().to_string(),
                });
            }
            if !seen.insert(name.clone()) {
                return Err(SchemaError::DuplicateColumn(name));
            }
            if name == AGE_GROUP_COLUMN || name == SPENDER_TYPE_COLUMN {
                log::debug!("Dropping input column '{name}', it is recomputed");
                continue;
            }
            let kind = match RequiredColumn::from_name(&name) {
                Some(required) => ColumnKind::Required(required),
                None => {
                    extra += 1;
                    ColumnKind::Extra(extra - 1)
                }
            };
            columns.push(Column { name, kind });
            sources.push(position);
        }

        for required in RequiredColumn::ALL {
            if !seen.contains(required.name()) {
                return Err(SchemaError::MissingColumn(required.name()));
            }
        }

        Ok(Schema { columns, sources })
    }

    /// Schema holding exactly the required columns in canonical order.
    #[cfg(test)]
    pub fn required_only() -> Self {
        let names: Vec<&str> = RequiredColumn::ALL.iter().map(|c| c.name()).collect();
        Self::from_headers(&names).expect("required names are valid")
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Convert one raw row into a typed customer. `row` is 0-based over data
    /// rows and only used for error messages. Missing trailing cells read as
    /// `Null`.
    pub fn customer_from_row(
        &self,
        row: usize,
        cells: &[CellValue],
    ) -> Result<Customer, SchemaError> {
        let cell = |source: usize| cells.get(source).cloned().unwrap_or(CellValue::Null);

        let mut customer = Customer {
            id: CellValue::Null,
            gender: CellValue::Null,
            age: None,
            annual_income: None,
            spending_score: None,
            profession: CellValue::Null,
            family_size: None,
            extra: Vec::new(),
            age_group: None,
            spender_type: None,
        };

        for (column, &source) in self.columns.iter().zip(&self.sources) {
            let value = cell(source);
            match column.kind {
                ColumnKind::Extra(_) => customer.extra.push(value),
                ColumnKind::Required(required) if required.is_numeric() => {
                    let number = numeric_cell(row, required.name(), value)?;
                    match required {
                        RequiredColumn::Age => customer.age = number,
                        RequiredColumn::AnnualIncome => customer.annual_income = number,
                        RequiredColumn::SpendingScore => customer.spending_score = number,
                        RequiredColumn::FamilySize => customer.family_size = number,
                        _ => {}
                    }
                }
                ColumnKind::Required(RequiredColumn::CustomerId) => customer.id = value,
                ColumnKind::Required(RequiredColumn::Gender) => {
                    customer.gender = categorical_cell(value)
                }
                ColumnKind::Required(RequiredColumn::Profession) => {
                    customer.profession = categorical_cell(value)
                }
                ColumnKind::Required(_) => {}
            }
        }

        Ok(customer)
    }
}

fn numeric_cell(
    row: usize,
    column: &'static str,
    value: CellValue,
) -> Result<Option<f64>, SchemaError> {
    match value {
        CellValue::Null => Ok(None),
        CellValue::Integer(i) => Ok(Some(i as f64)),
        CellValue::Float(f) if f.is_nan() => Ok(None),
        CellValue::Float(f) => Ok(Some(f)),
        CellValue::String(s) if s.trim().is_empty() => Ok(None),
        CellValue::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| SchemaError::InvalidNumber {
                row,
                column,
                value: s,
            }),
        CellValue::Bool(b) => Err(SchemaError::InvalidNumber {
            row,
            column,
            value: b.to_string(),
        }),
    }
}

/// Blank text counts as missing so it groups with empty cells.
fn categorical_cell(value: CellValue) -> CellValue {
    match value {
        CellValue::String(s) if s.trim().is_empty() => CellValue::Null,
        CellValue::String(s) => CellValue::String(s.trim().to_string()),
        other => other,
    }
}
