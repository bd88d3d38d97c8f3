use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use super::{ExportError, ExportFormat};
use crate::data::model::{CellValue, Customer};
use crate::data::schema::{ColumnKind, AGE_GROUP_COLUMN, SPENDER_TYPE_COLUMN};
use crate::data::view::FilteredView;

/// Worksheet holding the filtered view.
pub const SHEET_NAME: &str = "Customers";

/// File kinds written directly from the filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    pub fn export_format(self) -> ExportFormat {
        match self {
            TableFormat::Csv => ExportFormat::Csv,
            TableFormat::Xlsx => ExportFormat::Xlsx,
        }
    }

    pub fn save(self, view: &FilteredView<'_>, path: &Path) -> Result<(), ExportError> {
        match self {
            TableFormat::Csv => save_csv(view, path),
            TableFormat::Xlsx => save_xlsx(view, path),
        }
    }
}

/// Source columns in file order, then the derived bucket columns.
pub fn export_headers(view: &FilteredView<'_>) -> Vec<String> {
    view.schema()
        .columns()
        .iter()
        .map(|c| c.name.clone())
        .chain([AGE_GROUP_COLUMN.to_string(), SPENDER_TYPE_COLUMN.to_string()])
        .collect()
}

/// Cells of one customer, aligned with [`export_headers`].
pub fn export_row(view: &FilteredView<'_>, customer: &Customer) -> Vec<CellValue> {
    let bucket = |label: Option<&'static str>| label.map_or(CellValue::Null, CellValue::from_label);
    view.schema()
        .columns()
        .iter()
        .map(|column| match column.kind {
            ColumnKind::Required(required) => customer.required(required),
            ColumnKind::Extra(i) => customer.extra.get(i).cloned().unwrap_or(CellValue::Null),
        })
        .chain([bucket(customer.age_group), bucket(customer.spender_type)])
        .collect()
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Write the view as delimited text with a header row.
pub fn write_csv<W: Write>(view: &FilteredView<'_>, out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(export_headers(view))?;
    for customer in view.iter() {
        writer.write_record(export_row(view, customer).iter().map(ToString::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_csv(view: &FilteredView<'_>, path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_csv(view, std::io::BufWriter::new(file))?;
    log::info!("Exported {} customers to {}", view.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// XLSX
// ---------------------------------------------------------------------------

fn build_workbook(view: &FilteredView<'_>) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in export_headers(view).iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (i, customer) in view.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in export_row(view, customer).iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Null => {}
                CellValue::Integer(n) => {
                    worksheet.write_number(row, col, *n as f64)?;
                }
                CellValue::Float(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                CellValue::String(s) => {
                    worksheet.write_string(row, col, s)?;
                }
            }
        }
    }

    worksheet.autofit();
    Ok(workbook)
}

pub fn save_xlsx(view: &FilteredView<'_>, path: &Path) -> Result<(), ExportError> {
    build_workbook(view)?.save(path)?;
    log::info!("Exported {} customers to {}", view.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilterSelection;
    use crate::data::loader::{dataset_from_table, read_csv};
    use crate::data::model::FilterField;
    use crate::data::view::render;

    const CSV: &str = "\
CustomerID,Gender,Age,Annual Income ($),Spending Score (1-100),Profession,Work Experience,Family Size
1,Male,19,15000,39,Healthcare,1,4
2,Female,21,35000.5,81,Engineer,3,3
3,Female,20,86000,6,,1,1
4,Male,0,59000,77,Lawyer,0,2
5,Male,64,,40,Artist,10,
";

    #[test]
    fn csv_round_trip_preserves_rows_and_values() {
        let ds = dataset_from_table(read_csv(CSV.as_bytes()).unwrap()).unwrap();
        let (view, _) = render(&ds, &FilterSelection::all(&ds));
        assert_eq!(view.len(), 4);

        let mut buffer = Vec::new();
        write_csv(&view, &mut buffer).unwrap();

        let reloaded = dataset_from_table(read_csv(buffer.as_slice()).unwrap()).unwrap();
        assert_eq!(reloaded.len(), view.len());
        for (original, copy) in view.iter().zip(&reloaded.customers) {
            assert_eq!(copy.age, original.age);
            assert_eq!(copy.annual_income, original.annual_income);
            assert_eq!(copy.spending_score, original.spending_score);
            assert_eq!(copy.family_size, original.family_size);
            assert_eq!(copy.gender, original.gender);
            assert_eq!(copy.profession, original.profession);
            assert_eq!(copy.age_group, original.age_group);
            assert_eq!(copy.spender_type, original.spender_type);
            assert_eq!(copy.extra, original.extra);
        }
    }

    #[test]
    fn csv_header_appends_derived_columns() {
        let ds = dataset_from_table(read_csv(CSV.as_bytes()).unwrap()).unwrap();
        let mut selection = FilterSelection::all(&ds);
        selection.set(FilterField::Gender, [CellValue::String("Female".into())]);
        let (view, _) = render(&ds, &selection);

        let mut buffer = Vec::new();
        write_csv(&view, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("CustomerID,Gender,Age,Annual_Income_,Spending_Score_1100,Profession,Work_Experience,Family_Size,Age_Group,Spender_Type")
        );
        assert_eq!(lines.next(), Some("2,Female,21,35000.5,81,Engineer,3,3,<25,High"));
        assert_eq!(lines.next(), Some("3,Female,20,86000,6,,1,1,<25,Low"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_view_exports_header_only() {
        let ds = dataset_from_table(read_csv(CSV.as_bytes()).unwrap()).unwrap();
        let (view, _) = render(&ds, &FilterSelection::none());
        let mut buffer = Vec::new();
        write_csv(&view, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 1);
    }

    #[test]
    fn writes_xlsx_file() {
        let ds = dataset_from_table(read_csv(CSV.as_bytes()).unwrap()).unwrap();
        let (view, _) = render(&ds, &FilterSelection::all(&ds));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.xlsx");
        save_xlsx(&view, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // XLSX is a zip container.
        assert_eq!(&bytes[..2], b"PK");
    }
}
