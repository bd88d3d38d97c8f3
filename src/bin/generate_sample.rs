use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

/// Raw labels as they appear in the source spreadsheet export.
const HEADERS: [&str; 8] = [
    "CustomerID",
    "Gender",
    "Age",
    "Annual Income ($)",
    "Spending Score (1-100)",
    "Profession",
    "Work Experience",
    "Family Size",
];

const PROFESSIONS: [&str; 9] = [
    "Healthcare",
    "Engineer",
    "Lawyer",
    "Entertainment",
    "Artist",
    "Executive",
    "Doctor",
    "Homemaker",
    "Marketing",
];

const CUSTOMERS: usize = 200;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `lo..=hi`.
    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_f64() * (hi - lo + 1) as f64) as i64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.range(0, items.len() as i64 - 1) as usize]
    }
}

struct Columns {
    id: Vec<i64>,
    gender: Vec<String>,
    age: Vec<i64>,
    income: Vec<f64>,
    score: Vec<i64>,
    profession: Vec<Option<String>>,
    experience: Vec<i64>,
    family: Vec<i64>,
}

fn generate(rng: &mut SimpleRng) -> Columns {
    let mut c = Columns {
        id: Vec::new(),
        gender: Vec::new(),
        age: Vec::new(),
        income: Vec::new(),
        score: Vec::new(),
        profession: Vec::new(),
        experience: Vec::new(),
        family: Vec::new(),
    };
    for i in 0..CUSTOMERS {
        let age = rng.range(0, 99);
        c.id.push(i as i64 + 1);
        c.gender.push(rng.pick(&["Male", "Female"]).to_string());
        c.age.push(age);
        c.income.push((rng.range(0, 190) * 1000) as f64 + rng.range(0, 99) as f64 * 10.0);
        c.score.push(rng.range(1, 100));
        // A few blank professions, as in the real export.
        c.profession.push((rng.next_f64() > 0.02).then(|| rng.pick(&PROFESSIONS).to_string()));
        c.experience.push(rng.range(0, (age / 4).max(0)));
        c.family.push(rng.range(1, 9));
    }
    c
}

fn write_csv(columns: &Columns, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADERS)?;
    for i in 0..columns.id.len() {
        writer.write_record([
            columns.id[i].to_string(),
            columns.gender[i].clone(),
            columns.age[i].to_string(),
            columns.income[i].to_string(),
            columns.score[i].to_string(),
            columns.profession[i].clone().unwrap_or_default(),
            columns.experience[i].to_string(),
            columns.family[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn to_batch(columns: &Columns) -> Result<RecordBatch> {
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(columns.id.clone())),
        Arc::new(StringArray::from(columns.gender.clone())),
        Arc::new(Int64Array::from(columns.age.clone())),
        Arc::new(Float64Array::from(columns.income.clone())),
        Arc::new(Int64Array::from(columns.score.clone())),
        Arc::new(StringArray::from(columns.profession.clone())),
        Arc::new(Int64Array::from(columns.experience.clone())),
        Arc::new(Int64Array::from(columns.family.clone())),
    ];
    let schema = Arc::new(Schema::new(
        HEADERS
            .iter()
            .zip(&arrays)
            .map(|(name, array)| {
                Field::new(*name, array.data_type().clone(), *name == "Profession")
            })
            .collect::<Vec<_>>(),
    ));
    RecordBatch::try_new(schema, arrays).context("building record batch")
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let columns = generate(&mut rng);

    let dir = Path::new("data");
    std::fs::create_dir_all(dir)?;
    let csv_path = dir.join("Customer_data.csv");
    let parquet_path = dir.join("Customer_data.parquet");

    write_csv(&columns, &csv_path)?;
    let batch = to_batch(&columns)?;
    write_parquet(&batch, &parquet_path)?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!(
        "Wrote {CUSTOMERS} customers to {} and {}",
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
