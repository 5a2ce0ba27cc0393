//! Writes `sample_data.csv` and `sample_data.xlsx`: a small measurement
//! table with gaps in its numeric columns, for trying out the converter.

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

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

    /// `None` with probability `p`.
    fn gap<T>(&mut self, p: f64, value: T) -> Option<T> {
        (self.next_f64() >= p).then_some(value)
    }
}

struct Row {
    id: i64,
    sample: &'static str,
    operator: &'static str,
    age: Option<i64>,
    concentration: Option<f64>,
    passed: bool,
}

const HEADER: [&str; 6] = ["id", "sample", "operator", "age", "concentration", "passed"];

fn generate_rows(n: usize, rng: &mut SimpleRng) -> Vec<Row> {
    let samples = ["Sample_A", "Sample_B", "Sample_C"];
    let operators = ["Alice", "Bob"];

    (0..n)
        .map(|i| {
            let age = 20 + (rng.next_u64() % 45) as i64;
            let concentration = (rng.next_f64() * 5.0 * 1000.0).round() / 1000.0;
            Row {
                id: i as i64,
                sample: samples[i % samples.len()],
                operator: operators[i % operators.len()],
                age: rng.gap(0.15, age),
                concentration: rng.gap(0.2, concentration),
                passed: concentration > 1.0,
            }
        })
        .collect()
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record([
            row.id.to_string(),
            row.sample.to_string(),
            row.operator.to_string(),
            row.age.map(|a| a.to_string()).unwrap_or_default(),
            row.concentration.map(|c| c.to_string()).unwrap_or_default(),
            if row.passed { "True" } else { "False" }.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_xlsx(path: &str, rows: &[Row]) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, name) in HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_number(r, 0, row.id as f64)?;
        sheet.write_string(r, 1, row.sample)?;
        sheet.write_string(r, 2, row.operator)?;
        if let Some(age) = row.age {
            sheet.write_number(r, 3, age as f64)?;
        }
        if let Some(c) = row.concentration {
            sheet.write_number(r, 4, c)?;
        }
        sheet.write_boolean(r, 5, row.passed)?;
    }

    workbook.save(path).context("writing workbook")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(60, &mut rng);

    write_csv("sample_data.csv", &rows)?;
    write_xlsx("sample_data.xlsx", &rows)?;

    let gaps = rows
        .iter()
        .filter(|r| r.age.is_none() || r.concentration.is_none())
        .count();
    println!(
        "Wrote {} rows ({gaps} with missing values) to sample_data.csv and sample_data.xlsx",
        rows.len()
    );
    Ok(())
}
