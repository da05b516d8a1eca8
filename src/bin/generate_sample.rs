//! Writes a synthetic study into `./data/` with the same file names and
//! schemas the viewer expects, so it can run without the licensed quotes.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;

/// 2020-01-06, a Monday, in days since the Unix epoch.
const FIRST_DAY: i32 = 18_267;
const N_DAYS: usize = 40;
const RATE: f64 = 0.015;

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Fisher-Yates, so cross-sections are stored out of moneyness order.
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_u64() % (i as u64 + 1)) as usize;
            items.swap(i, j);
        }
    }
}

// ---------------------------------------------------------------------------
// Black-76 pricing and the implied transforms
// ---------------------------------------------------------------------------

/// Abramowitz-Stegun 7.1.26 approximation of the standard normal CDF.
fn norm_cdf(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.3275911 * x.abs() / std::f64::consts::SQRT_2);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    let erf = 1.0 - poly * (-(x * x) / 2.0).exp();
    if x >= 0.0 {
        0.5 * (1.0 + erf)
    } else {
        0.5 * (1.0 - erf)
    }
}

fn norm_pdf(x: f64) -> f64 {
    (-(x * x) / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Volatility smile in moneyness; `tilt` makes each method's fit differ.
fn smile(kf: f64, atm: f64, tilt: f64) -> f64 {
    let m = kf.ln();
    (atm - tilt * m + 0.8 * m * m).max(0.05)
}

struct Point {
    kf: f64,
    strike: f64,
    forward: f64,
    call: f64,
    vol: f64,
    q_alpha: f64,
    q_pdf: f64,
    e_alpha: f64,
    e_pdf: f64,
}

fn price_point(kf: f64, forward: f64, tau: f64, vol: f64) -> Point {
    let strike = kf * forward;
    let disc = (-RATE * tau).exp();
    let sd = vol * tau.sqrt();
    let d1 = ((forward / strike).ln() + 0.5 * sd * sd) / sd;
    let d2 = d1 - sd;
    let call = disc * (forward * norm_cdf(d1) - strike * norm_cdf(d2));
    let put = call - disc * (forward - strike);
    Point {
        kf,
        strike,
        forward,
        call,
        vol,
        q_alpha: 1.0 - norm_cdf(d2),
        q_pdf: norm_pdf(d2) / (kf * sd),
        e_alpha: put / (put + call),
        e_pdf: 0.0,
    }
}

/// Finite-difference slope of the expectile CDF, then both densities scaled
/// into the chart's [0, 1] range.
fn finish_densities(points: &mut [Point]) {
    let n = points.len();
    for i in 0..n {
        let (lo, hi) = (i.saturating_sub(1), (i + 1).min(n - 1));
        let dk = points[hi].kf - points[lo].kf;
        points[i].e_pdf = if dk > 0.0 {
            (points[hi].e_alpha - points[lo].e_alpha) / dk
        } else {
            0.0
        };
    }
    let q_max = points.iter().map(|p| p.q_pdf).fold(f64::MIN_POSITIVE, f64::max);
    let e_max = points.iter().map(|p| p.e_pdf).fold(f64::MIN_POSITIVE, f64::max);
    for p in points {
        p.q_pdf /= q_max;
        p.e_pdf /= e_max;
    }
}

// ---------------------------------------------------------------------------
// Columns and writing
// ---------------------------------------------------------------------------

struct Columns {
    float_names: Vec<&'static str>,
    dates: Vec<Vec<i32>>,
    floats: Vec<Vec<f64>>,
    date_names: Vec<&'static str>,
}

impl Columns {
    fn new(date_names: &[&'static str], float_names: &[&'static str]) -> Self {
        Columns {
            float_names: float_names.to_vec(),
            dates: vec![Vec::new(); date_names.len()],
            floats: vec![Vec::new(); float_names.len()],
            date_names: date_names.to_vec(),
        }
    }

    fn push(&mut self, dates: &[i32], floats: &[f64]) {
        for (col, &d) in self.dates.iter_mut().zip(dates) {
            col.push(d);
        }
        for (col, &v) in self.floats.iter_mut().zip(floats) {
            col.push(v);
        }
    }

    fn write(self, path: &Path) -> Result<usize, Box<dyn std::error::Error>> {
        let mut fields = Vec::new();
        let mut arrays: Vec<ArrayRef> = Vec::new();
        for (name, values) in self.date_names.iter().zip(self.dates) {
            fields.push(Field::new(*name, DataType::Date32, false));
            arrays.push(Arc::new(Date32Array::from(values)));
        }
        for (name, values) in self.float_names.iter().zip(self.floats) {
            fields.push(Field::new(*name, DataType::Float64, false));
            arrays.push(Arc::new(Float64Array::from(values)));
        }
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::GZIP(GzipLevel::default()))
            .build();
        let file = std::fs::File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(batch.num_rows())
    }
}

const FITTED: [&str; 9] = [
    "K/F", "strike", "forward", "prices", "vols", "QAlpha", "QPDF", "EAlpha", "EPDF",
];
const RAW: [&str; 5] = ["K/F", "strike_price", "forward_price", "callprice", "iv_raw"];

/// Trading days (Mon-Fri) and each day's next-Friday expiry.
fn calendar() -> Vec<(i32, i32)> {
    let mut days = Vec::with_capacity(N_DAYS);
    let mut day = FIRST_DAY;
    while days.len() < N_DAYS {
        // 1970-01-01 was a Thursday; Monday = 0
        let weekday = (day + 3) % 7;
        if weekday < 5 {
            let to_friday = (4 - weekday + 7) % 7;
            let expiry = day + if to_friday == 0 { 7 } else { to_friday };
            days.push((day, expiry));
        }
        day += 1;
    }
    days
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = SimpleRng::new(42);
    let out_dir = Path::new("data");
    std::fs::create_dir_all(out_dir)?;

    let mut birs = Columns::new(&["date"], &FITTED);
    let mut jackwerth = Columns::new(&["date", "exdate"], &FITTED);
    let mut bondarenko = Columns::new(&["date", "exdate"], &FITTED);
    let mut quotes = Columns::new(&["date", "exdate"], &RAW);

    let mut forward: f64 = 3250.0;
    let calendar = calendar();
    for (i, &(date, expiry)) in calendar.iter().enumerate() {
        forward *= (rng.gauss(0.0, 0.01)).exp();
        let tau = (expiry - date) as f64 / 365.0;
        let atm = 0.13 + 0.03 * rng.next_f64();

        let mut grid: Vec<f64> = (0..41).map(|k| 0.7 + 0.0125 * k as f64).collect();
        rng.shuffle(&mut grid);

        for (method, tilt, skip) in [
            (&mut birs, 0.35, false),
            (&mut jackwerth, 0.30, false),
            // Bondarenko misses the last day of the sample
            (&mut bondarenko, 0.40, i + 1 == calendar.len()),
        ] {
            if skip {
                continue;
            }
            let mut points: Vec<Point> = grid
                .iter()
                .map(|&kf| price_point(kf, forward, tau, smile(kf, atm, tilt)))
                .collect();
            points.sort_by(|a, b| a.kf.total_cmp(&b.kf));
            finish_densities(&mut points);
            rng.shuffle(&mut points);

            for p in &points {
                method.push(
                    &[date, expiry],
                    &[
                        p.kf, p.strike, p.forward, p.call, p.vol, p.q_alpha, p.q_pdf, p.e_alpha,
                        p.e_pdf,
                    ],
                );
            }
        }

        // observed quotes only exist on a coarser strike grid
        for &kf in grid.iter().step_by(2) {
            let vol = smile(kf, atm, 0.33) + rng.gauss(0.0, 0.004);
            let p = price_point(kf, forward, tau, vol);
            let noisy = (p.call + rng.gauss(0.0, 0.5)).max(0.05);
            quotes.push(&[date, expiry], &[p.kf, p.strike, p.forward, noisy, p.vol]);
        }
    }

    for (columns, file) in [
        (birs, "results_birs_noLCS.parquet.gzip"),
        (jackwerth, "results_jackwerth_noLCS.parquet.gzip"),
        (bondarenko, "results_bondarenko_noLCS.parquet.gzip"),
        (quotes, "OptionsData_after_filter.parquet.gzip"),
    ] {
        let path = out_dir.join(file);
        let rows = columns.write(&path)?;
        println!("Wrote {rows} rows to {}", path.display());
    }

    Ok(())
}
