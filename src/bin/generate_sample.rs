use anyhow::{anyhow, bail, Context, Result};
use cannabis_explorer::data::loader::REQUIRED_COLUMNS;
use encoding_rs::WINDOWS_1252;

/// (city as typed in the source, latitude, longitude, relative weight)
const CITIES: [(&str, f64, f64, u32); 8] = [
    ("Boston", 42.3601, -71.0589, 9),
    ("Worcester", 42.2626, -71.8023, 6),
    ("SPRINGFIELD", 42.1015, -72.5898, 5),
    ("Lowell", 42.6334, -71.3162, 4),
    ("cambridge", 42.3736, -71.1097, 4),
    ("Holyoke", 42.2043, -72.6162, 3),
    ("New Bedford", 41.6362, -70.9342, 3),
    ("North Adams", 42.7009, -73.1087, 1),
];

const LICENSE_TYPES: [(&str, u32); 5] = [
    ("Medicine Retailers", 8),
    ("Medicine Cultivators", 5),
    ("Medicine Product Manufacturers", 4),
    ("Medicine Microbusinesses", 2),
    ("Medicine Transporters", 1),
];

const NAME_PREFIXES: [&str; 6] = ["Green", "Bay State", "Café", "Pioneer", "Harbor", "Élan"];
const NAME_SUFFIXES: [&str; 4] = ["Wellness", "Botanicals", "Farms", "Collective"];

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn weighted<'a, T>(&mut self, items: &'a [T], weight: impl Fn(&T) -> u32) -> &'a T {
        let total: u32 = items.iter().map(&weight).sum();
        let mut pick = self.below(total as usize) as u32;
        for item in items {
            let w = weight(item);
            if pick < w {
                return item;
            }
            pick -= w;
        }
        &items[items.len() - 1]
    }
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_establishments.csv".to_string());
    let mut rng = SimpleRng::new(42);
    let n_rows = 240;

    // Ids are written out of order; the loader sorts them.
    let mut ids: Vec<u32> = (1..=n_rows).collect();
    for i in (1..ids.len()).rev() {
        ids.swap(i, rng.below(i + 1));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<&str> = REQUIRED_COLUMNS.to_vec();
    header.push("application_status");
    writer.write_record(&header).context("writing header")?;

    for id in ids {
        let &(city, lat, lon, _) = rng.weighted(&CITIES, |c| c.3);
        let &(license, _) = rng.weighted(&LICENSE_TYPES, |l| l.1);
        let name = format!(
            "{} {}",
            NAME_PREFIXES[rng.below(NAME_PREFIXES.len())],
            NAME_SUFFIXES[rng.below(NAME_SUFFIXES.len())]
        );
        let payment = (rng.below(20) as f64 + 1.0) * 100.0;

        // A few rows miss their city or coordinates, like the real dataset.
        let city = if rng.below(25) == 0 { "" } else { city };
        let (lat, lon) = if rng.below(8) == 0 {
            (String::new(), String::new())
        } else {
            (
                format!("{:.5}", rng.gauss(lat, 0.02)),
                format!("{:.5}", rng.gauss(lon, 0.02)),
            )
        };

        writer
            .write_record([
                id.to_string(),
                name,
                city.to_string(),
                license.to_string(),
                format!("{payment:.0}"),
                lat,
                lon,
                "Approved".to_string(),
            ])
            .with_context(|| format!("writing row {id}"))?;
    }

    let buffer = writer
        .into_inner()
        .map_err(|e| anyhow!("flushing CSV: {e}"))?;
    let text = String::from_utf8(buffer).context("CSV output is not UTF-8")?;
    let (bytes, _, unmappable) = WINDOWS_1252.encode(&text);
    if unmappable {
        bail!("sample text cannot be represented in ISO-8859-1");
    }
    std::fs::write(&output_path, &bytes)
        .with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {n_rows} establishments (ISO-8859-1) to {output_path}");
    Ok(())
}
