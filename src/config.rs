use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use encoding_rs::Encoding;
use serde::Deserialize;

use crate::data::loader::DataSource;

/// Published CSV export of the Massachusetts establishment license dataset.
pub const DEFAULT_SOURCE: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRpgZND22CxTxRyUdeRhMUgCVX8Pxph9NDb8_NE2lUKPyND4MsNYi62YNbrI1pU8g/pub?output=csv";

/// The dataset contains legacy single-byte text, so UTF-8 is not the default.
pub const DEFAULT_ENCODING: &str = "ISO-8859-1";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(version, about = "Explore Massachusetts cannabis establishment licenses")]
pub struct Args {
    /// JSON configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// CSV URL or local path (overrides the configuration file).
    #[arg(short, long)]
    pub source: Option<String>,

    /// Text encoding label of the CSV, e.g. ISO-8859-1 or UTF-8.
    #[arg(short, long)]
    pub encoding: Option<String>,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Bounds and initial value of the maximum-payment slider.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaymentRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl Default for PaymentRange {
    fn default() -> Self {
        PaymentRange {
            min: 0.0,
            max: 2000.0,
            default: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source: String,
    pub encoding: String,
    pub payment: PaymentRange,
    /// How many cities the "most establishments" chart shows.
    pub top_cities: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            source: DEFAULT_SOURCE.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            payment: PaymentRange::default(),
            top_cities: 8,
        }
    }
}

impl DashboardConfig {
    /// Defaults, then the optional config file, then command line flags.
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(source) = &args.source {
            config.source = source.clone();
        }
        if let Some(encoding) = &args.encoding {
            config.encoding = encoding.clone();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.text_encoding()?;
        let p = self.payment;
        if !(p.min <= p.default && p.default <= p.max) {
            bail!(
                "payment range must satisfy min <= default <= max, got {} / {} / {}",
                p.min,
                p.default,
                p.max
            );
        }
        if self.source.trim().is_empty() {
            bail!("data source must not be empty");
        }
        Ok(())
    }

    /// Resolve the configured encoding label.
    pub fn text_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .with_context(|| format!("unknown text encoding '{}'", self.encoding))
    }

    pub fn data_source(&self) -> DataSource {
        DataSource::parse(&self.source)
    }
}
