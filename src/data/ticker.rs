//! Company id → market ticker resolution.
//!
//! There is no authoritative CVM-code → B3-ticker mapping in the statement
//! files, so resolution is a pluggable strategy. `PrefixTicker` is a
//! best-effort placeholder; `MappedTicker` takes an explicit mapping.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::domain::Company;
use crate::error::AppError;

/// Resolve a company to a ticker symbol understood by the price provider.
pub trait TickerResolver {
    fn resolve(&self, company: &Company) -> Option<String>;
}

/// Fixed-width numeric prefix of the company id plus a share-class suffix.
///
/// Ids shorter than `width` are left-padded with zeros (35 -> `00353.SA`),
/// so every derived ticker has the same shape and price files for different
/// short ids never collide on a shorter prefix.
///
/// Frequently wrong: CVM codes are not B3 tickers. Expect mismatches.
#[derive(Debug, Clone)]
pub struct PrefixTicker {
    pub width: usize,
    pub suffix: String,
}

impl Default for PrefixTicker {
    fn default() -> Self {
        Self {
            width: 4,
            // Common share (ON) on B3, Yahoo notation.
            suffix: "3.SA".to_string(),
        }
    }
}

impl TickerResolver for PrefixTicker {
    fn resolve(&self, company: &Company) -> Option<String> {
        let digits = format!("{:0>width$}", company.id, width = self.width);
        let prefix: String = digits.chars().take(self.width).collect();
        Some(format!("{prefix}{}", self.suffix))
    }
}

/// Explicit `cd_cvm,ticker` mapping; unmapped companies have no ticker.
#[derive(Debug, Clone, Default)]
pub struct MappedTicker {
    map: HashMap<u32, String>,
}

impl MappedTicker {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, String)>) -> Self {
        Self {
            map: pairs.into_iter().collect(),
        }
    }

    /// Read a two-column CSV (`cd_cvm,ticker`, header required).
    pub fn from_csv(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open ticker map '{}': {e}", path.display())))?;
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

        let mut map = HashMap::new();
        for (idx, result) in reader.records().enumerate() {
            let line = idx + 2;
            let record = result
                .map_err(|e| AppError::new(2, format!("{}:{line}: CSV parse error: {e}", path.display())))?;
            let (Some(raw_id), Some(ticker)) = (record.get(0), record.get(1)) else {
                return Err(AppError::new(2, format!("{}:{line}: expected `cd_cvm,ticker`", path.display())));
            };
            let id = raw_id
                .parse::<u32>()
                .map_err(|_| AppError::new(2, format!("{}:{line}: invalid company id '{raw_id}'", path.display())))?;
            if !ticker.is_empty() {
                map.insert(id, ticker.to_string());
            }
        }
        Ok(Self { map })
    }
}

impl TickerResolver for MappedTicker {
    fn resolve(&self, company: &Company) -> Option<String> {
        self.map.get(&company.id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(id: u32) -> Company {
        Company {
            id,
            name: "ACME".to_string(),
        }
    }

    #[test]
    fn prefix_ticker_truncates_and_pads() {
        let resolver = PrefixTicker::default();
        assert_eq!(resolver.resolve(&company(906_512)).as_deref(), Some("90653.SA"));
        assert_eq!(resolver.resolve(&company(9512)).as_deref(), Some("95123.SA"));
        assert_eq!(resolver.resolve(&company(35)).as_deref(), Some("00353.SA"));

        let narrow = PrefixTicker {
            width: 2,
            suffix: "3.SA".to_string(),
        };
        assert_eq!(narrow.resolve(&company(7)).as_deref(), Some("073.SA"));
        assert_eq!(narrow.resolve(&company(9512)).as_deref(), Some("953.SA"));
    }

    #[test]
    fn mapped_ticker_reads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.csv");
        std::fs::write(&path, "cd_cvm,ticker\n9512,PETR4.SA\n4170,VALE3.SA\n19348,\n").unwrap();

        let resolver = MappedTicker::from_csv(&path).unwrap();
        assert_eq!(resolver.resolve(&company(9512)).as_deref(), Some("PETR4.SA"));
        assert_eq!(resolver.resolve(&company(19348)), None);
        assert_eq!(resolver.resolve(&company(1)), None);
    }
}
