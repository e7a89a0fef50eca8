//! External data: price history providers and ticker resolution.

pub mod prices;
pub mod ticker;
pub mod yahoo;

pub use prices::{CsvPriceDir, PriceProvider, fetch_yearly_closes, resample_yearly_last};
pub use ticker::{MappedTicker, PrefixTicker, TickerResolver};
pub use yahoo::YahooClient;
