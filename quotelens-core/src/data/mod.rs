//! Market data: provider boundary, table types, normalization, memoized loading.

pub mod loader;
pub mod normalize;
pub mod provider;
pub mod table;
pub mod yahoo;

pub use loader::{SeriesCache, SeriesLoader};
pub use normalize::{flatten_label, normalize};
pub use provider::{DataError, Interval, MarketDataSource, Period};
pub use table::{ColumnLabel, FlatTable, RawTable};
pub use yahoo::YahooProvider;
