//! Tabular data the engine reads from.
//!
//! Datasets are owned by the caller. The engine only ever reads rows and
//! produces fresh derived rows; nothing here is mutated by a transformation.

mod loader;
mod table;
mod types;
mod value;

pub use loader::{write_delimited, Loader, LoaderConfig};
pub use table::{Dataset, SourceMetadata};
pub use types::{ColumnInfo, ColumnType};
pub use value::{format_number, Row, Value};
