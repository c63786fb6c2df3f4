//! Refinery: a transformation expression engine for tabular data.
//!
//! Users attach named, ordered transformations to a column and see the
//! derived values without the source data ever being modified.
//!
//! # Components
//!
//! - [`expression`]: a total parser for the flat `FUNC(arg, ...)` language
//! - [`functions`]: the fixed catalog of string, math, date, utility and
//!   whole-column transform functions
//! - [`pipeline`]: threads a column's value through an ordered chain
//! - [`sequencer`]: owns chain order and lifecycle rules over a store
//! - [`preview`]: before/after pairs for a candidate transformation
//!
//! # Example
//!
//! ```
//! use refinery::{EngineConfig, NewTransformation, Row, Sequencer, Value};
//!
//! let sequencer = Sequencer::in_memory(EngineConfig::default());
//! sequencer.create(NewTransformation::new("people", "name", "TRIM(name)")).unwrap();
//! sequencer.create(NewTransformation::new("people", "name", "UPPERCASE(name)")).unwrap();
//!
//! let rows = vec![Row::from([("name".to_string(), Value::text("  ada "))])];
//! let derived = sequencer.apply("people", "name", &rows).unwrap();
//! assert_eq!(derived[0]["name"], Value::text("ADA"));
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod expression;
pub mod functions;
pub mod pipeline;
pub mod preview;
pub mod sequencer;
pub mod store;

pub use config::{EngineConfig, IfSemantics};
pub use dataset::{ColumnType, Dataset, Loader, Row, Value};
pub use error::{RefineryError, Result};
pub use expression::{Argument, Expression, ParsedExpression, parse};
pub use functions::{FunctionLibrary, FunctionSpec, FunctionType};
pub use pipeline::{Pipeline, Step};
pub use preview::{Preview, PreviewPair, PreviewRequest, Previewer};
pub use sequencer::Sequencer;
pub use store::{
    DeleteMode, MemoryStore, NewTransformation, OutputMode, Transformation, TransformationStatus,
    TransformationStore, TransformationUpdate,
};
