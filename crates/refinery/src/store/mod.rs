//! Transformation records, storage and persistence.

mod memory;
mod persistence;
mod transformation;

pub use memory::{MemoryStore, TransformationStore};
pub use persistence::{LEDGER_VERSION, TransformationLedger, transforms_path};
pub use transformation::{
    DeleteMode, NewTransformation, OutputMode, Transformation, TransformationStatus,
    TransformationUpdate, new_transformation_id,
};
