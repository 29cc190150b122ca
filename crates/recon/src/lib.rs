//! `divrecon-recon`: deterministic dividend reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded raw tables, returns the break list.
//! No CLI or IO dependencies.

pub mod alias;
pub mod compare;
pub mod config;
pub mod context;
pub mod date;
pub mod emit;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod mapping;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod number;

pub use alias::AliasTable;
pub use config::ReconConfig;
pub use context::{enrich_groups, group_breaks, BreakCategory, BreakEnricher, BreakGroup};
pub use date::DayOrder;
pub use engine::run;
pub use error::{CellError, ReconError};
pub use mapping::{Field, FieldMapping, FieldType, MappingEntry};
pub use model::{
    BreakRecord, BreakType, Dataset, DuplicateKey, FieldValue, JoinKey, RawRow, RawTable, ReconOutput,
    ReconSummary,
};
