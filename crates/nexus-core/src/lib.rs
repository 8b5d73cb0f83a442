pub mod apply;
pub mod document;
pub mod engine;
pub mod error;
pub mod id;
pub mod io;
pub mod mirror;
pub mod paths;
pub mod plan;
pub mod scan;
pub mod sequence;
pub mod verify;

pub use engine::{ContextDetails, ContextEngine, CreatedContext, RenumberSummary};
pub use error::{ApplyError, CorpusError, EngineError, PlanError, Result, ScanError};
pub use id::ContextId;
