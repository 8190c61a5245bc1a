//! pt-core: shared foundation for the powertrain crates.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (float guards, table lookup, relaxation)
//! - roots (bracketed Brent root finder)
//! - sweep (linear point generation)
//! - catalog (immutable keyed registries for reference data)
//! - error (shared error types)

pub mod catalog;
pub mod error;
pub mod numeric;
pub mod roots;
pub mod sweep;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use catalog::Catalog;
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use roots::{BrentConfig, RootSolution, brent};
pub use sweep::SweepDefinition;
pub use units::*;
