//! pt-prop: propeller performance surfaces.
//!
//! Thrust and power over the (airspeed, RPM) plane, linearly interpolated
//! on a Delaunay triangulation of scattered test samples. Queries outside
//! the convex hull of the samples are reported as out of envelope, never
//! extrapolated.

pub mod error;
pub mod geometry;
pub mod id;
pub mod sample;
pub mod surface;

pub use error::{PropError, PropResult};
pub use id::PropId;
pub use sample::{PropSample, grid_samples};
pub use surface::{Domain, PropPerformanceSurface, PropPoint, SurfaceConfig, ThrustSolution};
