//! The manylinux wheel pipeline: install build deps, build, repair, publish.

mod artifacts;
mod build;
mod permissions;
mod pipeline;
mod plan;

pub use build::build_wheels;
pub use pipeline::{PipelineStep, StepStatus, WheelAction};
pub use plan::BuildRequest;
