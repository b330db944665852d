//! Tool layer: declarative tool specs and the dispatch registry.

mod registry;
mod spec;

pub use registry::{RegistrationError, ToolCallResult, ToolError, ToolHandler, ToolRegistry};
pub use spec::{AdvertisedTool, ParamSpec, ParamType, ToolSpec};
