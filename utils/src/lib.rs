pub mod surf_logging;
pub mod url;

pub use surf_logging::SurfLogging;
