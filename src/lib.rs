pub mod logging;
pub mod melt;
