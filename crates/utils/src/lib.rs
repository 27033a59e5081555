pub mod env;
pub mod ids;
pub mod logging;
