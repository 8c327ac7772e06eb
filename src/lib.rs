pub mod error;
pub mod projection;
pub mod scenario;
pub mod triangulation;
pub mod types;
