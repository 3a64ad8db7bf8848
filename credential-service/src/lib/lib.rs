pub mod audit;
pub mod config;
pub mod domain;
pub mod outbound;

pub use domain::credential;
pub use outbound::repositories;
