pub mod argon2;
pub mod constant_time;
pub mod errors;
pub mod params;
pub mod phc;

pub use self::argon2::PasswordHasher;
pub use constant_time::constant_time_eq;
pub use errors::HashFormatError;
pub use errors::PasswordError;
pub use params::CostLimits;
pub use params::HashingParams;
pub use params::PasswordPolicy;
pub use phc::EncodedHash;
