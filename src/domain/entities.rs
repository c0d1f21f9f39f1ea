pub mod education;
pub mod profile;
