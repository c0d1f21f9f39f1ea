pub mod entities;
pub mod use_cases;
pub mod date_codec;
pub mod level;
pub mod suggestions;
