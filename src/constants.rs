use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Storage key of the local education cache blob.
pub const LOCAL_EDUCATION_KEY: &str = "localEducation";

/// Storage key of the owner-mode toggle ("true" / "false" / unset).
pub const OWNER_MODE_KEY: &str = "ownerMode";

/// Where the form sends the user after a successful save.
pub const EDUCATION_LIST_PATH: &str = "/education";

pub const MAX_DEGREE_LENGTH: u64 = 120;
pub const MAX_FIELD_LENGTH: u64 = 120;
pub const MAX_THESIS_LENGTH: u64 = 200;
pub const MAX_DESCRIPTION_LENGTH: u64 = 200;
pub const MAX_DETAILS_LENGTH: u64 = 1000;
