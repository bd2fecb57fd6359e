// Stable error codes surfaced to callers alongside the human-readable message

pub mod validation {
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1002";
}

pub mod store {
    pub const UNAVAILABLE: &str = "STORE_4001";
    pub const CORRUPTED_DOCUMENT: &str = "STORE_4002";
}

pub mod conflict {
    pub const DUPLICATE_ID: &str = "CONFLICT_5001";
}

pub mod lookup {
    pub const NOT_FOUND: &str = "NOT_FOUND_6001";
}

pub mod configuration {
    pub const INVALID_CONFIG: &str = "CONFIG_7001";
}
