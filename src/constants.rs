pub(crate) const FIRESTORE_API_HOST: &str = "https://firestore.googleapis.com";
pub(crate) const FIRESTORE_API_VERSION: &str = "v1";
pub(crate) const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";

pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Deepest map/array nesting the store accepts for a single field value.
pub(crate) const MAX_VALUE_DEPTH: usize = 20;
