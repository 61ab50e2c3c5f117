/// Application name
pub const APP_NAME: &str = "Tandem";

/// Separator between the two sorted participant ids in a room id
pub const ROOM_ID_SEPARATOR: &str = "-";

/// Maximum attachment size in bytes (50 MiB)
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// MIME type recorded for attachments whose type cannot be guessed
pub const FALLBACK_MIME: &str = "application/octet-stream";
