// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "ChatFlow";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "chatflow";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".chatflow";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "chatflow.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "CHATFLOW_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "CHATFLOW_DEBUG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "CHATFLOW_LOG";

/// Environment variable for the input log format (auto, json, jsonl)
pub const ENV_INPUT_FORMAT: &str = "CHATFLOW_INPUT_FORMAT";

/// Environment variable for pretty-printed output
pub const ENV_PRETTY: &str = "CHATFLOW_PRETTY";

// =============================================================================
// Input / Output
// =============================================================================

/// Input path meaning "read from stdin"
pub const STDIN_PATH: &str = "-";

/// Top-level key holding the log when the input is a JSON object
pub const MESSAGES_KEY: &str = "messages";
