//! Centralized string constants for the relay CLI
//!
//! Flag naming, sentinel values, parameter locations and user-facing hints
//! live here so the engine and the binary agree on them.

// Flag naming
pub const CHILD_FLAG_SEPARATOR: char = '.';
pub const PARAM_CONFLICT_PREFIX: &str = "param.";
pub const CONFIG_CONFLICT_PREFIX: &str = "config.";
/// Property names starting with this marker are internal knobs.
pub const INTERNAL_MARKER_PREFIX: &str = "_";
/// Internal knobs surface under this namespace.
pub const CONTROL_NAMESPACE: &str = "control.";
pub const EXPAND_SLOT_SUFFIX: &str = "...";
/// Body properties colliding with a declared parameter are renamed with this prefix.
pub const BODY_CONFLICT_PREFIX: &str = "req-";

// Sentinel flag values
pub const VALUE_HELP_IS_REQUIRED: &str = "help";
pub const VALUE_LOAD_JSON_FROM_FILE_PREFIX: &str = "@";
pub const VALUE_LOAD_VERBATIM_FROM_FILE_PREFIX: &str = "%";

// Flag type tags
pub const FLAG_TYPE_ENUM: &str = "enum";
pub const FLAG_TYPE_FILE: &str = "file";
pub const FLAG_TYPE_DIRECTORY: &str = "directory";
pub const FLAG_TYPE_ANY: &str = "any";

// Schema Types
pub const SCHEMA_TYPE_STRING: &str = "string";
pub const SCHEMA_TYPE_NUMBER: &str = "number";
pub const SCHEMA_TYPE_INTEGER: &str = "integer";
pub const SCHEMA_TYPE_BOOLEAN: &str = "boolean";
pub const SCHEMA_TYPE_ARRAY: &str = "array";
pub const SCHEMA_TYPE_OBJECT: &str = "object";
pub const SCHEMA_TYPE_NULL: &str = "null";

// Schema formats used as completion hints
pub const SCHEMA_FORMAT_FILE: &str = "file";
pub const SCHEMA_FORMAT_DIRECTORY: &str = "directory";

// Parameter Locations
pub const PARAM_LOCATION_PATH: &str = "path";
pub const PARAM_LOCATION_QUERY: &str = "query";
pub const PARAM_LOCATION_HEADER: &str = "header";
pub const PARAM_LOCATION_COOKIE: &str = "cookie";

// OpenAPI Extensions
pub const DEFAULT_EXTENSION_PREFIX: &str = "x-relay";
pub const EXT_REQUEST_BODY_PARAMETERS: &str = "requestBodyParameters";
pub const EXT_NAME: &str = "name";

// Link naming
pub const MISSING_LINK_NAME: &str = "missing";

// HTTP Headers
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_COOKIE: &str = "Cookie";
pub const CONTENT_TYPE_JSON: &str = "application/json";

// Environment Variables
pub const ENV_RELAY_CONFIG: &str = "RELAY_CONFIG";
pub const ENV_RELAY_CONFIG_DIR: &str = "RELAY_CONFIG_DIR";
pub const ENV_RELAY_LOG: &str = "RELAY_LOG";
pub const ENV_RELAY_LOG_FORMAT: &str = "RELAY_LOG_FORMAT";
pub const ENV_RELAY_LOG_FILE: &str = "RELAY_LOG_FILE";
pub const ENV_RELAY_LOG_MAX_BODY: &str = "RELAY_LOG_MAX_BODY";
pub const DEFAULT_ENV_PREFIX: &str = "RELAY";

// Files and directories
pub const CONFIG_DIR_NAME: &str = "relay";
pub const CONFIG_FILENAME: &str = "config.toml";

// Completion output
pub const ACTIVE_HELP_MARKER: &str = "_activeHelp_ ";

// Error Context Messages
pub const ERR_FILE_NOT_FOUND: &str = "Check that the file path is correct and the file exists.";
pub const ERR_PERMISSION: &str = "Check file permissions or run with appropriate privileges.";
pub const ERR_YAML_SYNTAX: &str = "Check that your operation catalog is valid YAML syntax.";
pub const ERR_JSON_SYNTAX: &str = "Check that the value or file contains valid JSON.";
pub const ERR_TOML_SYNTAX: &str = "Check that your configuration file is valid TOML syntax.";
pub const MSG_USE_HELP: &str = "Use --help to see the accepted flags.";
