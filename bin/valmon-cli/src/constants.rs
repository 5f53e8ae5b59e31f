/// Base name used for the logging whoami string.
pub const LOG_BASE_NAME: &str = "valmon";

/// Name of the config file inside the project config dir.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const PROJECT_QUALIFIER: &str = "xyz";
pub const PROJECT_ORGANIZATION: &str = "valmon";
pub const PROJECT_APPLICATION: &str = "valmon";
