/// Longest host name, in bytes, a unit may report.
pub const MAX_HOST_LEN: usize = 255;

/// Fixed size of one exchanged locality record.
pub const UNIT_RECORD_SIZE: usize = 512;

/// Default bound on concurrently active teams.
pub const DEFAULT_MAX_TEAMS: usize = 32;

/// Separator between a parent host name and a module suffix (`node-mic0`).
pub const DEFAULT_MODULE_SEPARATOR: &str = "-";

/// Tag of the global (root) domain.
pub const ROOT_TAG: &str = ".";
