//! Process exit codes. Part of the public contract.

pub const PASS: i32 = 0;
pub const FAIL: i32 = 1; // Commit not trusted
pub const CONFIG_ERROR: i32 = 2; // Missing configuration or output failure
