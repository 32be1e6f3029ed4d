pub mod classify;
pub mod config;
pub mod inject_code;
pub mod manifest;
pub mod run;
pub mod traits;
pub mod transform;
pub mod utils;
