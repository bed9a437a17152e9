//! CLI command handlers.

pub mod config;
pub mod env;
pub mod init;
pub mod prompts;

pub use config::{run_config_check, run_config_schema, run_config_show};
pub use env::run_env_check;
pub use init::run_init;
pub use prompts::{run_prompts_list, run_prompts_show_system};
