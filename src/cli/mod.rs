// src/cli/mod.rs
mod args;
mod remote;

pub use args::{
    parse_args, usage, CliError, Command, ServeArgs, DATABASE_CHECK, DEFAULT_CHECK_URL,
    REDIS_CHECK,
};
pub use remote::{check_remote, exit_code_for, EXIT_ERROR};
