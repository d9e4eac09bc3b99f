mod cli;
mod util;

pub(crate) use cli::{as_cli, print_usage, Session};

#[cfg(test)]
mod util_tests;
