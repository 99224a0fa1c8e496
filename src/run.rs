mod cli;
mod display;


pub(crate) use cli::as_cli;
