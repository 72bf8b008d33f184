//! Personal time diary. Activities are logged either live or after the fact into an append-only
//! csv file, and then summed up per day, week or month and charted in the terminal.
//!

pub mod cli;
pub mod diary;
pub mod utils;
