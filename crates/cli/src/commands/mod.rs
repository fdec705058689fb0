//! CLI Commands

pub mod countdown;
pub mod generate;
pub mod wallet;
