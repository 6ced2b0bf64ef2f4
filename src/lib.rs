pub mod aggregate;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod import;
pub mod measures;
pub mod model;
pub mod parsers;
pub mod project;
pub mod resolve;
pub mod xml;
