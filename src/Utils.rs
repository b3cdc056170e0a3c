//! different utility modules used throughout the project
/// typed configuration read from a TOML file
pub mod config;
/// tiny module to set up terminal and file logging
pub mod logger;
/// tiny module to plot a function of x into a PNG file
pub mod plots;
