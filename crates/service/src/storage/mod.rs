//! Document store backends.
//!
//! `file_store` keeps everything in one JSON file for local runs and tests;
//! `seaorm` is the Postgres backend.

pub mod file_store;
pub mod json_map_store;
pub mod seaorm;
