pub mod errors;
pub mod db;
pub mod document;
pub mod service_agent;
pub mod service_config;
pub mod legacy_document;

#[cfg(test)]
mod tests;
