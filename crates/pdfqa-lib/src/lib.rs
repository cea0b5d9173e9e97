pub mod config;
pub mod corpus;
pub mod db;
pub mod embedding;
pub mod error;
pub mod index;
pub mod oracle;
pub mod pipeline;
pub mod qa;
pub mod retrieval;
pub mod service;
pub mod transcript;

#[cfg(test)]
mod test_util;
