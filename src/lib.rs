#![doc = "gcs-bucket-sync: verify two Cloud Storage buckets and mirror one into the other with gsutil rsync."]

pub mod bucket;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod gsutil;
pub mod inspect;
pub mod load_config;
pub mod synchronise;

pub use cli::{run, Cli};
