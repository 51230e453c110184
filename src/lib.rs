pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

#[cfg(feature = "lambda")]
pub use crate::config::lambda::{LambdaConfig, S3Storage};

pub use crate::config::toml_config::TomlConfig;
pub use crate::core::{
    etl::EtlEngine, parser::parse_message, pipeline::ReportPipeline, reply::LineReplyClient,
    sub_entry::parse_sub_entry, webhook::WebhookResponse,
};
pub use crate::domain::model::{Report, SubEntry};
pub use crate::utils::error::{EtlError, ParseError, Result};
