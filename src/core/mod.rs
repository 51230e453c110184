pub mod etl;
pub mod parser;
pub mod pipeline;
pub mod reply;
pub mod sub_entry;
pub mod webhook;

pub use crate::domain::model::{
    InboundMessage, LoadSummary, MainRow, Report, SheetRow, SubEntry, SubEntryRow,
    TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, ReplySender, Storage};
pub use crate::utils::error::Result;
