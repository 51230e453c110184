use crate::domain::model::{InboundMessage, LoadSummary, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    /// Appends `data` to `path`, writing `header` first when the file is new or empty.
    /// Concurrent appends to the same path must all land.
    fn append_file(
        &self,
        path: &str,
        header: &[u8],
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ReplySender: Send + Sync {
    fn send_reply(
        &self,
        reply_token: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn main_sheet(&self) -> &str;
    fn report_sheet(&self) -> &str;
    fn reply_endpoint(&self) -> &str;
    fn channel_token(&self) -> &str;
    fn reply_text(&self) -> &str;
    fn utc_offset_hours(&self) -> i32;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, payload: &str) -> Result<InboundMessage>;
    async fn transform(&self, message: InboundMessage) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<LoadSummary>;
    async fn reply(&self, reply_token: &str) -> Result<()>;
}
