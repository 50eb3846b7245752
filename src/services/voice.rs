use async_trait::async_trait;

/// Speech-to-text capability.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> anyhow::Result<String>;
}

/// Text-to-speech capability.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str) -> anyhow::Result<()>;
}
