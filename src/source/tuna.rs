use super::{FetchError, NowPlaying, NowPlayingSource};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;

/// Reads the Tuna OBS plugin's JSON endpoint at `{host}:{port}`.
pub struct TunaSource {
    client: Client,
    endpoint: String,
}

impl TunaSource {
    pub fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    async fn fetch_now_playing(&self) -> Result<NowPlaying, FetchError> {
        let resp = self.client.get(&self.endpoint).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl NowPlayingSource for TunaSource {
    fn fetch(&self) -> BoxFuture<'_, Result<NowPlaying, FetchError>> {
        self.fetch_now_playing().boxed()
    }
}
