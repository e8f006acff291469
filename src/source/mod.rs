pub mod tuna;

pub use tuna::TunaSource;

use crate::overlay::{ArtworkRef, Track};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body returned by the now-playing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artists: Vec<String>,
    /// Cache-bustable URL served by the source
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Same cover as a local file path
    #[serde(default)]
    pub cover_path: Option<String>,
}

impl NowPlaying {
    /// Nothing is playing when the source reports an empty title.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
    }

    /// Pick the artwork field selected by `use_local_file` and build a track.
    pub fn into_track(self, use_local_file: bool) -> Track {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        let artwork = if use_local_file {
            non_empty(self.cover_path).map(ArtworkRef::Local)
        } else {
            non_empty(self.cover_url).map(ArtworkRef::Remote)
        };

        Track {
            title: self.title,
            artists: self.artists,
            artwork,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that can report the current track 🎵
pub trait NowPlayingSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Result<NowPlaying, FetchError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tuna_payload() {
        let body = r#"{
            "title": "Song Name",
            "artists": ["Artist One", "Artist Two"],
            "cover_url": "http://localhost:1608/cover.png",
            "cover_path": "C:/Users/me/tuna/cover.png",
            "album_url": "ignored",
            "progress": 1234
        }"#;
        let np: NowPlaying = serde_json::from_str(body).unwrap();
        assert_eq!(np.title, "Song Name");
        assert_eq!(np.artists.len(), 2);

        let remote = np.clone().into_track(false);
        assert_eq!(
            remote.artwork,
            Some(ArtworkRef::Remote("http://localhost:1608/cover.png".into()))
        );
        let local = np.into_track(true);
        assert_eq!(
            local.artwork,
            Some(ArtworkRef::Local("C:/Users/me/tuna/cover.png".into()))
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let np: NowPlaying = serde_json::from_str("{}").unwrap();
        assert!(np.is_empty());

        let np: NowPlaying = serde_json::from_str(r#"{"title":"X","cover_url":""}"#).unwrap();
        assert_eq!(np.into_track(false).artwork, None);
    }
}
