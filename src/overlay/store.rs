use serde::{Deserialize, Serialize};

/// Where a track's cover art lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ArtworkRef {
    /// Remote URL, cache-busted by the artwork layer on load
    Remote(String),
    /// Path on the local filesystem
    Local(String),
}

impl ArtworkRef {
    pub fn as_str(&self) -> &str {
        match self {
            ArtworkRef::Remote(s) | ArtworkRef::Local(s) => s,
        }
    }
}

/// One crossfade layer: the cover reference plus the swap that showed it.
/// A source that rewrites its cover in place hands out the same reference
/// for every track; the generation keeps each swap's layer distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtworkLayer {
    pub art: ArtworkRef,
    pub generation: u64,
}

impl ArtworkLayer {
    pub fn new(art: ArtworkRef, generation: u64) -> Self {
        Self { art, generation }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artists: Vec<String>,
    pub artwork: Option<ArtworkRef>,
}

impl Track {
    pub fn new(title: &str, artists: &[&str], artwork: Option<ArtworkRef>) -> Self {
        Self {
            title: title.to_string(),
            artists: artists.iter().map(|a| a.to_string()).collect(),
            artwork,
        }
    }

    /// Title is the change signal; artists and artwork are not compared.
    pub fn is_same_as(&self, other: &Track) -> bool {
        self.title == other.title
    }

    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// The displayed track and the one before it (kept only for the crossfade).
#[derive(Debug, Default, Clone)]
pub struct TrackStore {
    current: Option<Track>,
    previous: Option<Track>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Track> {
        self.previous.as_ref()
    }

    pub fn set(&mut self, track: Track) {
        self.previous = self.current.replace(track);
    }

    /// Drop the previous slot once its crossfade has run out.
    pub fn retire_previous(&mut self) {
        self.previous = None;
    }
}
