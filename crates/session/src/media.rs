//! External media capture contract
//!
//! The session never touches capture devices itself; whatever hosts it
//! (a browser shim, a native capture layer, a test double) supplies a
//! [`MediaSource`]. The session's only obligations are to acquire local
//! media before entering a room and to stop every track on teardown.

use crate::config::MediaConstraints;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

/// One capture track of a local stream
pub trait MediaTrack: Send + Sync {
    /// Track identifier, unique within its stream
    fn id(&self) -> &str;

    /// Track kind
    fn kind(&self) -> TrackKind;

    /// Stop capture for this track; must be idempotent
    fn stop(&self);
}

/// A set of live capture tracks
pub trait MediaStream: Send + Sync {
    /// The tracks making up this stream
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// Stop every track
    fn stop_all(&self) {
        for track in self.tracks() {
            track.stop();
        }
    }
}

/// Capability that acquires local media
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Acquire a local stream satisfying `constraints`
    ///
    /// # Errors
    ///
    /// [`crate::Error::MediaAccessDenied`] when the user refuses,
    /// [`crate::Error::MediaDeviceNotFound`] when no device exists,
    /// [`crate::Error::MediaAccess`] for anything else.
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<Box<dyn MediaStream>>;
}
