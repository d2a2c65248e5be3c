use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use super::storage::StoredRef;

/// Aspect-ratio class of a video, used to namespace storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    /// Classify by `width / height`: strictly inside (1.7, 1.8) is landscape
    /// (16:9 is ~1.778), strictly inside (0.5, 0.6) is portrait (9:16 is 0.5625).
    pub fn classify(width: u32, height: u32) -> Self {
        if height == 0 {
            return Orientation::Other;
        }
        let ratio = f64::from(width) / f64::from(height);
        if ratio > 1.7 && ratio < 1.8 {
            Orientation::Landscape
        } else if ratio > 0.5 && ratio < 0.6 {
            Orientation::Portrait
        } else {
            Orientation::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Video record as held by the metadata store.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    /// Stored object; resolved to a presigned URL only on the way out.
    pub video_ref: Option<StoredRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(user_id: Uuid, title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            description,
            thumbnail_url: None,
            video_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Video as returned to clients. `video_url` is a presigned, expiring URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    pub fn from_video(video: Video, video_url: Option<String>) -> Self {
        Self {
            id: video.id,
            user_id: video.user_id,
            title: video.title,
            description: video.description,
            thumbnail_url: video.thumbnail_url,
            video_url,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        assert_eq!(Orientation::classify(1920, 1080), Orientation::Landscape);
        assert_eq!(Orientation::classify(1280, 720), Orientation::Landscape);
        assert_eq!(Orientation::classify(1080, 1920), Orientation::Portrait);
        assert_eq!(Orientation::classify(1000, 1000), Orientation::Other);
        assert_eq!(Orientation::classify(640, 480), Orientation::Other);
    }

    #[test]
    fn test_classify_bounds_are_exclusive() {
        // 17:10 and 18:10 sit exactly on the landscape bounds
        assert_eq!(Orientation::classify(1700, 1000), Orientation::Other);
        assert_eq!(Orientation::classify(1800, 1000), Orientation::Other);
        assert_eq!(Orientation::classify(500, 1000), Orientation::Other);
        assert_eq!(Orientation::classify(600, 1000), Orientation::Other);
        assert_eq!(Orientation::classify(1750, 1000), Orientation::Landscape);
        assert_eq!(Orientation::classify(550, 1000), Orientation::Portrait);
    }

    #[test]
    fn test_zero_height_is_other() {
        assert_eq!(Orientation::classify(1920, 0), Orientation::Other);
    }

    #[test]
    fn test_orientation_strings() {
        assert_eq!(Orientation::Landscape.to_string(), "landscape");
        assert_eq!(Orientation::Portrait.to_string(), "portrait");
        assert_eq!(Orientation::Other.to_string(), "other");
    }

    #[test]
    fn test_response_carries_signed_url() {
        let video = Video::new(Uuid::new_v4(), "t".into(), "d".into());
        let resp = VideoResponse::from_video(video.clone(), Some("https://signed".into()));
        assert_eq!(resp.id, video.id);
        assert_eq!(resp.video_url.as_deref(), Some("https://signed"));
    }
}
