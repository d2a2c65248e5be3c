use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres};
use tubely_core::{AppError, StoredRef, Video};
use uuid::Uuid;

/// Metadata store for video records
#[async_trait::async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Persist all mutable fields of `video`. Last write wins.
    async fn update(&self, video: &Video) -> Result<Video, AppError>;

    async fn create(&self, video: &Video) -> Result<Video, AppError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
}

#[derive(Debug, FromRow)]
struct VideoRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    thumbnail_url: Option<String>,
    video_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Video {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            thumbnail_url: row.thumbnail_url,
            video_ref: row.video_url.as_deref().map(StoredRef::parse),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL-backed [`VideoRepository`]
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let row: Option<VideoRow> =
            sqlx::query_as::<Postgres, VideoRow>("SELECT * FROM videos WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Video::from))
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "update", db.record_id = %video.id))]
    async fn update(&self, video: &Video) -> Result<Video, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            UPDATE videos
            SET title = $2, description = $3, thumbnail_url = $4, video_url = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(video.video_ref.as_ref().map(StoredRef::encode))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Video::from)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video.id)))
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "insert", db.record_id = %video.id))]
    async fn create(&self, video: &Video) -> Result<Video, AppError> {
        let row: VideoRow = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            INSERT INTO videos (id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(video.id)
        .bind(video.user_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(video.video_ref.as_ref().map(StoredRef::encode))
        .bind(video.created_at)
        .bind(video.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Video::from(row))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let rows: Vec<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            "SELECT * FROM videos WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Video::from).collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(video_url: Option<&str>) -> VideoRow {
        VideoRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Boots".to_string(),
            description: "Unboxing".to_string(),
            thumbnail_url: None,
            video_url: video_url.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_without_reference() {
        let video = Video::from(row(None));
        assert!(video.video_ref.is_none());
    }

    #[test]
    fn test_row_reference_is_decoded() {
        let video = Video::from(row(Some("tubely-videos,landscape/abc.mp4")));
        let stored = video.video_ref.unwrap();
        let r = stored.object().unwrap();
        assert_eq!(r.bucket, "tubely-videos");
        assert_eq!(r.key, "landscape/abc.mp4");
    }

    #[test]
    fn test_row_with_unreadable_reference_still_loads() {
        let legacy = "https://b.s3.us-east-1.amazonaws.com/landscape/x.mp4";
        let video = Video::from(row(Some(legacy)));
        let stored = video.video_ref.unwrap();
        assert!(stored.object().is_err());
        // Written back unchanged unless an upload replaces it
        assert_eq!(stored.encode(), legacy);
    }
}
