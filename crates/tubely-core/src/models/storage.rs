//! Object reference model: identifies exactly one object in the object store.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Bucket and key of a stored object.
///
/// This is an internal handle, never a URL. It is flattened to a single
/// `"<bucket>,<key>"` string only when written to the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectRefError {
    #[error("object reference has no ',' separator: {0:?}")]
    MissingSeparator(String),

    #[error("object reference has an empty bucket")]
    EmptyBucket,

    #[error("object reference has an empty key")]
    EmptyKey,

    #[error("bucket name must not contain ',': {0:?}")]
    InvalidBucket(String),
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self, ObjectRefError> {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.is_empty() {
            return Err(ObjectRefError::EmptyBucket);
        }
        if bucket.contains(',') {
            return Err(ObjectRefError::InvalidBucket(bucket));
        }
        if key.is_empty() {
            return Err(ObjectRefError::EmptyKey);
        }
        Ok(Self { bucket, key })
    }

    /// Stored form: `<bucket>,<key>`.
    pub fn encode(&self) -> String {
        format!("{},{}", self.bucket, self.key)
    }

    /// Parse the stored form. Splits at the first comma, so keys may contain commas.
    pub fn decode(raw: &str) -> Result<Self, ObjectRefError> {
        let (bucket, key) = raw
            .split_once(',')
            .ok_or_else(|| ObjectRefError::MissingSeparator(raw.to_string()))?;
        Self::new(bucket, key)
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// A video reference as persisted on the record.
///
/// Rows written by older deployments may hold values that no longer parse
/// (for example a public URL). Those still load so ownership checks and
/// re-uploads work; they only fail when a URL is signed for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredRef {
    Object(ObjectRef),
    Unreadable { raw: String, reason: ObjectRefError },
}

impl StoredRef {
    pub fn parse(raw: &str) -> Self {
        match ObjectRef::decode(raw) {
            Ok(object) => StoredRef::Object(object),
            Err(reason) => StoredRef::Unreadable {
                raw: raw.to_string(),
                reason,
            },
        }
    }

    /// Value written back to the metadata store. Unreadable values are kept verbatim.
    pub fn encode(&self) -> String {
        match self {
            StoredRef::Object(object) => object.encode(),
            StoredRef::Unreadable { raw, .. } => raw.clone(),
        }
    }

    pub fn object(&self) -> Result<&ObjectRef, &ObjectRefError> {
        match self {
            StoredRef::Object(object) => Ok(object),
            StoredRef::Unreadable { reason, .. } => Err(reason),
        }
    }
}

impl From<ObjectRef> for StoredRef {
    fn from(object: ObjectRef) -> Self {
        StoredRef::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let r = ObjectRef::new("tubely-videos", "landscape/abc.mp4").unwrap();
        assert_eq!(r.encode(), "tubely-videos,landscape/abc.mp4");
        assert_eq!(ObjectRef::decode(&r.encode()).unwrap(), r);
    }

    #[test]
    fn test_key_with_comma_survives() {
        let r = ObjectRef::new("bucket", "other/a,b.mp4").unwrap();
        let decoded = ObjectRef::decode(&r.encode()).unwrap();
        assert_eq!(decoded.bucket, "bucket");
        assert_eq!(decoded.key, "other/a,b.mp4");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            ObjectRef::decode("no-separator"),
            Err(ObjectRefError::MissingSeparator(_))
        ));
        assert_eq!(
            ObjectRef::decode(",key.mp4"),
            Err(ObjectRefError::EmptyBucket)
        );
        assert_eq!(ObjectRef::decode("bucket,"), Err(ObjectRefError::EmptyKey));
    }

    #[test]
    fn test_bucket_with_comma_rejected() {
        assert!(matches!(
            ObjectRef::new("a,b", "k"),
            Err(ObjectRefError::InvalidBucket(_))
        ));
    }

    #[test]
    fn test_stored_ref_keeps_unreadable_values() {
        let raw = "https://b.s3.us-east-1.amazonaws.com/landscape/x.mp4";
        let stored = StoredRef::parse(raw);
        assert!(matches!(
            stored.object(),
            Err(ObjectRefError::MissingSeparator(_))
        ));
        assert_eq!(stored.encode(), raw);
    }

    #[test]
    fn test_stored_ref_parses_object() {
        let stored = StoredRef::parse("tubely-videos,portrait/abc.mp4");
        let object = stored.object().unwrap();
        assert_eq!(object.bucket, "tubely-videos");
        assert_eq!(object.key, "portrait/abc.mp4");
    }
}
