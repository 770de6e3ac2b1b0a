use chrono::{DateTime, Utc};

pub const LOCATION_SCHEME: &str = "s3://";

/// Parsed claim-check locator of the form `s3://<bucket>/<key>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLocation {
    pub bucket: String,
    pub key: String,
}

impl EventLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn parse(location: &str) -> Result<Self, InvalidLocation> {
        let path = location
            .strip_prefix(LOCATION_SCHEME)
            .ok_or_else(|| InvalidLocation::new(location))?;
        let (bucket, key) = path
            .split_once('/')
            .ok_or_else(|| InvalidLocation::new(location))?;
        if bucket.is_empty() || key.is_empty() {
            return Err(InvalidLocation::new(location));
        }

        Ok(Self::new(bucket, key))
    }
}

impl std::fmt::Display for EventLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{LOCATION_SCHEME}{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLocation {
    location: String,
}

impl InvalidLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl std::fmt::Display for InvalidLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid event location: {}", self.location)
    }
}

impl std::error::Error for InvalidLocation {}

/// Object key for a stored claim-check payload. The UTC second path keeps
/// listings chronological; the unique suffix prevents same-second collisions.
pub fn event_object_key(event_kind: &str, at: DateTime<Utc>, unique_id: &str) -> String {
    format!(
        "events/{event_kind}/{}-{unique_id}.json",
        at.format("%Y/%m/%d/%H/%M/%S"),
    )
}
