use crate::error::FeedError;
use serde::Deserialize;
use std::fmt;

const MAX_HANDLE_LEN: usize = 15;

/// A Twitter handle as used in Sotwe API paths and cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn parse(raw: &str) -> Result<Self, FeedError> {
        let handle = raw.trim().trim_start_matches('@');
        if handle.is_empty()
            || handle.len() > MAX_HANDLE_LEN
            || !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(FeedError::InvalidIdentity(raw.to_string()));
        }
        Ok(Self(handle.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of pulling the embedded JSON out of a solver response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Parsed(FeedPayload),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPayload {
    pub info: Option<UserInfo>,
    pub data: Option<Vec<RawPost>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub screen_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub profile_image_thumbnail: Option<String>,
}

/// A post as returned by `/api/v3/user/:id/`. Quoted, retweeted and
/// conversation posts nest recursively.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub created_at: Option<CreatedAt>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media_entities: Vec<MediaEntity>,
    #[serde(default)]
    pub quoted_status: Option<Box<RawPost>>,
    #[serde(default)]
    pub retweeted_status: Option<Box<RawPost>>,
    #[serde(default)]
    pub conversation: Option<Vec<RawPost>>,
}

/// `createdAt` arrives as epoch milliseconds, sometimes quoted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CreatedAt {
    Millis(i64),
    Fractional(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaEntity {
    Photo {
        #[serde(rename = "mediaURL", default, deserialize_with = "null_as_default")]
        media_url: String,
    },
    Video {
        #[serde(rename = "mediaURL", default, deserialize_with = "null_as_default")]
        media_url: String,
        #[serde(rename = "videoInfo", default, deserialize_with = "null_as_default")]
        video_info: VideoInfo,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub variants: Vec<VideoVariant>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoVariant {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "bitrate")]
    pub bitrate: u64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Bitrates are occasionally floats or null on HLS variants.
fn bitrate<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?
        .filter(|b| b.is_finite() && *b > 0.0)
        .map_or(0, |b| b as u64))
}

// Post ids show up both as JSON strings and as bare numbers.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_strips_at_sign() {
        let id = Identity::parse("@_RSSHub").unwrap();
        assert_eq!(id.as_str(), "_RSSHub");
    }

    #[test]
    fn test_identity_rejects_path_characters() {
        assert!(Identity::parse("").is_err());
        assert!(Identity::parse("a/b").is_err());
        assert!(Identity::parse("a?b=1").is_err());
        assert!(Identity::parse("..").is_err());
        assert!(Identity::parse(".").is_err());
        assert!(Identity::parse("a.b").is_err());
        assert!(Identity::parse("a-b").is_err());
        assert!(Identity::parse("sixteen_chars_xx").is_err());
        assert!(Identity::parse("fifteen_chars_x").is_ok());
    }

    #[test]
    fn test_raw_post_numeric_id_and_defaults() {
        let post: RawPost = serde_json::from_value(json!({"id": 42, "text": "hi"})).unwrap();
        assert_eq!(post.id, "42");
        assert!(post.media_entities.is_empty());
        assert!(post.created_at.is_none());
        assert!(post.quoted_status.is_none());
    }

    #[test]
    fn test_media_entity_variants() {
        let media: Vec<MediaEntity> = serde_json::from_value(json!([
            {"type": "photo", "mediaURL": "a.jpg"},
            {"type": "video", "mediaURL": "p.jpg", "videoInfo": {"variants": [
                {"type": "video/mp4", "url": "v.mp4", "bitrate": 500}
            ]}},
            {"type": "animated_gif", "mediaURL": "g.jpg"}
        ]))
        .unwrap();

        assert_eq!(
            media[0],
            MediaEntity::Photo {
                media_url: "a.jpg".to_string()
            }
        );
        assert!(matches!(&media[1], MediaEntity::Video { video_info, .. } if video_info.variants.len() == 1));
        assert_eq!(media[2], MediaEntity::Unknown);
    }

    #[test]
    fn test_null_strings_become_empty() {
        let info: UserInfo = serde_json::from_value(json!({
            "name": null, "screenName": "s", "description": null, "profileImageThumbnail": null
        }))
        .unwrap();
        assert_eq!(info.name, "");
        assert_eq!(info.description, "");
        assert_eq!(info.profile_image_thumbnail, None);

        let post: RawPost =
            serde_json::from_value(json!({"id": "1", "text": null, "mediaEntities": null})).unwrap();
        assert_eq!(post.text, "");
        assert!(post.media_entities.is_empty());
    }

    #[test]
    fn test_float_bitrate() {
        let variant: VideoVariant =
            serde_json::from_value(json!({"type": "video/mp4", "url": "v.mp4", "bitrate": 832000.0}))
                .unwrap();
        assert_eq!(variant.bitrate, 832_000);
        let variant: VideoVariant =
            serde_json::from_value(json!({"type": "application/x-mpegURL", "url": "p.m3u8", "bitrate": null}))
                .unwrap();
        assert_eq!(variant.bitrate, 0);
    }

    #[test]
    fn test_created_at_forms() {
        let millis: CreatedAt = serde_json::from_value(json!(1700000000)).unwrap();
        assert_eq!(millis, CreatedAt::Millis(1_700_000_000));
        let text: CreatedAt = serde_json::from_value(json!("1700000000")).unwrap();
        assert_eq!(text, CreatedAt::Text("1700000000".to_string()));
        let fractional: CreatedAt = serde_json::from_value(json!(1700000000.5)).unwrap();
        assert_eq!(fractional, CreatedAt::Fractional(1_700_000_000.5));
    }
}
