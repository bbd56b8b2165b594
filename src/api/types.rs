// Tumblr post types.
// A shared envelope plus a payload chosen by the post's `type` field.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Fields every post carries.
#[derive(Debug, Deserialize)]
struct Envelope {
    blog_name: String,
    id: u64,
    post_url: String,
    #[serde(rename = "type")]
    post_type: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct PhotoFields {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    original_size: PhotoSize,
}

#[derive(Debug, Deserialize)]
struct PhotoSize {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TextFields {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: String,
}

/// Type-specific post content.
#[derive(Debug, Clone, PartialEq)]
pub enum PostKind {
    Photo {
        caption: String,
        photo_urls: Vec<String>,
    },
    Text {
        title: String,
        body: String,
    },
    /// Any other post type (quote, link, video, ...). Only the envelope is kept.
    Other,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub blog_name: String,
    pub post_id: u64,
    pub post_url: String,
    pub post_type: String,
    pub post_date: String,
    pub kind: PostKind,
}

impl Post {
    /// Decode a post object from an API response.
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        let envelope = Envelope::deserialize(value)?;

        let kind = match envelope.post_type.as_str() {
            "photo" => {
                let fields = PhotoFields::deserialize(value)?;
                PostKind::Photo {
                    caption: fields.caption,
                    photo_urls: fields
                        .photos
                        .into_iter()
                        .map(|photo| photo.original_size.url)
                        .collect(),
                }
            }
            "text" => {
                let fields = TextFields::deserialize(value)?;
                PostKind::Text {
                    title: fields.title.unwrap_or_default(),
                    body: fields.body,
                }
            }
            _ => PostKind::Other,
        };

        Ok(Self {
            blog_name: envelope.blog_name,
            post_id: envelope.id,
            post_url: envelope.post_url,
            post_type: envelope.post_type,
            post_date: envelope.date,
            kind,
        })
    }

    pub fn is_photo(&self) -> bool {
        matches!(self.kind, PostKind::Photo { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, PostKind::Text { .. })
    }
}

/// Collapse line breaks so multi-line text fits on one line.
pub fn single_line(text: &str) -> String {
    text.replace('\n', " ")
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Post #{} ({}) by {} at {}\nRetrieved from {}",
            self.post_id, self.post_type, self.blog_name, self.post_date, self.post_url
        )?;

        match &self.kind {
            PostKind::Photo {
                caption,
                photo_urls,
            } => {
                write!(f, "\nCaption: {}\nPhotos:", single_line(caption))?;
                for url in photo_urls {
                    write!(f, "\n{}", url)?;
                }
                Ok(())
            }
            PostKind::Text { title, body } => {
                write!(f, "\nTitle: {}\nBody: {}", title, single_line(body))
            }
            PostKind::Other => Ok(()),
        }
    }
}
