// CSV export of blog posts.
// One writer for the shared envelope, one each for photo and text payloads.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use csv::Writer;
use tracing::info;

use crate::api::types::{Post, PostKind, single_line};
use crate::error::Result;

pub const POSTS_CSV: &str = "posts.csv";
pub const PHOTO_POSTS_CSV: &str = "photo_posts.csv";
pub const TEXT_POSTS_CSV: &str = "text_posts.csv";

const POSTS_HEADER: [&str; 5] = ["Blog Name", "Post ID", "Post Type", "Post Date", "Post URL"];
const PHOTO_HEADER: [&str; 7] = [
    "Blog Name",
    "Post ID",
    "Post Type",
    "Caption",
    "Photo URL",
    "Post Date",
    "Post URL",
];
const TEXT_HEADER: [&str; 7] = [
    "Blog Name",
    "Post ID",
    "Post Type",
    "Title",
    "Body",
    "Post Date",
    "Post URL",
];

/// Write one row per post with the envelope fields.
pub fn write_posts<W: Write>(out: W, posts: &[Post]) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(POSTS_HEADER)?;
    for post in posts {
        let id = post.post_id.to_string();
        writer.write_record([
            post.blog_name.as_str(),
            id.as_str(),
            post.post_type.as_str(),
            post.post_date.as_str(),
            post.post_url.trim(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one row per photo of each photo post. Other posts are skipped.
pub fn write_photo_posts<W: Write>(out: W, posts: &[Post]) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(PHOTO_HEADER)?;
    for post in posts {
        let PostKind::Photo {
            caption,
            photo_urls,
        } = &post.kind
        else {
            continue;
        };

        let id = post.post_id.to_string();
        let caption = single_line(caption);
        for url in photo_urls {
            writer.write_record([
                post.blog_name.as_str(),
                id.as_str(),
                post.post_type.as_str(),
                caption.as_str(),
                url.as_str(),
                post.post_date.as_str(),
                post.post_url.trim(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write one row per text post. Other posts are skipped.
pub fn write_text_posts<W: Write>(out: W, posts: &[Post]) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(TEXT_HEADER)?;
    for post in posts {
        let PostKind::Text { title, body } = &post.kind else {
            continue;
        };

        let id = post.post_id.to_string();
        let body = single_line(body);
        writer.write_record([
            post.blog_name.as_str(),
            id.as_str(),
            post.post_type.as_str(),
            title.as_str(),
            body.as_str(),
            post.post_date.as_str(),
            post.post_url.trim(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Create `path` and write posts with `write`.
pub fn write_to_path(
    path: &Path,
    posts: &[Post],
    write: fn(File, &[Post]) -> Result<()>,
) -> Result<()> {
    let file = File::create(path)?;
    write(file, posts)?;
    info!(path = %path.display(), posts = posts.len(), "wrote CSV");
    Ok(())
}

/// Write the three CSV files into `out_dir`, creating it if needed.
///
/// `posts.csv` lists the photo query's posts only.
pub fn export_all(out_dir: &Path, photo_posts: &[Post], text_posts: &[Post]) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    write_to_path(&out_dir.join(POSTS_CSV), photo_posts, write_posts)?;
    write_to_path(&out_dir.join(PHOTO_POSTS_CSV), photo_posts, write_photo_posts)?;
    write_to_path(&out_dir.join(TEXT_POSTS_CSV), text_posts, write_text_posts)?;
    Ok(())
}
