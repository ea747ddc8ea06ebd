use crate::sotwe_message::{MediaEntity, RawPost, VideoVariant};
use scraper::{Html, Node};
use tracing::debug;

/// Nested quotes/retweets deeper than this are dropped.
pub const MAX_NESTING_DEPTH: usize = 16;

const LINE_BREAK: &str = "<br>";
const MP4: &str = "video/mp4";

/// Tags whose text content never belongs in a plain-text title.
const NON_TEXT_TAGS: &[&str] = &["script", "style", "textarea", "noscript", "option"];

/// Render a post and everything it quotes, retweets or replies to as one
/// HTML fragment.
pub fn render_description(post: &RawPost) -> String {
    let mut out = String::new();
    render_into(&mut out, post, 0);
    out
}

fn render_into(out: &mut String, post: &RawPost, depth: usize) {
    let media = render_media(&post.media_entities);
    if !media.is_empty() {
        out.push_str(&media);
        out.push_str(LINE_BREAK);
    }
    out.push_str(&post.text.replace('\n', LINE_BREAK));

    let nested = post
        .quoted_status
        .as_deref()
        .into_iter()
        .chain(post.retweeted_status.as_deref())
        .chain(post.conversation.iter().flatten());

    for child in nested {
        if depth + 1 >= MAX_NESTING_DEPTH {
            debug!(post = %post.id, "nesting limit reached, truncating");
            return;
        }
        out.push_str(LINE_BREAK);
        render_into(out, child, depth + 1);
    }
}

pub fn render_media(media: &[MediaEntity]) -> String {
    media
        .iter()
        .map(|entity| match entity {
            MediaEntity::Photo { media_url } => format!(r#"<img src="{}">"#, media_url),
            MediaEntity::Video {
                media_url,
                video_info,
            } => match best_mp4(&video_info.variants) {
                Some(variant) => format!(
                    r#"<video controls preload="metadata" poster="{}"><source src="{}" type="video/mp4"></video>"#,
                    media_url, variant.url
                ),
                None => String::new(),
            },
            MediaEntity::Unknown => String::new(),
        })
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

/// Highest-bitrate MP4 variant; HLS playlists and other types are ignored.
fn best_mp4(variants: &[VideoVariant]) -> Option<&VideoVariant> {
    let mut mp4: Vec<&VideoVariant> = variants.iter().filter(|v| v.content_type == MP4).collect();
    mp4.sort_by(|a, b| b.bitrate.cmp(&a.bitrate));
    mp4.into_iter().next()
}

/// Strip every tag and attribute, keeping only the text. Entities come
/// back decoded; the result is plain text, not HTML.
pub fn sanitize_text(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    let mut text = String::new();

    for node in doc.root_element().descendants() {
        let Node::Text(t) = node.value() else {
            continue;
        };
        let inside_non_text = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| NON_TEXT_TAGS.contains(&e.name()))
        });
        if !inside_non_text {
            text.push_str(t);
        }
    }

    text
}

/// Plain-text first line of a post, used as the item title.
pub fn render_title(post: &RawPost) -> String {
    let first_line = post.text.split('\n').next().unwrap_or_default();
    sanitize_text(first_line)
}
