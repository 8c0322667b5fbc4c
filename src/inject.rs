use lazy_static::lazy_static;
use regex::{Captures, NoExpand, Regex};

const BLOCK_MARKER: &str = "<!-- Social Media Preview Tags -->";

lazy_static! {
    // Strip patterns consume the whitespace run in front of each tag so a
    // second injection reproduces the first result exactly.
    static ref OLD_MARKER_RE: Regex =
        Regex::new(r"(?i)[ \t\r\n]*<!--\s*Social Media Preview Tags\s*-->").unwrap();
    static ref OLD_OG_RE: Regex =
        Regex::new(r#"(?i)[ \t\r\n]*<meta\s+property="og:[^>]*>"#).unwrap();
    static ref OLD_TWITTER_RE: Regex =
        Regex::new(r#"(?i)[ \t\r\n]*<meta\s+name="twitter:[^>]*>"#).unwrap();
    static ref OLD_DESC_RE: Regex =
        Regex::new(r#"(?i)[ \t\r\n]*<meta\s+name="description"[^>]*>"#).unwrap();
    static ref HEAD_CLOSE_RE: Regex = Regex::new(r"(?i)\s*</head>").unwrap();
    static ref HEAD_OPEN_RE: Regex = Regex::new(r"(?i)<head(\s[^>]*)?>").unwrap();
    static ref TITLE_PRESENT_RE: Regex = Regex::new(r"(?i)<title[\s>]").unwrap();
}

pub struct MetaTags<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub public_url: &'a str,
    pub image_url: &'a str,
    pub image_width: u32,
    pub image_height: u32,
    pub site_name: &'a str,
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn build_meta_block(tags: &MetaTags) -> String {
    let title = escape_html(tags.title);
    let description = escape_html(tags.description);
    let url = escape_html(tags.public_url);
    let image = escape_html(tags.image_url);
    let site_name = escape_html(tags.site_name);

    format!(
        "{marker}\n\
         <meta property=\"og:title\" content=\"{title}\">\n\
         <meta property=\"og:description\" content=\"{description}\">\n\
         <meta property=\"og:url\" content=\"{url}\">\n\
         <meta property=\"og:type\" content=\"website\">\n\
         <meta property=\"og:site_name\" content=\"{site_name}\">\n\
         <meta property=\"og:image\" content=\"{image}\">\n\
         <meta property=\"og:image:width\" content=\"{width}\">\n\
         <meta property=\"og:image:height\" content=\"{height}\">\n\
         <meta name=\"twitter:card\" content=\"summary_large_image\">\n\
         <meta name=\"twitter:title\" content=\"{title}\">\n\
         <meta name=\"twitter:description\" content=\"{description}\">\n\
         <meta name=\"twitter:image\" content=\"{image}\">\n\
         <meta name=\"description\" content=\"{description}\">",
        marker = BLOCK_MARKER,
        title = title,
        description = description,
        url = url,
        site_name = site_name,
        image = image,
        width = tags.image_width,
        height = tags.image_height,
    )
}

fn strip_existing_tags(html: &str) -> String {
    let stripped = OLD_MARKER_RE.replace_all(html, "");
    let stripped = OLD_OG_RE.replace_all(&stripped, "");
    let stripped = OLD_TWITTER_RE.replace_all(&stripped, "");
    OLD_DESC_RE.replace_all(&stripped, "").into_owned()
}

// Textual splice, not a DOM rewrite. Everything outside the matched
// regions is preserved byte-for-byte.
pub fn inject_meta_tags(html: &str, tags: &MetaTags) -> String {
    let block = build_meta_block(tags);
    let content = strip_existing_tags(html);

    let mut content = if HEAD_CLOSE_RE.is_match(&content) {
        log::trace!("Inserting meta block before closing head tag");
        HEAD_CLOSE_RE
            .replace(&content, NoExpand(&format!("\n{}\n</head>", block)))
            .into_owned()
    } else if HEAD_OPEN_RE.is_match(&content) {
        log::trace!("No closing head tag, inserting after opening head tag");
        HEAD_OPEN_RE
            .replace(&content, |caps: &Captures| {
                format!("{}\n{}", &caps[0], block)
            })
            .into_owned()
    } else {
        log::trace!("No head section, synthesizing one");
        format!("<head>\n{}\n</head>\n{}", block, content)
    };

    if !TITLE_PRESENT_RE.is_match(&content) {
        let title = escape_html(tags.title);
        content = HEAD_OPEN_RE
            .replace(&content, |caps: &Captures| {
                format!("{}\n<title>{}</title>", &caps[0], title)
            })
            .into_owned();
    }

    content
}
