use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r"(?i)<title>(.*?)</title>").unwrap();
    static ref H1_RE: Regex = Regex::new(r"(?i)<h1[^>]*>(.*?)</h1>").unwrap();
    static ref H2_RE: Regex = Regex::new(r"(?i)<h2[^>]*>(.*?)</h2>").unwrap();
    static ref META_DESC_RE: Regex =
        Regex::new(r#"(?i)<meta name="description" content="(.*?)""#).unwrap();
    static ref P_RE: Regex = Regex::new(r"(?i)<p[^>]*>(.*?)</p>").unwrap();
    static ref INNER_TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
}

pub const GENERIC_DESCRIPTION: &str = "An annotated image shared via Annotation Hub";

const DESCRIPTION_LIMIT: usize = 160;

fn strip_tags(fragment: &str) -> String {
    INNER_TAG_RE.replace_all(fragment, "").trim().to_string()
}

fn first_capture<'a>(re: &Regex, html: &'a str) -> Option<&'a str> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// Best-effort pattern matching on raw text, not a structural parse. Matches
// stay within a single line, so titles split across lines fall through to
// the next tier.
pub fn extract_title(html: &str, fallback: &str) -> String {
    log::trace!("Extracting title, fallback: {}", fallback);
    let matched = first_capture(&TITLE_RE, html)
        .or_else(|| first_capture(&H1_RE, html))
        .or_else(|| first_capture(&H2_RE, html));

    match matched {
        Some(fragment) => {
            let title = strip_tags(fragment);
            log::debug!("Extracted title: {}", title);
            title
        }
        None => {
            log::debug!("No title pattern matched, using fallback: {}", fallback);
            fallback.to_string()
        }
    }
}

pub fn extract_description(html: &str, explicit: Option<&str>) -> String {
    if let Some(given) = explicit {
        if !given.trim().is_empty() {
            return given.trim().to_string();
        }
    }

    if let Some(fragment) = first_capture(&META_DESC_RE, html) {
        let description = strip_tags(fragment);
        if !description.is_empty() {
            log::debug!("Using meta description: {}", description);
            return description;
        }
    }

    if let Some(fragment) = first_capture(&P_RE, html) {
        let text = strip_tags(fragment);
        if !text.is_empty() {
            let truncated: String = text.chars().take(DESCRIPTION_LIMIT).collect();
            log::debug!("Using first paragraph as description");
            return format!("{}...", truncated);
        }
    }

    log::debug!("No description found, using generic sentence");
    GENERIC_DESCRIPTION.to_string()
}
