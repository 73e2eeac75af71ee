use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html as md_html};

/// URL schemes links and images may use. Relative URLs are always allowed.
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Render a post body to HTML. Raw HTML in the source is dropped and links
/// with unsafe schemes are neutralised.
pub fn render(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(source, options).filter_map(|event| match event {
        Event::Html(_) | Event::InlineHtml(_) => None,
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Some(Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        })),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Some(Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        })),
        other => Some(other),
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    md_html::push_html(&mut out, events);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    match url.split_once(':') {
        Some((scheme, _))
            if !scheme.contains(['/', '?', '#'])
                && !SAFE_SCHEMES.contains(&scheme.trim().to_ascii_lowercase().as_str()) =>
        {
            CowStr::Borrowed("#")
        }
        _ => url,
    }
}

/// First `limit` characters of `text`, with `...` appended when anything was cut.
pub fn excerpt(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
