//! Rendering policy for chat content.
//!
//! User text is always escaped. Assistant replies are markup from the
//! backend; they pass through an allowlist that keeps formatting tags without
//! attributes, keeps `a` only with an http(s)/mailto `href`, drops every
//! other tag (keeping its text) and removes script-like elements entirely.

const ALLOWED_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "br",
    "code",
    "div",
    "em",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "i",
    "li",
    "ol",
    "p",
    "pre",
    "span",
    "strong",
    "u",
    "ul",
];
const VOID_TAGS: &[&str] = &["br"];
const DROPPED_CONTENT_TAGS: &[&str] = &[
    "embed", "iframe", "noscript", "object", "script", "style", "template", "textarea", "title",
];
const SAFE_URL_SCHEMES: &[&str] = &["http://", "https://", "mailto:"];

#[must_use]
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        push_escaped(&mut out, ch);
    }
    out
}

#[must_use]
pub fn sanitize_assistant_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' => {
                if let Some(after) = rest.strip_prefix("<!--") {
                    rest = after.find("-->").map_or("", |end| &after[end + 3..]);
                    continue;
                }
                let Some(tag) = parse_tag(rest) else {
                    out.push_str("&lt;");
                    rest = &rest[1..];
                    continue;
                };
                rest = &rest[tag.len..];
                if !tag.closing && DROPPED_CONTENT_TAGS.contains(&tag.name.as_str()) {
                    rest = skip_past_closing(rest, &tag.name);
                    continue;
                }
                emit_tag(&mut out, &tag);
            }
            '&' => {
                let len = entity_len(rest);
                if len > 0 {
                    out.push_str(&rest[..len]);
                    rest = &rest[len..];
                } else {
                    out.push_str("&amp;");
                    rest = &rest[1..];
                }
            }
            _ => {
                push_escaped(&mut out, ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    out
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(ch),
    }
}

struct Tag<'a> {
    name: String,
    closing: bool,
    attributes: &'a str,
    len: usize,
}

/// Parses a tag at the start of `input` (which begins with `<`). Returns
/// `None` when the `<` does not open a well-formed tag.
fn parse_tag(input: &str) -> Option<Tag<'_>> {
    let closing = input[1..].starts_with('/');
    let name_start = if closing { 2 } else { 1 };
    let after = &input[name_start..];
    if !after.as_bytes().first().is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    let name_len = after
        .bytes()
        .take_while(|byte| byte.is_ascii_alphanumeric())
        .count();
    let name = after[..name_len].to_ascii_lowercase();

    let attributes_start = name_start + name_len;
    let mut quote: Option<u8> = None;
    for (offset, byte) in input[attributes_start..].bytes().enumerate() {
        match quote {
            Some(open) if byte == open => quote = None,
            Some(_) => {}
            None if byte == b'"' || byte == b'\'' => quote = Some(byte),
            None if byte == b'>' => {
                let end = attributes_start + offset;
                return Some(Tag {
                    name,
                    closing,
                    attributes: &input[attributes_start..end],
                    len: end + 1,
                });
            }
            None => {}
        }
    }
    None
}

fn skip_past_closing<'a>(rest: &'a str, name: &str) -> &'a str {
    let lowered = rest.to_ascii_lowercase();
    let Some(start) = lowered.find(&format!("</{name}")) else {
        return "";
    };
    match rest[start..].find('>') {
        Some(end) => &rest[start + end + 1..],
        None => "",
    }
}

fn emit_tag(out: &mut String, tag: &Tag<'_>) {
    let name = tag.name.as_str();
    if !ALLOWED_TAGS.contains(&name) {
        return;
    }
    if tag.closing {
        if !VOID_TAGS.contains(&name) {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        return;
    }
    if name == "a" {
        match attribute_value(tag.attributes, "href").filter(|href| is_safe_url(href)) {
            Some(href) => {
                out.push_str("<a href=\"");
                out.push_str(&escape_text(href.trim()));
                out.push_str("\" rel=\"noopener noreferrer\" target=\"_blank\">");
            }
            None => out.push_str("<a>"),
        }
        return;
    }
    out.push('<');
    out.push_str(name);
    out.push('>');
}

fn attribute_value(attributes: &str, wanted: &str) -> Option<String> {
    let mut rest = attributes;
    loop {
        rest = rest.trim_start_matches(|ch: char| ch.is_ascii_whitespace() || ch == '/');
        if rest.is_empty() {
            return None;
        }
        let name_len = rest
            .find(|ch: char| ch.is_ascii_whitespace() || ch == '=' || ch == '/')
            .unwrap_or(rest.len());
        if name_len == 0 {
            rest = &rest[1..];
            continue;
        }
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    match inner.find(quote) {
                        Some(end) => (&inner[..end], &inner[end + 1..]),
                        None => (inner, ""),
                    }
                }
                _ => {
                    let end = after_eq
                        .find(|ch: char| ch.is_ascii_whitespace())
                        .unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            rest = remaining;
            Some(value)
        } else {
            None
        };

        if name == wanted {
            return value.map(decode_basic_entities);
        }
    }
}

fn is_safe_url(url: &str) -> bool {
    let lowered = url.trim().to_ascii_lowercase();
    SAFE_URL_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}

fn decode_basic_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Length of a character reference at the start of `input` (`&name;`,
/// `&#123;`, `&#x1F;`), or 0 when there is none.
fn entity_len(input: &str) -> usize {
    let body = &input.as_bytes()[1..];
    if body.first() == Some(&b'#') {
        let hex = matches!(body.get(1), Some(b'x' | b'X'));
        let from = if hex { 2 } else { 1 };
        let digits = body
            .get(from..)
            .unwrap_or_default()
            .iter()
            .take_while(|byte| {
                if hex {
                    byte.is_ascii_hexdigit()
                } else {
                    byte.is_ascii_digit()
                }
            })
            .count();
        if digits == 0 || digits > 8 || body.get(from + digits) != Some(&b';') {
            return 0;
        }
        return 1 + from + digits + 1;
    }

    let letters = body
        .iter()
        .take_while(|byte| byte.is_ascii_alphanumeric())
        .count();
    if letters == 0 || letters > 32 || body.get(letters) != Some(&b';') {
        return 0;
    }
    1 + letters + 1
}
