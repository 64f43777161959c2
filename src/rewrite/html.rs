//! HTML link rewriting and snippet injection.
//!
//! Applied on emit to `text/html` bodies only, for both fresh and cached
//! responses. The stored body is always the origin's original bytes.

use bytes::Bytes;

use crate::config::InjectConfig;

/// Rewrites origin links inside HTML and splices configured snippets.
#[derive(Debug, Clone)]
pub struct HtmlRewriter {
    origin_host: String,
    inject: InjectConfig,
}

impl HtmlRewriter {
    pub fn new(origin_host: impl Into<String>, inject: InjectConfig) -> Self {
        Self {
            origin_host: origin_host.into().to_ascii_lowercase(),
            inject,
        }
    }

    /// Whether a response with this content type is rewritten at all.
    pub fn applies_to(content_type: Option<&str>) -> bool {
        content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }

    /// Transform a body. Returns `None` for non-UTF-8 input, which is passed through.
    pub fn transform(&self, body: &[u8], mirror_scheme: &str, mirror_host: &str) -> Option<Bytes> {
        let html = std::str::from_utf8(body).ok()?;
        let mut out = rewrite_links(html, &self.origin_host, mirror_scheme, mirror_host);
        if !self.inject.is_empty() {
            out = inject(&out, &self.inject);
        }
        Some(Bytes::from(out))
    }
}

/// Replace `http(s)://origin` with the mirror base, and `//origin` with `//mirror`.
pub fn rewrite_links(html: &str, origin_host: &str, mirror_scheme: &str, mirror_host: &str) -> String {
    if origin_host.is_empty() {
        return html.to_string();
    }
    let lower = html.to_ascii_lowercase();
    let needle = format!("//{}", origin_host.to_ascii_lowercase());
    let mirror_base = format!("{}://{}", mirror_scheme, mirror_host);

    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = lower[search..].find(&needle) {
        let at = search + found;
        let end = at + needle.len();
        search = end;

        // "origin.example" must not match "origin.example.net" or "origin.examples".
        if lower[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            continue;
        }

        let head = &lower[..at];
        let start = if head.ends_with("https:") {
            at - 6
        } else if head.ends_with("http:") {
            at - 5
        } else {
            at
        };

        out.push_str(&html[copied..start]);
        if start == at {
            out.push_str("//");
            out.push_str(mirror_host);
        } else {
            out.push_str(&mirror_base);
        }
        copied = end;
    }
    out.push_str(&html[copied..]);
    out
}

/// Splice the four snippets around `<head>` and `<body>`. Missing tags skip their snippets.
pub fn inject(html: &str, snippets: &InjectConfig) -> String {
    let mut inserts: Vec<(usize, &str)> = Vec::with_capacity(4);
    let lower = html.to_ascii_lowercase();

    if let Some(pos) = open_tag_end(&lower, "head") {
        inserts.push((pos, snippets.head_start.as_str()));
    }
    if let Some(pos) = lower.find("</head>") {
        inserts.push((pos, snippets.head_end.as_str()));
    }
    if let Some(pos) = open_tag_end(&lower, "body") {
        inserts.push((pos, snippets.body_start.as_str()));
    }
    if let Some(pos) = lower.rfind("</body>") {
        inserts.push((pos, snippets.body_end.as_str()));
    }
    inserts.retain(|(_, s)| !s.is_empty());
    inserts.sort_by_key(|(pos, _)| *pos);

    let extra: usize = inserts.iter().map(|(_, s)| s.len()).sum();
    let mut out = String::with_capacity(html.len() + extra);
    let mut copied = 0;
    for (pos, snippet) in inserts {
        out.push_str(&html[copied..pos]);
        out.push_str(snippet);
        copied = pos;
    }
    out.push_str(&html[copied..]);
    out
}

/// Byte offset just past the `>` of the first `<tag>` or `<tag ...>`.
fn open_tag_end(lower: &str, tag: &str) -> Option<usize> {
    let open = format!("<{}", tag);
    let mut search = 0;
    while let Some(found) = lower[search..].find(&open) {
        let after = search + found + open.len();
        match lower[after..].chars().next() {
            Some('>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() || c == '/' => {
                return lower[after..].find('>').map(|i| after + i + 1);
            }
            _ => search = after,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_absolute_and_protocol_relative_links() {
        let html = r#"<a href="https://origin.example/a">a</a><img src="http://Origin.Example/b.png"><script src="//origin.example/c.js"></script>"#;
        let out = rewrite_links(html, "origin.example", "http", "mirror.local:8080");
        assert_eq!(
            out,
            r#"<a href="http://mirror.local:8080/a">a</a><img src="http://mirror.local:8080/b.png"><script src="//mirror.local:8080/c.js"></script>"#
        );
    }

    #[test]
    fn test_leaves_lookalike_hosts_alone() {
        let html = "https://origin.example.net/x https://origin.examples/y https://other.example/z";
        assert_eq!(rewrite_links(html, "origin.example", "http", "m"), html);
    }

    #[test]
    fn test_inject_all_snippets() {
        let snippets = InjectConfig {
            head_start: "<!--hs-->".into(),
            head_end: "<!--he-->".into(),
            body_start: "<!--bs-->".into(),
            body_end: "<!--be-->".into(),
        };
        let html = "<html><HEAD lang=\"en\"><title>t</title></head><header></header><body class=\"x\"><p>hi</p></BODY></html>";
        let out = inject(html, &snippets);
        assert_eq!(
            out,
            "<html><HEAD lang=\"en\"><!--hs--><title>t</title><!--he--></head><header></header><body class=\"x\"><!--bs--><p>hi</p><!--be--></BODY></html>"
        );
    }

    #[test]
    fn test_inject_skips_missing_tags() {
        let snippets = InjectConfig {
            body_end: "<script>x()</script>".into(),
            head_start: "<meta>".into(),
            ..InjectConfig::default()
        };
        let out = inject("<p>fragment</p>", &snippets);
        assert_eq!(out, "<p>fragment</p>");

        let out = inject("<body>b</body>", &snippets);
        assert_eq!(out, "<body>b<script>x()</script></body>");
    }

    #[test]
    fn test_transform_only_for_utf8() {
        let rewriter = HtmlRewriter::new("origin.example", InjectConfig::default());
        assert!(rewriter.transform(&[0xff, 0xfe], "http", "m").is_none());
        let out = rewriter
            .transform(b"<a href=\"https://origin.example/\">", "https", "m.example")
            .unwrap();
        assert_eq!(&out[..], b"<a href=\"https://m.example/\">");
    }

    #[test]
    fn test_applies_to_html_only() {
        assert!(HtmlRewriter::applies_to(Some("text/html; charset=utf-8")));
        assert!(HtmlRewriter::applies_to(Some("TEXT/HTML")));
        assert!(!HtmlRewriter::applies_to(Some("application/json")));
        assert!(!HtmlRewriter::applies_to(None));
    }
}
