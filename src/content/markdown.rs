//! Markdown rendering with syntax highlighting

use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::{HashMap, HashSet};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::config::SiteConfig;
use crate::error::PostError;

/// Theme used when none is configured or the configured one is unknown
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Language tag for code without a declared language
const PLAIN_LANGUAGE: &str = "text";

lazy_static! {
    static ref SYNTAX_SET: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEME_SET: ThemeSet = ThemeSet::load_defaults();
}

/// Markdown renderer with syntax highlighting
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    theme_name: String,
    line_numbers: bool,
    allow_html: bool,
    heading_anchors: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(DEFAULT_THEME, false)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        let theme_name = if THEME_SET.themes.contains_key(theme) {
            theme.to_string()
        } else {
            tracing::warn!(
                "Unknown highlight theme {:?}, falling back to {}",
                theme,
                DEFAULT_THEME
            );
            DEFAULT_THEME.to_string()
        };

        Self {
            theme_name,
            line_numbers,
            allow_html: false,
            heading_anchors: true,
        }
    }

    /// Create from the site configuration
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::with_options(&config.highlight.theme, config.highlight.line_numbers)
            .allow_html(config.render.allow_html)
            .heading_anchors(config.render.heading_anchors)
    }

    /// Renderer whose theme was never loaded, so highlighting fails
    #[cfg(test)]
    pub(crate) fn with_unloaded_theme(theme: &str) -> Self {
        Self {
            theme_name: theme.to_string(),
            ..Self::new()
        }
    }

    /// Pass raw HTML through instead of escaping it
    pub fn allow_html(mut self, allow: bool) -> Self {
        self.allow_html = allow;
        self
    }

    /// Toggle slugified heading ids
    pub fn heading_anchors(mut self, enabled: bool) -> Self {
        self.heading_anchors = enabled;
        self
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String, PostError> {
        // No YAML metadata blocks: front-matter is stripped before we get here
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;
        let parsed: Vec<Event> = Parser::new_ext(markdown, options).collect();

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<PendingCodeBlock> = None;
        let mut heading: Option<PendingHeading> = None;
        let mut anchors = AnchorSet::default();

        // Explicit ids are kept as written, so generated ids must steer around them
        if self.heading_anchors {
            for event in &parsed {
                if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
                    anchors.reserve(id);
                }
            }
        }

        for event in parsed {
            if let Some(block) = code_block.as_mut() {
                match event {
                    Event::Text(text) => block.code.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let highlighted = self.highlight_code(&block.code, &block.lang)?;
                        code_block = None;
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                    _ => {}
                }
                continue;
            }

            if let Some(pending) = heading.as_mut() {
                if let Event::Text(text) | Event::Code(text) = &event {
                    pending.text.push_str(text);
                }
            }

            let event = match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_block = Some(PendingCodeBlock {
                        lang: code_language(&kind),
                        code: String::new(),
                    });
                    continue;
                }
                Event::Code(code) => Event::Html(CowStr::from(inline_code_html(&code))),
                Event::Html(raw) | Event::InlineHtml(raw) if !self.allow_html => Event::Text(raw),
                other => other,
            };

            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) if self.heading_anchors => match id {
                    Some(id) => events.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(id),
                        classes,
                        attrs,
                    })),
                    None => {
                        heading = Some(PendingHeading {
                            level,
                            classes,
                            attrs,
                            text: String::new(),
                            events: Vec::new(),
                        });
                    }
                },
                Event::End(TagEnd::Heading(level)) if heading.is_some() => {
                    if let Some(pending) = heading.take() {
                        let id = anchors.claim(&anchor_base(&pending.text));
                        events.push(Event::Start(Tag::Heading {
                            level: pending.level,
                            id: Some(CowStr::from(id)),
                            classes: pending.classes,
                            attrs: pending.attrs,
                        }));
                        events.extend(pending.events);
                    }
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                other => match heading.as_mut() {
                    Some(pending) => pending.events.push(other),
                    None => events.push(other),
                },
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }

    /// Highlight a code block, tagging it with its declared language
    fn highlight_code(&self, code: &str, lang: &str) -> Result<String, PostError> {
        let syntax = SYNTAX_SET
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

        let theme = THEME_SET
            .themes
            .get(&self.theme_name)
            .ok_or_else(|| PostError::Render(format!("theme {} not loaded", self.theme_name)))?;

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let regions = highlighter
                .highlight_line(line, &SYNTAX_SET)
                .map_err(|e| PostError::Render(format!("highlighting {}: {}", lang, e)))?;
            // Line endings stay out of the spans so lines can be numbered
            let regions: Vec<_> = regions
                .into_iter()
                .map(|(style, text)| (style, text.trim_end_matches(['\n', '\r'])))
                .filter(|(_, text)| !text.is_empty())
                .collect();
            let html = styled_line_to_highlighted_html(&regions[..], IncludeBackground::No)
                .map_err(|e| PostError::Render(format!("highlighting {}: {}", lang, e)))?;
            lines.push(html);
        }

        let lang = html_escape(lang);
        if self.line_numbers {
            Ok(self.add_line_numbers(&lines, &lang))
        } else {
            Ok(format!(
                "<pre class=\"language-{lang}\"><code class=\"language-{lang}\">{}</code></pre>\n",
                lines.join("\n")
            ))
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, lines: &[String], lang: &str) -> String {
        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");
        let code_lines = lines.join("\n");

        format!(
            concat!(
                "<figure class=\"highlight language-{lang}\"><table><tr>",
                "<td class=\"gutter\"><pre>{gutter}</pre></td>",
                "<td class=\"code\"><pre class=\"language-{lang}\">",
                "<code class=\"language-{lang}\">{code_lines}</code></pre></td>",
                "</tr></table></figure>\n",
            ),
            lang = lang,
            gutter = gutter,
            code_lines = code_lines
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

struct PendingCodeBlock {
    lang: String,
    code: String,
}

struct PendingHeading<'a> {
    level: pulldown_cmark::HeadingLevel,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    text: String,
    events: Vec<Event<'a>>,
}

/// Heading ids already handed out in one document
#[derive(Default)]
struct AnchorSet {
    used: HashSet<String>,
    /// Next suffix to try for each generated base
    next_suffix: HashMap<String, usize>,
}

impl AnchorSet {
    /// Mark an author-supplied id as taken
    fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    /// Return `base`, or the first free `base-N`
    fn claim(&mut self, base: &str) -> String {
        let suffix = self.next_suffix.entry(base.to_string()).or_insert(0);
        loop {
            let id = if *suffix == 0 {
                base.to_string()
            } else {
                format!("{}-{}", base, suffix)
            };
            *suffix += 1;
            if self.used.insert(id.clone()) {
                return id;
            }
        }
    }
}

fn anchor_base(text: &str) -> String {
    let slug = slug::slugify(text);
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Declared language of a code block; only the first word of the info string counts
fn code_language(kind: &CodeBlockKind) -> String {
    match kind {
        CodeBlockKind::Fenced(info) => info
            .split_whitespace()
            .next()
            .map(|lang| lang.to_string())
            .unwrap_or_else(|| PLAIN_LANGUAGE.to_string()),
        CodeBlockKind::Indented => PLAIN_LANGUAGE.to_string(),
    }
}

/// Inline code is escaped and wrapped the same way as plain-text blocks
fn inline_code_html(code: &str) -> String {
    format!(
        r#"<code class="language-{}">{}</code>"#,
        PLAIN_LANGUAGE,
        html_escape(code)
    )
}

/// Simple HTML escaping
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new().heading_anchors(false);
        let html = renderer.render("# Hello World\n\nThis is a test.").unwrap();
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains(r#"<pre class="language-rust"><code class="language-rust">"#));
        assert!(html.contains("<span style="));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_unknown_language_keeps_tag() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```nosuchlang\nx = 1\n```").unwrap();
        assert!(html.contains(r#"class="language-nosuchlang""#));
        assert!(html.contains("x = 1"));
    }

    #[test]
    fn test_code_block_without_language_is_escaped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```\n<b>bold</b>\n```").unwrap();
        assert!(html.contains(r#"class="language-text""#));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_inline_code_script_is_escaped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("Never write `<script>alert(1)</script>` in a post.")
            .unwrap();
        assert!(html.contains(
            r#"<code class="language-text">&lt;script&gt;alert(1)&lt;/script&gt;</code>"#
        ));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_raw_html_escaped_by_default() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("Hi <img src=x onerror=alert(1)> there").unwrap();
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img"));

        let html = renderer
            .clone()
            .allow_html(true)
            .render("Hi <em>there</em>")
            .unwrap();
        assert!(html.contains("<em>there</em>"));
    }

    #[test]
    fn test_heading_anchors_are_unique() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("# Hello World\n\n## Hello World\n\n### `code` title")
            .unwrap();
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains(r#"<h2 id="hello-world-1">Hello World</h2>"#));
        assert!(html.contains(r#"<h3 id="code-title">"#));
    }

    #[test]
    fn test_explicit_heading_id_kept() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Intro {#start}\n\n# Start").unwrap();
        assert!(html.contains(r#"<h1 id="start">Intro</h1>"#));
        assert!(html.contains(r#"<h1 id="start-1">Start</h1>"#));
    }

    #[test]
    fn test_explicit_id_after_colliding_heading() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Start\n\n# Intro {#start}").unwrap();
        assert_eq!(html.matches(r#"id="start""#).count(), 1);
        assert!(html.contains(r#"<h1 id="start-1">Start</h1>"#));
        assert!(html.contains(r#"<h1 id="start">Intro</h1>"#));
    }

    #[test]
    fn test_generated_ids_skip_taken_suffixes() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("# Note {#note-1}\n\n# Note\n\n# Note")
            .unwrap();
        assert!(html.contains(r#"<h1 id="note-1">Note</h1>"#));
        assert!(html.contains(r#"<h1 id="note">Note</h1>"#));
        assert!(html.contains(r#"<h1 id="note-2">Note</h1>"#));
    }

    #[test]
    fn test_highlight_failure_is_a_render_error() {
        let renderer = MarkdownRenderer::with_unloaded_theme("no-such-theme");
        let err = renderer.render("```rust\nfn x() {}\n```").unwrap_err();
        assert!(matches!(err, PostError::Render(ref msg) if msg.contains("no-such-theme")));

        // Documents without code blocks never touch the theme
        assert!(renderer.render("plain *text*").is_ok());
    }

    #[test]
    fn test_line_numbers() {
        let renderer = MarkdownRenderer::with_options(DEFAULT_THEME, true);
        let html = renderer.render("```js\nlet a = 1;\nlet b = 2;\n```").unwrap();
        assert!(html.contains(r#"<figure class="highlight language-js">"#));
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let renderer = MarkdownRenderer::with_options("no-such-theme", false);
        assert!(renderer.render("```rust\nfn x() {}\n```").is_ok());
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let markdown = concat!(
            "# Title\n\nSome `code` and\n\n```python\nprint('hi')\n```\n\n",
            "| a | b |\n|---|---|\n| 1 | 2 |\n",
        );
        assert_eq!(
            renderer.render(markdown).unwrap(),
            renderer.render(markdown).unwrap()
        );
    }
}
