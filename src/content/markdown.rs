//! Markdown rendering with syntax highlighting

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::image::image_dimensions;
use super::slug::heading_id;
use crate::helpers::html_escape;

/// Characters escaped in a single URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Label of the copy button in code block headers
const COPY_LABEL: &str = "复制";

/// Client-side handler for the copy buttons rendered in code block headers.
///
/// Buttons carry no inline handler, a delegated listener picks up clicks so
/// the script can run under a nonce-only CSP.
pub const COPY_SCRIPT: &str = r#"
  function copyToClipboard(button) {
    const codeBlock = button.parentElement.nextElementSibling.querySelector('code');
    const text = codeBlock.textContent || '';

    navigator.clipboard.writeText(text).then(() => {
      const originalText = button.textContent;
      button.textContent = '已复制';
      button.classList.add('copied');

      setTimeout(() => {
        button.textContent = originalText;
        button.classList.remove('copied');
      }, 2000);
    }).catch(() => {});
  }

  document.addEventListener('click', (event) => {
    const button = event.target.closest('.copy-button');
    if (button) copyToClipboard(button);
  });
"#;

/// A table of contents entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    /// Links containing this URL are treated as internal
    site_url: String,
    /// Root used to resolve article-relative images on disk
    content_root: Option<PathBuf>,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", "")
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, site_url: &str) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            site_url: site_url.trim_end_matches('/').to_string(),
            content_root: None,
        }
    }

    /// Resolve relative images against this content directory
    pub fn with_content_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.content_root = Some(root.into());
        self
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        self.render_with(markdown, None)
    }

    /// Render an article; relative images resolve against the article's directory
    pub fn render_article(&self, markdown: &str, article_path: &Path) -> String {
        self.render_with(markdown, Some(article_path))
    }

    fn render_with(&self, markdown: &str, article_path: Option<&Path>) -> String {
        let article_dir = article_path.map(article_directory);
        let mut rewriter = Rewriter::new(self, article_dir);

        for event in Parser::new_ext(markdown, parser_options()) {
            rewriter.handle(event);
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, rewriter.out.into_iter());

        html_output.replace("<blockquote>", r#"<blockquote class="markdown-blockquote">"#)
    }

    /// Headings of a document, without the leading title that `render` drops
    pub fn toc(markdown: &str) -> Vec<TocEntry> {
        let mut entries = Vec::new();
        let mut title_removed = false;
        let mut current: Option<(HeadingLevel, Option<String>, String)> = None;

        for event in Parser::new_ext(markdown, parser_options()) {
            match event {
                Event::Start(Tag::Heading { level, id, .. }) => {
                    current = Some((level, id.map(|i| i.to_string()), String::new()));
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, _, buf)) = current.as_mut() {
                        buf.push_str(&text);
                    }
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, id, text)) = current.take() {
                        if level == HeadingLevel::H1 && !title_removed {
                            title_removed = true;
                            continue;
                        }
                        let text = text.trim().to_string();
                        entries.push(TocEntry {
                            id: id.unwrap_or_else(|| heading_id(&text)),
                            text,
                            level: level as u8,
                        });
                    }
                }
                _ => {}
            }
        }

        entries
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let display_lang = html_escape(lang.unwrap_or("text"));

        let highlighted = lang
            .and_then(|l| self.syntax_set.find_syntax_by_token(l))
            .and_then(|syntax| {
                let theme = self.theme()?;
                let mut highlighter = HighlightLines::new(syntax, theme);
                let mut out = String::new();
                for line in LinesWithEndings::from(code) {
                    let regions = highlighter.highlight_line(line, &self.syntax_set).ok()?;
                    out.push_str(
                        &styled_line_to_highlighted_html(&regions, IncludeBackground::No).ok()?,
                    );
                }
                Some(out)
            })
            .unwrap_or_else(|| html_escape(code));

        format!(
            concat!(
                r#"<div class="code-block-wrapper">"#,
                r#"<div class="code-block-header">"#,
                r#"<span class="code-language">{lang}</span>"#,
                r#"<button class="copy-button" type="button">{copy}</button>"#,
                r#"</div>"#,
                r#"<pre class="code-block"><code class="hljs language-{lang}">{code}</code></pre>"#,
                r#"</div>"#,
                "\n"
            ),
            lang = display_lang,
            copy = COPY_LABEL,
            code = highlighted
        )
    }

    fn is_external(&self, href: &str) -> bool {
        href.starts_with("http") && (self.site_url.is_empty() || !href.contains(&self.site_url))
    }

    fn link_open(&self, link_type: LinkType, dest: &str, title: &str) -> String {
        let href = if link_type == LinkType::Email && !dest.starts_with("mailto:") {
            format!("mailto:{}", dest)
        } else {
            dest.to_string()
        };
        let target = if self.is_external(&href) {
            r#" target="_blank" rel="noopener noreferrer""#
        } else {
            ""
        };
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, html_escape(title))
        };

        format!(
            r#"<a href="{}"{}{} class="markdown-link">"#,
            html_escape(&href),
            target,
            title_attr
        )
    }

    fn image_html(&self, image: &ImageState, article_dir: Option<&str>) -> String {
        let mut src = image.dest.clone();
        let mut size: Option<(u32, u32)> = None;

        let is_relative = image.dest.starts_with("./")
            || image.dest.starts_with("img/")
            || image.dest.starts_with("static/");

        if let (Some(dir), true) = (article_dir, is_relative) {
            let relative = image.dest.strip_prefix("./").unwrap_or(&image.dest);
            let joined = format!("{}{}", dir, relative);
            src = format!("/content/{}", encode_path(&joined));

            if let Some(root) = &self.content_root {
                size = image_dimensions(&root.join(&joined));
            }
        }

        let title_attr = if image.title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, html_escape(&image.title))
        };
        let size_attrs = size
            .map(|(w, h)| format!(r#" width="{}" height="{}""#, w, h))
            .unwrap_or_default();
        let caption = if image.title.is_empty() {
            String::new()
        } else {
            format!("<figcaption>{}</figcaption>", html_escape(&image.title))
        };

        format!(
            r#"<figure class="markdown-image"><img src="{}" alt="{}"{}{} loading="lazy" decoding="async" />{}</figure>"#,
            html_escape(&src),
            html_escape(&image.alt),
            title_attr,
            size_attrs,
            caption
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn parser_options() -> Options {
    // YAML metadata blocks stay off; front-matter is stripped before rendering
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

/// Directory part of an article path with a trailing `/`, or empty at the root
fn article_directory(article_path: &Path) -> String {
    let dir = article_path
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    if dir.is_empty() {
        dir
    } else {
        format!("{}/", dir.trim_end_matches('/'))
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

struct HeadingState<'a> {
    level: HeadingLevel,
    id: Option<String>,
    text: String,
    events: Vec<Event<'a>>,
}

struct CodeState {
    lang: Option<String>,
    text: String,
}

struct ImageState {
    dest: String,
    title: String,
    alt: String,
}

/// Streams parser events into the output, replacing the elements we render ourselves
struct Rewriter<'a, 'r> {
    renderer: &'r MarkdownRenderer,
    article_dir: Option<String>,
    out: Vec<Event<'a>>,
    heading: Option<HeadingState<'a>>,
    code: Option<CodeState>,
    image: Option<ImageState>,
    title_removed: bool,
    skipping_title: bool,
}

impl<'a, 'r> Rewriter<'a, 'r> {
    fn new(renderer: &'r MarkdownRenderer, article_dir: Option<String>) -> Self {
        Self {
            renderer,
            article_dir,
            out: Vec::new(),
            heading: None,
            code: None,
            image: None,
            title_removed: false,
            skipping_title: false,
        }
    }

    fn push(&mut self, event: Event<'a>) {
        match self.heading.as_mut() {
            Some(heading) => {
                if let Event::Text(text) | Event::Code(text) = &event {
                    heading.text.push_str(text);
                }
                heading.events.push(event);
            }
            None => self.out.push(event),
        }
    }

    fn push_html(&mut self, html: String) {
        self.push(Event::Html(CowStr::from(html)));
    }

    fn handle(&mut self, event: Event<'a>) {
        if self.skipping_title {
            if let Event::End(TagEnd::Heading(HeadingLevel::H1)) = event {
                self.skipping_title = false;
            }
            return;
        }

        if let Some(image) = self.image.as_mut() {
            match event {
                Event::End(TagEnd::Image) => {}
                Event::Text(text) | Event::Code(text) => {
                    image.alt.push_str(&text);
                    return;
                }
                _ => return,
            }
        }

        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                if level == HeadingLevel::H1 && !self.title_removed {
                    self.title_removed = true;
                    self.skipping_title = true;
                    return;
                }
                self.heading = Some(HeadingState {
                    level,
                    id: id.map(|i| i.to_string()),
                    text: String::new(),
                    events: Vec::new(),
                });
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = self.heading.take() {
                    let n = heading.level as u8;
                    let id = heading
                        .id
                        .unwrap_or_else(|| heading_id(heading.text.trim()));
                    let mut inner = String::new();
                    html::push_html(&mut inner, heading.events.into_iter());
                    self.push_html(format!(
                        r#"<h{n} id="{id}" class="heading-{n}">{inner}</h{n}>"#,
                        n = n,
                        id = html_escape(&id),
                        inner = inner
                    ));
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|l| !l.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeState {
                    lang,
                    text: String::new(),
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(code) = self.code.take() {
                    let html = self.renderer.highlight_code(&code.text, code.lang.as_deref());
                    self.push_html(html);
                }
            }
            Event::Text(text) if self.code.is_some() => {
                if let Some(code) = self.code.as_mut() {
                    code.text.push_str(&text);
                }
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                self.image = Some(ImageState {
                    dest: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Event::End(TagEnd::Image) => {
                if let Some(image) = self.image.take() {
                    let html = self
                        .renderer
                        .image_html(&image, self.article_dir.as_deref());
                    self.push_html(html);
                }
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            }) => {
                let html = self.renderer.link_open(link_type, &dest_url, &title);
                self.push_html(html);
            }
            Event::End(TagEnd::Link) => self.push_html("</a>".to_string()),
            // Single newlines render as line breaks
            Event::SoftBreak => self.push(Event::HardBreak),
            other => self.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.\nSecond line.");
        assert!(!html.contains("Hello World"));
        assert!(html.contains("<p>This is a test.<br />\nSecond line.</p>"));
    }

    #[test]
    fn test_only_first_h1_is_removed() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Title\n\n## Intro\n\n# Appendix\n");
        assert!(!html.contains("Title"));
        assert!(html.contains(r#"<h2 id="intro" class="heading-2">Intro</h2>"#));
        assert!(html.contains(r#"<h1 id="appendix" class="heading-1">Appendix</h1>"#));
    }

    #[test]
    fn test_heading_with_inline_code() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## 使用 `cargo` 构建");
        assert!(html.contains(r#"id="使用-cargo-构建""#));
        assert!(html.contains("<code>cargo</code>"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```");
        assert!(html.contains("code-block-wrapper"));
        assert!(html.contains(r#"<span class="code-language">rust</span>"#));
        assert!(html.contains(r#"class="hljs language-rust""#));
        assert!(html.contains("<span"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_unknown_language_is_escaped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```nosuchlang\n<div>&</div>\n```");
        assert!(html.contains("language-nosuchlang"));
        assert!(html.contains("&lt;div&gt;&amp;&lt;/div&gt;"));

        let plain = renderer.render("    indented <code>\n");
        assert!(plain.contains("language-text"));
        assert!(plain.contains("&lt;code&gt;"));
    }

    #[test]
    fn test_links() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", "https://itmirror.top");
        let html = renderer.render(
            "[ext](https://rust-lang.org \"Rust\") [int](https://itmirror.top/about) [rel](/blog)",
        );
        assert!(html.contains(
            r#"<a href="https://rust-lang.org" target="_blank" rel="noopener noreferrer" title="Rust" class="markdown-link">ext</a>"#
        ));
        assert!(html.contains(r#"<a href="https://itmirror.top/about" class="markdown-link">int</a>"#));
        assert!(html.contains(r#"<a href="/blog" class="markdown-link">rel</a>"#));
    }

    #[test]
    fn test_blockquote_class() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("> quoted");
        assert!(html.contains(r#"<blockquote class="markdown-blockquote">"#));
    }

    #[test]
    fn test_absolute_image() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("![A *cat*](https://img.example/cat.png \"Cat\")");
        assert!(html.contains(r#"<figure class="markdown-image">"#));
        assert!(html.contains(r#"src="https://img.example/cat.png""#));
        assert!(html.contains(r#"alt="A cat""#));
        assert!(html.contains(r#"loading="lazy" decoding="async""#));
        assert!(html.contains("<figcaption>Cat</figcaption>"));
    }

    #[test]
    fn test_relative_image_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let img_dir = dir.path().join("01. 前端/img");
        std::fs::create_dir_all(&img_dir).unwrap();
        let mut png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 13];
        png.extend_from_slice(b"IHDR");
        png.extend_from_slice(&800u32.to_be_bytes());
        png.extend_from_slice(&600u32.to_be_bytes());
        png.extend_from_slice(&[8, 6, 0, 0, 0]);
        std::fs::write(img_dir.join("diagram.png"), png).unwrap();

        let renderer = MarkdownRenderer::new().with_content_root(dir.path());
        let html = renderer.render_article(
            "![diagram](./img/diagram.png)",
            Path::new("01. 前端/intro.md"),
        );
        assert!(html.contains(r#"src="/content/01.%20%E5%89%8D%E7%AB%AF/img/diagram.png""#));
        assert!(html.contains(r#"width="800" height="600""#));

        let missing = renderer.render_article("![x](img/none.png)", Path::new("root.md"));
        assert!(missing.contains(r#"src="/content/img/none.png""#));
        assert!(!missing.contains("width="));
    }

    #[test]
    fn test_toc() {
        let md = "# Title\n\n## 安装 Rust\n\n```bash\n# not a heading\n```\n\n### Step {#custom}\n";
        let toc = MarkdownRenderer::toc(md);
        assert_eq!(
            toc,
            vec![
                TocEntry {
                    id: "安装-rust".to_string(),
                    text: "安装 Rust".to_string(),
                    level: 2
                },
                TocEntry {
                    id: "custom".to_string(),
                    text: "Step".to_string(),
                    level: 3
                },
            ]
        );
    }
}
