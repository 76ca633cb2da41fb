//! Markdown to HTML for assistant answers.
//!
//! Output is restricted to a fixed set of tags and attributes:
//!
//! | tag | attributes |
//! |---|---|
//! | `b i em strong br code thead tbody tr` | none |
//! | `a` | `href class target rel` |
//! | `img` | `src alt class` |
//! | `pre h1 h2 h3 table th td` | `class` |
//!
//! Raw HTML in the input is escaped, never passed through. Link and image
//! URLs must be relative or use one of [`ALLOWED_SCHEMES`].

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

pub const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "ftp"];

const H1_CLASS: &str = "text-2xl font-extrabold";
const H2_CLASS: &str = "text-xl font-bold";
const H3_CLASS: &str = "text-lg font-semibold";
const PRE_CLASS: &str = "bg-gray-200 p-2 rounded";
const LINK_CLASS: &str = "text-blue-500 text-xs hover:underline";
const IMG_CLASS: &str = "max-w-full h-auto rounded-lg";
const TABLE_CLASS: &str =
    "w-full border-collapse border border-gray-300 my-4 text-sm rounded-lg overflow-hidden";
const TH_CLASS: &str = "border border-gray-300 px-3 py-2 bg-gray-100 font-semibold text-left";
const TD_CLASS: &str = "border border-gray-300 px-3 py-2";

/// Renders markdown into allow-listed HTML.
pub fn render_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(text, options);
    let mut renderer = HtmlRenderer::default();

    for event in parser {
        renderer.process_event(event);
    }

    renderer.out
}

/// Whether `url` may appear in an `href` or `src`.
pub fn is_safe_url(url: &str) -> bool {
    match url::Url::parse(url.trim()) {
        Ok(parsed) => ALLOWED_SCHEMES.contains(&parsed.scheme()),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

#[derive(Debug)]
struct ListLevel {
    next_number: Option<u64>,
    items: usize,
}

#[derive(Debug)]
struct PendingImage {
    url: String,
    alt: String,
}

#[derive(Debug, Default)]
struct HtmlRenderer {
    out: String,
    /// A flowing block (paragraph, list) ended; the next one needs a gap.
    needs_gap: bool,
    lists: Vec<ListLevel>,
    /// One entry per open link: whether an `<a>` was emitted for it.
    links: Vec<bool>,
    image: Option<PendingImage>,
    code_block: Option<String>,
    in_table_head: bool,
    tbody_open: bool,
}

impl HtmlRenderer {
    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => {
                self.out.push_str("<code>");
                escape_into(&code, &mut self.out);
                self.out.push_str("</code>");
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(image) = &mut self.image {
                    image.alt.push(' ');
                } else {
                    self.out.push_str("<br/>");
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => self.add_raw_html(&html),
            Event::Rule => {
                self.out.push_str("<br/>");
                self.needs_gap = false;
            }
            // Footnotes, math and task lists are not enabled.
            _ => {}
        }
    }

    fn start_flow_block(&mut self) {
        if self.needs_gap {
            self.out.push_str("<br/><br/>");
            self.needs_gap = false;
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph | Tag::HtmlBlock => {
                if self.lists.is_empty() {
                    self.start_flow_block();
                }
            }
            Tag::Heading { level, .. } => {
                let (name, class) = heading(level);
                self.out.push_str(&format!("<{name} class=\"{class}\">"));
            }
            Tag::CodeBlock(_) => {
                self.code_block = Some(String::new());
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.start_flow_block();
                }
                self.lists.push(ListLevel {
                    next_number: start,
                    items: 0,
                });
            }
            Tag::Item => self.start_item(),
            Tag::Emphasis => self.out.push_str("<em>"),
            Tag::Strong => self.out.push_str("<strong>"),
            Tag::Link { dest_url, .. } => {
                let safe = is_safe_url(&dest_url);
                if safe {
                    self.out.push_str("<a href=\"");
                    escape_into(dest_url.trim(), &mut self.out);
                    self.out.push_str(&format!(
                        "\" class=\"{LINK_CLASS}\" target=\"_blank\" rel=\"noopener noreferrer\">"
                    ));
                }
                self.links.push(safe);
            }
            Tag::Image { dest_url, .. } => {
                self.image = Some(PendingImage {
                    url: dest_url.to_string(),
                    alt: String::new(),
                });
            }
            Tag::Table(_) => {
                self.needs_gap = false;
                self.out.push_str(&format!("<table class=\"{TABLE_CLASS}\">"));
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.out.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                if !self.tbody_open {
                    self.out.push_str("<tbody>");
                    self.tbody_open = true;
                }
                self.out.push_str("<tr>");
            }
            Tag::TableCell => {
                if self.in_table_head {
                    self.out.push_str(&format!("<th class=\"{TH_CLASS}\">"));
                } else {
                    self.out.push_str(&format!("<td class=\"{TD_CLASS}\">"));
                }
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::HtmlBlock => {
                if self.lists.is_empty() {
                    self.needs_gap = true;
                }
            }
            TagEnd::Heading(level) => {
                let (name, _) = heading(level);
                self.out.push_str(&format!("</{name}>"));
                self.needs_gap = false;
            }
            TagEnd::CodeBlock => {
                let code = self.code_block.take().unwrap_or_default();
                let code = code.strip_suffix('\n').unwrap_or(&code);
                self.out.push_str(&format!("<pre class=\"{PRE_CLASS}\"><code>"));
                escape_into(code, &mut self.out);
                self.out.push_str("</code></pre>");
                self.needs_gap = false;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.needs_gap = true;
                }
            }
            TagEnd::Emphasis => self.out.push_str("</em>"),
            TagEnd::Strong => self.out.push_str("</strong>"),
            TagEnd::Link => {
                if self.links.pop() == Some(true) {
                    self.out.push_str("</a>");
                }
            }
            TagEnd::Image => {
                if let Some(image) = self.image.take() {
                    self.add_image(&image);
                }
            }
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.out.push_str("</tr></thead>");
            }
            TagEnd::TableRow => self.out.push_str("</tr>"),
            TagEnd::TableCell => {
                if self.in_table_head {
                    self.out.push_str("</th>");
                } else {
                    self.out.push_str("</td>");
                }
            }
            TagEnd::Table => {
                if self.tbody_open {
                    self.out.push_str("</tbody>");
                    self.tbody_open = false;
                }
                self.out.push_str("</table>");
            }
            _ => {}
        }
    }

    fn start_item(&mut self) {
        let depth = self.lists.len();
        let Some(level) = self.lists.last_mut() else {
            return;
        };
        let prefix = match level.next_number.as_mut() {
            Some(n) => {
                let prefix = format!("{n}. ");
                *n += 1;
                prefix
            }
            None => "- ".to_string(),
        };
        let first_top_level = depth == 1 && level.items == 0;
        level.items += 1;

        if !first_top_level {
            self.out.push_str("<br/>");
        }
        for _ in 1..depth {
            self.out.push_str("&nbsp;&nbsp;");
        }
        self.out.push_str(&prefix);
    }

    fn add_text(&mut self, text: &str) {
        if let Some(code) = &mut self.code_block {
            code.push_str(text);
        } else if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else {
            escape_into(text, &mut self.out);
        }
    }

    fn add_raw_html(&mut self, html: &str) {
        let html = html.strip_suffix('\n').unwrap_or(html);
        for (i, line) in html.split('\n').enumerate() {
            if i > 0 {
                self.out.push_str("<br/>");
            }
            escape_into(line, &mut self.out);
        }
    }

    fn add_image(&mut self, image: &PendingImage) {
        if !is_safe_url(&image.url) {
            escape_into(&image.alt, &mut self.out);
            return;
        }
        self.out.push_str("<img src=\"");
        escape_into(image.url.trim(), &mut self.out);
        self.out.push_str("\" alt=\"");
        escape_into(&image.alt, &mut self.out);
        self.out.push_str(&format!("\" class=\"{IMG_CLASS}\"/>"));
    }
}

/// Deeper headings are clamped to `h3`.
fn heading(level: HeadingLevel) -> (&'static str, &'static str) {
    match level {
        HeadingLevel::H1 => ("h1", H1_CLASS),
        HeadingLevel::H2 => ("h2", H2_CLASS),
        _ => ("h3", H3_CLASS),
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
