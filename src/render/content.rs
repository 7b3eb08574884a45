//! Transformation of rich-text HTML into a flat block sequence.
//!
//! The editor produces a small, well-known subset of HTML. Markup is
//! reduced to block-level text with plain-text inline markers (`**` bold,
//! `_` italic, `__` underline, `~~` strikethrough, backtick inline code,
//! `==` highlight), which downstream layout reproduces byte-for-byte.
//! Unknown tags are transparent: their text content is kept.

/// A block-level element of the transformed document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    List { ordered: bool, items: Vec<String> },
    Blockquote(String),
    CodeBlock(String),
    Rule,
    Table { rows: Vec<Vec<String>> },
}

#[derive(Debug)]
enum Token {
    Open { name: String, href: Option<String> },
    Close(String),
    Text(String),
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

fn tokenize(html: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }

                let mut tag = String::new();
                for t in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                    tag.push(t);
                }

                let closing = tag.starts_with('/');
                let self_closing = tag.ends_with('/');
                let tag = tag.trim_start_matches('/')
                    .trim_end_matches('/')
                    .trim();

                let name = tag.split_whitespace()
                    .next()
                    .unwrap_or("")
                    .to_lowercase();
                if name.is_empty() || name.starts_with('!') {
                    continue;
                }

                if closing {
                    tokens.push(Token::Close(name));
                } else {
                    let href = attr_value(tag, "href");
                    // Void elements never receive a closing tag.
                    let void = self_closing
                        || matches!(name.as_str(), "br" | "hr" | "img");
                    tokens.push(Token::Open { name: name.clone(), href });
                    if void {
                        tokens.push(Token::Close(name));
                    }
                }
            }
            '&' => {
                let mut entity = String::new();
                let mut terminated = false;
                while let Some(&e) = chars.peek() {
                    if e == ';' {
                        chars.next();
                        terminated = true;
                        break;
                    }
                    if e == '&' || e == '<' || entity.len() > 8 {
                        break;
                    }
                    entity.push(e);
                    chars.next();
                }

                match decode_entity(&entity).filter(|_| terminated) {
                    Some(decoded) => text.push(decoded),
                    None => {
                        text.push('&');
                        text.push_str(&entity);
                        if terminated {
                            text.push(';');
                        }
                    }
                }
            }
            _ => text.push(c),
        }
    }

    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }

    tokens
}

fn attr_value(tag: &str, attr: &str) -> Option<String> {
    let at = tag.find(attr)? + attr.len();
    let rest = tag[at..].trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return Some(rest.split_whitespace().next()?.to_string());
    }
    let rest = &rest[1..];
    Some(rest[..rest.find(quote)?].to_string())
}

/// Marker emitted around an inline element's content.
fn inline_marker(name: &str) -> Option<&'static str> {
    match name {
        "strong" | "b" => Some("**"),
        "em" | "i" => Some("_"),
        "u" => Some("__"),
        "strike" | "s" | "del" => Some("~~"),
        "code" => Some("`"),
        "mark" => Some("=="),
        _ => None,
    }
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    buf: String,
    heading: Option<u8>,
    quote_depth: u32,
    pre_depth: u32,
    list: Option<(bool, Vec<String>)>,
    item: Option<String>,
    table: Option<Vec<Vec<String>>>,
    row: Option<Vec<String>>,
    cell: Option<String>,
    links: Vec<Option<String>>,
}

impl Builder {
    fn push_text(&mut self, text: &str) {
        let target = if let Some(cell) = self.cell.as_mut() {
            cell
        } else if let Some(item) = self.item.as_mut() {
            item
        } else {
            &mut self.buf
        };

        if self.pre_depth > 0 {
            target.push_str(text);
            return;
        }

        // Collapse the whitespace runs pretty-printed HTML is full of.
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0
                || (text.starts_with(char::is_whitespace)
                    && !target.is_empty()
                    && !target.ends_with(char::is_whitespace))
            {
                target.push(' ');
            }
            target.push_str(word);
        }
        if text.ends_with(char::is_whitespace)
            && !target.is_empty()
            && !target.ends_with(char::is_whitespace)
        {
            target.push(' ');
        }
    }

    fn push_marker(&mut self, marker: &str) {
        let target = if let Some(cell) = self.cell.as_mut() {
            cell
        } else if let Some(item) = self.item.as_mut() {
            item
        } else {
            &mut self.buf
        };
        target.push_str(marker);
    }

    fn flush_paragraph(&mut self) {
        let text = std::mem::take(&mut self.buf);
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let block = if let Some(level) = self.heading {
            Block::Heading { level, text: text.to_string() }
        } else if self.quote_depth > 0 {
            Block::Blockquote(text.to_string())
        } else {
            Block::Paragraph(text.to_string())
        };
        self.blocks.push(block);
    }

    fn open(&mut self, name: &str, href: Option<String>) {
        if self.pre_depth > 0 && name != "pre" {
            return;
        }

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush_paragraph();
                self.heading = name[1..].parse().ok();
            }
            "p" | "div" if self.item.is_none() && self.cell.is_none() => {
                self.flush_paragraph();
            }
            "br" => self.push_marker("\n"),
            "hr" => {
                self.flush_paragraph();
                self.blocks.push(Block::Rule);
            }
            "ul" | "ol" if self.list.is_none() => {
                self.flush_paragraph();
                self.list = Some((name == "ol", Vec::new()));
            }
            "li" if self.list.is_some() => {
                self.item = Some(String::new());
            }
            "blockquote" => {
                self.flush_paragraph();
                self.quote_depth += 1;
            }
            "pre" => {
                self.flush_paragraph();
                self.pre_depth += 1;
            }
            "table" if self.table.is_none() => {
                self.flush_paragraph();
                self.table = Some(Vec::new());
            }
            "tr" if self.table.is_some() => {
                self.row = Some(Vec::new());
            }
            "td" | "th" if self.row.is_some() => {
                self.cell = Some(String::new());
            }
            "a" => self.links.push(href),
            _ => {
                if let Some(marker) = inline_marker(name) {
                    self.push_marker(marker);
                }
            }
        }
    }

    fn close(&mut self, name: &str) {
        if self.pre_depth > 0 && name != "pre" {
            return;
        }

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush_paragraph();
                self.heading = None;
            }
            "p" | "div" if self.item.is_none() && self.cell.is_none() => {
                self.flush_paragraph();
            }
            "ul" | "ol" => {
                if let Some((ordered, items)) = self.list.take() {
                    if !items.is_empty() {
                        self.blocks.push(Block::List { ordered, items });
                    }
                }
            }
            "li" => {
                if let Some(item) = self.item.take() {
                    let item = item.trim().to_string();
                    if let Some((_, items)) = self.list.as_mut() {
                        items.push(item);
                    }
                }
            }
            "blockquote" => {
                self.flush_paragraph();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            "pre" => {
                self.pre_depth = self.pre_depth.saturating_sub(1);
                if self.pre_depth == 0 {
                    let text = std::mem::take(&mut self.buf);
                    let text = text.trim_matches('\n');
                    if !text.is_empty() {
                        self.blocks.push(Block::CodeBlock(text.to_string()));
                    }
                }
            }
            "table" => {
                if let Some(rows) = self.table.take() {
                    if !rows.is_empty() {
                        self.blocks.push(Block::Table { rows });
                    }
                }
            }
            "tr" => {
                if let Some(row) = self.row.take() {
                    if let Some(rows) = self.table.as_mut() {
                        rows.push(row);
                    }
                }
            }
            "td" | "th" => {
                if let Some(cell) = self.cell.take() {
                    if let Some(row) = self.row.as_mut() {
                        row.push(cell.trim().to_string());
                    }
                }
            }
            "a" => {
                if let Some(Some(href)) = self.links.pop() {
                    if !href.is_empty() {
                        self.push_marker(&format!(" ({})", href));
                    }
                }
            }
            _ => {
                if let Some(marker) = inline_marker(name) {
                    self.push_marker(marker);
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_paragraph();
        self.blocks
    }
}

/// Reduce an HTML fragment to its block sequence.
pub fn transform(html: &str) -> Vec<Block> {
    let mut builder = Builder::default();

    for token in tokenize(html) {
        match token {
            Token::Open { name, href } => builder.open(&name, href),
            Token::Close(name) => builder.close(&name),
            Token::Text(text) => builder.push_text(&text),
        }
    }

    builder.finish()
}
