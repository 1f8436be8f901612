use std::{fmt, str::FromStr};

use thiserror::Error;

pub const ROOT_TAG: &str = "REAPER_PROJECT";

const INDENT: &str = "  ";
const QUOTES: [char; 3] = ['"', '\'', '`'];
/// Deepest block nesting `Document::parse` accepts. Rendering, cloning and dropping recurse
/// once per level.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("project text is empty")]
    Empty,
    #[error("line {line}: expected a `<` block opening the project")]
    MissingRoot { line: usize },
    #[error("line {line}: block has no tag")]
    EmptyTag { line: usize },
    #[error("line {line}: `>` without an open block")]
    UnexpectedClose { line: usize },
    #[error("block `{tag}` opened on line {line} is never closed")]
    Unclosed { tag: String, line: usize },
    #[error("line {line}: content after the project block")]
    TrailingContent { line: usize },
    #[error("line {line}: blocks nested deeper than {limit} levels")]
    TooDeep { line: usize, limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Line,
    Block,
}

#[derive(Debug, Clone)]
struct Layout {
    depth: usize,
    indent: String,
    /// Original header text without indentation; `None` once the node was edited.
    header: Option<String>,
    footer: Option<Footer>,
}

#[derive(Debug, Clone)]
struct Footer {
    indent: String,
    text: String,
}

#[derive(Debug, Clone)]
pub struct Node {
    tag: String,
    params: Vec<String>,
    kind: NodeKind,
    children: Vec<Node>,
    layout: Option<Layout>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.params == other.params
            && self.kind == other.kind
            && self.children == other.children
    }
}

impl Node {
    #[must_use]
    pub fn line<I, S>(tag: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag: tag.into(),
            params: params.into_iter().map(Into::into).collect(),
            kind: NodeKind::Line,
            children: Vec::new(),
            layout: None,
        }
    }

    #[must_use]
    pub fn block<I, S>(tag: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: NodeKind::Block,
            ..Self::line(tag, params)
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn is_block(&self) -> bool {
        self.kind == NodeKind::Block
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[must_use]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn param_f64(&self, index: usize) -> Option<f64> {
        self.param(index)?
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }

    #[must_use]
    pub fn param_i64(&self, index: usize) -> Option<i64> {
        let raw = self.param(index)?;
        raw.parse::<i64>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    #[must_use]
    pub fn child_index(&self, tag: &str) -> Option<usize> {
        self.children.iter().position(|child| child.tag == tag)
    }

    pub fn children_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if self.tag != tag {
            self.tag = tag;
            self.touch();
        }
    }

    pub fn set_param(&mut self, index: usize, value: impl Into<String>) {
        let value = value.into();
        if self.params.get(index) == Some(&value) {
            return;
        }
        while self.params.len() <= index {
            self.params.push("0".to_string());
        }
        self.params[index] = value;
        self.touch();
    }

    pub fn pad_params(&mut self, defaults: &[&str]) {
        if self.params.len() >= defaults.len() {
            return;
        }
        let missing = &defaults[self.params.len()..];
        self.params.extend(missing.iter().map(ToString::to_string));
        self.touch();
    }

    fn touch(&mut self) {
        if let Some(layout) = &mut self.layout {
            layout.header = None;
        }
    }

    #[must_use]
    pub fn to_rpp_string(&self) -> String {
        let mut lines = Vec::new();
        self.write_lines(0, &mut lines);
        lines.join("\n")
    }

    /// Token-level rendering that ignores remembered layout. Two nodes with equal tags,
    /// parameters and children always produce the same canonical text.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        self.write_canonical(0, &mut out);
        out
    }

    fn header_text(&self) -> String {
        let mut text = String::new();
        if self.is_block() {
            text.push('<');
        }
        text.push_str(&quote(&self.tag));
        for param in &self.params {
            text.push(' ');
            text.push_str(&quote(param));
        }
        text
    }

    fn write_lines(&self, depth: usize, lines: &mut Vec<String>) {
        let (indent, header) = match &self.layout {
            Some(layout) => {
                let indent = if layout.depth == depth {
                    layout.indent.clone()
                } else {
                    INDENT.repeat(depth)
                };
                let header = layout
                    .header
                    .clone()
                    .unwrap_or_else(|| self.header_text());
                (indent, header)
            }
            None => (INDENT.repeat(depth), self.header_text()),
        };
        lines.push(format!("{indent}{header}"));

        if !self.is_block() {
            return;
        }
        for child in &self.children {
            child.write_lines(depth + 1, lines);
        }
        let footer = self
            .layout
            .as_ref()
            .and_then(|layout| layout.footer.as_ref().map(|footer| (layout.depth, footer)));
        match footer {
            Some((original_depth, footer)) if original_depth == depth => {
                lines.push(format!("{}{}", footer.indent, footer.text));
            }
            Some((_, footer)) => lines.push(format!("{}{}", INDENT.repeat(depth), footer.text)),
            None => lines.push(format!("{}>", INDENT.repeat(depth))),
        }
    }

    fn write_canonical(&self, depth: usize, out: &mut String) {
        out.push_str(&INDENT.repeat(depth));
        out.push_str(&self.header_text());
        out.push('\n');
        if self.is_block() {
            for child in &self.children {
                child.write_canonical(depth + 1, out);
            }
            out.push_str(&INDENT.repeat(depth));
            out.push_str(">\n");
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rpp_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,
    line_ending: LineEnding,
    bom: bool,
    leading: Vec<String>,
    trailing: Vec<String>,
    final_newline: bool,
}

impl Document {
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self {
            root,
            line_ending: LineEnding::Lf,
            bom: false,
            leading: Vec::new(),
            trailing: Vec::new(),
            final_newline: true,
        }
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let (bom, body) = match text.strip_prefix('\u{feff}') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let final_newline = body.ends_with('\n');
        let mut lines: Vec<&str> = body.split('\n').collect();
        if final_newline {
            lines.pop();
        }

        let terminated = if final_newline {
            lines.len()
        } else {
            lines.len().saturating_sub(1)
        };
        let line_ending = if terminated > 0 && lines[..terminated].iter().all(|l| l.ends_with('\r'))
        {
            for line in &mut lines[..terminated] {
                *line = &line[..line.len() - 1];
            }
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };

        let mut stack: Vec<(Node, usize)> = Vec::new();
        let mut root: Option<Node> = None;
        let mut leading = Vec::new();
        let mut trailing = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let number = index + 1;
            let body = line.trim_start();
            let indent = &line[..line.len() - body.len()];
            let trimmed = body.trim_end();

            if stack.is_empty() {
                if trimmed.is_empty() {
                    if root.is_none() {
                        leading.push((*line).to_string());
                    } else {
                        trailing.push((*line).to_string());
                    }
                    continue;
                }
                if root.is_some() {
                    return Err(ParseError::TrailingContent { line: number });
                }
                if !trimmed.starts_with('<') {
                    return Err(ParseError::MissingRoot { line: number });
                }
            }

            let depth = stack.len();
            if let Some(rest) = trimmed.strip_prefix('<') {
                let mut tokens = tokenize(rest);
                if tokens.is_empty() {
                    return Err(ParseError::EmptyTag { line: number });
                }
                if depth >= MAX_DEPTH {
                    return Err(ParseError::TooDeep {
                        line: number,
                        limit: MAX_DEPTH,
                    });
                }
                let tag = tokens.remove(0);
                let mut node = Node::block(tag, tokens);
                node.layout = Some(Layout {
                    depth,
                    indent: indent.to_string(),
                    header: Some(body.to_string()),
                    footer: None,
                });
                stack.push((node, number));
            } else if trimmed == ">" {
                let (mut node, _) = stack
                    .pop()
                    .ok_or(ParseError::UnexpectedClose { line: number })?;
                if let Some(layout) = &mut node.layout {
                    layout.footer = Some(Footer {
                        indent: indent.to_string(),
                        text: body.to_string(),
                    });
                }
                match stack.last_mut() {
                    Some((parent, _)) => parent.children.push(node),
                    None => root = Some(node),
                }
            } else {
                let mut tokens = tokenize(trimmed);
                let tag = if tokens.is_empty() {
                    String::new()
                } else {
                    tokens.remove(0)
                };
                let mut node = Node::line(tag, tokens);
                node.layout = Some(Layout {
                    depth,
                    indent: indent.to_string(),
                    header: Some(body.to_string()),
                    footer: None,
                });
                if let Some((parent, _)) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
        }

        if let Some((node, line)) = stack.pop() {
            return Err(ParseError::Unclosed {
                tag: node.tag,
                line,
            });
        }

        let root = root.ok_or(ParseError::Empty)?;
        Ok(Self {
            root,
            line_ending,
            bom,
            leading,
            trailing,
            final_newline,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = self.leading.clone();
        self.root.write_lines(0, &mut lines);
        lines.extend(self.trailing.iter().cloned());

        let ending = self.line_ending.as_str();
        let mut out = String::new();
        if self.bom {
            out.push('\u{feff}');
        }
        out.push_str(&lines.join(ending));
        if self.final_newline {
            out.push_str(ending);
        }
        out
    }
}

impl FromStr for Document {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Splits one line into tokens. Quoted tokens run to the next matching quote, or to the end
/// of the line when unterminated.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if QUOTES.contains(&ch) {
            chars.next();
            let body_start = start + ch.len_utf8();
            let mut end = text.len();
            for (index, next) in chars.by_ref() {
                if next == ch {
                    end = index;
                    break;
                }
            }
            tokens.push(text[body_start..end].to_string());
        } else {
            let mut end = text.len();
            while let Some(&(index, next)) = chars.peek() {
                if next.is_whitespace() {
                    end = index;
                    break;
                }
                chars.next();
            }
            tokens.push(text[start..end].to_string());
        }
    }

    tokens
}

fn quote(token: &str) -> String {
    if token.is_empty() {
        return "\"\"".to_string();
    }
    let needs_quotes =
        token.chars().any(char::is_whitespace) || token.starts_with(QUOTES.as_slice());
    if !needs_quotes {
        return token.to_string();
    }
    match QUOTES.iter().find(|quote| !token.contains(**quote)) {
        Some(quote) => format!("{quote}{token}{quote}"),
        None => format!("`{}`", token.replace('`', "'")),
    }
}
