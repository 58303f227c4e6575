//! Lightweight markdown checks and plain-text rendering.
//!
//! This is not a markdown parser. It understands the handful of constructs
//! résumés and cover letters use (front matter, ATX headings, lists,
//! emphasis, inline code, links, fenced code) well enough to validate a file
//! and show a readable preview in the terminal.

/// Default number of characters shown by [`preview`].
pub const DEFAULT_PREVIEW_LIMIT: usize = 500;

/// State of a YAML front-matter block at the top of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontMatter {
    /// No `---` ... `---` block at the top. An opening `---` that is never
    /// closed is a horizontal rule, not front matter.
    None,
    /// A closed block whose contents parse as YAML.
    Valid,
    /// A closed block that is not valid YAML; holds the parser message.
    Invalid(String),
}

/// A heading found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub has_content: bool,
    pub has_headings: bool,
    pub headings: Vec<Heading>,
    pub front_matter: FrontMatter,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.has_content && !matches!(self.front_matter, FrontMatter::Invalid(_))
    }

    /// Human-readable reasons the document is invalid.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.has_content {
            problems.push("file is empty".to_string());
        }
        if let FrontMatter::Invalid(reason) = &self.front_matter {
            problems.push(format!("front matter is not valid YAML: {reason}"));
        }
        problems
    }
}

/// Check that `content` is usable as a template or job description.
pub fn validate_markdown(content: &str) -> ValidationReport {
    let (front_matter, body) = split_front_matter(content);

    let mut headings = Vec::new();
    let mut in_fence = false;
    for line in body.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some((level, text)) = parse_heading(line) {
            headings.push(Heading {
                level,
                text: text.to_owned(),
            });
        }
    }

    ValidationReport {
        has_content: !content.trim().is_empty(),
        has_headings: !headings.is_empty(),
        headings,
        front_matter,
    }
}

/// Render `content` as plain text.
///
/// Front matter, fence delimiters and horizontal rules are dropped; heading
/// markers, list bullets, quote markers, emphasis and inline-code ticks are
/// removed; links keep their text. Code inside fences is kept verbatim.
pub fn plain_text(content: &str) -> String {
    let (_, body) = split_front_matter(content);

    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;
    for line in body.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            lines.push(line.to_owned());
            continue;
        }
        if is_rule(line) {
            continue;
        }

        let text = match parse_heading(line) {
            Some((_, text)) => text,
            None => strip_block_marker(line.trim()),
        };
        lines.push(strip_inline(text));
    }

    // Collapse runs of blank lines.
    let mut out = String::new();
    let mut blank = false;
    for line in lines {
        if line.trim().is_empty() {
            blank = true;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank { "\n\n" } else { "\n" });
        }
        out.push_str(line.trim_end());
        blank = false;
    }
    out
}

/// First `limit` characters of [`plain_text`], with `...` appended when cut.
pub fn preview(content: &str, limit: usize) -> String {
    let text = plain_text(content);
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn split_front_matter(content: &str) -> (FrontMatter, &str) {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (FrontMatter::None, content);
    };
    if first.trim_end() != "---" {
        return (FrontMatter::None, content);
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == "---" {
            let state = parse_front_matter(&content[start..offset]);
            return (state, &content[offset + line.len()..]);
        }
        offset += line.len();
    }
    (FrontMatter::None, content)
}

fn parse_front_matter(block: &str) -> FrontMatter {
    if block.trim().is_empty() {
        return FrontMatter::Valid;
    }
    match serde_yaml::from_str::<serde_yaml::Value>(block) {
        Ok(_) => FrontMatter::Valid,
        Err(e) => FrontMatter::Invalid(e.to_string()),
    }
}

fn is_fence(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("```") || line.starts_with("~~~")
}

fn is_rule(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3
        && matches!(marks[0], '-' | '*' | '_')
        && marks.iter().all(|&c| c == marks[0])
}

fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((level, rest.trim().trim_end_matches('#').trim_end()))
}

fn strip_block_marker(line: &str) -> &str {
    let mut line = line;
    while let Some(rest) = line.strip_prefix('>') {
        line = rest.trim_start();
    }
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }
    line
}

fn strip_inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' | '`' => {
                i += 1;
            }
            '_' if chars.get(i + 1) == Some(&'_') => {
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'[') => {
                i += 1;
            }
            '[' => match link_end(&chars, i) {
                Some((label_end, end)) => {
                    let label: String = chars[i + 1..label_end].iter().collect();
                    out.push_str(&strip_inline(&label));
                    i = end + 1;
                }
                None => {
                    out.push(c);
                    i += 1;
                }
            },
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// For a `[label](target)` starting at `start`, the index of `]` and of `)`.
fn link_end(chars: &[char], start: usize) -> Option<(usize, usize)> {
    let label_end = start + chars[start..].iter().position(|&c| c == ']')?;
    if chars.get(label_end + 1) != Some(&'(') {
        return None;
    }
    let target_end = label_end + 1 + chars[label_end + 1..].iter().position(|&c| c == ')')?;
    Some((label_end, target_end))
}
