// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Marked-region extraction and canonical serialization for markup documents.
//
// A deliberately narrow tokenizer: it understands start tags, end tags,
// text, comments, doctypes, and the raw content of script/style, which is
// everything needed to locate a marked element and re-serialize it
// deterministically.  It is not a general HTML parser.
//
// The canonical form depends only on the token sequence of the input:
//
//   - tag and attribute names are ASCII-lowercased
//   - attributes are sorted by name; the first occurrence wins on duplicates
//   - every attribute value is double-quoted; values escape `& < > "`,
//     text escapes `& < >`
//   - character references (the five core named entities plus numeric forms)
//     are decoded on read and re-encoded with the fixed set above
//   - comments, doctypes, and processing instructions are dropped
//   - void elements emit no closing tag; a trailing `/` in a start tag is
//     ignored
//   - script/style content is copied verbatim
//   - an end tag closes every element above its match, unmatched end tags
//     are dropped, and elements still open at end of input are closed

// ---------------------------------------------------------------------------
// Element tables
// ---------------------------------------------------------------------------

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "source", "track", "wbr",
];

/// Elements whose content is raw text: no child tags, no character
/// references.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// A parsed start tag. The name is lowercased and attribute values are
/// entity-decoded; attributes keep their source order until serialization.
#[derive(Debug)]
struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
}

#[derive(Debug)]
enum Token<'a> {
    Start(StartTag),
    End(String),
    Text(&'a str),
    /// Verbatim content of a script or style element.
    Raw(&'a str),
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Set when a start tag opened a raw-text element; the next token is its
    /// verbatim content.
    raw_text_element: Option<String>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_text_element: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            if let Some(name) = self.raw_text_element.take() {
                return Some(self.read_raw_text(&name));
            }
            if self.pos >= self.input.len() {
                return None;
            }
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_comment();
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past_gt();
                continue;
            }
            if rest.starts_with("</") {
                match self.parse_end_tag() {
                    Some(token) => return Some(token),
                    None => continue,
                }
            }
            if Self::starts_tag(rest) {
                match self.parse_start_tag() {
                    Some(tag) => {
                        if is_raw_text(&tag.name) {
                            self.raw_text_element = Some(tag.name.clone());
                        }
                        return Some(Token::Start(tag));
                    }
                    // input ended inside the tag
                    None => continue,
                }
            }
            return Some(self.read_text());
        }
    }

    /// True when `rest` begins a start tag: `<` followed by a letter.
    fn starts_tag(rest: &str) -> bool {
        let mut chars = rest.chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    fn skip_comment(&mut self) {
        match self.input[self.pos + 4..].find("-->") {
            Some(end) => self.pos += 4 + end + 3,
            None => self.pos = self.input.len(),
        }
    }

    /// Advance past the next `>`, or to end of input.
    fn skip_past_gt(&mut self) {
        match self.rest().find('>') {
            Some(end) => self.pos += end + 1,
            None => self.pos = self.input.len(),
        }
    }

    /// Parse `</name ...>`. A `</` not followed by a letter is a bogus
    /// construct and is skipped, yielding `None`.
    fn parse_end_tag(&mut self) -> Option<Token<'a>> {
        let named = self.input[self.pos + 2..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());
        if !named {
            self.skip_past_gt();
            return None;
        }
        self.pos += 2;
        let name = self.read_name();
        self.skip_past_gt();
        Some(Token::End(name))
    }

    /// Parse a start tag at the cursor. Returns `None` when the input ends
    /// inside the tag, in which case the fragment is discarded.
    fn parse_start_tag(&mut self) -> Option<StartTag> {
        self.pos += 1;
        let name = self.read_name();
        let mut attrs: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_whitespace();
            match self.rest().chars().next() {
                None => return None,
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                // trailing solidus carries no meaning in this grammar
                Some('/') => self.pos += 1,
                // stray '=' with no attribute name
                Some('=') => self.pos += 1,
                Some(_) => {
                    let attr_name = self.read_attr_name();
                    self.skip_whitespace();
                    let value = if self.rest().starts_with('=') {
                        self.pos += 1;
                        self.skip_whitespace();
                        self.read_attr_value()
                    } else {
                        String::new()
                    };
                    attrs.push((attr_name, value));
                }
            }
        }
        Some(StartTag { name, attrs })
    }

    /// Read a tag name starting at the cursor, lowercased.
    fn read_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'))
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_ascii_lowercase()
    }

    /// Read an attribute name: everything up to whitespace, `=`, `/`, or `>`.
    fn read_attr_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/' || c == '>')
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_ascii_lowercase()
    }

    /// Read an attribute value: quoted with `"` or `'`, or unquoted up to
    /// whitespace or `>`.
    fn read_attr_value(&mut self) -> String {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(quote).unwrap_or(body.len());
                let closed = usize::from(end < body.len());
                self.pos += 1 + end + closed;
                decode_entities(&body[..end])
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                decode_entities(&rest[..end])
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        self.pos += rest.len() - trimmed.len();
    }

    /// Read a text run. A `<` not followed by a letter, `/`, `!`, or `?` is
    /// literal text.
    fn read_text(&mut self) -> Token<'a> {
        let rest = self.rest();
        let mut from = if rest.starts_with('<') { 1 } else { 0 };
        let mut end = rest.len();
        while let Some(offset) = rest[from..].find('<') {
            let at = from + offset;
            match rest[at + 1..].chars().next() {
                Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?' => {
                    end = at;
                    break;
                }
                _ => from = at + 1,
            }
        }
        self.pos += end;
        Token::Text(&rest[..end])
    }

    /// Read verbatim content up to the matching end tag of a raw-text
    /// element. The end tag itself is left for the normal path.
    fn read_raw_text(&mut self, name: &str) -> Token<'a> {
        let rest = self.rest();
        let mut from = 0;
        while let Some(offset) = rest[from..].find("</") {
            let at = from + offset;
            let after = &rest[at + 2..];
            let name_matches = after
                .get(..name.len())
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name));
            if name_matches {
                let ends_here = match after[name.len()..].chars().next() {
                    None => true,
                    Some(c) => c == '>' || c == '/' || c.is_ascii_whitespace(),
                };
                if ends_here {
                    self.pos += at;
                    return Token::Raw(&rest[..at]);
                }
            }
            from = at + 2;
        }
        self.pos = self.input.len();
        Token::Raw(rest)
    }
}

// ---------------------------------------------------------------------------
// Character references
// ---------------------------------------------------------------------------

/// Decode the five core named references and numeric references. Anything
/// unrecognized stays literal and is re-escaped on output, so the canonical
/// form stays deterministic without a full entity table.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_reference(tail) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one `&...;` reference at the start of `s`, returning the character
/// and the number of bytes consumed.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    let semi = s.find(';')?;
    let body = &s[1..semi];
    let decoded = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?
        }
    };
    Some((decoded, semi + 1))
}

/// Escape text content.
fn encode_text(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Escape an attribute value for double-quoted output.
fn encode_attr_value(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical serialization
// ---------------------------------------------------------------------------

/// Whether the tag's `class` attribute contains `marker` as a complete
/// whitespace-separated token. Only the first `class` attribute counts,
/// matching the duplicate rule used at serialization.
fn has_marker_class(tag: &StartTag, marker: &str) -> bool {
    tag.attrs
        .iter()
        .find(|(name, _)| name == "class")
        .is_some_and(|(_, value)| value.split_whitespace().any(|token| token == marker))
}

fn serialize_start_tag(out: &mut String, tag: &StartTag) {
    out.push('<');
    out.push_str(&tag.name);

    let mut attrs: Vec<(&str, &str)> = Vec::with_capacity(tag.attrs.len());
    for (name, value) in &tag.attrs {
        if !attrs.iter().any(|&(seen, _)| seen == name.as_str()) {
            attrs.push((name.as_str(), value.as_str()));
        }
    }
    attrs.sort_by(|a, b| a.0.cmp(b.0));

    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        encode_attr_value(out, value);
        out.push('"');
    }
    out.push('>');
}

fn close_tag(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Serialize `root` and everything inside it canonically, consuming tokens
/// until the element closes or the input runs out.
fn serialize_element(root: StartTag, tokens: &mut Tokenizer<'_>) -> String {
    let mut out = String::new();
    serialize_start_tag(&mut out, &root);
    if is_void(&root.name) {
        return out;
    }

    let mut open: Vec<String> = vec![root.name];
    while let Some(token) = tokens.next_token() {
        match token {
            Token::Start(tag) => {
                serialize_start_tag(&mut out, &tag);
                if !is_void(&tag.name) {
                    open.push(tag.name);
                }
            }
            Token::End(name) => {
                if let Some(depth) = open.iter().rposition(|open_name| *open_name == name) {
                    for closed in open.drain(depth..).rev() {
                        close_tag(&mut out, &closed);
                    }
                    if open.is_empty() {
                        return out;
                    }
                }
            }
            Token::Text(text) => encode_text(&mut out, &decode_entities(text)),
            Token::Raw(raw) => out.push_str(raw),
        }
    }

    // input ended inside the element
    for unclosed in open.drain(..).rev() {
        close_tag(&mut out, &unclosed);
    }
    out
}

/// Find the first element whose `class` token list contains `marker_class`
/// and return its canonical serialization, or `None` when no element in the
/// document is marked.
pub fn extract_marked_element(html: &str, marker_class: &str) -> Option<String> {
    let mut tokens = Tokenizer::new(html);
    while let Some(token) = tokens.next_token() {
        if let Token::Start(tag) = token {
            if has_marker_class(&tag, marker_class) {
                return Some(serialize_element(tag, &mut tokens));
            }
        }
    }
    None
}
