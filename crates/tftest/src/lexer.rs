//! Minimal HCL native-syntax scanner
//!
//! Only comments are produced. Everything else is skipped, but quoted
//! templates, interpolation sequences and heredocs are tracked so that a `#`
//! inside a string never shows up as a comment.

use std::path::{Path, PathBuf};

use crate::error::{Result, TfTestError};

/// A comment token. `#` and `//` comments keep their trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub line: usize,
}

/// Collect every comment token in `src`.
pub fn comments(src: &str, path: &Path) -> Result<Vec<Comment>> {
    let mut lexer = Lexer {
        src: src.as_bytes(),
        text: src,
        pos: 0,
        line: 1,
        path: path.to_path_buf(),
        comments: Vec::new(),
    };
    lexer.scan_body()?;
    Ok(lexer.comments)
}

struct Lexer<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
    line: usize,
    path: PathBuf,
    comments: Vec<Comment>,
}

impl<'a> Lexer<'a> {
    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.src.get(self.pos).copied()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn error(&self, line: usize, message: impl Into<String>) -> TfTestError {
        TfTestError::Lex {
            path: self.path.clone(),
            line,
            message: message.into(),
        }
    }

    /// Top-level body: runs to end of input.
    fn scan_body(&mut self) -> Result<()> {
        while self.peek(0).is_some() {
            self.scan_token()?;
        }
        Ok(())
    }

    /// Expression context inside `${ ... }` or `%{ ... }`; returns after
    /// consuming the matching closing brace.
    fn scan_interpolation(&mut self, opened_at: usize) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.peek(0) {
                None => return Err(self.error(opened_at, "unterminated template interpolation")),
                Some(b'{') => {
                    depth += 1;
                    self.bump();
                }
                Some(b'}') => {
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                Some(_) => self.scan_token()?,
            }
        }
    }

    /// Consume one token-ish unit starting at the current position.
    fn scan_token(&mut self) -> Result<()> {
        match (self.peek(0), self.peek(1)) {
            (Some(b'#'), _) => self.scan_line_comment(),
            (Some(b'/'), Some(b'/')) => self.scan_line_comment(),
            (Some(b'/'), Some(b'*')) => self.scan_block_comment()?,
            (Some(b'"'), _) => self.scan_quoted()?,
            (Some(b'<'), Some(b'<')) => {
                if !self.scan_heredoc()? {
                    self.bump();
                    self.bump();
                }
            }
            _ => {
                self.bump();
            }
        }
        Ok(())
    }

    fn scan_line_comment(&mut self) {
        let start = self.pos;
        let line = self.line;
        while let Some(b) = self.bump() {
            if b == b'\n' {
                break;
            }
        }
        self.push_comment(start, line);
    }

    fn scan_block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        let line = self.line;
        self.bump();
        self.bump();
        loop {
            match (self.peek(0), self.peek(1)) {
                (None, _) => return Err(self.error(line, "unterminated block comment")),
                (Some(b'*'), Some(b'/')) => {
                    self.bump();
                    self.bump();
                    break;
                }
                _ => {
                    self.bump();
                }
            }
        }
        self.push_comment(start, line);
        Ok(())
    }

    fn push_comment(&mut self, start: usize, line: usize) {
        self.comments.push(Comment {
            text: self.text[start..self.pos].to_string(),
            line,
        });
    }

    fn scan_quoted(&mut self) -> Result<()> {
        let line = self.line;
        self.bump();
        loop {
            match (self.peek(0), self.peek(1), self.peek(2)) {
                (None, _, _) | (Some(b'\n'), _, _) => {
                    return Err(self.error(line, "unterminated template string"))
                }
                (Some(b'"'), _, _) => {
                    self.bump();
                    return Ok(());
                }
                (Some(b'\\'), Some(_), _) => {
                    self.bump();
                    self.bump();
                }
                // `$${` and `%%{` are literal escapes
                (Some(b'$'), Some(b'$'), Some(b'{')) | (Some(b'%'), Some(b'%'), Some(b'{')) => {
                    self.bump();
                    self.bump();
                    self.bump();
                }
                (Some(b'$'), Some(b'{'), _) | (Some(b'%'), Some(b'{'), _) => {
                    let opened_at = self.line;
                    self.bump();
                    self.bump();
                    self.scan_interpolation(opened_at)?;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Returns `false` when the `<<` is not followed by a heredoc marker.
    fn scan_heredoc(&mut self) -> Result<bool> {
        let mut cursor = self.pos + 2;
        if self.src.get(cursor) == Some(&b'-') {
            cursor += 1;
        }
        let ident_start = cursor;
        while let Some(&b) = self.src.get(cursor) {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
                cursor += 1;
            } else {
                break;
            }
        }
        if cursor == ident_start {
            return Ok(false);
        }
        // The marker must end the line.
        let mut eol = cursor;
        if self.src.get(eol) == Some(&b'\r') {
            eol += 1;
        }
        if self.src.get(eol) != Some(&b'\n') {
            return Ok(false);
        }

        let marker = &self.text[ident_start..cursor];
        let line = self.line;
        while self.pos <= eol {
            self.bump();
        }

        loop {
            if self.peek(0).is_none() {
                return Err(self.error(line, format!("unterminated heredoc {marker}")));
            }
            let start = self.pos;
            while let Some(b) = self.bump() {
                if b == b'\n' {
                    break;
                }
            }
            if self.text[start..self.pos].trim() == marker {
                return Ok(true);
            }
        }
    }
}
