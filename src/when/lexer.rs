use super::WhenError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Context key or bare literal, e.g. `editorLangId` or `typescript`
    Word(String),
    /// Quoted literal
    Str(String),
    /// `/pattern/flags`, only produced right after `=~`
    Regex { pattern: String, flags: String },
    True,
    False,
    In,
    Not,

    LParen,
    RParen,
    Bang,
    And,
    Or,
    EqEq,
    Ne,
    Match,
    Lt,
    Le,
    Gt,
    Ge,
}

pub fn lex(source: &str) -> Result<Vec<Token>, WhenError> {
    Lexer::new(source).tokenize()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-')
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, WhenError> {
        while let Some(ch) = self.peek() {
            let start = self.pos;
            match ch {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'(' => {
                    self.pos += 1;
                    self.tokens.push(Token::LParen);
                }
                b')' => {
                    self.pos += 1;
                    self.tokens.push(Token::RParen);
                }
                b'!' => {
                    self.pos += 1;
                    if self.eat(b'=') {
                        self.eat(b'=');
                        self.tokens.push(Token::Ne);
                    } else {
                        self.tokens.push(Token::Bang);
                    }
                }
                b'&' => {
                    self.pos += 1;
                    if !self.eat(b'&') {
                        return Err(WhenError::UnexpectedChar { ch: '&', pos: start });
                    }
                    self.tokens.push(Token::And);
                }
                b'|' => {
                    self.pos += 1;
                    if !self.eat(b'|') {
                        return Err(WhenError::UnexpectedChar { ch: '|', pos: start });
                    }
                    self.tokens.push(Token::Or);
                }
                b'=' => {
                    self.pos += 1;
                    if self.eat(b'=') {
                        self.eat(b'=');
                        self.tokens.push(Token::EqEq);
                    } else if self.eat(b'~') {
                        self.tokens.push(Token::Match);
                        self.regex()?;
                    } else {
                        return Err(WhenError::UnexpectedChar { ch: '=', pos: start });
                    }
                }
                b'<' => {
                    self.pos += 1;
                    let token = if self.eat(b'=') { Token::Le } else { Token::Lt };
                    self.tokens.push(token);
                }
                b'>' => {
                    self.pos += 1;
                    let token = if self.eat(b'=') { Token::Ge } else { Token::Gt };
                    self.tokens.push(token);
                }
                b'\'' | b'"' => self.string(ch)?,
                b if is_word_byte(b) => self.word(),
                _ => {
                    let ch = self.source[start..].chars().next().unwrap_or('?');
                    return Err(WhenError::UnexpectedChar { ch, pos: start });
                }
            }
        }
        Ok(self.tokens)
    }

    fn string(&mut self, quote: u8) -> Result<(), WhenError> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        while let Some(b) = self.peek() {
            if b == quote {
                let value = self.source[content_start..self.pos].to_string();
                self.pos += 1;
                self.tokens.push(Token::Str(value));
                return Ok(());
            }
            self.pos += 1;
        }
        Err(WhenError::UnterminatedString(start))
    }

    fn word(&mut self) {
        let start = self.pos;
        while self.peek().is_some_and(is_word_byte) {
            self.pos += 1;
        }
        let word = &self.source[start..self.pos];
        let token = match word {
            "true" => Token::True,
            "false" => Token::False,
            "in" => Token::In,
            "not" => Token::Not,
            _ => Token::Word(word.to_string()),
        };
        self.tokens.push(token);
    }

    fn regex(&mut self) -> Result<(), WhenError> {
        while self.peek().is_some_and(|b| b == b' ' || b == b'\t') {
            self.pos += 1;
        }
        let start = self.pos;
        if !self.eat(b'/') {
            return Err(WhenError::ExpectedRegex(start));
        }
        let pattern_start = self.pos;
        let mut escaped = false;
        loop {
            match self.peek() {
                None => return Err(WhenError::ExpectedRegex(start)),
                Some(b'\\') if !escaped => escaped = true,
                Some(b'/') if !escaped => break,
                Some(_) => escaped = false,
            }
            self.pos += 1;
        }
        let pattern = self.source[pattern_start..self.pos].to_string();
        self.pos += 1;
        let flags_start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let flags = self.source[flags_start..self.pos].to_string();
        self.tokens.push(Token::Regex { pattern, flags });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_comparison() {
        let tokens = lex("editorLangId == 'rust' && !editorFocus").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("editorLangId".to_string()),
                Token::EqEq,
                Token::Str("rust".to_string()),
                Token::And,
                Token::Bang,
                Token::Word("editorFocus".to_string()),
            ]
        );
    }

    #[test]
    fn test_lex_regex_with_escaped_slash() {
        let tokens = lex(r"resourcePath =~ /src\/.*\.rs$/i").unwrap();
        assert_eq!(
            tokens[2],
            Token::Regex {
                pattern: r"src\/.*\.rs$".to_string(),
                flags: "i".to_string()
            }
        );
    }

    #[test]
    fn test_lex_rejects_unknown_characters() {
        assert!(matches!(
            lex("!@#invalid"),
            Err(WhenError::UnexpectedChar { ch: '@', pos: 1 })
        ));
    }

    #[test]
    fn test_lex_unterminated_string() {
        assert!(matches!(lex("a == 'b"), Err(WhenError::UnterminatedString(5))));
    }
}
