// ABOUTME: Tokenizer turning source text into a flat sequence of tokens

use crate::error::LexError;
use crate::token::{TokenKind, KEYWORDS};

/// Scans a source string into tokens, left to right, with no backtracking
/// once a token has been emitted.
struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn done(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Consumes `s` if it matches at the current position, char by char.
    fn eat_str(&mut self, s: &str) -> bool {
        let n = s.chars().count();
        if self.chars[self.pos..].iter().take(n).eq(s.chars().collect::<Vec<_>>().iter()) {
            self.pos += n;
            true
        } else {
            false
        }
    }

    fn eat_char(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Run of leading `-` signs (parity determines sign) followed by one or
    /// more digits. Rewinds and reports no match if no digits are consumed.
    /// A letter immediately following the digit run is a hard lex error
    /// rather than a fall-through to identifier scanning.
    fn try_integer(&mut self) -> Result<Option<i64>, LexError> {
        let start = self.pos;
        let mut negative = false;
        while self.eat_char('-') {
            negative = !negative;
        }

        let digits_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }

        if self.pos == digits_start {
            self.pos = start;
            return Ok(None);
        }

        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            return Err(LexError::IntegerFollowedByLetter);
        }

        let digits: String = self.chars[digits_start..self.pos].iter().collect();
        let magnitude: i64 = digits.parse().expect("digit run must parse as i64");
        Ok(Some(if negative { -magnitude } else { magnitude }))
    }

    fn try_keyword(&mut self) -> Option<TokenKind> {
        for (kw, make) in KEYWORDS {
            let n = kw.chars().count();
            let matches_text = self.chars[self.pos..]
                .iter()
                .take(n)
                .collect::<String>()
                == *kw;
            let boundary_ok = !matches!(self.peek_at(n), Some(c) if c.is_ascii_alphanumeric());
            if matches_text && self.chars.len() - self.pos >= n && boundary_ok {
                self.pos += n;
                return Some(make());
            }
        }
        None
    }

    fn try_var(&mut self) -> Option<String> {
        if !matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            return None;
        }
        let start = self.pos;
        self.pos += 1;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn try_string(&mut self) -> Result<Option<String>, LexError> {
        if !self.eat_char('"') {
            return Ok(None);
        }
        let mut content = String::new();
        loop {
            match self.advance() {
                None => return Err(LexError::UnterminatedString),
                Some('\\') => {
                    content.push('\\');
                    match self.advance() {
                        None => return Err(LexError::UnterminatedString),
                        Some(c) => content.push(c),
                    }
                }
                Some('"') => return Ok(Some(content)),
                Some(c) => content.push(c),
            }
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn next_token(&mut self) -> Result<Option<TokenKind>, LexError> {
        if self.eat_str("!=") {
            return Ok(Some(TokenKind::NotEq));
        }
        if self.eat_str("<=") {
            return Ok(Some(TokenKind::Lte));
        }
        if self.eat_str(">=") {
            return Ok(Some(TokenKind::Gte));
        }
        if self.eat_str("&&") {
            return Ok(Some(TokenKind::And));
        }
        if self.eat_str("||") {
            return Ok(Some(TokenKind::Or));
        }
        if self.eat_str("==") {
            return Ok(Some(TokenKind::Eq));
        }

        let single = [
            ('(', TokenKind::LeftParen),
            (')', TokenKind::RightParen),
            ('[', TokenKind::LeftBracket),
            (']', TokenKind::RightBracket),
            ('{', TokenKind::LeftBrace),
            ('}', TokenKind::RightBrace),
            (':', TokenKind::Colon),
            ('!', TokenKind::Not),
            ('<', TokenKind::Lt),
            ('>', TokenKind::Gt),
            ('+', TokenKind::Add),
        ];
        for (ch, kind) in single {
            if self.peek() == Some(ch) {
                self.pos += 1;
                return Ok(Some(kind));
            }
        }

        if let Some(n) = self.try_integer()? {
            return Ok(Some(TokenKind::Int(n)));
        }

        let single_late = [
            ('-', TokenKind::Sub),
            ('*', TokenKind::Mul),
            ('/', TokenKind::Div),
            (';', TokenKind::Seq),
        ];
        for (ch, kind) in single_late {
            if self.peek() == Some(ch) {
                self.pos += 1;
                return Ok(Some(kind));
            }
        }

        if let Some(kind) = self.try_keyword() {
            return Ok(Some(kind));
        }

        if let Some(name) = self.try_var() {
            return Ok(Some(TokenKind::Var(name)));
        }

        if let Some(s) = self.try_string()? {
            return Ok(Some(TokenKind::Str(s)));
        }

        if self.skip_whitespace() {
            return Ok(None);
        }

        match self.peek() {
            Some(c) => Err(LexError::UnexpectedChar(c)),
            None => Ok(None),
        }
    }
}

/// Converts `src` into a flat sequence of tokens, or a [`LexError`] at the
/// first unrecognized input.
pub fn tokenize(src: &str) -> Result<Vec<TokenKind>, LexError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    while !lexer.done() {
        if let Some(tok) = lexer.next_token()? {
            tokens.push(tok);
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation() {
        let toks = tokenize("(){}[]:;").unwrap();
        assert_eq!(
            toks,
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Colon,
                TokenKind::Seq,
            ]
        );
    }

    #[test]
    fn test_two_char_operators_before_single() {
        assert_eq!(tokenize("!=").unwrap(), vec![TokenKind::NotEq]);
        assert_eq!(tokenize("<=").unwrap(), vec![TokenKind::Lte]);
        assert_eq!(tokenize(">=").unwrap(), vec![TokenKind::Gte]);
        assert_eq!(tokenize("!").unwrap(), vec![TokenKind::Not]);
        assert_eq!(tokenize("<").unwrap(), vec![TokenKind::Lt]);
        assert_eq!(tokenize(">").unwrap(), vec![TokenKind::Gt]);
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(tokenize("42").unwrap(), vec![TokenKind::Int(42)]);
        assert_eq!(tokenize("-42").unwrap(), vec![TokenKind::Int(-42)]);
        assert_eq!(tokenize("--42").unwrap(), vec![TokenKind::Int(42)]);
        assert_eq!(tokenize("---5").unwrap(), vec![TokenKind::Int(-5)]);
    }

    #[test]
    fn test_negative_literal_sign_run_quirk() {
        // spec.md §4.1: "3-2" tokenises as two INTs, not INT SUB INT.
        assert_eq!(
            tokenize("3-2").unwrap(),
            vec![TokenKind::Int(3), TokenKind::Int(-2)]
        );
    }

    #[test]
    fn test_standalone_minus_is_sub_when_no_digits_follow() {
        assert_eq!(
            tokenize("(- 5 3)").unwrap(),
            vec![
                TokenKind::LeftParen,
                TokenKind::Sub,
                TokenKind::Int(5),
                TokenKind::Int(3),
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn test_integer_followed_by_letter_is_error() {
        assert_eq!(
            tokenize("5x"),
            Err(LexError::IntegerFollowedByLetter)
        );
    }

    #[test]
    fn test_keyword_boundary() {
        // "ifx" must lex as one Var, not If + Var("x").
        assert_eq!(
            tokenize("ifx").unwrap(),
            vec![TokenKind::Var("ifx".to_string())]
        );
        assert_eq!(tokenize("if").unwrap(), vec![TokenKind::If]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(tokenize("while").unwrap(), vec![TokenKind::While]);
        assert_eq!(tokenize("func").unwrap(), vec![TokenKind::Func]);
        assert_eq!(tokenize("call").unwrap(), vec![TokenKind::Call]);
        assert_eq!(tokenize("let").unwrap(), vec![TokenKind::Let]);
        assert_eq!(tokenize("mut").unwrap(), vec![TokenKind::Mut]);
        assert_eq!(tokenize("set").unwrap(), vec![TokenKind::Set]);
        assert_eq!(tokenize("True").unwrap(), vec![TokenKind::True]);
        assert_eq!(tokenize("False").unwrap(), vec![TokenKind::False]);
        assert_eq!(tokenize("nil").unwrap(), vec![TokenKind::Nil]);
        assert_eq!(tokenize("head").unwrap(), vec![TokenKind::Head]);
        assert_eq!(tokenize("tail").unwrap(), vec![TokenKind::Tail]);
        assert_eq!(tokenize("push").unwrap(), vec![TokenKind::Push]);
        assert_eq!(tokenize("get").unwrap(), vec![TokenKind::Get]);
        assert_eq!(tokenize("put").unwrap(), vec![TokenKind::Put]);
        assert_eq!(tokenize("print").unwrap(), vec![TokenKind::Print]);
    }

    #[test]
    fn test_variable_identifier() {
        assert_eq!(
            tokenize("foo").unwrap(),
            vec![TokenKind::Var("foo".to_string())]
        );
        assert_eq!(
            tokenize("foo123bar").unwrap(),
            vec![TokenKind::Var("foo123bar".to_string())]
        );
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(
            tokenize(r#""hello""#).unwrap(),
            vec![TokenKind::Str("hello".to_string())]
        );
        assert_eq!(
            tokenize(r#""say \"hi\"""#).unwrap(),
            vec![TokenKind::Str(r#"say \"hi\""#.to_string())]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(tokenize(r#""abc"#), Err(LexError::UnterminatedString));
    }

    #[test]
    fn test_even_backslash_run_before_closing_quote_still_closes() {
        // Two literal backslashes (one escaped backslash) right before the
        // closing quote. A single-char lookback at the last scanned
        // character would see a `\` and wrongly treat this quote as escaped
        // too; pairing `\` with whatever follows it avoids that.
        assert_eq!(
            tokenize(r#""a\\""#).unwrap(),
            vec![TokenKind::Str(r#"a\\"#.to_string())]
        );
    }

    #[test]
    fn test_whitespace_skipped() {
        assert_eq!(
            tokenize("  1   2  \n 3\t").unwrap(),
            vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Int(3)]
        );
    }

    #[test]
    fn test_unrecognized_char_is_lex_error() {
        assert_eq!(tokenize("@"), Err(LexError::UnexpectedChar('@')));
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let src = "(func f a b: (+ a b))";
        assert_eq!(tokenize(src).unwrap(), tokenize(src).unwrap());
    }
}
