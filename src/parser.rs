// ABOUTME: Recursive-descent parser turning a token stream into an AST

use crate::ast::{Func, Node};
use crate::error::ParseError;
use crate::token::TokenKind;

/// Walks a flat token slice, producing AST nodes with one token of
/// lookahead and no backtracking.
struct Parser<'a> {
    tokens: &'a [TokenKind],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [TokenKind]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn lookahead(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&TokenKind> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: &TokenKind, what: &str) -> Result<(), ParseError> {
        match self.advance() {
            Some(found) if found == want => Ok(()),
            Some(found) => Err(ParseError::UnexpectedToken {
                found: found.clone(),
                expected: what.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: what.to_string(),
            }),
        }
    }

    fn expect_var(&mut self, what: &str) -> Result<String, ParseError> {
        match self.advance() {
            Some(TokenKind::Var(name)) => Ok(name.clone()),
            Some(found) => Err(ParseError::UnexpectedToken {
                found: found.clone(),
                expected: what.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: what.to_string(),
            }),
        }
    }

    fn starts_t(tok: &TokenKind) -> bool {
        matches!(
            tok,
            TokenKind::Int(_)
                | TokenKind::Var(_)
                | TokenKind::Str(_)
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::Nil
                | TokenKind::True
                | TokenKind::False
        )
    }

    fn starts_e(tok: &TokenKind) -> bool {
        matches!(tok, TokenKind::LeftParen) || Self::starts_t(tok)
    }

    fn starts_uop(tok: &TokenKind) -> bool {
        matches!(
            tok,
            TokenKind::Not | TokenKind::Head | TokenKind::Tail | TokenKind::Print
        )
    }

    fn starts_bop(tok: &TokenKind) -> bool {
        matches!(
            tok,
            TokenKind::And
                | TokenKind::Or
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Lte
                | TokenKind::Gt
                | TokenKind::Gte
                | TokenKind::Add
                | TokenKind::Sub
                | TokenKind::Mul
                | TokenKind::Div
                | TokenKind::While
                | TokenKind::Push
                | TokenKind::Get
        )
    }

    fn starts_top(tok: &TokenKind) -> bool {
        matches!(tok, TokenKind::If | TokenKind::Put)
    }

    /// E: a bare term, or a parenthesized form, optionally followed by one
    /// or more `;` and a trailing expression, turning the pair into `Seq`.
    fn parse_e(&mut self) -> Result<Node, ParseError> {
        let e = match self.lookahead() {
            Some(tok) if Self::starts_t(tok) => self.parse_t()?,
            Some(TokenKind::LeftParen) => {
                self.advance();
                self.parse_e1()?
            }
            Some(found) => {
                return Err(ParseError::UnexpectedToken {
                    found: found.clone(),
                    expected: "expression".to_string(),
                })
            }
            None => {
                return Err(ParseError::UnexpectedEof {
                    expected: "expression".to_string(),
                })
            }
        };

        let mut saw_seq = false;
        while matches!(self.lookahead(), Some(TokenKind::Seq)) {
            self.advance();
            saw_seq = true;
        }
        if !saw_seq {
            return Ok(e);
        }
        match self.lookahead() {
            Some(tok) if Self::starts_e(tok) => {
                let rest = self.parse_e()?;
                Ok(Node::Seq(vec![e, rest]))
            }
            _ => Ok(e),
        }
    }

    /// E1: the inside of a `(...)` form, after the opening paren has been
    /// consumed. Dispatches on the leading keyword/operator.
    fn parse_e1(&mut self) -> Result<Node, ParseError> {
        match self.lookahead().cloned() {
            Some(TokenKind::Func) => {
                self.advance();
                let name = self.expect_var("function name")?;
                let params = self.parse_p()?;
                if params.iter().any(|p| p == &name) {
                    return Err(ParseError::ParamShadowsFunctionName(name));
                }
                self.expect(&TokenKind::Colon, ":")?;
                let body = self.parse_e()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(Node::Func(Func {
                    name,
                    params,
                    body: Box::new(body),
                }))
            }
            Some(TokenKind::Call) => {
                self.advance();
                let callee = self.parse_e()?;
                let args = self.parse_l()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(Node::Call(Box::new(callee), args))
            }
            Some(TokenKind::Let) => {
                self.advance();
                let name = self.expect_var("variable name")?;
                let e = self.parse_e()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(Node::Let(name, Box::new(e)))
            }
            Some(TokenKind::Mut) => {
                self.advance();
                let name = self.expect_var("variable name")?;
                let e = self.parse_e()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(Node::Mut(name, Box::new(e)))
            }
            Some(TokenKind::Set) => {
                self.advance();
                let name = self.expect_var("variable name")?;
                let e = self.parse_e()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(Node::Set(name, Box::new(e)))
            }
            Some(ref tok) if Self::starts_uop(tok) => {
                let build = self.parse_uop()?;
                let e = self.parse_e()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(build(Box::new(e)))
            }
            Some(ref tok) if Self::starts_bop(tok) => {
                let build = self.parse_bop()?;
                let e1 = self.parse_e()?;
                let e2 = self.parse_e()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(build(Box::new(e1), Box::new(e2)))
            }
            Some(ref tok) if Self::starts_top(tok) => {
                let build = self.parse_top()?;
                let e1 = self.parse_e()?;
                let e2 = self.parse_e()?;
                let e3 = self.parse_e()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(build(Box::new(e1), Box::new(e2), Box::new(e3)))
            }
            Some(ref tok) if Self::starts_e(tok) => {
                let e = self.parse_e()?;
                self.expect(&TokenKind::RightParen, ")")?;
                Ok(e)
            }
            Some(found) => Err(ParseError::UnexpectedToken {
                found,
                expected: "form inside parentheses".to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "form inside parentheses".to_string(),
            }),
        }
    }

    fn parse_t(&mut self) -> Result<Node, ParseError> {
        match self.advance().cloned() {
            Some(TokenKind::Int(n)) => Ok(Node::Int(n)),
            Some(TokenKind::True) => Ok(Node::Bool(true)),
            Some(TokenKind::False) => Ok(Node::Bool(false)),
            Some(TokenKind::Var(name)) => Ok(Node::Var(name)),
            Some(TokenKind::Str(s)) => Ok(Node::Str(s)),
            Some(TokenKind::Nil) => Ok(Node::Nil),
            Some(TokenKind::LeftBracket) => {
                let items = self.parse_l()?;
                self.expect(&TokenKind::RightBracket, "]")?;
                Ok(Node::List(items))
            }
            Some(TokenKind::LeftBrace) => {
                let pairs = self.parse_m()?;
                self.expect(&TokenKind::RightBrace, "}")?;
                Ok(Node::Map(pairs))
            }
            Some(found) => Err(ParseError::UnexpectedToken {
                found,
                expected: "term".to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "term".to_string(),
            }),
        }
    }

    /// M: zero or more `key: value` pairs, each a full `E`. Order is
    /// preserved; a duplicate key is resolved later, leftmost wins.
    fn parse_m(&mut self) -> Result<Vec<(Node, Node)>, ParseError> {
        match self.lookahead() {
            Some(tok) if Self::starts_e(tok) => {
                let key = self.parse_e()?;
                self.expect(&TokenKind::Colon, ":")?;
                let value = self.parse_e()?;
                let mut rest = self.parse_m()?;
                rest.insert(0, (key, value));
                Ok(rest)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// P: zero or more parameter names.
    fn parse_p(&mut self) -> Result<Vec<String>, ParseError> {
        match self.lookahead() {
            Some(TokenKind::Var(_)) => {
                let name = self.expect_var("parameter name")?;
                let mut rest = self.parse_p()?;
                rest.insert(0, name);
                Ok(rest)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// L: zero or more comma-free, whitespace-separated expressions (list
    /// elements or call arguments).
    fn parse_l(&mut self) -> Result<Vec<Node>, ParseError> {
        match self.lookahead() {
            Some(tok) if Self::starts_e(tok) => {
                let e = self.parse_e()?;
                let mut rest = self.parse_l()?;
                rest.insert(0, e);
                Ok(rest)
            }
            _ => Ok(Vec::new()),
        }
    }

    #[allow(clippy::type_complexity)]
    fn parse_uop(&mut self) -> Result<fn(Box<Node>) -> Node, ParseError> {
        match self.advance() {
            Some(TokenKind::Not) => Ok(Node::Not),
            Some(TokenKind::Head) => Ok(Node::Head),
            Some(TokenKind::Tail) => Ok(Node::Tail),
            Some(TokenKind::Print) => Ok(Node::Print),
            Some(found) => Err(ParseError::UnexpectedToken {
                found: found.clone(),
                expected: "unary operator".to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "unary operator".to_string(),
            }),
        }
    }

    #[allow(clippy::type_complexity)]
    fn parse_bop(&mut self) -> Result<fn(Box<Node>, Box<Node>) -> Node, ParseError> {
        match self.advance() {
            Some(TokenKind::And) => Ok(Node::And),
            Some(TokenKind::Or) => Ok(Node::Or),
            Some(TokenKind::Eq) => Ok(Node::Eq),
            Some(TokenKind::NotEq) => Ok(Node::NotEq),
            Some(TokenKind::Lt) => Ok(Node::Lt),
            Some(TokenKind::Lte) => Ok(Node::Lte),
            Some(TokenKind::Gt) => Ok(Node::Gt),
            Some(TokenKind::Gte) => Ok(Node::Gte),
            Some(TokenKind::Add) => Ok(Node::Add),
            Some(TokenKind::Sub) => Ok(Node::Sub),
            Some(TokenKind::Mul) => Ok(Node::Mul),
            Some(TokenKind::Div) => Ok(Node::Div),
            Some(TokenKind::While) => Ok(Node::While),
            Some(TokenKind::Push) => Ok(Node::Push),
            Some(TokenKind::Get) => Ok(Node::Get),
            Some(found) => Err(ParseError::UnexpectedToken {
                found: found.clone(),
                expected: "binary operator".to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "binary operator".to_string(),
            }),
        }
    }

    #[allow(clippy::type_complexity)]
    fn parse_top(&mut self) -> Result<fn(Box<Node>, Box<Node>, Box<Node>) -> Node, ParseError> {
        match self.advance() {
            Some(TokenKind::If) => Ok(Node::If),
            Some(TokenKind::Put) => Ok(Node::Put),
            Some(found) => Err(ParseError::UnexpectedToken {
                found: found.clone(),
                expected: "ternary operator".to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "ternary operator".to_string(),
            }),
        }
    }
}

/// Parses a full token stream into a single top-level expression. Returns
/// `Ok(None)` for an empty token stream, and errors on any tokens left over
/// once the expression has been fully consumed.
pub fn parse(tokens: &[TokenKind]) -> Result<Option<Node>, ParseError> {
    let mut parser = Parser::new(tokens);
    if parser.done() {
        return Ok(None);
    }
    let e = parser.parse_e()?;
    if !parser.done() {
        return Err(ParseError::TrailingTokens);
    }
    Ok(Some(e))
}
