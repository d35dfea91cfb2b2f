use super::ast::{AugOp, BinOp, Compare, CompareOp, Expr, Stmt};
use super::LowerError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Ident(String),
    Plus,
    Minus,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    PlusEq,
    MinusEq,
    Eq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    KwWhile,
    KwIf,
    KwElse,
}

fn tokenize(source: &str) -> Result<Vec<Token>, LowerError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<i64>().map_err(|_| LowerError::UnexpectedToken {
                found: text.clone(),
                expected: "integer literal",
            })?;
            tokens.push(Token::Int(value));
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(match text.as_str() {
                "while" => Token::KwWhile,
                "if" => Token::KwIf,
                "else" => Token::KwElse,
                _ => Token::Ident(text),
            });
            continue;
        }
        macro_rules! two_char {
            ($second:expr, $both:expr, $single:expr) => {{
                if i + 1 < chars.len() && chars[i + 1] == $second {
                    i += 2;
                    $both
                } else {
                    i += 1;
                    $single
                }
            }};
        }
        let tok = match c {
            '+' => two_char!('=', Token::PlusEq, Token::Plus),
            '-' => two_char!('=', Token::MinusEq, Token::Minus),
            '&' => {
                i += 1;
                Token::Amp
            }
            '|' => {
                i += 1;
                Token::Pipe
            }
            '^' => {
                i += 1;
                Token::Caret
            }
            '<' => {
                if i + 1 < chars.len() && chars[i + 1] == '<' {
                    i += 2;
                    Token::Shl
                } else {
                    two_char!('=', Token::LtEq, Token::Lt)
                }
            }
            '>' => {
                if i + 1 < chars.len() && chars[i + 1] == '>' {
                    i += 2;
                    Token::Shr
                } else {
                    two_char!('=', Token::GtEq, Token::Gt)
                }
            }
            '=' => two_char!('=', Token::EqEq, Token::Eq),
            '!' => {
                if i + 1 < chars.len() && chars[i + 1] == '=' {
                    i += 2;
                    Token::NotEq
                } else {
                    return Err(LowerError::UnexpectedToken {
                        found: "!".to_string(),
                        expected: "!=",
                    });
                }
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '{' => {
                i += 1;
                Token::LBrace
            }
            '}' => {
                i += 1;
                Token::RBrace
            }
            ';' => {
                i += 1;
                Token::Semi
            }
            other => {
                return Err(LowerError::UnexpectedToken {
                    found: other.to_string(),
                    expected: "a token",
                })
            }
        };
        tokens.push(tok);
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &'static str, matcher: impl Fn(&Token) -> bool) -> Result<Token, LowerError> {
        match self.peek() {
            Some(tok) if matcher(tok) => Ok(self.advance().unwrap()),
            Some(tok) => Err(LowerError::UnexpectedToken { found: format!("{tok:?}"), expected }),
            None => Err(LowerError::UnexpectedEof { expected }),
        }
    }

    fn ident(&mut self) -> Result<String, LowerError> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(tok) => Err(LowerError::UnexpectedToken { found: format!("{tok:?}"), expected: "identifier" }),
            None => Err(LowerError::UnexpectedEof { expected: "identifier" }),
        }
    }

    fn parse_program(&mut self) -> Result<Vec<Stmt>, LowerError> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, LowerError> {
        self.expect("{", |t| *t == Token::LBrace)?;
        let mut stmts = Vec::new();
        while !matches!(self.peek(), Some(Token::RBrace)) {
            if self.peek().is_none() {
                return Err(LowerError::UnexpectedEof { expected: "}" });
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect("}", |t| *t == Token::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, LowerError> {
        match self.peek() {
            Some(Token::KwWhile) => {
                self.advance();
                self.expect("(", |t| *t == Token::LParen)?;
                let cond = self.parse_compare()?;
                self.expect(")", |t| *t == Token::RParen)?;
                let body = self.parse_block()?;
                Ok(Stmt::While { cond, body })
            }
            Some(Token::KwIf) => {
                self.advance();
                self.expect("(", |t| *t == Token::LParen)?;
                let cond = self.parse_compare()?;
                self.expect(")", |t| *t == Token::RParen)?;
                let then_body = self.parse_block()?;
                let else_body = if matches!(self.peek(), Some(Token::KwElse)) {
                    self.advance();
                    self.parse_block()?
                } else {
                    Vec::new()
                };
                Ok(Stmt::If { cond, then_body, else_body })
            }
            Some(Token::Ident(_)) => {
                let name = self.ident()?;
                match self.advance() {
                    Some(Token::Eq) => {
                        let value = self.parse_expr()?;
                        self.expect(";", |t| *t == Token::Semi)?;
                        Ok(Stmt::Assign { name, value })
                    }
                    Some(Token::PlusEq) => {
                        let value = self.parse_expr()?;
                        self.expect(";", |t| *t == Token::Semi)?;
                        Ok(Stmt::AugAssign { name, op: AugOp::Add, value })
                    }
                    Some(Token::MinusEq) => {
                        let value = self.parse_expr()?;
                        self.expect(";", |t| *t == Token::Semi)?;
                        Ok(Stmt::AugAssign { name, op: AugOp::Sub, value })
                    }
                    Some(tok) => Err(LowerError::UnexpectedToken {
                        found: format!("{tok:?}"),
                        expected: "'=', '+=' or '-='",
                    }),
                    None => Err(LowerError::UnexpectedEof { expected: "'=', '+=' or '-='" }),
                }
            }
            Some(tok) => Err(LowerError::UnexpectedToken { found: format!("{tok:?}"), expected: "statement" }),
            None => Err(LowerError::UnexpectedEof { expected: "statement" }),
        }
    }

    fn parse_compare(&mut self) -> Result<Compare, LowerError> {
        let left = self.parse_expr()?;
        let op = match self.advance() {
            Some(Token::EqEq) => CompareOp::Eq,
            Some(Token::NotEq) => CompareOp::Ne,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::LtEq) => CompareOp::Le,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::GtEq) => CompareOp::Ge,
            Some(tok) => {
                return Err(LowerError::UnexpectedToken {
                    found: format!("{tok:?}"),
                    expected: "comparison operator",
                })
            }
            None => return Err(LowerError::UnexpectedEof { expected: "comparison operator" }),
        };
        let right = self.parse_expr()?;
        Ok(Compare { left, op, right })
    }

    /// Parses a left-associative chain of binary operators over
    /// atoms. There is no precedence climbing: `a + b & c` groups as
    /// `(a + b) & c`, matching the single-pass evaluator in codegen.
    fn parse_expr(&mut self) -> Result<Expr, LowerError> {
        let mut expr = self.parse_atom()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                Some(Token::Amp) => BinOp::And,
                Some(Token::Pipe) => BinOp::Or,
                Some(Token::Caret) => BinOp::Xor,
                Some(Token::Shl) => BinOp::Shl,
                Some(Token::Shr) => BinOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.parse_atom()?;
            expr = Expr::Binary { op, left: Box::new(expr), right: Box::new(right) };
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, LowerError> {
        match self.advance() {
            Some(Token::Int(value)) => Ok(Expr::Int(value)),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(")", |t| *t == Token::RParen)?;
                Ok(expr)
            }
            Some(tok) => Err(LowerError::UnexpectedToken { found: format!("{tok:?}"), expected: "expression" }),
            None => Err(LowerError::UnexpectedEof { expected: "expression" }),
        }
    }
}

pub fn parse(source: &str) -> Result<Vec<Stmt>, LowerError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignment() {
        let stmts = parse("x = 1 + 2;").unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Assign { .. }));
    }

    #[test]
    fn parses_while_with_comparison() {
        let stmts = parse("while (x < 10) { x += 1; }").unwrap();
        assert!(matches!(stmts[0], Stmt::While { .. }));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("x = ;").is_err());
    }
}
