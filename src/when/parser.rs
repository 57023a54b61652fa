use regex_cache::LazyRegex;

use super::WhenError;
use super::context::{ContextValue, EditorContext};
use super::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Parsed `when` clause
#[derive(Debug, Clone)]
pub enum Expr {
    Bool(bool),
    Key(String),
    Not(Box<Expr>),
    /// Operands of a flat `&&` chain
    And(Vec<Expr>),
    /// Operands of a flat `||` chain
    Or(Vec<Expr>),
    Compare {
        key: String,
        op: CmpOp,
        value: String,
    },
    Match {
        key: String,
        regex: LazyRegex,
    },
    In {
        key: String,
        container: String,
        negated: bool,
    },
}

/// Bound on nested `!` and parentheses
pub const MAX_DEPTH: usize = 256;

pub fn parse(tokens: Vec<Token>) -> Result<Expr, WhenError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(WhenError::UnexpectedToken(format!("{token:?}"))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), WhenError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(WhenError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, WhenError> {
        let mut operands = vec![self.parse_and()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            operands.push(self.parse_and()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expr::Or(operands)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, WhenError> {
        let mut operands = vec![self.parse_unary()?];
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            operands.push(self.parse_unary()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expr::And(operands)
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, WhenError> {
        if matches!(self.peek(), Some(Token::Bang)) {
            self.advance();
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, WhenError> {
        match self.advance() {
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(WhenError::UnexpectedToken(format!("{other:?}"))),
                    None => Err(WhenError::UnexpectedEnd),
                }
            }
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::Word(key)) => self.parse_key_operation(key),
            Some(other) => Err(WhenError::UnexpectedToken(format!("{other:?}"))),
            None => Err(WhenError::UnexpectedEnd),
        }
    }

    fn parse_key_operation(&mut self, key: String) -> Result<Expr, WhenError> {
        let op = match self.peek() {
            Some(Token::EqEq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Le) => CmpOp::Le,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Ge) => CmpOp::Ge,
            Some(Token::Match) => {
                self.advance();
                return self.parse_match(key);
            }
            Some(Token::In) => {
                self.advance();
                return self.parse_in(key, false);
            }
            Some(Token::Not) => {
                self.advance();
                if !matches!(self.advance(), Some(Token::In)) {
                    return Err(WhenError::UnexpectedToken("not".to_string()));
                }
                return self.parse_in(key, true);
            }
            _ => return Ok(Expr::Key(key)),
        };
        self.advance();
        let value = match self.advance() {
            Some(Token::Word(value) | Token::Str(value)) => value,
            Some(Token::True) => "true".to_string(),
            Some(Token::False) => "false".to_string(),
            Some(other) => return Err(WhenError::UnexpectedToken(format!("{other:?}"))),
            None => return Err(WhenError::UnexpectedEnd),
        };
        Ok(Expr::Compare { key, op, value })
    }

    fn parse_match(&mut self, key: String) -> Result<Expr, WhenError> {
        let Some(Token::Regex { pattern, flags }) = self.advance() else {
            return Err(WhenError::ExpectedRegex(self.pos));
        };
        let inline: String = flags
            .chars()
            .filter(|flag| matches!(flag, 'i' | 'm' | 's'))
            .collect();
        let pattern = pattern.replace("\\/", "/");
        let source = if inline.is_empty() {
            pattern
        } else {
            format!("(?{inline}){pattern}")
        };
        let regex = LazyRegex::new(&source).map_err(|e| WhenError::Regex {
            source: e,
            pattern: source.clone(),
        })?;
        Ok(Expr::Match { key, regex })
    }

    fn parse_in(&mut self, key: String, negated: bool) -> Result<Expr, WhenError> {
        match self.advance() {
            Some(Token::Word(container)) => Ok(Expr::In {
                key,
                container,
                negated,
            }),
            Some(other) => Err(WhenError::UnexpectedToken(format!("{other:?}"))),
            None => Err(WhenError::UnexpectedEnd),
        }
    }
}

fn compare_numbers(actual: f64, expected: f64, op: CmpOp) -> bool {
    match op {
        CmpOp::Eq => (actual - expected).abs() < f64::EPSILON,
        CmpOp::Ne => (actual - expected).abs() >= f64::EPSILON,
        CmpOp::Lt => actual < expected,
        CmpOp::Le => actual <= expected,
        CmpOp::Gt => actual > expected,
        CmpOp::Ge => actual >= expected,
    }
}

impl Expr {
    #[must_use]
    pub fn eval(&self, context: &EditorContext) -> bool {
        match self {
            Expr::Bool(value) => *value,
            Expr::Key(key) => context.get(key).is_some_and(ContextValue::is_truthy),
            Expr::Not(inner) => !inner.eval(context),
            Expr::And(operands) => operands.iter().all(|operand| operand.eval(context)),
            Expr::Or(operands) => operands.iter().any(|operand| operand.eval(context)),
            Expr::Compare { key, op, value } => {
                let Some(actual) = context.get(key) else {
                    return *op == CmpOp::Ne;
                };
                if let (Some(actual), Ok(expected)) = (actual.as_number(), value.parse::<f64>()) {
                    return compare_numbers(actual, expected, *op);
                }
                match op {
                    CmpOp::Eq => actual.as_text() == *value,
                    CmpOp::Ne => actual.as_text() != *value,
                    CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => false,
                }
            }
            Expr::Match { key, regex } => context
                .get(key)
                .is_some_and(|actual| regex.is_match(&actual.as_text())),
            Expr::In {
                key,
                container,
                negated,
            } => {
                let found = match (context.get(key), context.get(container)) {
                    (Some(item), Some(ContextValue::List(items))) => {
                        let item = item.as_text();
                        items.iter().any(|candidate| *candidate == item)
                    }
                    _ => false,
                };
                found != *negated
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::lex;
    use super::*;

    fn parse_str(source: &str) -> Result<Expr, WhenError> {
        parse(lex(source)?)
    }

    #[test]
    fn test_precedence_and_binds_tighter_than_or() {
        let expr = parse_str("a || b && c").unwrap();
        let Expr::Or(operands) = expr else {
            panic!("Expected Expr::Or");
        };
        assert_eq!(operands.len(), 2);
        assert!(matches!(operands[1], Expr::And(_)));
    }

    #[test]
    fn test_nesting_is_bounded() {
        let nots = "!".repeat(5_000) + "editorFocus";
        assert!(matches!(parse_str(&nots), Err(WhenError::TooDeep(MAX_DEPTH))));
        let parens = "(".repeat(5_000) + "a" + &")".repeat(5_000);
        assert!(matches!(parse_str(&parens), Err(WhenError::TooDeep(_))));
        let within = "!".repeat(MAX_DEPTH) + "a";
        assert!(parse_str(&within).is_ok());
    }

    #[test]
    fn test_long_chain_stays_flat() {
        let chain = vec!["a"; 20_000].join(" && ");
        let Expr::And(operands) = parse_str(&chain).unwrap() else {
            panic!("Expected Expr::And");
        };
        assert_eq!(operands.len(), 20_000);
    }

    #[test]
    fn test_dangling_operator_is_an_error() {
        assert!(matches!(parse_str("a &&"), Err(WhenError::UnexpectedEnd)));
        assert!(parse_str("a == ").is_err());
        assert!(parse_str("(a").is_err());
        assert!(parse_str("a b").is_err());
    }

    #[test]
    fn test_not_in() {
        let expr = parse_str("editorLangId not in excludedLanguages").unwrap();
        assert!(matches!(expr, Expr::In { negated: true, .. }));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            parse_str("resourcePath =~ /[unclosed/"),
            Err(WhenError::Regex { .. })
        ));
    }
}
