//! Recursive-descent parser with precedence climbing for binary operators.

use serde_json::Value;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{Lexer, SpannedToken, Token};
use super::EvalError;

/// Maximum accepted expression size in bytes.
const MAX_EXPRESSION_BYTES: usize = 64 * 1024;
/// Maximum nesting of parentheses, unary operators and call arguments.
const MAX_NESTING: usize = 64;

/// Parse an expression string into its syntax tree.
pub(crate) fn parse(input: &str) -> Result<Expr, EvalError> {
    if input.len() > MAX_EXPRESSION_BYTES {
        return Err(EvalError::Parse {
            position: 0,
            message: format!(
                "expression exceeds size limit: {} bytes (max {MAX_EXPRESSION_BYTES})",
                input.len()
            ),
        });
    }
    let tokens = Lexer::new(input).lex()?;
    let mut parser = Parser {
        tokens,
        index: 0,
        nesting: 0,
    };
    let expr = parser.parse_expression()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    index: usize,
    nesting: usize,
}

impl Parser {
    fn current(&self) -> &SpannedToken {
        // The token stream always ends with Eof and the index never moves past it.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().token.clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> EvalError {
        let current = self.current();
        EvalError::Parse {
            position: current.position,
            message: format!("unexpected `{}`, expected {expected}", current.token.describe()),
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), EvalError> {
        if self.current().token == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_eof(&self) -> Result<(), EvalError> {
        match self.current().token {
            Token::Eof => Ok(()),
            _ => Err(self.unexpected("end of input")),
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(EvalError::Parse {
                position: self.current().position,
                message: format!("expression nesting exceeds limit ({MAX_NESTING})"),
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    fn parse_expression(&mut self) -> Result<Expr, EvalError> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr, EvalError> {
        let condition = self.parse_binary(0)?;
        if self.current().token != Token::Question {
            return Ok(condition);
        }
        self.advance();
        self.enter()?;
        let then_branch = self.parse_expression()?;
        self.expect(Token::Colon, "`:` in conditional expression")?;
        let else_branch = self.parse_expression()?;
        self.leave();
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, EvalError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = binary_op(&self.current().token) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            // All binary operators are left-associative.
            let right = self.parse_binary(precedence + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.current().token {
            Token::Not => UnaryOp::Not,
            Token::Minus => UnaryOp::Negate,
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current().token {
                Token::Dot | Token::SafeDot => {
                    let null_safe = self.advance() == Token::SafeDot;
                    let name = match &self.current().token {
                        Token::Ident(name) => name.clone(),
                        _ => return Err(self.unexpected("property or method name")),
                    };
                    self.advance();
                    if self.current().token == Token::LParen {
                        let args = self.parse_arguments()?;
                        expr = Expr::Call {
                            receiver: Box::new(expr),
                            method: name,
                            args,
                            null_safe,
                        };
                    } else {
                        expr = Expr::Member {
                            object: Box::new(expr),
                            property: name,
                            null_safe,
                        };
                    }
                }
                Token::LBracket => {
                    self.advance();
                    self.enter()?;
                    let index = self.parse_expression()?;
                    self.leave();
                    self.expect(Token::RBracket, "`]`")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, EvalError> {
        self.expect(Token::LParen, "`(`")?;
        self.enter()?;
        let mut args = Vec::new();
        if self.current().token != Token::RParen {
            loop {
                args.push(self.parse_expression()?);
                if self.current().token == Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.leave();
        self.expect(Token::RParen, "`)` after arguments")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let position = self.current().position;
        if !starts_primary(&self.current().token) {
            return Err(self.unexpected("expression"));
        }
        match self.advance() {
            Token::Number(raw) => parse_number(&raw, position).map(Expr::Literal),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Var(name) => match name.as_str() {
                "this" | "root" => Ok(Expr::Context),
                _ => Err(EvalError::Parse {
                    position,
                    message: format!("unknown variable `#{name}`"),
                }),
            },
            Token::Ident(name) => {
                if self.current().token == Token::LParen {
                    return Err(EvalError::Parse {
                        position,
                        message: format!("unknown function `{name}`"),
                    });
                }
                Ok(Expr::Property(name))
            }
            Token::LParen => {
                self.enter()?;
                let expr = self.parse_expression()?;
                self.leave();
                self.expect(Token::RParen, "`)`")?;
                Ok(expr)
            }
            other => Err(EvalError::Parse {
                position,
                message: format!("unexpected `{}`, expected expression", other.describe()),
            }),
        }
    }
}

fn starts_primary(token: &Token) -> bool {
    matches!(
        token,
        Token::Number(_)
            | Token::Str(_)
            | Token::True
            | Token::False
            | Token::Null
            | Token::Var(_)
            | Token::Ident(_)
            | Token::LParen
    )
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    Some(match token {
        Token::Or => BinaryOp::Or,
        Token::And => BinaryOp::And,
        Token::Eq => BinaryOp::Equal,
        Token::Ne => BinaryOp::NotEqual,
        Token::Lt => BinaryOp::Less,
        Token::Le => BinaryOp::LessEqual,
        Token::Gt => BinaryOp::Greater,
        Token::Ge => BinaryOp::GreaterEqual,
        Token::Matches => BinaryOp::Matches,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Subtract,
        Token::Star => BinaryOp::Multiply,
        Token::Slash => BinaryOp::Divide,
        Token::Percent => BinaryOp::Modulo,
        _ => return None,
    })
}

fn parse_number(raw: &str, position: usize) -> Result<Value, EvalError> {
    if let Ok(int) = raw.parse::<i64>() {
        return Ok(Value::from(int));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| EvalError::Parse {
            position,
            message: format!("invalid number `{raw}`"),
        })
}
