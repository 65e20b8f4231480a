use crate::{
    ast::ast::{NodeId, Tag},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<NodeId, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind).copied() {
        Some(nud) => nud,
        None => return Err(parser.unexpected_token()),
    };

    let mut left = nud(parser)?;

    // While the next operator binds tighter than `bp`, keep extending lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = parser
            .get_bp_lookup()
            .get(&token_kind)
            .copied()
            .unwrap_or(BindingPower::Default);
        if next_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind).copied() {
            Some(led) => led,
            None => return Err(parser.unexpected_token()),
        };
        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

/// Parses an expression tree and wraps it in an `Expression` node.
pub fn parse_expression(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.current_token_id();
    let expr = parse_expr(parser, BindingPower::Default)?;
    Ok(parser.add_node(Tag::Expression, start, expr.0, 0))
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.current_token();
    let tag = match token.kind {
        TokenKind::Int => {
            if token.value.parse::<i64>().is_err() {
                return Err(Error::new(
                    ErrorImpl::NumberParseError {
                        token: token.value.clone(),
                    },
                    parser.get_location(),
                ));
            }
            Tag::IntLiteral
        }
        TokenKind::Float => {
            if token.value.parse::<f64>().is_err() {
                return Err(Error::new(
                    ErrorImpl::NumberParseError {
                        token: token.value.clone(),
                    },
                    parser.get_location(),
                ));
            }
            Tag::FloatLiteral
        }
        TokenKind::String => Tag::StringLiteral,
        TokenKind::True | TokenKind::False => Tag::BoolLiteral,
        TokenKind::Identifier => Tag::Identifier,
        _ => return Err(parser.unexpected_token()),
    };

    let token = parser.advance();
    Ok(parser.add_node(tag, token, 0, 0))
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: NodeId,
    bp: BindingPower,
) -> Result<NodeId, Error> {
    let operator_kind = parser.current_token_kind();
    let operator = parser.advance();

    let tag = match operator_kind {
        TokenKind::Plus => Tag::Add,
        TokenKind::Dash => Tag::Sub,
        TokenKind::Star => Tag::Mul,
        TokenKind::Slash => Tag::Div,
        TokenKind::Equals => Tag::Equal,
        TokenKind::NotEquals => Tag::NotEqual,
        TokenKind::Less => Tag::Less,
        TokenKind::LessEquals => Tag::LessEqual,
        TokenKind::Greater => Tag::Greater,
        TokenKind::GreaterEquals => Tag::GreaterEqual,
        TokenKind::And => Tag::And,
        TokenKind::Or => Tag::Or,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.token(operator).value.clone(),
                },
                parser.get_location(),
            ))
        }
    };

    let right = parse_expr(parser, bp)?;

    Ok(parser.add_node(tag, operator, left.0, right.0))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let tag = match parser.current_token_kind() {
        TokenKind::Dash => Tag::Negate,
        TokenKind::Plus => Tag::UnaryPlus,
        TokenKind::Not => Tag::Not,
        TokenKind::Ampersand => Tag::AddressOf,
        TokenKind::Star => Tag::Deref,
        _ => return Err(parser.unexpected_token()),
    };
    let operator = parser.advance();
    let rhs = parse_expr(parser, BindingPower::Unary)?;

    Ok(parser.add_node(tag, operator, rhs.0, 0))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_call_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    let open = parser.expect(TokenKind::OpenParen)?;

    let mut args = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        args.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected_token_detailed("expected `,` or `)` in argument list"));
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let (start, end) = parser.add_extra_range(&args);
    let header = parser.add_extra(&[start, end]);
    Ok(parser.add_node(Tag::Call, open, left.0, header))
}
