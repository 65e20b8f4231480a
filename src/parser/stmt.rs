use crate::{
    ast::ast::{NodeId, Tag, NULL_NODE},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{expr::parse_expression, parser::Parser};

pub fn parse_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let handler = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied();
    if let Some(handler) = handler {
        return handler(parser);
    }

    let start = parser.current_token_id();
    let target = parse_expression(parser)?;

    if parser.current_token_kind() == TokenKind::Assignment {
        let operator = parser.advance();
        let value = parse_expression(parser)?;
        parser.expect_terminator()?;
        return Ok(parser.add_node(Tag::Assign, operator, target.0, value.0));
    }

    parser.expect_terminator()?;

    Ok(parser.add_node(Tag::ExprStmt, start, target.0, 0))
}

fn parse_identifier(parser: &mut Parser, message: &str) -> Result<NodeId, Error> {
    let error = parser.unexpected_token_detailed(message);
    let token = parser.expect_error(TokenKind::Identifier, Some(error))?;
    Ok(parser.add_node(Tag::Identifier, token, 0, 0))
}

/// `const name = value` and `var name = value`.
pub fn parse_binding_decl_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let tag = if parser.current_token_kind() == TokenKind::Const {
        Tag::ConstDecl
    } else {
        Tag::VarDecl
    };
    let keyword = parser.advance();

    let name = parse_identifier(parser, "expected identifier during variable declaration")?;

    let error = parser.unexpected_token_detailed("expected `=` and an initial value");
    parser.expect_error(TokenKind::Assignment, Some(error))?;
    let value = parse_expression(parser)?;

    parser.expect_terminator()?;

    Ok(parser.add_node(tag, keyword, name.0, value.0))
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let open = parser.expect(TokenKind::OpenCurly)?;

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        match parser.current_token_kind() {
            TokenKind::EOF => return Err(parser.unexpected_token_detailed("unclosed block")),
            TokenKind::Semicolon => {
                parser.advance();
            }
            _ => statements.push(parse_stmt(parser)?),
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    let (start, end) = parser.add_extra_range(&statements);
    Ok(parser.add_node(Tag::Block, open, start, end))
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let keyword = parser.advance();

    let name = parse_identifier(parser, "expected function name")?;

    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseParen {
        parameters.push(parse_identifier(parser, "expected parameter name")?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected_token_detailed("expected `,` or `)` in parameter list"));
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    parser.enter_function();
    let body = parse_block_stmt(parser);
    parser.exit_function();
    let body = body?;

    let (start, end) = parser.add_extra_range(&parameters);
    let header = parser.add_extra(&[start, end, body.0]);

    Ok(parser.add_node(Tag::FnDecl, keyword, name.0, header))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    if !parser.in_function() {
        return Err(parser.unexpected_token_detailed("return outside of a function"));
    }
    let keyword = parser.advance();

    let value = match parser.current_token_kind() {
        TokenKind::Semicolon | TokenKind::CloseCurly | TokenKind::EOF => NULL_NODE,
        _ => parse_expression(parser)?.0,
    };

    parser.expect_terminator()?;

    Ok(parser.add_node(Tag::Return, keyword, value, 0))
}
