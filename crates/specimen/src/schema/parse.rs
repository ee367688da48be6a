//! Type-expression parser.
//!
//! ```text
//! type     := ident ('<' type (',' type)* '>')? ('[]')*
//!           | '?' ('extends' type ('&' type)*)?
//! ```

use super::{ClassId, TypeDesc, TypeVar};
use crate::error::SchemaError;

pub(crate) struct Scope<'a> {
    pub owner: &'a ClassId,
    pub params: &'a [TypeVar],
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Lt,
    Gt,
    Comma,
    Brackets,
    Question,
    Amp,
}

pub(crate) fn parse_type(text: &str, scope: Option<&Scope<'_>>) -> Result<TypeDesc, SchemaError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        text,
        tokens,
        pos: 0,
        scope,
    };
    let desc = parser.parse_type()?;
    if parser.pos != parser.tokens.len() {
        return Err(SchemaError::syntax(text, "unexpected trailing input"));
    }
    Ok(desc)
}

fn tokenize(text: &str) -> Result<Vec<Token>, SchemaError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '<' | '>' | ',' | '?' | '&' => {
                chars.next();
                tokens.push(match c {
                    '<' => Token::Lt,
                    '>' => Token::Gt,
                    ',' => Token::Comma,
                    '?' => Token::Question,
                    _ => Token::Amp,
                });
            }
            '[' => {
                chars.next();
                match chars.next() {
                    Some((_, ']')) => tokens.push(Token::Brackets),
                    _ => return Err(SchemaError::syntax(text, format!("expected ']' after offset {}", offset))),
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || matches!(c, '_' | '.' | '$') {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(SchemaError::syntax(
                    text,
                    format!("unexpected character '{}' at offset {}", other, offset),
                ))
            }
        }
    }

    if tokens.is_empty() {
        return Err(SchemaError::syntax(text, "empty type expression"));
    }
    Ok(tokens)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    scope: Option<&'a Scope<'a>>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::syntax(self.text, message)
    }

    fn parse_type(&mut self) -> Result<TypeDesc, SchemaError> {
        match self.next() {
            Some(Token::Question) => self.parse_wildcard(),
            Some(Token::Ident(name)) if name != "extends" => {
                let mut desc = self.parse_named(name)?;
                while self.eat(&Token::Brackets) {
                    desc = TypeDesc::array(desc);
                }
                Ok(desc)
            }
            Some(other) => Err(self.error(format!("unexpected token {:?}", other))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_wildcard(&mut self) -> Result<TypeDesc, SchemaError> {
        if self.peek() != Some(&Token::Ident("extends".to_string())) {
            return Ok(TypeDesc::Wildcard { upper: Vec::new() });
        }
        self.pos += 1;
        let mut upper = vec![self.parse_type()?];
        while self.eat(&Token::Amp) {
            upper.push(self.parse_type()?);
        }
        Ok(TypeDesc::Wildcard { upper })
    }

    fn parse_named(&mut self, name: String) -> Result<TypeDesc, SchemaError> {
        if self.eat(&Token::Lt) {
            if self.scope_var(&name).is_some() {
                return Err(self.error(format!("type variable '{}' cannot take arguments", name)));
            }
            let mut args = vec![self.parse_type()?];
            while self.eat(&Token::Comma) {
                args.push(self.parse_type()?);
            }
            if !self.eat(&Token::Gt) {
                return Err(self.error("expected '>'"));
            }
            return Ok(TypeDesc::Parameterized {
                raw: ClassId::new(name),
                args,
            });
        }

        Ok(match self.scope_var(&name) {
            Some(var) => TypeDesc::Var(var),
            None => TypeDesc::Class(ClassId::new(name)),
        })
    }

    fn scope_var(&self, name: &str) -> Option<TypeVar> {
        let scope = self.scope?;
        scope
            .params
            .iter()
            .find(|var| var.name.as_ref() == name && &var.owner == scope.owner)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_generics() {
        let desc = parse_type("Map<Integer, List<Item<String>>>", None).unwrap();
        assert_eq!(
            desc,
            TypeDesc::parameterized(
                "Map",
                vec![
                    TypeDesc::class("Integer"),
                    TypeDesc::parameterized(
                        "List",
                        vec![TypeDesc::parameterized("Item", vec![TypeDesc::class("String")])]
                    ),
                ]
            )
        );
    }

    #[test]
    fn test_scope_turns_identifiers_into_variables() {
        let owner = ClassId::new("Pair");
        let params = vec![TypeVar::new("Pair", "L"), TypeVar::new("Pair", "R")];
        let scope = Scope {
            owner: &owner,
            params: &params,
        };
        let desc = parse_type("Map<L, R[]>", Some(&scope)).unwrap();
        assert_eq!(
            desc,
            TypeDesc::parameterized(
                "Map",
                vec![
                    TypeDesc::Var(params[0].clone()),
                    TypeDesc::array(TypeDesc::Var(params[1].clone())),
                ]
            )
        );
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(
            parse_type("List<?>", None).unwrap().args()[0],
            TypeDesc::Wildcard { upper: vec![] }
        );
        let bounded = parse_type("? extends Number & Comparable", None).unwrap();
        assert_eq!(bounded.to_string(), "? extends Number & Comparable");
    }

    #[test]
    fn test_arrays_of_arrays() {
        let desc = parse_type("int[][]", None).unwrap();
        assert_eq!(desc.to_string(), "int[][]");
        assert_eq!(desc.raw_class(), Some(ClassId::new("int[][]")));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "Map<String", "List<>", "Foo]", "Foo<Bar>>", "a b"] {
            assert!(parse_type(bad, None).is_err(), "expected '{}' to fail", bad);
        }
    }
}
