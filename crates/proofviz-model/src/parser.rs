use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::lexer::{Lexer, Token, TokenKind};
use crate::model::{DependencyEmbedding, Document, TacticFlowCatalog};
use crate::{LoadError, ParseError};

const BINDING_KEYWORDS: [&str; 3] = ["const", "let", "var"];
const MAX_DEPTH: usize = 128;

// Binding names serde also accepts for another body key.
const FIELD_ALIASES: [(&str, &str); 1] = [("tacticFlowColors", "colors")];

/// JSON or object-literal source. The first object binding is the body; later
/// bindings are added to it under their own names unless already present.
pub fn parse_literal(input: &str) -> Result<Value, ParseError> {
    let parser = Parser::new(input)?;
    parser.parse_document()
}

pub fn parse_catalog(input: &str) -> Result<TacticFlowCatalog, LoadError> {
    let catalog: TacticFlowCatalog = decode(input)?;
    catalog.warn_unrecognized();
    Ok(catalog)
}

pub fn parse_embedding(input: &str) -> Result<DependencyEmbedding, LoadError> {
    let embedding: DependencyEmbedding = decode(input)?;
    embedding.warn_unrecognized();
    Ok(embedding)
}

/// Loads either dataset, telling them apart by their top-level sequence.
pub fn parse_document(input: &str) -> Result<Document, LoadError> {
    let value = parse_literal(input)?;
    let is_catalog = value.get("theorems").is_some();
    let is_embedding = value.get("items").is_some();
    match (is_catalog, is_embedding) {
        (true, false) => {
            let catalog: TacticFlowCatalog = serde_json::from_value(value)?;
            catalog.warn_unrecognized();
            Ok(Document::Catalog(catalog))
        }
        (false, true) => {
            let embedding: DependencyEmbedding = serde_json::from_value(value)?;
            embedding.warn_unrecognized();
            Ok(Document::Embedding(embedding))
        }
        (true, true) => Err(LoadError::AmbiguousDocument),
        (false, false) => Err(LoadError::UnknownDocument),
    }
}

/// Canonical pretty JSON for any loaded document.
pub fn to_json<T: serde::Serialize>(document: &T) -> Result<String, LoadError> {
    Ok(serde_json::to_string_pretty(document)?)
}

fn decode<T: DeserializeOwned>(input: &str) -> Result<T, LoadError> {
    let value = parse_literal(input)?;
    Ok(serde_json::from_value(value)?)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let first = lexer.next_token()?;
        Ok(Self {
            lexer,
            current: first,
            depth: 0,
        })
    }

    fn parse_document(mut self) -> Result<Value, ParseError> {
        if !self.at_binding_keyword() {
            let value = self.parse_value()?;
            while self.current.kind == TokenKind::Semicolon {
                self.advance()?;
            }
            if self.current.kind != TokenKind::Eof {
                return Err(self.error_here("expected end of document"));
            }
            return Ok(value);
        }

        let mut bindings = Vec::new();
        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Semicolon => self.advance()?,
                _ if self.at_binding_keyword() => bindings.push(self.parse_binding()?),
                _ => return Err(self.error_here("expected 'const', 'let' or 'var' binding")),
            }
        }
        merge_bindings(bindings).ok_or_else(|| self.error_here("expected an object binding"))
    }

    fn parse_binding(&mut self) -> Result<(String, Value), ParseError> {
        self.advance()?;
        let name = match self.current.kind.clone() {
            TokenKind::Ident(name) => {
                self.advance()?;
                name
            }
            _ => return Err(self.error_here("expected binding name")),
        };
        self.expect(TokenKind::Equals, "expected '=' after binding name")?;
        let value = self.parse_value()?;
        if self.current.kind == TokenKind::Semicolon {
            self.advance()?;
        }
        Ok((name, value))
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        match self.current.kind.clone() {
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::Str(text) => {
                self.advance()?;
                Ok(Value::String(text))
            }
            TokenKind::Number(number) => {
                self.advance()?;
                Ok(Value::Number(number))
            }
            TokenKind::Ident(word) => {
                let value = match word.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "null" => Value::Null,
                    _ => return Err(self.error_here(&format!("unexpected identifier '{word}'"))),
                };
                self.advance()?;
                Ok(value)
            }
            _ => Err(self.error_here("expected a value")),
        }
    }

    fn parse_object(&mut self) -> Result<Value, ParseError> {
        self.enter()?;
        let mut map = Map::new();
        while self.current.kind != TokenKind::RBrace {
            let key = match self.current.kind.clone() {
                TokenKind::Ident(key) | TokenKind::Str(key) => key,
                TokenKind::Number(number) => number.to_string(),
                _ => return Err(self.error_here("expected object key")),
            };
            self.advance()?;
            self.expect(TokenKind::Colon, "expected ':' after object key")?;
            let value = self.parse_value()?;
            map.insert(key, value);

            match self.current.kind {
                TokenKind::Comma => self.advance()?,
                TokenKind::RBrace => {}
                _ => return Err(self.error_here("expected ',' or '}' in object")),
            }
        }
        self.advance()?;
        self.depth -= 1;
        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        self.enter()?;
        let mut values = Vec::new();
        while self.current.kind != TokenKind::RBracket {
            values.push(self.parse_value()?);
            match self.current.kind {
                TokenKind::Comma => self.advance()?,
                TokenKind::RBracket => {}
                _ => return Err(self.error_here("expected ',' or ']' in array")),
            }
        }
        self.advance()?;
        self.depth -= 1;
        Ok(Value::Array(values))
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error_here("nesting too deep"));
        }
        self.depth += 1;
        self.advance()
    }

    fn at_binding_keyword(&self) -> bool {
        matches!(&self.current.kind, TokenKind::Ident(word) if BINDING_KEYWORDS.contains(&word.as_str()))
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), ParseError> {
        if self.current.kind != kind {
            return Err(self.error_here(message));
        }
        self.advance()
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn error_here(&self, message: &str) -> ParseError {
        ParseError::new(message.to_string(), self.current.start)
    }
}

fn merge_bindings(bindings: Vec<(String, Value)>) -> Option<Value> {
    let body_index = bindings.iter().position(|(_, value)| value.is_object())?;
    let mut bindings = bindings;
    let (_, body) = bindings.remove(body_index);
    let Value::Object(mut body) = body else {
        return None;
    };
    for (name, value) in bindings {
        if !has_field(&body, &name) {
            body.insert(name, value);
        }
    }
    Some(Value::Object(body))
}

fn has_field(body: &Map<String, Value>, name: &str) -> bool {
    body.contains_key(name)
        || FIELD_ALIASES.iter().any(|&(alias, field)| {
            (name == alias && body.contains_key(field)) || (name == field && body.contains_key(alias))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_json() {
        let value = parse_literal(r#"{"a": [1, 2.5, "x", true, null]}"#).unwrap();
        assert_eq!(value, json!({"a": [1, 2.5, "x", true, null]}));
    }

    #[test]
    fn accepts_trailing_commas_and_bare_keys() {
        let value = parse_literal("{ a: [1, 2,], b: { c: 'd', }, }").unwrap();
        assert_eq!(value, json!({"a": [1, 2], "b": {"c": "d"}}));
    }

    #[test]
    fn merges_later_bindings_into_body() {
        let source = "const data = { items: [] };\nconst familyColors = { 'Core': '#ef4444' };";
        let value = parse_literal(source).unwrap();
        assert_eq!(
            value,
            json!({"items": [], "familyColors": {"Core": "#ef4444"}})
        );
    }

    #[test]
    fn body_keys_win_over_bindings() {
        let source = "let doc = { colors: {} }; var colors = { goal: '#fff' };";
        let value = parse_literal(source).unwrap();
        assert_eq!(value, json!({"colors": {}}));
    }

    #[test]
    fn aliased_binding_does_not_shadow_body_field() {
        let source = "const data = { theorems: [], colors: { goal: '#fff' } };\nconst tacticFlowColors = { goal: '#000' };";
        let value = parse_literal(source).unwrap();
        assert_eq!(value, json!({"theorems": [], "colors": {"goal": "#fff"}}));
    }

    #[test]
    fn rejects_nesting_past_the_limit() {
        let err = parse_literal(&"[".repeat(100_000)).unwrap_err();
        assert_eq!(err.message, "nesting too deep");
        assert_eq!(err.offset, MAX_DEPTH);

        let nested = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_literal(&nested).is_ok());
    }

    #[test]
    fn errors_on_missing_colon() {
        let err = parse_literal("{ a 1 }").unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(err.message.contains("':'"));
    }

    #[test]
    fn errors_on_bindings_without_object() {
        assert!(parse_literal("const a = 1; const b = [2];").is_err());
    }

    #[test]
    fn errors_on_trailing_garbage() {
        assert!(parse_literal("{} {}").is_err());
    }
}
