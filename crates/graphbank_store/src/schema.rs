//! Schema declaration parsing and store-side schema state.

use crate::error::{StoreError, StoreResult};
use std::collections::HashMap;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer.
    Int,
}

impl FieldType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(FieldType::Text),
            "int" => Some(FieldType::Int),
            _ => None,
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub ty: FieldType,
    /// Whether a term index is maintained for the field.
    pub term_indexed: bool,
}

/// One declared record type grouping fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// Type name.
    pub name: String,
    /// Names of the grouped fields.
    pub fields: Vec<String>,
}

/// Parsed schema state, installed process-wide via alter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSchema {
    fields: HashMap<String, FieldDecl>,
    types: HashMap<String, TypeDecl>,
}

impl StoreSchema {
    /// Parses a schema declaration.
    ///
    /// Accepted lines are field declarations
    /// (`name: string @index(term) .`) and type blocks
    /// (`type user { ... }`). Anything else rejects the whole text.
    pub fn parse(text: &str) -> StoreResult<Self> {
        let mut schema = StoreSchema::default();
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        while let Some(line) = lines.next() {
            if let Some(rest) = line.strip_prefix("type ") {
                let name = rest
                    .strip_suffix('{')
                    .map(str::trim)
                    .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_alphanumeric() || c == '_'))
                    .ok_or_else(|| StoreError::schema(format!("bad type declaration: {line}")))?;

                let mut fields = Vec::new();
                loop {
                    let field = lines
                        .next()
                        .ok_or_else(|| StoreError::schema(format!("unterminated type block: {name}")))?;
                    if field == "}" {
                        break;
                    }
                    fields.push(field.to_string());
                }

                schema.types.insert(
                    name.to_string(),
                    TypeDecl {
                        name: name.to_string(),
                        fields,
                    },
                );
            } else {
                schema.add_field(Self::parse_field(line)?);
            }
        }

        // Every field grouped by a type must itself be declared.
        for decl in schema.types.values() {
            for field in &decl.fields {
                if !schema.fields.contains_key(field) {
                    return Err(StoreError::schema(format!(
                        "type {} references undeclared field {field}",
                        decl.name
                    )));
                }
            }
        }

        Ok(schema)
    }

    fn parse_field(line: &str) -> StoreResult<FieldDecl> {
        let body = line
            .strip_suffix('.')
            .ok_or_else(|| StoreError::schema(format!("field declaration must end with '.': {line}")))?
            .trim();

        let (name, rest) = body
            .split_once(':')
            .ok_or_else(|| StoreError::schema(format!("bad field declaration: {line}")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::schema(format!("missing field name: {line}")));
        }

        let mut parts = rest.split_whitespace();
        let ty = parts
            .next()
            .and_then(FieldType::parse)
            .ok_or_else(|| StoreError::schema(format!("unknown field type in: {line}")))?;

        let mut term_indexed = false;
        for directive in parts {
            match directive {
                "@index(term)" => term_indexed = true,
                other => {
                    return Err(StoreError::schema(format!("unknown directive {other} in: {line}")))
                }
            }
        }

        Ok(FieldDecl {
            name: name.to_string(),
            ty,
            term_indexed,
        })
    }

    fn add_field(&mut self, decl: FieldDecl) {
        self.fields.insert(decl.name.clone(), decl);
    }

    /// Looks up a field declaration.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.get(name)
    }

    /// Looks up a type declaration.
    #[must_use]
    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    /// Returns true if the field exists and is term-indexed.
    #[must_use]
    pub fn is_term_indexed(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|f| f.term_indexed)
    }
}
