// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Symbolic type references
//!
//! A [`TypeReference`] names a type the way source code does: an optional outer
//! reference (namespace or enclosing type), a simple name and generic arguments.
//! `System.Collections.Generic.Dictionary<FString, int32>` is a chain of three
//! outer references around `Dictionary` with two arguments.

use once_cell::sync::OnceCell;
use std::fmt;

use crate::error::{FormulaError, Result};

#[derive(Debug, Clone, Default)]
pub struct TypeReference {
    name: String,
    expression: Option<Box<TypeReference>>,
    type_arguments: Vec<TypeReference>,
    full_name: OnceCell<String>,
    full_name_with_generics: OnceCell<String>,
}

impl TypeReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Reference to `name` nested inside `outer`
    pub fn nested(outer: TypeReference, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: Some(Box::new(outer)),
            ..Default::default()
        }
    }

    pub fn with_arguments(mut self, type_arguments: Vec<TypeReference>) -> Self {
        self.type_arguments = type_arguments;
        self.full_name = OnceCell::new();
        self.full_name_with_generics = OnceCell::new();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> Option<&TypeReference> {
        self.expression.as_deref()
    }

    pub fn type_arguments(&self) -> &[TypeReference] {
        &self.type_arguments
    }

    pub fn is_generic(&self) -> bool {
        !self.type_arguments.is_empty()
    }

    /// Dotted name, optionally followed by rendered generic arguments
    ///
    /// Both renderings are computed once per reference.
    pub fn full_name(&self, write_generics: bool) -> &str {
        let cell = if write_generics {
            &self.full_name_with_generics
        } else {
            &self.full_name
        };
        cell.get_or_init(|| self.render(write_generics))
    }

    fn render(&self, write_generics: bool) -> String {
        let mut out = String::new();
        if let Some(outer) = &self.expression {
            out.push_str(outer.full_name(write_generics));
            out.push('.');
        }
        out.push_str(&self.name);
        if write_generics && !self.type_arguments.is_empty() {
            out.push('<');
            for (i, argument) in self.type_arguments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(argument.full_name(true));
            }
            out.push('>');
        }
        out
    }

    /// Parse a textual reference such as `System.Array<int32>` or `TMap<FString, int32>`
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser {
            input: text.as_bytes(),
            text,
            pos: 0,
        };
        let reference = parser.reference()?;
        parser.skip_whitespace();
        if parser.pos != parser.input.len() {
            return Err(parser.error());
        }
        Ok(reference)
    }
}

impl PartialEq for TypeReference {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.expression == other.expression
            && self.type_arguments == other.type_arguments
    }
}

impl Eq for TypeReference {}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name(true))
    }
}

struct Parser<'a> {
    input: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn reference(&mut self) -> Result<TypeReference> {
        let mut current: Option<TypeReference> = None;
        loop {
            let name = self.identifier()?;
            let mut reference = match current.take() {
                Some(outer) => TypeReference::nested(outer, name),
                None => TypeReference::new(name),
            };
            self.skip_whitespace();
            if self.peek() == Some(b'<') {
                self.pos += 1;
                let mut arguments = Vec::new();
                loop {
                    self.skip_whitespace();
                    arguments.push(self.reference()?);
                    self.skip_whitespace();
                    match self.peek() {
                        Some(b',') => self.pos += 1,
                        Some(b'>') => {
                            self.pos += 1;
                            break;
                        }
                        _ => return Err(self.error()),
                    }
                }
                reference = reference.with_arguments(arguments);
                self.skip_whitespace();
            }
            if self.peek() == Some(b'.') {
                self.pos += 1;
                current = Some(reference);
                continue;
            }
            return Ok(reference);
        }
    }

    fn identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'@' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error());
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self) -> FormulaError {
        log::debug!("malformed type reference '{}' at {}", self.text, self.pos);
        FormulaError::unresolved_type(self.text)
    }
}
