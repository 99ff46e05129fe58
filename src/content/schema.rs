//! Schema-driven structured extraction
//!
//! A schema is compiled once per request; compilation fails on any selector
//! that does not parse, so a bad schema is caught before the page is fetched.

use crate::content::dom::collapsed_text;
use crate::request::{ExtractionSchema, FieldKind, SchemaField};
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid selector '{selector}' in field '{field}': {reason}")]
    Selector {
        field: String,
        selector: String,
        reason: String,
    },

    #[error("attribute field '{0}' does not name an attribute")]
    MissingAttribute(String),
}

#[derive(Debug)]
struct CompiledField {
    name: String,
    selector: Option<Selector>,
    kind: FieldKind,
    attribute: Option<String>,
    fields: Vec<CompiledField>,
    default: Option<Value>,
}

/// A compiled extraction schema
#[derive(Debug)]
pub struct SchemaExtractor {
    name: String,
    base: Selector,
    fields: Vec<CompiledField>,
}

impl SchemaExtractor {
    pub fn compile(schema: &ExtractionSchema) -> Result<Self, SchemaError> {
        let base = compile_selector(&schema.name, &schema.base_selector)?;
        let fields = schema
            .fields
            .iter()
            .map(compile_field)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: schema.name.clone(),
            base,
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// One object per base match, or None when the base selector matches nothing
    pub fn extract(&self, document: &Html) -> Option<Value> {
        let items: Vec<Value> = document
            .select(&self.base)
            .map(|element| Value::Object(extract_fields(element, &self.fields)))
            .collect();

        tracing::debug!("Schema '{}' matched {} items", self.name, items.len());

        if items.is_empty() {
            None
        } else {
            Some(Value::Array(items))
        }
    }
}

fn compile_selector(field: &str, selector: &str) -> Result<Selector, SchemaError> {
    Selector::parse(selector).map_err(|e| SchemaError::Selector {
        field: field.to_string(),
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn compile_field(field: &SchemaField) -> Result<CompiledField, SchemaError> {
    let selector = field
        .selector
        .as_deref()
        .map(|s| compile_selector(&field.name, s))
        .transpose()?;

    if field.kind == FieldKind::Attribute && field.attribute.as_deref().map_or(true, str::is_empty)
    {
        return Err(SchemaError::MissingAttribute(field.name.clone()));
    }

    Ok(CompiledField {
        name: field.name.clone(),
        selector,
        kind: field.kind,
        attribute: field.attribute.clone(),
        fields: field
            .fields
            .iter()
            .map(compile_field)
            .collect::<Result<Vec<_>, _>>()?,
        default: field.default.clone(),
    })
}

fn extract_fields(scope: ElementRef<'_>, fields: &[CompiledField]) -> Map<String, Value> {
    let mut object = Map::new();
    for field in fields {
        match field_value(scope, field).or_else(|| field.default.clone()) {
            Some(value) => {
                object.insert(field.name.clone(), value);
            }
            None => tracing::trace!("Field '{}' resolved to nothing", field.name),
        }
    }
    object
}

fn field_value<'a>(scope: ElementRef<'a>, field: &'a CompiledField) -> Option<Value> {
    let mut targets: Box<dyn Iterator<Item = ElementRef<'a>> + 'a> = match &field.selector {
        Some(selector) => Box::new(scope.select(selector)),
        None => Box::new(std::iter::once(scope)),
    };

    match field.kind {
        FieldKind::Text => targets.next().map(|el| Value::String(collapsed_text(el))),
        FieldKind::Html => targets.next().map(|el| Value::String(el.inner_html())),
        FieldKind::Attribute => {
            let attribute = field.attribute.as_deref()?;
            targets
                .find_map(|el| el.value().attr(attribute))
                .map(|v| Value::String(v.trim().to_string()))
        }
        FieldKind::Nested => targets
            .next()
            .map(|el| Value::Object(extract_fields(el, &field.fields))),
        FieldKind::List => {
            let items: Vec<Value> = targets
                .map(|el| {
                    if field.fields.is_empty() {
                        Value::String(collapsed_text(el))
                    } else {
                        Value::Object(extract_fields(el, &field.fields))
                    }
                })
                .collect();
            if items.is_empty() {
                None
            } else {
                Some(Value::Array(items))
            }
        }
    }
}
