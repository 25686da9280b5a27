use outlay_core::Record;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {template:?}: unknown field {field:?}")]
    UnknownField { template: String, field: String },
    #[error("template {template:?}: unterminated placeholder")]
    Unterminated { template: String },
}

/// Record fields a rule template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Note,
    Account,
    Vs,
    Amount,
    Date,
}

impl Field {
    fn parse(name: &str) -> Option<Field> {
        match name {
            "note" => Some(Field::Note),
            "account" => Some(Field::Account),
            "vs" => Some(Field::Vs),
            "amount" => Some(Field::Amount),
            "date" => Some(Field::Date),
            _ => None,
        }
    }

    fn resolve(self, rec: &Record) -> String {
        match self {
            Field::Note => rec.note().to_string(),
            Field::Account => rec.account_id().to_string(),
            Field::Vs => rec.vs().to_string(),
            Field::Amount => rec.money().to_string(),
            Field::Date => rec.date().format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Field(Field),
}

/// A compiled `{{field}}` substitution template. Deliberately not a general
/// template engine: rules only ever need record-field interpolation, which
/// keeps matching semantics total and testable. Unknown fields fail at
/// compile time, so rendering against a record cannot fail.
#[derive(Debug, Clone)]
pub struct FieldTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldTemplate {
    pub fn compile(raw: &str) -> Result<FieldTemplate, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = raw;
        while let Some(start) = rest.find("{{") {
            if !rest[..start].is_empty() {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                return Err(TemplateError::Unterminated {
                    template: raw.to_string(),
                });
            };
            let name = after[..end].trim();
            let field = Field::parse(name).ok_or_else(|| TemplateError::UnknownField {
                template: raw.to_string(),
                field: name.to_string(),
            })?;
            segments.push(Segment::Field(field));
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }
        Ok(FieldTemplate {
            raw: raw.to_string(),
            segments,
        })
    }

    /// True when at least one placeholder survived compilation. Static-only
    /// templates degrade to literals at the rule level.
    pub fn has_fields(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Field(_)))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Substitutes record fields and trims surrounding spaces. Only plain
    /// spaces: tabs and other whitespace are part of the key.
    pub fn render(&self, rec: &Record) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(&field.resolve(rec)),
            }
        }
        out.trim_matches(' ').to_string()
    }
}
