use std::fs::File;
use std::io::Read;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::rules::{KeySource, Rule, Ruleset, Section};
use crate::template::{FieldTemplate, TemplateError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("open config {path:?}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config decode: {0}")]
    Decode(#[from] serde_yaml::Error),
    #[error("config: section {section:?}, rule {index}: none of re, key or account set")]
    EmptyRule { section: String, index: usize },
    #[error("config: section {section:?}, rule {index}: bad regex {pattern:?}: {source}")]
    BadRegex {
        section: String,
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("config: section {section:?}, rule {index}: {source}")]
    BadTemplate {
        section: String,
        index: usize,
        #[source]
        source: TemplateError,
    },
}

/// Raw report configuration as deserialized from YAML. Compiling it
/// validates every rule and yields the [`Ruleset`] used for matching.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    /// External template path accepted for compatibility with older
    /// configs; the built-in renderer ignores it.
    #[serde(default)]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub skip: bool,
    #[serde(default, rename = "skipPerMonth")]
    pub skip_per_month: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub re: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub vs: String,
    #[serde(default, rename = "if")]
    pub cond: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Ruleset, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Ruleset, ConfigError> {
        let config: Config = serde_yaml::from_reader(input)?;
        config.compile()
    }

    /// Validates and compiles every section, preserving declaration order.
    pub fn compile(self) -> Result<Ruleset, ConfigError> {
        if let Some(template) = &self.template {
            tracing::warn!(template, "'template' is ignored, output is built in");
        }
        let mut sections = Vec::with_capacity(self.sections.len());
        for section in self.sections {
            let mut rules = Vec::with_capacity(section.rules.len());
            for (index, rule) in section.rules.iter().enumerate() {
                rules.push(compile_rule(&section.name, index, rule)?);
            }
            sections.push(Section {
                name: section.name,
                order: section.order,
                skip_from_sum: section.skip,
                skip_per_month: section.skip_per_month,
                rules,
            });
        }
        Ok(Ruleset::new(sections))
    }
}

fn compile_rule(section: &str, index: usize, raw: &RuleConfig) -> Result<Rule, ConfigError> {
    if raw.re.is_empty() && raw.key.is_empty() && raw.account.is_empty() {
        return Err(ConfigError::EmptyRule {
            section: section.to_string(),
            index,
        });
    }

    let regex = if raw.re.is_empty() {
        None
    } else {
        Some(
            Regex::new(&raw.re).map_err(|source| ConfigError::BadRegex {
                section: section.to_string(),
                index,
                pattern: raw.re.clone(),
                source,
            })?,
        )
    };

    Ok(Rule {
        key: compile_key(section, index, &raw.key)?,
        regex,
        account: non_empty(&raw.account),
        vs: non_empty(&raw.vs),
        cond: compile_cond(section, index, &raw.cond)?,
    })
}

/// A key with placeholders compiles to a template; static text stays a
/// literal classification key.
fn compile_key(section: &str, index: usize, raw: &str) -> Result<KeySource, ConfigError> {
    if raw.is_empty() {
        return Ok(KeySource::None);
    }
    let tmpl = compile_template(section, index, raw)?;
    if tmpl.has_fields() {
        Ok(KeySource::Template(tmpl))
    } else {
        Ok(KeySource::Literal(raw.to_string()))
    }
}

/// A static `if` cannot reject anything, so only templated conditions
/// survive compilation.
fn compile_cond(
    section: &str,
    index: usize,
    raw: &str,
) -> Result<Option<FieldTemplate>, ConfigError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let tmpl = compile_template(section, index, raw)?;
    Ok(tmpl.has_fields().then_some(tmpl))
}

fn compile_template(section: &str, index: usize, raw: &str) -> Result<FieldTemplate, ConfigError> {
    FieldTemplate::compile(raw).map_err(|source| ConfigError::BadTemplate {
        section: section.to_string(),
        index,
        source,
    })
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
sections:
  - name: Groceries
    order: 1
    rules:
      - re: \"LIDL|BILLA\"
        key: Supermarket
  - name: Transfers
    order: 2
    skip: true
    skipPerMonth: true
    rules:
      - account: \"123/0800\"
        vs: \"42\"
";

    #[test]
    fn compiles_sections_in_declaration_order() {
        let ruleset = Config::from_reader(SAMPLE.as_bytes()).unwrap();
        let names: Vec<_> = ruleset.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "Transfers"]);
    }

    #[test]
    fn section_attributes_survive_compilation() {
        let ruleset = Config::from_reader(SAMPLE.as_bytes()).unwrap();
        let transfers = ruleset.section("Transfers").unwrap();
        assert_eq!(transfers.order, 2);
        assert!(transfers.skip_from_sum);
        assert!(transfers.skip_per_month);

        let groceries = ruleset.section("Groceries").unwrap();
        assert!(!groceries.skip_from_sum);
        assert!(!groceries.skip_per_month);
    }

    #[test]
    fn rule_with_nothing_set_is_rejected() {
        let yaml = "sections:\n  - name: Broken\n    rules:\n      - vs: \"1\"\n";
        let err = Config::from_reader(yaml.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyRule { ref section, index: 0 } if section == "Broken"
        ));
    }

    #[test]
    fn invalid_regex_is_rejected_at_load() {
        let yaml = "sections:\n  - name: Broken\n    rules:\n      - re: \"(\"\n";
        let err = Config::from_reader(yaml.as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::BadRegex { index: 0, .. }));
    }

    #[test]
    fn unknown_template_field_is_rejected_at_load() {
        let yaml = "sections:\n  - name: Broken\n    rules:\n      - key: \"{{nope}}\"\n";
        let err = Config::from_reader(yaml.as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::BadTemplate { .. }));
    }

    #[test]
    fn static_key_compiles_to_literal() {
        let yaml = "sections:\n  - name: S\n    rules:\n      - key: \"Fixed\"\n";
        let ruleset = Config::from_reader(yaml.as_bytes()).unwrap();
        assert_eq!(ruleset.sections()[0].rules.len(), 1);
    }

    #[test]
    fn template_key_is_accepted_and_ignored() {
        let yaml = "\
template: ~/report.tmpl
sections:
  - name: S
    rules:
      - re: \".\"
";
        let ruleset = Config::from_reader(yaml.as_bytes()).unwrap();
        assert_eq!(ruleset.sections().len(), 1);
    }

    #[test]
    fn unknown_yaml_keys_are_rejected() {
        let yaml = "sections:\n  - name: S\n    colour: red\n";
        assert!(matches!(
            Config::from_reader(yaml.as_bytes()),
            Err(ConfigError::Decode(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let ruleset = Config::load(file.path()).unwrap();
        assert_eq!(ruleset.sections().len(), 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load(Path::new("/nonexistent/.outlay.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/.outlay.yaml"));
    }
}
