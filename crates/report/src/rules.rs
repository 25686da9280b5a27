use std::collections::HashMap;

use outlay_core::Record;
use regex::Regex;

use crate::template::FieldTemplate;

/// How a rule produces a classification key once its gates pass.
#[derive(Debug, Clone, Default)]
pub(crate) enum KeySource {
    #[default]
    None,
    Literal(String),
    Template(FieldTemplate),
}

/// One compiled matcher. Construction happens in [`crate::config`]; at
/// match time a rule can no longer fail, only match or not.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub(crate) key: KeySource,
    pub(crate) regex: Option<Regex>,
    pub(crate) account: Option<String>,
    pub(crate) vs: Option<String>,
    pub(crate) cond: Option<FieldTemplate>,
}

enum Checked {
    /// The `if` gate failed; the rule does not match.
    Rejected,
    Key(String),
    /// No templated or literal key; fall back to regex capture or the
    /// synthesized account key.
    Fallthrough,
}

impl Rule {
    /// Derives the classification key, or `None` when the rule does not
    /// match the record.
    pub fn extract_key(&self, rec: &Record) -> Option<String> {
        if !self.account_matches(rec) {
            return None;
        }

        if let Some(re) = &self.regex {
            return self.extract_key_regex(re, rec);
        }

        match self.templated_checks(rec) {
            Checked::Rejected => None,
            Checked::Key(key) => Some(key),
            Checked::Fallthrough => self.account_key(rec),
        }
    }

    /// Account gate: a declared account must equal the record's account id,
    /// and a declared VS additionally must equal the record's VS.
    fn account_matches(&self, rec: &Record) -> bool {
        let Some(account) = &self.account else {
            return true;
        };
        if account != rec.account_id() {
            return false;
        }
        match &self.vs {
            Some(vs) => vs == rec.vs(),
            None => true,
        }
    }

    fn extract_key_regex(&self, re: &Regex, rec: &Record) -> Option<String> {
        let caps = re.captures(rec.note())?;

        match self.templated_checks(rec) {
            Checked::Rejected => return None,
            Checked::Key(key) => return Some(key),
            Checked::Fallthrough => {}
        }

        // A declared capture group names the key, even when it matched
        // nothing (which then means: no match, keep scanning).
        if caps.len() > 1 {
            let group = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            return non_empty(group.to_string());
        }
        if self.account.is_some() {
            return self.account_key(rec);
        }
        non_empty(rec.note().to_string())
    }

    /// Evaluates the `if` gate, then the templated/literal key. A rendered
    /// `if` is falsy when it trims to empty.
    fn templated_checks(&self, rec: &Record) -> Checked {
        if let Some(cond) = &self.cond {
            if cond.render(rec).is_empty() {
                return Checked::Rejected;
            }
        }

        let key = match &self.key {
            KeySource::None => String::new(),
            KeySource::Literal(key) => key.clone(),
            KeySource::Template(tmpl) => tmpl.render(rec),
        };
        if key.is_empty() {
            Checked::Fallthrough
        } else {
            Checked::Key(key)
        }
    }

    /// Synthesizes `"<account>[, VS: <vs>][, <note>]"` for account rules.
    fn account_key(&self, rec: &Record) -> Option<String> {
        let account = self.account.as_ref()?;
        let mut key = account.clone();
        if !rec.vs().is_empty() {
            key.push_str(", VS: ");
            key.push_str(rec.vs());
        }
        if !rec.note().is_empty() {
            key.push_str(", ");
            key.push_str(rec.note());
        }
        Some(key)
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// A section's compiled matching rules plus its reporting attributes.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub order: i32,
    pub skip_from_sum: bool,
    pub skip_per_month: bool,
    pub(crate) rules: Vec<Rule>,
}

/// All sections in declaration order with an O(1) name index. Classification
/// is a strict first-match linear scan; declaration order is semantic and
/// must never be replaced by a best-match search.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

impl Ruleset {
    pub(crate) fn new(sections: Vec<Section>) -> Ruleset {
        let index = sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();
        Ruleset { sections, index }
    }

    /// First rule across sections, in declaration order, that matches the
    /// record. Returns the owning section and the derived key.
    pub fn find_section(&self, rec: &Record) -> Option<(&Section, String)> {
        for section in &self.sections {
            for rule in &section.rules {
                if let Some(key) = rule.extract_key(rec) {
                    return Some((section, key));
                }
            }
        }
        None
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.index.get(name).map(|&i| &self.sections[i])
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}
