use winnow::Parser;

use super::error::ParseError;
use super::grammar::{self, Line};

/// A parsed key file: named groups of `key=value` entries, kept in file order.
///
/// Values are stored raw (unescaped) and converted on access, so a malformed
/// value only fails when the key is actually read.
#[derive(Debug, Clone, Default)]
pub struct KeyFile {
    groups: Vec<Group>,
}

#[derive(Debug, Clone)]
struct Group {
    name: String,
    entries: Vec<(String, String)>,
}

impl Group {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => value.clone_into(&mut entry.1),
            None => self.entries.push((key.to_owned(), value.to_owned())),
        }
    }
}

impl KeyFile {
    pub(crate) fn from_lines(input: &str) -> Result<Self, ParseError> {
        let mut file = KeyFile::default();
        let mut current: Option<usize> = None;

        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = grammar::line.parse(raw).map_err(|e| {
                ParseError::at_line(line_no, format!("{} in '{}'", e.inner(), raw.trim()))
            })?;

            match line {
                Line::Blank | Line::Comment => {}
                Line::Group(name) => {
                    current = Some(file.group_index(name).unwrap_or_else(|| {
                        file.groups.push(Group {
                            name: name.to_owned(),
                            entries: Vec::new(),
                        });
                        file.groups.len() - 1
                    }));
                }
                Line::Entry { key, value } => {
                    let Some(group) = current else {
                        return Err(ParseError::at_line(
                            line_no,
                            format!("key '{key}' appears before the first group"),
                        ));
                    };
                    file.groups[group].set(key, value);
                }
            }
        }

        Ok(file)
    }

    fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    fn raw(&self, group: &str, key: &str) -> Option<&str> {
        self.group_index(group)
            .and_then(|idx| self.groups[idx].get(key))
    }

    /// Group names in the order they first appear.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.group_index(group).is_some()
    }

    #[must_use]
    pub fn has_key(&self, group: &str, key: &str) -> bool {
        self.raw(group, key).is_some()
    }

    /// Read an unescaped string value. `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the value contains an invalid escape sequence.
    pub fn string(&self, group: &str, key: &str) -> Result<Option<String>, ParseError> {
        self.raw(group, key)
            .map(|raw| {
                grammar::string_value
                    .parse(raw)
                    .map_err(|e| value_error(group, key, &e.inner().to_string()))
            })
            .transpose()
    }

    /// Read a `;`-separated list. `Ok(None)` when the key is absent; an empty
    /// value is an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if an element contains an invalid escape sequence.
    pub fn string_list(&self, group: &str, key: &str) -> Result<Option<Vec<String>>, ParseError> {
        self.raw(group, key)
            .map(|raw| {
                grammar::string_list
                    .parse(raw)
                    .map_err(|e| value_error(group, key, &e.inner().to_string()))
            })
            .transpose()
    }

    /// Read a boolean literal (`true`/`1`, `false`/`0`).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the value is not a boolean literal.
    pub fn boolean(&self, group: &str, key: &str) -> Result<Option<bool>, ParseError> {
        self.raw(group, key)
            .map(|raw| match raw {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(value_error(
                    group,
                    key,
                    &format!("'{other}' cannot be interpreted as a boolean"),
                )),
            })
            .transpose()
    }
}

fn value_error(group: &str, key: &str, reason: &str) -> ParseError {
    ParseError::new(format!("invalid value for key '{key}' in group '{group}': {reason}"))
}
