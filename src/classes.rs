//! Style class table – named declaration blocks with optional selector
//! variants.
//!
//! ```text
//! cell { padding: 1, 1, 1, 1; }
//! cell:first { padding: 1, 1, 1, 1; background-color: #eeeeee; }
//! ```
//!
//! A selector variant replaces the base block while its selector is active;
//! it is never merged with it.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::StyleError;
use crate::style::{Snapshot, StyleSet};

#[derive(Debug, Clone, PartialEq)]
pub struct StyleClass {
    pub name: String,
    pub base: StyleSet,
    pub selectors: BTreeMap<String, StyleSet>,
}

impl StyleClass {
    /// The declarations in effect for `selector`.
    pub fn styles_for(&self, selector: Option<&str>) -> &StyleSet {
        selector
            .and_then(|sel| self.selectors.get(sel))
            .unwrap_or(&self.base)
    }
}

/// All classes of a document, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassTable {
    classes: Vec<StyleClass>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a sequence of `name { decl; ... }` blocks.
    pub fn parse(source: &str) -> Result<Self, StyleError> {
        let normalized: String = source
            .chars()
            .map(|c| if matches!(c, '\r' | '\n' | '\t') { ' ' } else { c })
            .collect();

        let mut table = Self::new();
        let mut rest = normalized.as_str();
        loop {
            let remaining = rest.trim();
            if remaining.is_empty() {
                break;
            }
            let open = rest
                .find('{')
                .ok_or_else(|| StyleError::TrailingContent(remaining.to_string()))?;
            let name = rest[..open].trim();
            if name.is_empty() {
                return Err(StyleError::MissingClassName);
            }
            let body_start = open + 1;
            let close = rest[body_start..]
                .find('}')
                .map(|i| body_start + i)
                .ok_or_else(|| StyleError::UnmatchedBrace(name.to_string()))?;
            let body = &rest[body_start..close];
            if body.contains('{') {
                return Err(StyleError::UnmatchedBrace(name.to_string()));
            }

            let styles = StyleSet::parse(body)?;
            table.declare(name, styles)?;
            rest = &rest[close + 1..];
        }
        Ok(table)
    }

    fn declare(&mut self, name: &str, styles: StyleSet) -> Result<(), StyleError> {
        match name.split_once(':') {
            Some((base, selector)) => {
                let (base, selector) = (base.trim(), selector.trim());
                if base.is_empty() {
                    return Err(StyleError::MissingClassName);
                }
                let class = self
                    .classes
                    .iter_mut()
                    .find(|c| c.name == base)
                    .ok_or_else(|| StyleError::MissingBaseClass {
                        class: base.to_string(),
                        selector: selector.to_string(),
                    })?;
                log::debug!("class '{base}': selector '{selector}' added");
                class.selectors.insert(selector.to_string(), styles);
            }
            None => match self.classes.iter_mut().find(|c| c.name == name) {
                Some(existing) => existing.base = styles,
                None => self.classes.push(StyleClass {
                    name: name.to_string(),
                    base: styles,
                    selectors: BTreeMap::new(),
                }),
            },
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StyleClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Fold the named classes, in the given order, into `snapshot`.
    /// Names without a matching class are skipped.
    pub fn apply_to<S: AsRef<str>>(
        &self,
        selector: Option<&str>,
        names: &[S],
        snapshot: &mut Snapshot,
    ) {
        for name in names {
            let name = name.as_ref();
            match self.get(name) {
                Some(class) => class.styles_for(selector).apply_to(snapshot),
                None => log::debug!("style class '{name}' not found, skipped"),
            }
        }
    }

    /// Like [`ClassTable::apply_to`] but returns a new snapshot.
    pub fn apply<S: AsRef<str>>(
        &self,
        selector: Option<&str>,
        names: &[S],
        base: &Snapshot,
    ) -> Snapshot {
        let mut resolved = base.clone();
        self.apply_to(selector, names, &mut resolved);
        resolved
    }
}

impl fmt::Display for ClassTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in &self.classes {
            writeln!(f, "{} {{ {} }}", class.name, class.base)?;
            for (selector, styles) in &class.selectors {
                writeln!(f, "{}:{} {{ {} }}", class.name, selector, styles)?;
            }
        }
        Ok(())
    }
}
