//! The parsed policy document.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::directive::{Directive, DirectiveBody, SourceListKind};
use crate::serialize;
use crate::source::Source;

/// A parsed `Content-Security-Policy` header value.
///
/// Every directive occurrence lives in exactly one of the three sequences:
/// the first occurrence of a recognized name in `directives`, the first
/// occurrence of an unrecognized name in `other_directives`, and every later
/// occurrence of an already seen name in `ineffective_directives`.
///
/// `raw` caches the header text the document was parsed from. The mutating
/// helpers clear it; code that edits the public fields directly should do
/// the same.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct ContentSecurityPolicy {
    pub directives: Vec<Directive>,
    pub other_directives: Vec<Directive>,
    pub ineffective_directives: Vec<Directive>,
    pub raw: Option<String>,
}

impl PartialEq for ContentSecurityPolicy {
    fn eq(&self, other: &Self) -> bool {
        self.directives == other.directives
            && self.other_directives == other.other_directives
            && self.ineffective_directives == other.ineffective_directives
    }
}

impl ContentSecurityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the document holds no effective directive at all
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.other_directives.is_empty()
    }

    /// Effective directives in render order
    pub fn effective_directives(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter().chain(&self.other_directives)
    }

    /// Case-insensitive lookup across `directives`, then `other_directives`.
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        let name = name.to_ascii_lowercase();
        self.effective_directives()
            .find(|directive| directive.name == name)
    }

    pub fn directive_mut(&mut self, name: &str) -> Option<&mut Directive> {
        let name = name.to_ascii_lowercase();
        self.directives
            .iter_mut()
            .chain(self.other_directives.iter_mut())
            .find(|directive| directive.name == name)
    }

    /// Sources of the effective directive of `kind`, if present
    pub fn sources(&self, kind: SourceListKind) -> Option<&[Source]> {
        self.directive(kind.name()).and_then(Directive::sources)
    }

    /// Append a directive, classifying it the way the parser would.
    pub fn push_directive(&mut self, directive: Directive) {
        let seen: HashSet<&str> = self
            .effective_directives()
            .map(|existing| existing.name.as_str())
            .collect();

        if seen.contains(directive.name.as_str()) {
            log::debug!("Directive {} already present, stored as ineffective", directive.name);
            self.ineffective_directives.push(directive);
        } else if directive.is_other() {
            self.other_directives.push(directive);
        } else {
            self.directives.push(directive);
        }
        self.raw = None;
    }

    /// Merge `sources` into the effective directive of `kind`.
    ///
    /// Sources already present (by semantic equality) are skipped. When the
    /// directive is absent it is synthesised at the end of `directives`. A
    /// `'none'` entry is dropped once real sources are merged in, since the
    /// grammar does not allow it next to other sources.
    pub fn merge_sources<I>(&mut self, kind: SourceListKind, sources: I)
    where
        I: IntoIterator<Item = Source>,
    {
        let incoming: Vec<Source> = sources.into_iter().filter(|source| !source.is_none()).collect();
        self.raw = None;

        let existing = self
            .directives
            .iter_mut()
            .find(|directive| directive.name == kind.name());

        let directive = match existing {
            Some(directive) => directive,
            None => {
                log::debug!("Synthesising {} for merged sources", kind.name());
                self.directives.push(Directive::source_list(kind, incoming));
                return;
            }
        };

        let DirectiveBody::SourceList { sources: current, .. } = &mut directive.body else {
            return;
        };

        if !incoming.is_empty() {
            current.retain(|source| !source.is_none());
        }
        for source in incoming {
            if !current.contains(&source) {
                current.push(source);
            }
        }
        directive.raw_value = directive.rendered_value();
    }

    /// Canonical header text, ignoring any cached raw text
    pub fn render(&self) -> String {
        serialize::render(self)
    }
}
