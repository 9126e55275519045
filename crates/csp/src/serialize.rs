//! Canonical serialization.
//!
//! Every type renders independently of the raw text it may have been parsed
//! from, so hand-built documents serialize the same way parsed ones do.

use std::fmt::{self, Write as _};

use crate::directive::{Directive, DirectiveBody, TrustedTypesExpression};
use crate::policy::ContentSecurityPolicy;
use crate::source::{
    HashSource, HostSource, KeywordSource, NonceSource, SchemeSource, Source, NONE_SOURCE,
};

impl fmt::Display for SchemeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)
    }
}

impl fmt::Display for HostSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{}://", scheme)?;
        }
        f.write_str(&self.host)?;
        if let Some(port) = &self.port {
            write!(f, ":{}", port)?;
        }
        if let Some(path) = &self.path {
            f.write_str(path)?;
        }
        Ok(())
    }
}

impl fmt::Display for KeywordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.keyword)
    }
}

impl fmt::Display for NonceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'nonce-{}'", self.nonce)
    }
}

impl fmt::Display for HashSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}-{}'", self.algorithm.as_str(), self.digest)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::None => f.write_str(NONE_SOURCE),
            Source::Scheme(source) => fmt::Display::fmt(source, f),
            Source::Host(source) => fmt::Display::fmt(source, f),
            Source::Keyword(source) => fmt::Display::fmt(source, f),
            Source::Nonce(source) => fmt::Display::fmt(source, f),
            Source::Hash(source) => fmt::Display::fmt(source, f),
        }
    }
}

impl fmt::Display for TrustedTypesExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustedTypesExpression::PolicyName(name) => f.write_str(name),
            TrustedTypesExpression::Keyword(keyword) => write!(f, "'{}'", keyword),
            TrustedTypesExpression::Wildcard => f.write_str("*"),
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Writing into a String cannot fail.
        let _ = write!(out, "{}", item);
    }
    out
}

impl Directive {
    /// Canonical rendering of the value, without the name.
    pub fn rendered_value(&self) -> String {
        match &self.body {
            DirectiveBody::SourceList { sources, .. } => join(sources),
            DirectiveBody::Sandbox { tokens } => join(tokens),
            DirectiveBody::ReportUri { uris } => join(uris),
            DirectiveBody::ReportTo { group } => group.clone(),
            DirectiveBody::RequireSriFor { resources } => join(resources),
            DirectiveBody::TrustedTypes { expressions } => join(expressions),
            DirectiveBody::RequireTrustedTypesFor { sink_groups } => {
                let quoted: Vec<_> = sink_groups.iter().map(|group| format!("'{}'", group)).collect();
                join(&quoted)
            }
            DirectiveBody::Webrtc { value } => value.as_str().to_string(),
            DirectiveBody::UpgradeInsecureRequests | DirectiveBody::BlockAllMixedContent => {
                String::new()
            }
            DirectiveBody::Other => self.raw_value.clone(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        let value = self.rendered_value();
        if !value.is_empty() {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}

/// Canonical form of a whole policy: effective directives, then unrecognized
/// ones, joined by `"; "`. Ineffective directives are never rendered.
pub fn render(policy: &ContentSecurityPolicy) -> String {
    policy
        .directives
        .iter()
        .chain(&policy.other_directives)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl fmt::Display for ContentSecurityPolicy {
    /// The cached header text when present, the canonical form otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => f.write_str(raw),
            None => f.write_str(&render(self)),
        }
    }
}
