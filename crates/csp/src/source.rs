//! Sources and the source-list interpreter.
//!
//! A [`Source`] is one space separated token of a source-list directive value.
//! Every source remembers the exact text it was parsed from; equality only
//! looks at the decomposed fields.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CspError, CspResult};
use crate::grammar::{rule_name, ParseNode, Rule};
use crate::tree::{extract, search, search_single};

/// Literal text of the `'none'` source
pub const NONE_SOURCE: &str = "'none'";

/// One entry of a source list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Source {
    /// `'none'`, only ever the sole entry of a list
    None,
    /// `https:`
    Scheme(SchemeSource),
    /// `https://*.example.com:443/path`
    Host(HostSource),
    /// `'self'`, `'unsafe-inline'`, ...
    Keyword(KeywordSource),
    /// `'nonce-<base64>'`
    Nonce(NonceSource),
    /// `'sha256-<base64>'`
    Hash(HashSource),
}

impl Source {
    /// Scheme source for `scheme`, which must not carry the trailing colon.
    pub fn scheme(scheme: impl Into<String>) -> Self {
        let scheme = scheme.into();
        Source::Scheme(SchemeSource {
            raw: format!("{}:", scheme),
            scheme,
        })
    }

    /// Host source without scheme, port or path.
    pub fn host(host: impl Into<String>) -> Self {
        HostSource::new(host).into()
    }

    /// Keyword source; `keyword` may be given with or without quotes.
    pub fn keyword(keyword: &str) -> Self {
        let keyword = strip_quotes(keyword).to_ascii_lowercase();
        Source::Keyword(KeywordSource {
            raw: format!("'{}'", keyword),
            keyword,
        })
    }

    /// Nonce source carrying `nonce` as its base64 payload.
    pub fn nonce(nonce: impl Into<String>) -> Self {
        let nonce = nonce.into();
        Source::Nonce(NonceSource {
            raw: format!("'nonce-{}'", nonce),
            nonce,
        })
    }

    /// Hash source with `digest` as its base64 payload.
    pub fn hash(algorithm: HashAlgorithm, digest: impl Into<String>) -> Self {
        let digest = digest.into();
        Source::Hash(HashSource {
            raw: format!("'{}-{}'", algorithm.as_str(), digest),
            algorithm,
            digest,
        })
    }

    /// The text this source was parsed from (or synthesised with).
    pub fn raw(&self) -> &str {
        match self {
            Source::None => NONE_SOURCE,
            Source::Scheme(source) => &source.raw,
            Source::Host(source) => &source.raw,
            Source::Keyword(source) => &source.raw,
            Source::Nonce(source) => &source.raw,
            Source::Hash(source) => &source.raw,
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Source::None)
    }

    /// Returns true for the keyword source `keyword` (quotes optional).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        match self {
            Source::Keyword(source) => source.keyword.eq_ignore_ascii_case(strip_quotes(keyword)),
            _ => false,
        }
    }
}

impl From<HostSource> for Source {
    fn from(source: HostSource) -> Self {
        Source::Host(source)
    }
}

/// `scheme-source`
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct SchemeSource {
    pub raw: String,
    pub scheme: String,
}

impl PartialEq for SchemeSource {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
    }
}

/// `host-source`
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct HostSource {
    pub raw: String,
    pub scheme: Option<String>,
    pub host: String,
    /// Port digits, or the wildcard `*`
    pub port: Option<String>,
    pub path: Option<String>,
}

impl HostSource {
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            raw: host.clone(),
            scheme: None,
            host,
            port: None,
            path: None,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self.raw = self.to_string();
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self.raw = self.to_string();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self.raw = self.to_string();
        self
    }

    /// Returns true when the port is the `*` wildcard
    pub fn has_wildcard_port(&self) -> bool {
        self.port.as_deref() == Some("*")
    }
}

impl PartialEq for HostSource {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.host == other.host
            && self.port == other.port
            && self.path == other.path
    }
}

/// `keyword-source` / `ancestor-keyword-source`
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct KeywordSource {
    pub raw: String,
    /// Lowercased keyword without the surrounding quotes
    pub keyword: String,
}

impl PartialEq for KeywordSource {
    fn eq(&self, other: &Self) -> bool {
        self.keyword == other.keyword
    }
}

/// `nonce-source`
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct NonceSource {
    pub raw: String,
    pub nonce: String,
}

impl PartialEq for NonceSource {
    fn eq(&self, other: &Self) -> bool {
        self.nonce == other.nonce
    }
}

/// Digest algorithms allowed in a `hash-source`
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Some(HashAlgorithm::Sha256),
            "sha384" => Some(HashAlgorithm::Sha384),
            "sha512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Digest size in bytes
    pub const fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

/// `hash-source`
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct HashSource {
    pub raw: String,
    pub algorithm: HashAlgorithm,
    /// Base64 (or base64url) encoded digest
    pub digest: String,
}

impl HashSource {
    /// Decode the digest payload.
    ///
    /// Both the standard and the URL-safe alphabets are accepted. The decoded
    /// length is not checked against the algorithm; compare with
    /// [`HashAlgorithm::digest_len`] where that matters.
    pub fn decoded_digest(&self) -> CspResult<Vec<u8>> {
        STANDARD
            .decode(&self.digest)
            .or_else(|_| URL_SAFE.decode(&self.digest))
            .map_err(|err| CspError::Syntax {
                rule: rule_name(Rule::base64_value),
                directive: None,
                input: self.digest.clone(),
                position: match err {
                    base64::DecodeError::InvalidByte(offset, _) => offset,
                    base64::DecodeError::InvalidLastSymbol(offset, _) => offset,
                    _ => self.digest.len(),
                },
            })
    }
}

impl PartialEq for HashSource {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.digest == other.digest
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches('\'')
}

/// Turn a matched source list into typed sources.
///
/// `tree` is the root of a `serialized-source-list` or
/// `ancestor-source-list-root` match over `input`; `list_rule` names that
/// root for diagnostics.
pub fn interpret(input: &str, tree: &ParseNode, list_rule: Rule) -> CspResult<Vec<Source>> {
    let expressions = search(
        tree,
        &[Rule::source_expression, Rule::ancestor_source],
        2,
        false,
    );

    expressions
        .into_iter()
        .map(|expression| {
            let concrete = match expression.children.as_slice() {
                [concrete] => concrete,
                children => {
                    return Err(CspError::invariant(format!(
                        "{} in {} has {} children, expected 1",
                        rule_name(expression.rule),
                        rule_name(list_rule),
                        children.len()
                    )))
                }
            };
            interpret_expression(input, concrete)
        })
        .collect()
}

fn interpret_expression(input: &str, node: &ParseNode) -> CspResult<Source> {
    let raw = extract(input, node).to_string();

    match node.rule {
        Rule::scheme_source => {
            let scheme = required(input, node, Rule::scheme_part)?.to_string();
            Ok(Source::Scheme(SchemeSource { raw, scheme }))
        }
        Rule::host_source => Ok(Source::Host(HostSource {
            scheme: optional(input, node, Rule::scheme_part),
            host: required(input, node, Rule::host_part)?.to_string(),
            port: optional(input, node, Rule::port_part),
            path: optional(input, node, Rule::path_part),
            raw,
        })),
        Rule::keyword_source | Rule::ancestor_keyword_source => {
            let keyword = strip_quotes(&raw).to_ascii_lowercase();
            Ok(Source::Keyword(KeywordSource { raw, keyword }))
        }
        Rule::nonce_source => {
            expect_arity(node, 1)?;
            let nonce = required(input, node, Rule::base64_value)?.to_string();
            Ok(Source::Nonce(NonceSource { raw, nonce }))
        }
        Rule::hash_source => {
            expect_arity(node, 2)?;
            let algorithm_text = required(input, node, Rule::hash_algorithm)?;
            let algorithm = HashAlgorithm::parse(algorithm_text).ok_or_else(|| {
                CspError::invariant(format!("hash-algorithm matched unknown {:?}", algorithm_text))
            })?;
            let digest = required(input, node, Rule::base64_value)?.to_string();
            Ok(Source::Hash(HashSource {
                raw,
                algorithm,
                digest,
            }))
        }
        other => Err(CspError::invariant(format!(
            "unrecognized source expression rule {}",
            rule_name(other)
        ))),
    }
}

fn required<'i>(input: &'i str, node: &ParseNode, rule: Rule) -> CspResult<&'i str> {
    search_single(node, rule, 1)
        .map(|child| extract(input, child))
        .ok_or_else(|| {
            CspError::invariant(format!(
                "{} without mandatory {}",
                rule_name(node.rule),
                rule_name(rule)
            ))
        })
}

fn optional(input: &str, node: &ParseNode, rule: Rule) -> Option<String> {
    search_single(node, rule, 1).map(|child| extract(input, child).to_string())
}

fn expect_arity(node: &ParseNode, arity: usize) -> CspResult<()> {
    if node.children.len() == arity {
        Ok(())
    } else {
        Err(CspError::invariant(format!(
            "{} has {} children, expected {}",
            rule_name(node.rule),
            node.children.len(),
            arity
        )))
    }
}
