//! Citadel Content-Security-Policy Crate
//!
//! Parses a `Content-Security-Policy` header value into a typed, queryable
//! [`ContentSecurityPolicy`] document and renders documents back into their
//! canonical wire form.
//!
//! ```
//! use citadel_csp::{parse_content_security_policy, SourceListKind};
//!
//! let policy = parse_content_security_policy(b"default-src 'self'; object-src 'none'").unwrap();
//! assert_eq!(policy.sources(SourceListKind::ObjectSrc).map(|s| s.len()), Some(1));
//! assert_eq!(policy.render(), "default-src 'self'; object-src 'none'");
//! ```

pub mod config;
pub mod directive;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod policy;
pub mod serialize;
pub mod source;
pub mod tree;

pub use config::ParserConfig;
pub use directive::{
    Directive, DirectiveBody, DirectiveKind, SourceListKind, TrustedTypesExpression, WebrtcValue,
};
pub use error::{CspError, CspResult};
pub use parser::{parse_content_security_policy, PolicyParser};
pub use policy::ContentSecurityPolicy;
pub use source::{
    HashAlgorithm, HashSource, HostSource, KeywordSource, NonceSource, SchemeSource, Source,
};
