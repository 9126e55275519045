#![no_main]
//! Content Security Policy (CSP) Focused Fuzzing
//!
//! This fuzzer targets the header parser and the canonical serializer:
//! - raw header bytes, valid or not
//! - headers assembled from fuzzer-chosen directives and sources
//! - duplicate directive classification
//! - render/parse idempotence

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

use citadel_csp::{parse_content_security_policy, ContentSecurityPolicy};

/// Directive names worth mixing into assembled headers
const DIRECTIVE_NAMES: &[&str] = &[
    "default-src",
    "script-src",
    "style-src-attr",
    "img-src",
    "frame-ancestors",
    "object-src",
    "sandbox",
    "report-uri",
    "report-to",
    "require-sri-for",
    "trusted-types",
    "require-trusted-types-for",
    "webrtc",
    "upgrade-insecure-requests",
    "x-unknown",
];

/// Source expressions worth mixing into assembled headers
const SOURCES: &[&str] = &[
    "'self'",
    "'none'",
    "'unsafe-inline'",
    "'nonce-YWJj'",
    "'sha256-q83vEjRWeJA='",
    "https:",
    "*.example.com:*",
    "https://cdn.example.com/js/",
    "allow-scripts",
    "'script'",
    "allow",
    "*",
];

/// CSP directive fuzzing
#[derive(Debug, Clone, Arbitrary)]
pub struct CspDirectiveFuzz {
    /// Index into the known directive names, or a free-form name
    pub known_name: Option<u8>,
    pub free_name: String,
    /// Indexes into the known sources, or free-form values
    pub sources: Vec<Result<u8, String>>,
    pub uppercase: bool,
}

impl CspDirectiveFuzz {
    fn render(&self) -> String {
        let name = match self.known_name {
            Some(i) => DIRECTIVE_NAMES[i as usize % DIRECTIVE_NAMES.len()].to_string(),
            None => self.free_name.clone(),
        };
        let name = if self.uppercase { name.to_uppercase() } else { name };

        let sources: Vec<String> = self
            .sources
            .iter()
            .take(32)
            .map(|source| match source {
                Ok(i) => SOURCES[*i as usize % SOURCES.len()].to_string(),
                Err(free) => free.clone(),
            })
            .collect();

        if sources.is_empty() {
            name
        } else {
            format!("{} {}", name, sources.join(" "))
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);

    // Choose fuzzing strategy
    let strategy = unstructured.int_in_range(0..=1).unwrap_or(0);

    match strategy {
        0 => fuzz_raw_header(data),
        _ => fuzz_assembled_header(&mut unstructured),
    }
});

/// Fuzz the parser with the raw input bytes
fn fuzz_raw_header(data: &[u8]) {
    if let Ok(policy) = parse_content_security_policy(data) {
        check_policy(&policy);
    }
}

/// Fuzz the parser with a header assembled from plausible directives
fn fuzz_assembled_header(unstructured: &mut Unstructured) {
    let Ok(directives) = Vec::<CspDirectiveFuzz>::arbitrary(unstructured) else {
        return;
    };

    let header = directives
        .iter()
        .take(64)
        .map(CspDirectiveFuzz::render)
        .collect::<Vec<_>>()
        .join("; ");

    if let Ok(policy) = parse_content_security_policy(header.as_bytes()) {
        check_policy(&policy);
    }
}

/// Invariants every successfully parsed policy must satisfy
fn check_policy(policy: &ContentSecurityPolicy) {
    let mut effective = std::collections::HashSet::new();
    for directive in policy.directives.iter().chain(&policy.other_directives) {
        assert!(
            effective.insert(directive.name.as_str()),
            "directive {} is effective twice",
            directive.name
        );
    }
    for directive in &policy.ineffective_directives {
        assert!(
            effective.contains(directive.name.as_str()),
            "ineffective {} has no effective counterpart",
            directive.name
        );
    }

    // Canonical output must parse back to the same effective directives
    let rendered = policy.render();
    if rendered.is_empty() {
        return;
    }
    let reparsed = match parse_content_security_policy(rendered.as_bytes()) {
        Ok(reparsed) => reparsed,
        Err(err) => panic!("canonical form {:?} failed to parse: {}", rendered, err),
    };
    assert_eq!(reparsed.directives, policy.directives);
    assert_eq!(reparsed.other_directives, policy.other_directives);
    assert!(reparsed.ineffective_directives.is_empty());
    assert_eq!(reparsed.render(), rendered);
}
