//! Parsing tests for the Citadel CSP parser
//!
//! These tests drive whole header values through the public entry point and
//! check the resulting documents.

use citadel_csp::{
    parse_content_security_policy, ContentSecurityPolicy, CspError, DirectiveBody, HashAlgorithm,
    HostSource, Source, SourceListKind, TrustedTypesExpression, WebrtcValue,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn parse(header: &str) -> ContentSecurityPolicy {
    init_logging();
    match parse_content_security_policy(header.as_bytes()) {
        Ok(policy) => policy,
        Err(err) => panic!("{header:?} should parse: {err}"),
    }
}

fn parse_err(header: &str) -> CspError {
    init_logging();
    match parse_content_security_policy(header.as_bytes()) {
        Ok(policy) => panic!("{header:?} should fail, got {policy:?}"),
        Err(err) => err,
    }
}

#[test]
fn test_default_src_self_and_host() {
    let policy = parse("default-src 'self' https://cdn.example.com");

    assert_eq!(policy.directives.len(), 1);
    let sources = policy.sources(SourceListKind::DefaultSrc).unwrap();
    assert_eq!(sources.len(), 2);

    match &sources[0] {
        Source::Keyword(keyword) => {
            assert_eq!(keyword.keyword, "self");
            assert_eq!(keyword.raw, "'self'");
        }
        other => panic!("expected keyword, got {other:?}"),
    }
    match &sources[1] {
        Source::Host(host) => {
            assert_eq!(host.scheme.as_deref(), Some("https"));
            assert_eq!(host.host, "cdn.example.com");
            assert_eq!(host.port, None);
            assert_eq!(host.path, None);
        }
        other => panic!("expected host, got {other:?}"),
    }
}

#[test]
fn test_object_src_none() {
    let policy = parse("object-src 'none'");
    assert_eq!(policy.sources(SourceListKind::ObjectSrc), Some(&[Source::None][..]));
}

#[test]
fn test_none_cannot_be_mixed() {
    assert!(parse_err("object-src 'none' 'self'").is_syntax_error());
    assert!(parse_err("object-src 'self' 'none'").is_syntax_error());
}

#[test]
fn test_sandbox_tokens_keep_order() {
    let policy = parse("sandbox allow-scripts allow-same-origin");
    assert_eq!(
        policy.directive("sandbox").unwrap().body,
        DirectiveBody::Sandbox {
            tokens: vec!["allow-scripts".to_string(), "allow-same-origin".to_string()],
        }
    );

    let policy = parse("sandbox");
    assert_eq!(
        policy.directive("sandbox").unwrap().body,
        DirectiveBody::Sandbox { tokens: Vec::new() }
    );

    let policy = parse("sandbox allow-forms allow-forms");
    match &policy.directive("sandbox").unwrap().body {
        DirectiveBody::Sandbox { tokens } => assert_eq!(tokens.len(), 2),
        other => panic!("unexpected body {other:?}"),
    }
}

#[test]
fn test_wildcard_host_and_port() {
    let policy = parse("connect-src *.example.com:*");
    let sources = policy.sources(SourceListKind::ConnectSrc).unwrap();
    assert_eq!(sources.len(), 1);

    match &sources[0] {
        Source::Host(host) => {
            assert_eq!(host.host, "*.example.com");
            assert_eq!(host.port.as_deref(), Some("*"));
            assert!(host.has_wildcard_port());
        }
        other => panic!("expected host, got {other:?}"),
    }
}

#[test]
fn test_webrtc() {
    let policy = parse("webrtc allow");
    assert_eq!(
        policy.directive("webrtc").unwrap().body,
        DirectiveBody::Webrtc {
            value: WebrtcValue::Allow
        }
    );

    match parse_err("webrtc maybe") {
        CspError::Syntax {
            directive, input, ..
        } => {
            assert_eq!(directive.as_deref(), Some("webrtc"));
            assert_eq!(input, "maybe");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(parse_err("webrtc 'allow'").is_syntax_error());
}

#[test]
fn test_duplicates_are_ineffective() {
    let policy = parse("script-src 'self'; foo a; SCRIPT-SRC https://evil.example; Foo b; script-src *");

    assert_eq!(policy.directives.len(), 1);
    assert_eq!(policy.other_directives.len(), 1);
    assert_eq!(policy.ineffective_directives.len(), 3);

    assert_eq!(policy.directives[0].raw_value, "'self'");
    assert_eq!(policy.other_directives[0].raw_value, "a");

    let ineffective: Vec<_> = policy
        .ineffective_directives
        .iter()
        .map(|d| (d.name.as_str(), d.raw_name.as_str(), d.raw_value.as_str()))
        .collect();
    assert_eq!(
        ineffective,
        vec![
            ("script-src", "SCRIPT-SRC", "https://evil.example"),
            ("foo", "Foo", "b"),
            ("script-src", "script-src", "*"),
        ]
    );
}

#[test]
fn test_unknown_directives_go_to_other() {
    let policy = parse("default-src 'self'; plugin-types application/pdf; navigate-to 'self'");
    assert_eq!(policy.directives.len(), 1);

    let names: Vec<_> = policy.other_directives.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["plugin-types", "navigate-to"]);
    assert_eq!(policy.other_directives[0].body, DirectiveBody::Other);
    assert_eq!(
        policy.directive("navigate-to").map(|d| d.raw_value.as_str()),
        Some("'self'")
    );
}

#[test]
fn test_every_source_kind() {
    let policy = parse(
        "script-src 'self' 'unsafe-inline' 'strict-dynamic' 'nonce-YWJjMTIz' \
         'sha256-q83vEjRWeJA=' https: blob: https://a.example:443/js/ *",
    );
    let sources = policy.sources(SourceListKind::ScriptSrc).unwrap();

    assert_eq!(
        sources,
        &[
            Source::keyword("self"),
            Source::keyword("unsafe-inline"),
            Source::keyword("strict-dynamic"),
            Source::nonce("YWJjMTIz"),
            Source::hash(HashAlgorithm::Sha256, "q83vEjRWeJA="),
            Source::scheme("https"),
            Source::scheme("blob"),
            HostSource::new("a.example")
                .with_scheme("https")
                .with_port("443")
                .with_path("/js/")
                .into(),
            Source::host("*"),
        ][..]
    );
}

#[test]
fn test_frame_ancestors_uses_ancestor_grammar() {
    let policy = parse("frame-ancestors 'self' https://partner.example");
    assert_eq!(
        policy.sources(SourceListKind::FrameAncestors),
        Some(
            &[
                Source::keyword("self"),
                HostSource::new("partner.example").with_scheme("https").into(),
            ][..]
        )
    );

    let policy = parse("frame-ancestors 'none'");
    assert_eq!(policy.sources(SourceListKind::FrameAncestors), Some(&[Source::None][..]));

    assert!(parse_err("frame-ancestors 'unsafe-inline'").is_syntax_error());
    assert!(parse_err("frame-ancestors 'nonce-abc'").is_syntax_error());
}

#[test]
fn test_report_directives() {
    let policy = parse("report-uri /csp-report https://collector.example/r?id=1; report-to csp-endpoint");

    assert_eq!(
        policy.directive("report-uri").unwrap().body,
        DirectiveBody::ReportUri {
            uris: vec![
                "/csp-report".to_string(),
                "https://collector.example/r?id=1".to_string()
            ],
        }
    );
    assert_eq!(
        policy.directive("report-to").unwrap().body,
        DirectiveBody::ReportTo {
            group: "csp-endpoint".to_string()
        }
    );

    assert!(parse_err("report-uri").is_syntax_error());
    assert!(parse_err("report-uri /bad%zz").is_syntax_error());
}

#[test]
fn test_require_sri_for() {
    let policy = parse("require-sri-for Script  STYLE");
    assert_eq!(
        policy.directive("require-sri-for").unwrap().body,
        DirectiveBody::RequireSriFor {
            resources: vec!["script".to_string(), "style".to_string()],
        }
    );
}

#[test]
fn test_trusted_types() {
    let policy = parse("trusted-types default dompurify 'allow-duplicates' *; require-trusted-types-for 'script'");

    assert_eq!(
        policy.directive("trusted-types").unwrap().body,
        DirectiveBody::TrustedTypes {
            expressions: vec![
                TrustedTypesExpression::PolicyName("default".to_string()),
                TrustedTypesExpression::PolicyName("dompurify".to_string()),
                TrustedTypesExpression::Keyword("allow-duplicates".to_string()),
                TrustedTypesExpression::Wildcard,
            ],
        }
    );
    assert_eq!(
        policy.directive("require-trusted-types-for").unwrap().body,
        DirectiveBody::RequireTrustedTypesFor {
            sink_groups: vec!["script".to_string()],
        }
    );

    let policy = parse("trusted-types 'none'");
    assert_eq!(
        policy.directive("trusted-types").unwrap().body,
        DirectiveBody::TrustedTypes {
            expressions: vec![TrustedTypesExpression::Keyword("none".to_string())],
        }
    );

    assert!(parse_err("require-trusted-types-for 'style'").is_syntax_error());
    assert!(parse_err("trusted-types 'bogus'").is_syntax_error());
}

#[test]
fn test_whitespace_and_empty_directives() {
    let policy = parse("  default-src\t'self' ;; ; img-src data:  ;  ");
    let names: Vec<_> = policy.directives.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["default-src", "img-src"]);
}

#[test]
fn test_top_level_syntax_errors() {
    for header in ["", ";", "default-src 'self', img-src *", "default-src 'self'\n", "déf 'self'"] {
        let err = parse_err(header);
        assert!(err.is_syntax_error(), "{header:?} gave {err:?}");
    }
}

#[test]
fn test_error_in_ineffective_directive_still_fails() {
    assert!(parse_err("img-src 'self'; img-src 'bogus'").is_syntax_error());
}

#[test]
fn test_parse_is_thread_safe() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let header = format!("default-src 'self'; img-src img{}.example", i);
                parse_content_security_policy(header.as_bytes()).map(|policy| policy.render())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let rendered = handle.join().unwrap().unwrap();
        assert_eq!(rendered, format!("default-src 'self'; img-src img{}.example", i));
    }
}

#[test]
fn test_json_export() {
    let policy = parse("default-src 'self'; webrtc block");
    let json = serde_json::to_value(&policy).unwrap();

    assert_eq!(json["directives"][0]["name"], "default-src");
    assert_eq!(json["directives"][0]["body"]["type"], "source-list");
    assert_eq!(json["directives"][0]["body"]["sources"][0]["kind"], "keyword");
    assert_eq!(json["directives"][1]["body"]["value"], "block");

    let back: ContentSecurityPolicy = serde_json::from_value(json).unwrap();
    assert_eq!(back, policy);
}
