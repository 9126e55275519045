//! Directive dispatcher.
//!
//! The header is matched against the whole-policy grammar first. Each
//! `serialized-directive` is then classified by name and, where the directive
//! has its own value grammar, its value is matched again in isolation.

use std::collections::HashSet;

use crate::config::ParserConfig;
use crate::directive::{
    Directive, DirectiveBody, DirectiveKind, SourceListKind, TrustedTypesExpression, WebrtcValue,
};
use crate::error::{CspError, CspResult};
use crate::grammar::{first_tree, match_rule, rule_name, ParseNode, Rule};
use crate::policy::ContentSecurityPolicy;
use crate::source::{self, Source, NONE_SOURCE};
use crate::tree::{extract, search, search_single};

/// Parses `Content-Security-Policy` header values.
///
/// Holds no mutable state; one parser can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct PolicyParser {
    config: ParserConfig,
}

impl PolicyParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse one header value.
    pub fn parse(&self, data: &[u8]) -> CspResult<ContentSecurityPolicy> {
        self.config.check_header_length(data.len())?;

        let header = std::str::from_utf8(data).map_err(|err| CspError::Syntax {
            rule: rule_name(Rule::serialized_policy),
            directive: None,
            input: String::from_utf8_lossy(data).into_owned(),
            position: err.valid_up_to(),
        })?;

        let tree = first_tree(
            match_rule(Rule::serialized_policy, header)?,
            Rule::serialized_policy,
            header,
        )?;

        let nodes = search(&tree, &[Rule::serialized_directive], 2, false);
        self.config.check_directive_count(nodes.len())?;

        let mut policy = ContentSecurityPolicy {
            raw: Some(header.to_string()),
            ..Default::default()
        };
        let mut seen = HashSet::new();

        for node in nodes {
            let directive = self.parse_directive(header, node)?;

            // Record the name before placement so every later repeat lands
            // in the ineffective list.
            if !seen.insert(directive.name.clone()) {
                log::debug!("Ineffective duplicate directive {}", directive.raw_name);
                policy.ineffective_directives.push(directive);
            } else if directive.is_other() {
                log::debug!("Unrecognized directive {}", directive.raw_name);
                policy.other_directives.push(directive);
            } else {
                policy.directives.push(directive);
            }
        }

        Ok(policy)
    }

    fn parse_directive(&self, header: &str, node: &ParseNode) -> CspResult<Directive> {
        let name_node = search_single(node, Rule::directive_name, 1).ok_or_else(|| {
            CspError::invariant(format!(
                "serialized-directive at {:?} without directive-name",
                node.span
            ))
        })?;
        let raw_name = extract(header, name_node);
        let raw_value = search_single(node, Rule::directive_value, 1)
            .map(|value| extract(header, value))
            .unwrap_or_default();
        let name = raw_name.to_ascii_lowercase();

        log::trace!("Dispatching directive {} = {:?}", name, raw_value);

        let body = match DirectiveKind::from_name(&name) {
            Some(kind) => self.parse_body(kind, raw_value).map_err(|err| err.in_directive(&name))?,
            None => DirectiveBody::Other,
        };

        Ok(Directive {
            name,
            raw_name: raw_name.to_string(),
            raw_value: raw_value.to_string(),
            body,
        })
    }

    fn parse_body(&self, kind: DirectiveKind, value: &str) -> CspResult<DirectiveBody> {
        match kind {
            DirectiveKind::SourceList(kind) => {
                let sources = self.parse_source_list(kind, value)?;
                Ok(DirectiveBody::SourceList { kind, sources })
            }
            DirectiveKind::Sandbox => Ok(DirectiveBody::Sandbox {
                tokens: leaf_values(value, Rule::sandbox_root, Rule::token)?,
            }),
            DirectiveKind::ReportUri => Ok(DirectiveBody::ReportUri {
                uris: leaf_values(value, Rule::report_uri_root, Rule::uri_reference)?,
            }),
            DirectiveKind::ReportTo => Ok(DirectiveBody::ReportTo {
                group: value.to_string(),
            }),
            DirectiveKind::RequireSriFor => Ok(DirectiveBody::RequireSriFor {
                resources: value
                    .split(' ')
                    .filter(|resource| !resource.is_empty())
                    .map(str::to_ascii_lowercase)
                    .collect(),
            }),
            DirectiveKind::TrustedTypes => Ok(DirectiveBody::TrustedTypes {
                expressions: trusted_types_expressions(value)?,
            }),
            DirectiveKind::RequireTrustedTypesFor => {
                let sink_groups =
                    leaf_values(value, Rule::require_trusted_types_for_root, Rule::trusted_types_sink_group)?
                        .iter()
                        .map(|group| unquote(group))
                        .collect();
                Ok(DirectiveBody::RequireTrustedTypesFor { sink_groups })
            }
            DirectiveKind::Webrtc => match WebrtcValue::parse(value) {
                Some(value) => Ok(DirectiveBody::Webrtc { value }),
                None => Err(CspError::Syntax {
                    rule: "webrtc".to_string(),
                    directive: None,
                    input: value.to_string(),
                    position: 0,
                }),
            },
            DirectiveKind::UpgradeInsecureRequests => {
                ignore_value(kind, value);
                Ok(DirectiveBody::UpgradeInsecureRequests)
            }
            DirectiveKind::BlockAllMixedContent => {
                ignore_value(kind, value);
                Ok(DirectiveBody::BlockAllMixedContent)
            }
        }
    }

    fn parse_source_list(&self, kind: SourceListKind, value: &str) -> CspResult<Vec<Source>> {
        if value == NONE_SOURCE {
            return Ok(vec![Source::None]);
        }
        if value.is_empty() {
            return Ok(Vec::new());
        }

        let list_rule = match kind {
            SourceListKind::FrameAncestors => Rule::ancestor_source_list_root,
            _ => Rule::serialized_source_list,
        };
        let tree = first_tree(match_rule(list_rule, value)?, list_rule, value)?;
        let sources = source::interpret(value, &tree, list_rule)?;

        if sources.is_empty() {
            return Err(CspError::syntax(list_rule, value, 0));
        }
        self.config.check_source_count(sources.len())?;

        Ok(sources)
    }
}

/// Match `value` under `root` and collect the text of every `leaf` node.
fn leaf_values(value: &str, root: Rule, leaf: Rule) -> CspResult<Vec<String>> {
    let tree = first_tree(match_rule(root, value)?, root, value)?;
    Ok(search(&tree, &[leaf], 2, false)
        .into_iter()
        .map(|node| extract(value, node).to_string())
        .collect())
}

fn trusted_types_expressions(value: &str) -> CspResult<Vec<TrustedTypesExpression>> {
    let tree = first_tree(
        match_rule(Rule::trusted_types_root, value)?,
        Rule::trusted_types_root,
        value,
    )?;

    search(&tree, &[Rule::tt_expression], 2, false)
        .into_iter()
        .map(|expression| {
            let [concrete] = expression.children.as_slice() else {
                return Err(CspError::invariant(format!(
                    "tt-expression has {} children, expected 1",
                    expression.children.len()
                )));
            };
            let text = extract(value, concrete);
            match concrete.rule {
                Rule::tt_policy_name => Ok(TrustedTypesExpression::PolicyName(text.to_string())),
                Rule::tt_keyword => Ok(TrustedTypesExpression::Keyword(unquote(text))),
                Rule::tt_wildcard => Ok(TrustedTypesExpression::Wildcard),
                other => Err(CspError::invariant(format!(
                    "unrecognized tt-expression rule {}",
                    rule_name(other)
                ))),
            }
        })
        .collect()
}

fn unquote(s: &str) -> String {
    s.trim_matches('\'').to_ascii_lowercase()
}

fn ignore_value(kind: DirectiveKind, value: &str) {
    if !value.is_empty() {
        log::debug!("Ignoring value {:?} of valueless directive {}", value, kind.name());
    }
}

/// Parse a header value with the default [`ParserConfig`].
pub fn parse_content_security_policy(data: &[u8]) -> CspResult<ContentSecurityPolicy> {
    PolicyParser::default().parse(data)
}
