//! Directive kinds and their typed values.

use serde::{Deserialize, Serialize};

use crate::source::Source;

/// Directives whose value is a source list
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceListKind {
    BaseUri,
    ChildSrc,
    ConnectSrc,
    DefaultSrc,
    FontSrc,
    FormAction,
    FrameAncestors,
    FrameSrc,
    ImgSrc,
    ManifestSrc,
    MediaSrc,
    ObjectSrc,
    ScriptSrc,
    ScriptSrcAttr,
    ScriptSrcElem,
    StyleSrc,
    StyleSrcAttr,
    StyleSrcElem,
    WorkerSrc,
}

impl SourceListKind {
    pub const ALL: [SourceListKind; 19] = [
        SourceListKind::BaseUri,
        SourceListKind::ChildSrc,
        SourceListKind::ConnectSrc,
        SourceListKind::DefaultSrc,
        SourceListKind::FontSrc,
        SourceListKind::FormAction,
        SourceListKind::FrameAncestors,
        SourceListKind::FrameSrc,
        SourceListKind::ImgSrc,
        SourceListKind::ManifestSrc,
        SourceListKind::MediaSrc,
        SourceListKind::ObjectSrc,
        SourceListKind::ScriptSrc,
        SourceListKind::ScriptSrcAttr,
        SourceListKind::ScriptSrcElem,
        SourceListKind::StyleSrc,
        SourceListKind::StyleSrcAttr,
        SourceListKind::StyleSrcElem,
        SourceListKind::WorkerSrc,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            SourceListKind::BaseUri => "base-uri",
            SourceListKind::ChildSrc => "child-src",
            SourceListKind::ConnectSrc => "connect-src",
            SourceListKind::DefaultSrc => "default-src",
            SourceListKind::FontSrc => "font-src",
            SourceListKind::FormAction => "form-action",
            SourceListKind::FrameAncestors => "frame-ancestors",
            SourceListKind::FrameSrc => "frame-src",
            SourceListKind::ImgSrc => "img-src",
            SourceListKind::ManifestSrc => "manifest-src",
            SourceListKind::MediaSrc => "media-src",
            SourceListKind::ObjectSrc => "object-src",
            SourceListKind::ScriptSrc => "script-src",
            SourceListKind::ScriptSrcAttr => "script-src-attr",
            SourceListKind::ScriptSrcElem => "script-src-elem",
            SourceListKind::StyleSrc => "style-src",
            SourceListKind::StyleSrcAttr => "style-src-attr",
            SourceListKind::StyleSrcElem => "style-src-elem",
            SourceListKind::WorkerSrc => "worker-src",
        }
    }

    /// Look up a kind by lowercased directive name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

/// Every directive name this crate gives a typed value
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum DirectiveKind {
    SourceList(SourceListKind),
    Sandbox,
    ReportUri,
    ReportTo,
    RequireSriFor,
    TrustedTypes,
    RequireTrustedTypesFor,
    Webrtc,
    UpgradeInsecureRequests,
    BlockAllMixedContent,
}

impl DirectiveKind {
    /// Look up a kind by lowercased directive name
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "sandbox" => DirectiveKind::Sandbox,
            "report-uri" => DirectiveKind::ReportUri,
            "report-to" => DirectiveKind::ReportTo,
            "require-sri-for" => DirectiveKind::RequireSriFor,
            "trusted-types" => DirectiveKind::TrustedTypes,
            "require-trusted-types-for" => DirectiveKind::RequireTrustedTypesFor,
            "webrtc" => DirectiveKind::Webrtc,
            "upgrade-insecure-requests" => DirectiveKind::UpgradeInsecureRequests,
            "block-all-mixed-content" => DirectiveKind::BlockAllMixedContent,
            other => DirectiveKind::SourceList(SourceListKind::from_name(other)?),
        };
        Some(kind)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            DirectiveKind::SourceList(kind) => kind.name(),
            DirectiveKind::Sandbox => "sandbox",
            DirectiveKind::ReportUri => "report-uri",
            DirectiveKind::ReportTo => "report-to",
            DirectiveKind::RequireSriFor => "require-sri-for",
            DirectiveKind::TrustedTypes => "trusted-types",
            DirectiveKind::RequireTrustedTypesFor => "require-trusted-types-for",
            DirectiveKind::Webrtc => "webrtc",
            DirectiveKind::UpgradeInsecureRequests => "upgrade-insecure-requests",
            DirectiveKind::BlockAllMixedContent => "block-all-mixed-content",
        }
    }
}

/// One `trusted-types` expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "value")]
pub enum TrustedTypesExpression {
    /// A policy name such as `default` or `dompurify`
    PolicyName(String),
    /// `'allow-duplicates'` or `'none'`, stored without quotes
    Keyword(String),
    /// `*`
    Wildcard,
}

/// Value of the `webrtc` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebrtcValue {
    Allow,
    Block,
}

impl WebrtcValue {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(WebrtcValue::Allow),
            "block" => Some(WebrtcValue::Block),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            WebrtcValue::Allow => "allow",
            WebrtcValue::Block => "block",
        }
    }
}

/// Typed value of a directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum DirectiveBody {
    SourceList {
        kind: SourceListKind,
        sources: Vec<Source>,
    },
    Sandbox {
        tokens: Vec<String>,
    },
    ReportUri {
        uris: Vec<String>,
    },
    ReportTo {
        group: String,
    },
    RequireSriFor {
        resources: Vec<String>,
    },
    TrustedTypes {
        expressions: Vec<TrustedTypesExpression>,
    },
    RequireTrustedTypesFor {
        sink_groups: Vec<String>,
    },
    Webrtc {
        value: WebrtcValue,
    },
    UpgradeInsecureRequests,
    BlockAllMixedContent,
    /// Syntactically valid directive with an unrecognized name
    Other,
}

/// One directive of a policy
///
/// `name` is the lowercased lookup key; `raw_name` and `raw_value` keep the
/// text as written. Equality ignores the raw text.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    pub raw_name: String,
    pub raw_value: String,
    pub body: DirectiveBody,
}

impl PartialEq for Directive {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.body == other.body && self.other_value_eq(other)
    }
}

impl Directive {
    /// Build a directive from its typed value, deriving the name and the raw
    /// text from it.
    pub fn new(kind: DirectiveKind, body: DirectiveBody) -> Self {
        let mut directive = Self {
            name: kind.name().to_string(),
            raw_name: kind.name().to_string(),
            raw_value: String::new(),
            body,
        };
        directive.raw_value = directive.rendered_value();
        directive
    }

    /// Source-list directive
    pub fn source_list(kind: SourceListKind, sources: Vec<Source>) -> Self {
        Self::new(
            DirectiveKind::SourceList(kind),
            DirectiveBody::SourceList { kind, sources },
        )
    }

    /// Directive with an unrecognized name; only the raw text is kept.
    pub fn other(raw_name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        let raw_name = raw_name.into();
        Self {
            name: raw_name.to_ascii_lowercase(),
            raw_name,
            raw_value: raw_value.into(),
            body: DirectiveBody::Other,
        }
    }

    /// The kind of this directive, `None` for unrecognized names
    pub fn kind(&self) -> Option<DirectiveKind> {
        match &self.body {
            DirectiveBody::Other => None,
            _ => DirectiveKind::from_name(&self.name),
        }
    }

    pub fn is_other(&self) -> bool {
        matches!(self.body, DirectiveBody::Other)
    }

    pub fn sources(&self) -> Option<&[Source]> {
        match &self.body {
            DirectiveBody::SourceList { sources, .. } => Some(sources),
            _ => None,
        }
    }

    pub fn sources_mut(&mut self) -> Option<&mut Vec<Source>> {
        match &mut self.body {
            DirectiveBody::SourceList { sources, .. } => Some(sources),
            _ => None,
        }
    }

    // Unrecognized directives only carry their raw value, so it takes part
    // in equality for them.
    fn other_value_eq(&self, other: &Self) -> bool {
        match self.body {
            DirectiveBody::Other => self.raw_value == other.raw_value,
            _ => true,
        }
    }
}
