//! Typed fragments of engine object payloads.
//!
//! Only the fields the client actually reads are modelled; everything else
//! rides along in `extra` maps so properties survive a round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity block present on every generic object (`qInfo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NxInfo {
    #[serde(rename = "qId", default, skip_serializing_if = "Option::is_none")]
    pub q_id: Option<String>,
    #[serde(rename = "qType")]
    pub q_type: String,
}

/// Remote object reference returned by `OpenDoc`, `GetObject`,
/// `CreateSessionObject` and friends (`qReturn`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInterface {
    #[serde(rename = "qType", default, skip_serializing_if = "Option::is_none")]
    pub q_type: Option<String>,
    #[serde(rename = "qHandle")]
    pub q_handle: i32,
    #[serde(
        rename = "qGenericType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub q_generic_type: Option<String>,
    #[serde(rename = "qGenericId", default, skip_serializing_if = "Option::is_none")]
    pub q_generic_id: Option<String>,
}

/// Envelope around [`ObjectInterface`] as the engine nests it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnedObject {
    #[serde(rename = "qReturn")]
    pub q_return: ObjectInterface,
}

/// A title-like property: either a literal string or a dynamic expression
/// the engine evaluates against the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TitleExpr {
    Expr(StringExpression),
    Text(String),
}

impl TitleExpr {
    /// Literal text, when this is not an expression.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            TitleExpr::Text(text) => Some(text),
            TitleExpr::Expr(_) => None,
        }
    }

    /// The expression body, when there is one worth evaluating. Empty and
    /// whitespace-only expressions are reported as absent.
    pub fn as_expression(&self) -> Option<&str> {
        match self {
            TitleExpr::Text(_) => None,
            TitleExpr::Expr(expr) => {
                let body = expr.q_string_expression.expr();
                if body.trim().is_empty() { None } else { Some(body) }
            }
        }
    }
}

/// Structured expression wrapper (`{"qStringExpression": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringExpression {
    #[serde(rename = "qStringExpression")]
    pub q_string_expression: ExpressionBody,
}

/// The engine accepts both `"qStringExpression": "=..."` and
/// `"qStringExpression": {"qExpr": "=..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionBody {
    Def {
        #[serde(rename = "qExpr")]
        q_expr: String,
    },
    Text(String),
}

impl ExpressionBody {
    pub fn expr(&self) -> &str {
        match self {
            ExpressionBody::Def { q_expr } => q_expr,
            ExpressionBody::Text(text) => text,
        }
    }
}

/// Properties of a generic object, as returned by `GetProperties`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericObjectProperties {
    #[serde(rename = "qInfo")]
    pub q_info: NxInfo,
    /// Master-object link: when set, the referenced object's metadata is
    /// authoritative for titles.
    #[serde(rename = "qExtendsId", default, skip_serializing_if = "Option::is_none")]
    pub q_extends_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<TitleExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<TitleExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnote: Option<TitleExpr>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Envelope around [`GenericObjectProperties`] (`qProp`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertiesEnvelope {
    #[serde(rename = "qProp")]
    pub q_prop: GenericObjectProperties,
}

/// Result of the engine's `ExportData` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDataResult {
    /// Server-relative download path for the exported file.
    #[serde(rename = "qUrl")]
    pub q_url: String,
    #[serde(rename = "qWarnings", default)]
    pub q_warnings: Vec<i64>,
}

/// File formats accepted by `ExportData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFileType {
    #[serde(rename = "CSV_C")]
    CsvComma,
    #[serde(rename = "CSV_T")]
    CsvTab,
    #[serde(rename = "OOXML")]
    Xlsx,
}
