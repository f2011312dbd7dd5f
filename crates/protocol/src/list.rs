//! Session list definitions and their layout payloads.
//!
//! Every app-level list (sheets, measures, fields, variables, bookmarks) is
//! fetched the same way: create a session object carrying the list
//! definition, read the matching field of its layout, destroy the object.
//! [`ListKind`] captures what varies between the five.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The five app-level lists the engine can materialize in a session object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    Sheet,
    Measure,
    Field,
    Variable,
    Bookmark,
}

impl ListKind {
    pub const ALL: [ListKind; 5] = [
        ListKind::Sheet,
        ListKind::Measure,
        ListKind::Field,
        ListKind::Variable,
        ListKind::Bookmark,
    ];

    /// `qInfo.qType` of the transient session object.
    pub fn session_type(self) -> &'static str {
        match self {
            ListKind::Sheet => "SheetList",
            ListKind::Measure => "MeasureList",
            ListKind::Field => "FieldList",
            ListKind::Variable => "VariableList",
            ListKind::Bookmark => "BookmarkList",
        }
    }

    /// Property field holding the list definition in the create request.
    pub fn def_field(self) -> &'static str {
        match self {
            ListKind::Sheet => "qAppObjectListDef",
            ListKind::Measure => "qMeasureListDef",
            ListKind::Field => "qFieldListDef",
            ListKind::Variable => "qVariableListDef",
            ListKind::Bookmark => "qBookmarkListDef",
        }
    }

    /// Layout field whose `qItems` carry the list payload.
    pub fn layout_field(self) -> &'static str {
        match self {
            ListKind::Sheet => "qAppObjectList",
            ListKind::Measure => "qMeasureList",
            ListKind::Field => "qFieldList",
            ListKind::Variable => "qVariableList",
            ListKind::Bookmark => "qBookmarkList",
        }
    }

    /// The list definition body sent under [`Self::def_field`].
    pub fn def(self) -> Value {
        match self {
            ListKind::Sheet => serde_json::json!({
                "qType": "sheet",
                "qData": {
                    "title": "/qMetaDef/title",
                    "description": "/qMetaDef/description",
                    "cells": "/cells"
                }
            }),
            ListKind::Measure => serde_json::json!({
                "qType": "measure",
                "qData": {"title": "/qMetaDef/title", "tags": "/qMetaDef/tags"}
            }),
            ListKind::Field => serde_json::json!({
                "qShowSystem": false,
                "qShowHidden": false,
                "qShowSemantic": true,
                "qShowSrcTables": true
            }),
            ListKind::Variable => serde_json::json!({
                "qType": "variable",
                "qShowReserved": false,
                "qShowConfig": false
            }),
            ListKind::Bookmark => serde_json::json!({
                "qType": "bookmark",
                "qData": {"title": "/qMetaDef/title"}
            }),
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ListKind::Sheet => "sheet",
            ListKind::Measure => "measure",
            ListKind::Field => "field",
            ListKind::Variable => "variable",
            ListKind::Bookmark => "bookmark",
        };
        write!(f, "{name}")
    }
}

/// One entry of the sheet list (`qAppObjectList.qItems[..]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetListItem {
    #[serde(rename = "qInfo")]
    pub q_info: crate::NxInfo,
    #[serde(rename = "qMeta", default)]
    pub q_meta: ObjectMeta,
    #[serde(rename = "qData", default)]
    pub q_data: SheetData,
}

/// Repository metadata attached to list items (`qMeta`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Sheet-specific data block listing the objects placed on the sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetData {
    #[serde(default)]
    pub cells: Vec<SheetCell>,
}

/// One object placed on a sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetCell {
    /// Engine id of the referenced object.
    pub name: String,
    #[serde(rename = "type")]
    pub obj_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colspan: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,
}
