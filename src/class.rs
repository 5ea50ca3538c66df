use serde::{Deserialize, Serialize};

use crate::function::JsFunction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JsObjectType {
    Class,
}

/// The single class a module may declare, plus the free functions that
/// follow it in the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsClass {
    #[serde(rename = "type")]
    pub object_type: JsObjectType,
    pub name: String,
    pub exported: bool,
    pub line: usize,
    pub constructor: Option<JsFunction>,
    /// Methods other than the constructor, in source order.
    pub class_functions: Vec<JsFunction>,
    /// Top-level functions declared after the class's closing brace.
    pub none_class_functions: Vec<JsFunction>,
    /// Field declaration lines, trimmed but otherwise verbatim.
    pub class_members: Vec<String>,
}

impl JsClass {
    pub fn new(name: String, exported: bool, line: usize) -> Self {
        JsClass {
            object_type: JsObjectType::Class,
            name,
            exported,
            line,
            constructor: None,
            class_functions: Vec::new(),
            none_class_functions: Vec::new(),
            class_members: Vec::new(),
        }
    }

    /// Constructor first, then methods, then trailing free functions.
    pub fn functions(&self) -> impl Iterator<Item = &JsFunction> {
        self.constructor
            .iter()
            .chain(self.class_functions.iter())
            .chain(self.none_class_functions.iter())
    }

    pub(crate) fn functions_mut(&mut self) -> impl Iterator<Item = &mut JsFunction> {
        self.constructor
            .iter_mut()
            .chain(self.class_functions.iter_mut())
            .chain(self.none_class_functions.iter_mut())
    }
}
