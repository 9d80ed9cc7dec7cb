use crate::expressions::Expr;
use crate::meta::Meta;
use crate::string_decl::StringDecl;
use serde::{Deserialize, Serialize};
use yara_span::Span;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleModifiers {
    pub global: bool,
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub identifier: String,
    pub modifiers: RuleModifiers,
    pub tags: Vec<String>,
    pub meta: Vec<Meta>,
    pub strings: Vec<StringDecl>,
    pub condition: Expr,
    pub span: Span,
}

impl Rule {
    /// Look up a string declaration by its (non-anonymous) identifier.
    pub fn string(&self, identifier: &str) -> Option<&StringDecl> {
        self.strings.iter().find(|s| s.identifier == identifier)
    }
}
