//! Canonical operation text.
//!
//! Output carries no commas and no insignificant whitespace. A single space
//! separates two adjacent words (names, numbers, strings) and a word from a
//! following `...`. `@transform` is compile-time only and never printed.

use apollo_compiler::ast::{
    Argument, Definition, Directive, Document, FragmentDefinition, OperationDefinition,
    OperationType, Selection, Type, Value, VariableDefinition,
};
use apollo_compiler::Node;

/// Directives consumed by the compiler and removed from `Content`.
const STRIPPED_DIRECTIVES: &[&str] = &["transform"];

/// Print `operation` followed by every fragment of `document` it reaches.
pub fn print_operation(document: &Document, operation: &OperationDefinition) -> String {
    let fragments: Vec<&Node<FragmentDefinition>> = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::FragmentDefinition(fragment) => Some(fragment),
            _ => None,
        })
        .collect();

    let mut printer = Printer::default();
    printer.operation(operation);
    for fragment in reachable_fragments(&operation.selection_set, &fragments) {
        printer.fragment(fragment);
    }
    printer.out
}

/// Fragments spread from `selections`, directly or through other fragments,
/// in the order they are first reached.
pub(crate) fn reachable_fragments<'a>(
    selections: &[Selection],
    fragments: &[&'a Node<FragmentDefinition>],
) -> Vec<&'a Node<FragmentDefinition>> {
    let mut reached: Vec<&'a Node<FragmentDefinition>> = Vec::new();
    let mut pending: Vec<&[Selection]> = vec![selections];
    while let Some(selections) = pending.pop() {
        for selection in selections {
            match selection {
                Selection::Field(field) => pending.push(&field.selection_set),
                Selection::InlineFragment(inline) => pending.push(&inline.selection_set),
                Selection::FragmentSpread(spread) => {
                    if reached.iter().any(|f| f.name == spread.fragment_name) {
                        continue;
                    }
                    if let Some(fragment) =
                        fragments.iter().copied().find(|f| f.name == spread.fragment_name)
                    {
                        reached.push(fragment);
                        pending.push(&fragment.selection_set);
                    }
                }
            }
        }
    }
    reached
}

#[derive(Default)]
struct Printer {
    out: String,
    last_word: bool,
}

impl Printer {
    fn punct(&mut self, punct: &str) {
        self.out.push_str(punct);
        self.last_word = false;
    }

    fn spread(&mut self) {
        if self.last_word {
            self.out.push(' ');
        }
        self.punct("...");
    }

    fn word(&mut self, word: &str) {
        if self.last_word {
            self.out.push(' ');
        }
        self.out.push_str(word);
        self.last_word = true;
    }

    fn operation(&mut self, operation: &OperationDefinition) {
        let shorthand = operation.operation_type == OperationType::Query
            && operation.name.is_none()
            && operation.variables.is_empty()
            && operation.directives.is_empty();
        if !shorthand {
            self.word(match operation.operation_type {
                OperationType::Query => "query",
                OperationType::Mutation => "mutation",
                OperationType::Subscription => "subscription",
            });
            if let Some(name) = &operation.name {
                self.word(name.as_str());
            }
            if !operation.variables.is_empty() {
                self.punct("(");
                for variable in &operation.variables {
                    self.variable(variable);
                }
                self.punct(")");
            }
            self.directives(&operation.directives);
        }
        self.selection_set(&operation.selection_set);
    }

    fn fragment(&mut self, fragment: &FragmentDefinition) {
        self.word("fragment");
        self.word(fragment.name.as_str());
        self.word("on");
        self.word(fragment.type_condition.as_str());
        self.directives(&fragment.directives);
        self.selection_set(&fragment.selection_set);
    }

    fn variable(&mut self, variable: &VariableDefinition) {
        self.punct("$");
        self.word(variable.name.as_str());
        self.punct(":");
        self.ty(&variable.ty);
        if let Some(default) = &variable.default_value {
            self.punct("=");
            self.value(default);
        }
        self.directives(&variable.directives);
    }

    fn ty(&mut self, ty: &Type) {
        match ty {
            Type::Named(name) => self.word(name.as_str()),
            Type::NonNullNamed(name) => {
                self.word(name.as_str());
                self.punct("!");
            }
            Type::List(inner) => {
                self.punct("[");
                self.ty(inner);
                self.punct("]");
            }
            Type::NonNullList(inner) => {
                self.punct("[");
                self.ty(inner);
                self.punct("]!");
            }
        }
    }

    fn directives(&mut self, directives: &[Node<Directive>]) {
        for directive in directives {
            if STRIPPED_DIRECTIVES.contains(&directive.name.as_str()) {
                continue;
            }
            self.punct("@");
            self.word(directive.name.as_str());
            self.arguments(&directive.arguments);
        }
    }

    fn arguments(&mut self, arguments: &[Node<Argument>]) {
        if arguments.is_empty() {
            return;
        }
        self.punct("(");
        for argument in arguments {
            self.word(argument.name.as_str());
            self.punct(":");
            self.value(&argument.value);
        }
        self.punct(")");
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Null => self.word("null"),
            Value::Enum(name) => self.word(name.as_str()),
            Value::Variable(name) => {
                self.punct("$");
                self.word(name.as_str());
            }
            Value::String(s) => self.word(&quote(s.as_str())),
            Value::Float(f) => self.word(f.as_str()),
            Value::Int(i) => self.word(i.as_str()),
            Value::Boolean(b) => self.word(if *b { "true" } else { "false" }),
            Value::List(values) => {
                self.punct("[");
                for value in values {
                    self.value(value);
                }
                self.punct("]");
            }
            Value::Object(fields) => {
                self.punct("{");
                for (name, value) in fields {
                    self.word(name.as_str());
                    self.punct(":");
                    self.value(value);
                }
                self.punct("}");
            }
        }
    }

    fn selection_set(&mut self, selections: &[Selection]) {
        self.punct("{");
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    if let Some(alias) = &field.alias {
                        self.word(alias.as_str());
                        self.punct(":");
                    }
                    self.word(field.name.as_str());
                    self.arguments(&field.arguments);
                    self.directives(&field.directives);
                    if !field.selection_set.is_empty() {
                        self.selection_set(&field.selection_set);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    self.spread();
                    self.word(spread.fragment_name.as_str());
                    self.directives(&spread.directives);
                }
                Selection::InlineFragment(inline) => {
                    self.spread();
                    if let Some(condition) = &inline.type_condition {
                        self.word("on");
                        self.word(condition.as_str());
                    }
                    self.directives(&inline.directives);
                    self.selection_set(&inline.selection_set);
                }
            }
        }
        self.punct("}");
    }
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{8}' => quoted.push_str("\\b"),
            '\u{c}' => quoted.push_str("\\f"),
            c if c.is_control() => quoted.push_str(&format!("\\u{:04X}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
