//! Codegen module for layout scaffolding
//!
//! Generates the TypeScript helpers that sit next to a layout:
//! - `<Prefix>ViewBinding`: typed, by-id access to every resolvable view
//! - `<Prefix>ViewEvent` / `<Prefix>ViewEventHandler`: listener wiring to optional callbacks
//!   for every view whose element name matches an event rule
//! - `create<Prefix>ViewBindingAndEvent`: factory combining the two
//! - `<Name>BasePresenterWithViewAndEvent`: optional abstract presenter base
//!
//! Every module is assembled from named sections so each piece can be checked on its own.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;

use crate::config::{EventRuleConfig, EventSpec, TypeRef};
use crate::error::{GenError, Result};
use crate::flatten::{FlatNodeIndex, NodeRecord};
use crate::imports::{import_statement, ImportTable};

lazy_static! {
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^a-zA-Z0-9]+").unwrap();
}

const INDENT: &str = "    ";

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE ASSEMBLY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub text: String,
}

/// A generated module: deduplicated import statements followed by named sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub file_name: String,
    imports: Vec<String>,
    sections: Vec<Section>,
}

impl SourceFile {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            imports: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Returns false when the statement was already present.
    pub fn add_import(&mut self, statement: &str) -> bool {
        if self.imports.iter().any(|s| s == statement) {
            return false;
        }
        self.imports.push(statement.to_string());
        true
    }

    pub fn push_section(&mut self, name: &'static str, text: String) {
        self.sections.push(Section { name, text });
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.text.as_str())
    }

    pub fn render(&self) -> String {
        let mut blocks = Vec::new();
        if !self.imports.is_empty() {
            blocks.push(self.imports.join("\n"));
        }
        blocks.extend(self.sections.iter().map(|s| s.text.clone()));
        let mut out = blocks.join("\n\n");
        out.push('\n');
        out
    }
}

/// `header { members }` with one member per line.
fn block(header: &str, members: &[String]) -> String {
    let mut out = format!("{} {{\n", header);
    for member in members {
        out.push_str(member);
        out.push('\n');
    }
    out.push('}');
    out
}

fn indent(level: usize, line: &str) -> String {
    format!("{}{}", INDENT.repeat(level), line)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAMING
// ═══════════════════════════════════════════════════════════════════════════════

/// Non-alphanumeric runs split words; each word gets an upper-case first letter.
pub fn camel_case(input: &str, upper_first: bool) -> String {
    let joined: String = NON_ALPHANUMERIC
        .replace_all(input, " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();

    if upper_first {
        return joined;
    }
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Layout base name with its first letter upper-cased: `login` → `Login`.
pub fn file_prefix(base_name: &str) -> String {
    let mut chars = base_name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn handler_method_name(view_id: &str, handler_name: &str) -> String {
    format!(
        "handle{}{}",
        camel_case(view_id, true),
        camel_case(handler_name, true)
    )
}

/// Type and file names derived from one layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNames {
    pub prefix: String,
    pub binding: String,
    pub event: String,
    pub handler: String,
    pub view_and_handler: String,
    pub factory: String,
    pub presenter_base: String,
}

impl ModuleNames {
    pub fn for_layout(base_name: &str) -> Self {
        let prefix = file_prefix(base_name);
        let pascal: String = base_name
            .split(|c| c == '-' || c == '_')
            .map(file_prefix)
            .collect();
        Self {
            binding: format!("{}ViewBinding", prefix),
            event: format!("{}ViewEvent", prefix),
            handler: format!("{}ViewEventHandler", prefix),
            view_and_handler: format!("{}ViewAndEventHandler", prefix),
            factory: format!("create{}ViewBindingAndEvent", prefix),
            presenter_base: format!("{}BasePresenterWithViewAndEvent", pascal),
            prefix,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT RULES
// ═══════════════════════════════════════════════════════════════════════════════

/// Compiled element-name → events table.
#[derive(Debug, Clone)]
pub struct EventRules {
    rules: Vec<(Regex, Vec<EventSpec>)>,
}

impl EventRules {
    pub fn compile(configs: &[EventRuleConfig]) -> Result<Self> {
        let rules = configs
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.events.clone()))
                    .map_err(|source| GenError::Pattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Events of every rule whose pattern matches `view_type`, in table order.
    pub fn events_for(&self, view_type: &str) -> Vec<&EventSpec> {
        self.rules
            .iter()
            .filter(|(pattern, _)| pattern.is_match(view_type))
            .flat_map(|(_, events)| events.iter())
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATORS
// ═══════════════════════════════════════════════════════════════════════════════

pub struct CodegenInput<'a> {
    pub base_name: &'a str,
    pub index: &'a FlatNodeIndex,
    pub imports: &'a ImportTable,
    pub rules: &'a EventRules,
    pub root_container: &'a TypeRef,
    pub presenter_base_class: &'a TypeRef,
}

/// A view whose element name resolved to an import.
struct BoundView<'a> {
    record: &'a NodeRecord,
    import: &'a str,
}

/// Views are bound only when their type resolves.
fn bound_views<'a>(input: &CodegenInput<'a>) -> Vec<BoundView<'a>> {
    input
        .index
        .iter()
        .filter_map(|record| match input.imports.get(&record.tag) {
            Some(import) => Some(BoundView { record, import }),
            None => {
                log::debug!("no import for <{}> '{}', not bound", record.tag, record.id);
                None
            }
        })
        .collect()
}

fn type_import(imports: &ImportTable, type_ref: &TypeRef) -> String {
    imports
        .get(&type_ref.type_name)
        .map(str::to_string)
        .unwrap_or_else(|| import_statement(&type_ref.type_name, &type_ref.module))
}

fn param_list(event: &EventSpec) -> String {
    event
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

fn add_param_imports(file: &mut SourceFile, imports: &ImportTable, event: &EventSpec) {
    for param in &event.params {
        if let Some(statement) = imports.get(&param.ty) {
            file.add_import(statement);
        }
    }
}

pub fn generate_binding(input: &CodegenInput) -> SourceFile {
    let names = ModuleNames::for_layout(input.base_name);
    let container = &input.root_container.type_name;
    let mut file = SourceFile::new(format!("{}.ts", names.binding));

    file.add_import(&type_import(input.imports, input.root_container));

    let mut properties = Vec::new();
    let mut assignments = Vec::new();
    for view in bound_views(input) {
        let (id, ty) = (&view.record.id, &view.record.tag);
        file.add_import(view.import);
        properties.push(indent(1, &format!("public {}: {};", id, ty)));
        assignments.push(indent(
            2,
            &format!("this.{} = rootView.findViewById('{}') as {};", id, id, ty),
        ));
    }

    let mut members = properties;
    if !members.is_empty() {
        members.push(String::new());
    }
    members.push(indent(1, &format!("constructor(rootView: {}) {{", container)));
    members.extend(assignments);
    members.push(indent(1, "}"));

    file.push_section("class", block(&format!("class {}", names.binding), &members));
    file.push_section("export", format!("export = {};", names.binding));
    file
}

pub fn generate_event(input: &CodegenInput) -> SourceFile {
    let names = ModuleNames::for_layout(input.base_name);
    let mut file = SourceFile::new(format!("{}.ts", names.event));
    file.add_import(&import_statement(&names.binding, &format!("./{}", names.binding)));

    let mut methods = Vec::new();
    let mut listeners = Vec::new();
    for record in input.index.iter() {
        let id = &record.id;
        for event in input.rules.events_for(&record.tag) {
            let method = handler_method_name(id, &event.handler_name);
            add_param_imports(&mut file, input.imports, event);
            methods.push(indent(1, &format!("{}?({}): void;", method, param_list(event))));
            listeners.push(indent(
                2,
                &format!(
                    "this.viewBinding.{}.on('{}', this.eventHandler.{}?.bind(this.eventHandler));",
                    id, event.event_name, method
                ),
            ));
        }
    }

    file.push_section(
        "handler",
        block(&format!("export interface {}", names.handler), &methods),
    );

    let constructor = [
        indent(
            1,
            &format!(
                "constructor(viewBinding: {}, eventHandler: {}) {{",
                names.binding, names.handler
            ),
        ),
        indent(2, "this.viewBinding = viewBinding;"),
        indent(2, "this.eventHandler = eventHandler;"),
        indent(2, "this.attachListeners();"),
        indent(1, "}"),
    ];
    let mut members = vec![
        indent(1, &format!("private eventHandler: {};", names.handler)),
        String::new(),
        indent(1, &format!("private viewBinding: {};", names.binding)),
        String::new(),
    ];
    members.extend(constructor);
    members.push(String::new());
    members.push(indent(1, "private attachListeners(): void {"));
    members.extend(listeners);
    members.push(indent(1, "}"));

    file.push_section(
        "dispatcher",
        block(&format!("export class {}", names.event), &members),
    );
    file
}

pub fn generate_factory(input: &CodegenInput) -> SourceFile {
    let names = ModuleNames::for_layout(input.base_name);
    let container = &input.root_container.type_name;
    let mut file = SourceFile::new(format!("{}.ts", names.factory));

    file.add_import(&type_import(input.imports, input.root_container));
    file.add_import(&import_statement(&names.binding, &format!("./{}", names.binding)));
    file.add_import(&format!(
        "import {{ {}, {} }} from \"./{}\";",
        names.event, names.handler, names.event
    ));

    file.push_section(
        "interface",
        block(
            &format!("interface {} extends {}", names.view_and_handler, names.handler),
            &[indent(1, &format!("view: {};", container))],
        ),
    );
    file.push_section(
        "function",
        block(
            &format!(
                "function {}(viewAndEventHandler: {})",
                names.factory, names.view_and_handler
            ),
            &[
                indent(
                    1,
                    &format!(
                        "const viewBinding = new {}(viewAndEventHandler.view);",
                        names.binding
                    ),
                ),
                indent(
                    1,
                    &format!(
                        "const viewEvent = new {}(viewBinding, viewAndEventHandler);",
                        names.event
                    ),
                ),
                String::new(),
                indent(1, "return {"),
                indent(2, "viewBinding,"),
                indent(2, "viewEvent,"),
                indent(1, "};"),
            ],
        ),
    );
    file.push_section("export", format!("export = {};", names.factory));
    file
}

/// Abstract presenter with a protected field per bound view and an abstract
/// `on<Id><Handler>` hook per matched event, bound or not.
pub fn generate_presenter_base(input: &CodegenInput) -> SourceFile {
    let names = ModuleNames::for_layout(input.base_name);
    let mut file = SourceFile::new(format!("{}.ts", names.presenter_base));
    file.add_import(&type_import(input.imports, input.presenter_base_class));

    let mut members = Vec::new();
    for record in input.index.iter() {
        let id = &record.id;
        if let Some(import) = input.imports.get(&record.tag) {
            file.add_import(import);
            members.push(indent(1, &format!("protected {}: {};", id, record.tag)));
        }

        for event in input.rules.events_for(&record.tag) {
            add_param_imports(&mut file, input.imports, event);
            members.push(indent(
                1,
                &format!(
                    "protected abstract on{}{}({}): void;",
                    camel_case(id, true),
                    camel_case(&event.handler_name, true),
                    param_list(event)
                ),
            ));
        }
    }

    file.push_section(
        "class",
        block(
            &format!(
                "abstract class {} extends {}",
                names.presenter_base, input.presenter_base_class.type_name
            ),
            &members,
        ),
    );
    file.push_section("export", format!("export = {};", names.presenter_base));
    file
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTAX CHECK
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse `source` as a TypeScript module and return the syntax errors, if any.
pub fn check_typescript(source: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::default().with_typescript(true)).parse();
    ret.errors.iter().map(|e| e.to_string()).collect()
}
