//! Printer turning a [`DatabaseSchema`] back into DSL source.
//!
//! Output order: enums, tables, refs, table groups. Relations declared
//! inline with `ref:` come out as top-level `Ref` lines, which parse back to
//! the same relation list.

use crate::parser::is_bare_default;
use crate::schema::{Column, DatabaseSchema, DbEnum, DefaultValue, Index, Relation, Table, TableGroup};

const INDENT: &str = "  ";

/// Print a schema as DSL source.
pub fn print_dsl(schema: &DatabaseSchema) -> String {
    let mut output = String::new();

    for e in &schema.enums {
        separate(&mut output);
        print_enum(&mut output, e);
    }

    for table in &schema.tables {
        separate(&mut output);
        print_table(&mut output, table);
    }

    if !schema.relations.is_empty() {
        separate(&mut output);
        for relation in &schema.relations {
            print_relation(&mut output, relation);
        }
    }

    for group in &schema.table_groups {
        separate(&mut output);
        print_table_group(&mut output, group);
    }

    output
}

/// Blank line between top-level blocks.
fn separate(output: &mut String) {
    if !output.is_empty() {
        output.push('\n');
    }
}

fn print_enum(output: &mut String, e: &DbEnum) {
    output.push_str(&format!("Enum {} {{\n", e.name));
    for value in &e.values {
        output.push_str(INDENT);
        output.push_str(&word_or_string(&value.name));
        if let Some(note) = &value.note {
            output.push_str(&format!(" [note: {}]", quote(note)));
        }
        output.push('\n');
    }
    output.push_str("}\n");
}

fn print_table(output: &mut String, table: &Table) {
    output.push_str("Table ");
    if let Some(schema) = &table.schema {
        output.push_str(schema);
        output.push('.');
    }
    output.push_str(&table.name);
    if let Some(alias) = &table.alias {
        output.push_str(" as ");
        output.push_str(alias);
    }
    output.push_str(" {\n");

    for column in &table.columns {
        print_column(output, column);
    }

    let indexes: Vec<&Index> = table.indexes.iter().filter(|i| !i.columns.is_empty()).collect();
    if !indexes.is_empty() {
        output.push_str(INDENT);
        output.push_str("indexes {\n");
        for index in indexes {
            print_index(output, index);
        }
        output.push_str(INDENT);
        output.push_str("}\n");
    }

    if let Some(note) = &table.note {
        output.push_str(&format!("{INDENT}Note: {}\n", quote(note)));
    }

    output.push_str("}\n");
}

fn print_column(output: &mut String, column: &Column) {
    output.push_str(INDENT);
    output.push_str(&column.name);
    output.push(' ');
    output.push_str(column.display_type());

    let s = &column.settings;
    match (s.length, s.precision, s.scale) {
        (_, Some(p), Some(scale)) => output.push_str(&format!("({p}, {scale})")),
        (Some(len), _, _) => output.push_str(&format!("({len})")),
        _ => {}
    }

    let mut settings = Vec::new();
    if s.primary_key {
        settings.push("pk".to_string());
    }
    if s.auto_increment {
        settings.push("increment".to_string());
    }
    if s.unique {
        settings.push("unique".to_string());
    }
    if s.not_null {
        settings.push("not null".to_string());
    }
    if let Some(default) = &s.default {
        settings.push(format!("default: {}", default_literal(default)));
    }
    if let Some(note) = &s.note {
        settings.push(format!("note: {}", quote(note)));
    }

    if !settings.is_empty() {
        output.push_str(" [");
        output.push_str(&settings.join(", "));
        output.push(']');
    }
    output.push('\n');
}

fn print_index(output: &mut String, index: &Index) {
    output.push_str(INDENT);
    output.push_str(INDENT);
    if index.columns.len() == 1 {
        output.push_str(&index.columns[0]);
    } else {
        output.push('(');
        output.push_str(&index.columns.join(", "));
        output.push(')');
    }

    let mut settings = Vec::new();
    if index.unique {
        settings.push("unique".to_string());
    }
    if let Some(name) = &index.name {
        settings.push(format!("name: {}", quote(name)));
    }
    if let Some(ty) = &index.index_type {
        settings.push(format!("type: {}", word_or_string(ty)));
    }
    if !settings.is_empty() {
        output.push_str(" [");
        output.push_str(&settings.join(", "));
        output.push(']');
    }
    output.push('\n');
}

fn print_relation(output: &mut String, relation: &Relation) {
    output.push_str("Ref");
    if let Some(name) = &relation.name {
        output.push(' ');
        output.push_str(name);
    }
    output.push_str(&format!(
        ": {} {} {}\n",
        relation.from,
        relation.relation_type.operator(),
        relation.to
    ));
}

fn print_table_group(output: &mut String, group: &TableGroup) {
    output.push_str(&format!("TableGroup {} {{\n", group.name));
    for table in &group.tables {
        output.push_str(INDENT);
        output.push_str(table);
        output.push('\n');
    }
    output.push_str("}\n");
}

fn default_literal(value: &DefaultValue) -> String {
    match value {
        DefaultValue::String(s) if is_call(s) => s.clone(),
        DefaultValue::String(s) => quote(s),
        other => other.to_string(),
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `now()`, `nextval('seq')`: a single call that parses back unchanged
/// without quotes. Anything else, `f(a) + g(b)` included, is quoted.
fn is_call(s: &str) -> bool {
    s.ends_with(')') && is_bare_default(s)
}

fn word_or_string(s: &str) -> String {
    if is_ident(s) { s.to_string() } else { quote(s) }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}
