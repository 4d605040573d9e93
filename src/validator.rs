//! Structural and referential checks over a [`DatabaseSchema`].
//!
//! Findings are accumulated, never thrown. Only `error` severity makes a
//! schema invalid.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{ColumnType, DatabaseSchema, RelationEndpoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Where a finding applies, as far as it can be pinned down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ValidationLocation>,
}

impl ValidationError {
    fn error(message: String, location: ValidationLocation) -> Self {
        Self {
            severity: Severity::Error,
            message,
            location: Some(location),
        }
    }

    fn warning(message: String, location: ValidationLocation) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            location: Some(location),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.severity == Severity::Warning)
    }
}

fn at_table(table: &str) -> ValidationLocation {
    ValidationLocation {
        table: Some(table.to_string()),
        column: None,
    }
}

fn at_column(table: &str, column: &str) -> ValidationLocation {
    ValidationLocation {
        table: Some(table.to_string()),
        column: Some(column.to_string()),
    }
}

pub fn validate_schema(schema: &DatabaseSchema) -> ValidationResult {
    let mut findings = Vec::new();

    let mut seen_tables: HashSet<&str> = HashSet::new();
    for table in &schema.tables {
        if !seen_tables.insert(table.name.as_str()) {
            findings.push(ValidationError::error(
                format!("Duplicate table name: {}", table.name),
                at_table(&table.name),
            ));
        }
    }

    let enum_names: HashSet<&str> = schema.enums.iter().map(|e| e.name.as_str()).collect();
    let mut table_columns: HashMap<&str, HashSet<&str>> = HashMap::new();

    for table in &schema.tables {
        let mut seen_columns: HashSet<&str> = HashSet::new();
        for column in &table.columns {
            if !seen_columns.insert(column.name.as_str()) {
                findings.push(ValidationError::error(
                    format!(
                        "Duplicate column name \"{}\" in table \"{}\"",
                        column.name, table.name
                    ),
                    at_column(&table.name, &column.name),
                ));
            }
        }

        if !table.columns.iter().any(|c| c.settings.primary_key) {
            findings.push(ValidationError::warning(
                format!("Table \"{}\" has no primary key", table.name),
                at_table(&table.name),
            ));
        }

        for column in &table.columns {
            if column.column_type != ColumnType::Enum || column.settings.enum_values.is_some() {
                continue;
            }
            let raw = column.display_type();
            if !enum_names.contains(raw) {
                findings.push(ValidationError::warning(
                    format!(
                        "Column \"{}.{}\" references undefined enum \"{}\"",
                        table.name, column.name, raw
                    ),
                    at_column(&table.name, &column.name),
                ));
            }
        }

        table_columns
            .entry(table.name.as_str())
            .or_default()
            .extend(seen_columns);
    }

    for relation in &schema.relations {
        for endpoint in [&relation.from, &relation.to] {
            check_endpoint(endpoint, &table_columns, &mut findings);
        }
    }

    for group in &schema.table_groups {
        for table in &group.tables {
            if !table_columns.contains_key(table.as_str()) {
                findings.push(ValidationError::warning(
                    format!(
                        "Table group \"{}\" references non-existent table: {}",
                        group.name, table
                    ),
                    at_table(table),
                ));
            }
        }
    }

    let valid = !findings.iter().any(|f| f.severity == Severity::Error);
    debug!(
        valid,
        findings = findings.len(),
        errors = findings.iter().filter(|f| f.severity == Severity::Error).count(),
        "validated schema"
    );

    ValidationResult {
        valid,
        errors: findings,
    }
}

fn check_endpoint(
    endpoint: &RelationEndpoint,
    table_columns: &HashMap<&str, HashSet<&str>>,
    findings: &mut Vec<ValidationError>,
) {
    match table_columns.get(endpoint.table.as_str()) {
        None => findings.push(ValidationError::error(
            format!(
                "Relation references non-existent table: {}",
                endpoint.table
            ),
            at_table(&endpoint.table),
        )),
        Some(columns) if !columns.contains(endpoint.column.as_str()) => {
            findings.push(ValidationError::error(
                format!("Relation references non-existent column: {endpoint}"),
                at_column(&endpoint.table, &endpoint.column),
            ))
        }
        Some(_) => {}
    }
}
