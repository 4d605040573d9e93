//! Structural comparison of two schema versions.
//!
//! Tables and columns are keyed by name, relations by `from->to`. Entries
//! come in old-schema order, followed by anything only the new schema has.
//! Column comparison looks at display type, `pk` and `not null` only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{Column, DatabaseSchema, Relation, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAction {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl DiffAction {
    pub fn as_str(self) -> &'static str {
        match self {
            DiffAction::Added => "added",
            DiffAction::Removed => "removed",
            DiffAction::Modified => "modified",
            DiffAction::Unchanged => "unchanged",
        }
    }

    /// Symbol used in changelog output.
    pub fn marker(self) -> char {
        match self {
            DiffAction::Added => '+',
            DiffAction::Removed => '-',
            DiffAction::Modified => '~',
            DiffAction::Unchanged => ' ',
        }
    }
}

impl fmt::Display for DiffAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDiff {
    pub name: String,
    pub action: DiffAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDiff {
    pub name: String,
    pub action: DiffAction,
    pub columns: Vec<ColumnDiff>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDiff {
    pub key: String,
    pub action: DiffAction,
}

/// Table counts per action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub tables: Vec<TableDiff>,
    pub relations: Vec<RelationDiff>,
}

impl SchemaDiff {
    pub fn has_changes(&self) -> bool {
        self.tables.iter().any(|t| t.action != DiffAction::Unchanged)
            || self
                .relations
                .iter()
                .any(|r| r.action != DiffAction::Unchanged)
    }

    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for table in &self.tables {
            match table.action {
                DiffAction::Added => summary.added += 1,
                DiffAction::Removed => summary.removed += 1,
                DiffAction::Modified => summary.modified += 1,
                DiffAction::Unchanged => {}
            }
        }
        summary
    }
}

pub fn diff_schemas(old: &DatabaseSchema, new: &DatabaseSchema) -> SchemaDiff {
    let mut tables = Vec::new();

    for old_table in &old.tables {
        let diff = match new.table(&old_table.name) {
            Some(new_table) => diff_table(old_table, new_table),
            None => whole_table(old_table, DiffAction::Removed),
        };
        tables.push(diff);
    }
    for new_table in &new.tables {
        if old.table(&new_table.name).is_none() {
            tables.push(whole_table(new_table, DiffAction::Added));
        }
    }

    SchemaDiff {
        tables,
        relations: diff_relations(&old.relations, &new.relations),
    }
}

fn whole_table(table: &Table, action: DiffAction) -> TableDiff {
    let columns = table
        .columns
        .iter()
        .map(|c| {
            let ty = Some(c.display_type().to_string());
            let (old_type, new_type) = match action {
                DiffAction::Removed => (ty, None),
                _ => (None, ty),
            };
            ColumnDiff {
                name: c.name.clone(),
                action,
                old_type,
                new_type,
            }
        })
        .collect();

    TableDiff {
        name: table.name.clone(),
        action,
        columns,
    }
}

fn column_changed(old: &Column, new: &Column) -> bool {
    old.display_type() != new.display_type()
        || old.settings.primary_key != new.settings.primary_key
        || old.settings.not_null != new.settings.not_null
}

fn diff_table(old: &Table, new: &Table) -> TableDiff {
    let mut columns = Vec::new();

    for old_col in &old.columns {
        let diff = match new.column(&old_col.name) {
            Some(new_col) => ColumnDiff {
                name: old_col.name.clone(),
                action: if column_changed(old_col, new_col) {
                    DiffAction::Modified
                } else {
                    DiffAction::Unchanged
                },
                old_type: Some(old_col.display_type().to_string()),
                new_type: Some(new_col.display_type().to_string()),
            },
            None => ColumnDiff {
                name: old_col.name.clone(),
                action: DiffAction::Removed,
                old_type: Some(old_col.display_type().to_string()),
                new_type: None,
            },
        };
        columns.push(diff);
    }
    for new_col in &new.columns {
        if old.column(&new_col.name).is_none() {
            columns.push(ColumnDiff {
                name: new_col.name.clone(),
                action: DiffAction::Added,
                old_type: None,
                new_type: Some(new_col.display_type().to_string()),
            });
        }
    }

    let action = if columns.iter().any(|c| c.action != DiffAction::Unchanged) {
        DiffAction::Modified
    } else {
        DiffAction::Unchanged
    };

    TableDiff {
        name: new.name.clone(),
        action,
        columns,
    }
}

fn diff_relations(old: &[Relation], new: &[Relation]) -> Vec<RelationDiff> {
    let find = |list: &[Relation], key: &str| list.iter().find(|r| r.key() == key).cloned();
    let mut out = Vec::new();

    for relation in old {
        let key = relation.key();
        let action = match find(new, &key) {
            Some(other) if other.relation_type != relation.relation_type => DiffAction::Modified,
            Some(_) => DiffAction::Unchanged,
            None => DiffAction::Removed,
        };
        out.push(RelationDiff { key, action });
    }
    for relation in new {
        let key = relation.key();
        if find(old, &key).is_none() {
            out.push(RelationDiff {
                key,
                action: DiffAction::Added,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_dsl;

    fn diff(old: &str, new: &str) -> SchemaDiff {
        diff_schemas(&parse_dsl(old).unwrap(), &parse_dsl(new).unwrap())
    }

    #[test]
    fn test_identical_schemas() {
        let src = "Table users {\n id int [pk]\n email varchar\n}\nTable posts { id int [pk] }\nRef: posts.id > users.id";
        let d = diff(src, src);
        assert!(!d.has_changes());
        assert_eq!(d.summary(), DiffSummary::default());
        assert!(d.tables.iter().all(|t| t.action == DiffAction::Unchanged));
    }

    #[test]
    fn test_added_and_removed_tables() {
        let d = diff("Table a { id int }", "Table b { id int }");
        assert_eq!(d.tables.len(), 2);
        assert_eq!((d.tables[0].name.as_str(), d.tables[0].action), ("a", DiffAction::Removed));
        assert_eq!((d.tables[1].name.as_str(), d.tables[1].action), ("b", DiffAction::Added));
        assert_eq!(d.tables[0].columns[0].old_type.as_deref(), Some("int"));
        assert_eq!(d.tables[1].columns[0].new_type.as_deref(), Some("int"));
        assert_eq!(
            d.summary(),
            DiffSummary {
                added: 1,
                removed: 1,
                modified: 0
            }
        );
    }

    #[test]
    fn test_type_change_modifies_column_and_table() {
        let d = diff("Table a { id int name varchar }", "Table a { id int name text }");
        let table = &d.tables[0];
        assert_eq!(table.action, DiffAction::Modified);
        assert_eq!(table.columns[0].action, DiffAction::Unchanged);
        assert_eq!(table.columns[1].action, DiffAction::Modified);
        assert_eq!(table.columns[1].old_type.as_deref(), Some("varchar"));
        assert_eq!(table.columns[1].new_type.as_deref(), Some("text"));
    }

    #[test]
    fn test_raw_type_spelling_counts() {
        let d = diff("Table a { id int }", "Table a { id integer }");
        assert_eq!(d.tables[0].columns[0].action, DiffAction::Modified);
    }

    #[test]
    fn test_flag_changes() {
        let d = diff("Table a { id int }", "Table a { id int [pk] }");
        assert_eq!(d.tables[0].action, DiffAction::Modified);
        let d = diff("Table a { id int }", "Table a { id int [not null] }");
        assert_eq!(d.tables[0].action, DiffAction::Modified);
    }

    #[test]
    fn test_other_settings_ignored() {
        let d = diff(
            "Table a { id int [default: 1] }",
            "Table a { id int [default: 2, unique, note: 'x'] }",
        );
        assert!(!d.has_changes());
    }

    #[test]
    fn test_column_added_and_removed() {
        let d = diff("Table a { id int old int }", "Table a { id int new int }");
        let actions: Vec<_> = d.tables[0]
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("id", DiffAction::Unchanged),
                ("old", DiffAction::Removed),
                ("new", DiffAction::Added),
            ]
        );
    }

    #[test]
    fn test_relations() {
        let d = diff(
            "Ref: a.x > b.y\nRef: a.z > c.id",
            "Ref: a.x - b.y\nRef: d.w > e.v",
        );
        let rels: Vec<_> = d.relations.iter().map(|r| (r.key.as_str(), r.action)).collect();
        assert_eq!(
            rels,
            vec![
                ("a.x->b.y", DiffAction::Modified),
                ("a.z->c.id", DiffAction::Removed),
                ("d.w->e.v", DiffAction::Added),
            ]
        );
        assert!(d.has_changes());
        // Relations do not count towards the table summary.
        assert_eq!(d.summary(), DiffSummary::default());
    }

    #[test]
    fn test_json_actions() {
        let d = diff("Table a { id int }", "");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["tables"][0]["action"], "removed");
        assert_eq!(json["tables"][0]["columns"][0]["oldType"], "int");
    }
}
