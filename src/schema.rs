//! Canonical, renderer-independent schema model.
//!
//! Every schema source (the DSL parser, importers, hand edits) converges on
//! [`DatabaseSchema`]. Referential integrity is not enforced here; see
//! [`crate::validator`].

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSchema {
    pub tables: Vec<Table>,
    pub relations: Vec<Relation>,
    pub enums: Vec<DbEnum>,
    pub table_groups: Vec<TableGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DatabaseSchema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_type: Option<String>,
    #[serde(default)]
    pub settings: ColumnSettings,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            raw_type: None,
            settings: ColumnSettings::default(),
        }
    }

    /// The type as a user wrote it, falling back to the logical type.
    pub fn display_type(&self) -> &str {
        self.raw_type
            .as_deref()
            .unwrap_or_else(|| self.column_type.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Bigint,
    Smallint,
    Float,
    Double,
    Decimal,
    Varchar,
    Char,
    Text,
    Boolean,
    Date,
    Datetime,
    Timestamp,
    Time,
    Uuid,
    Json,
    Blob,
    Enum,
    #[default]
    Unknown,
}

impl ColumnType {
    /// Case-insensitive lookup of a DSL type name.
    pub fn from_type_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "int" | "integer" | "int4" | "mediumint" | "serial" => Self::Int,
            "bigint" | "int8" | "bigserial" => Self::Bigint,
            "smallint" | "int2" | "tinyint" | "smallserial" => Self::Smallint,
            "float" | "float4" | "real" => Self::Float,
            "double" | "float8" => Self::Double,
            "decimal" | "numeric" | "money" => Self::Decimal,
            "varchar" | "nvarchar" | "string" => Self::Varchar,
            "char" | "character" | "nchar" => Self::Char,
            "text" | "tinytext" | "mediumtext" | "longtext" => Self::Text,
            "boolean" | "bool" | "bit" => Self::Boolean,
            "date" => Self::Date,
            "datetime" | "datetime2" => Self::Datetime,
            "timestamp" | "timestamptz" => Self::Timestamp,
            "time" | "timetz" => Self::Time,
            "uuid" | "guid" | "uniqueidentifier" => Self::Uuid,
            "json" | "jsonb" => Self::Json,
            "blob" | "binary" | "varbinary" | "bytea" | "longblob" => Self::Blob,
            "enum" => Self::Enum,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bigint => "bigint",
            Self::Smallint => "smallint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Varchar => "varchar",
            Self::Char => "char",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Time => "time",
            Self::Uuid => "uuid",
            Self::Json => "json",
            Self::Blob => "blob",
            Self::Enum => "enum",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSettings {
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub not_null: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_increment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A column default. A JSON `null` default deserializes as "no default".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Null,
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Null => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub index_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub from: RelationEndpoint,
    pub to: RelationEndpoint,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
}

impl Relation {
    /// `"{fromTable}.{fromCol}->{toTable}.{toCol}"`, the identity used for
    /// unnamed edges and for diffing.
    pub fn key(&self) -> String {
        format!("{}->{}", self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationEndpoint {
    pub table: String,
    pub column: String,
}

impl RelationEndpoint {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for RelationEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationType {
    /// DSL operator spelling.
    pub fn operator(self) -> &'static str {
        match self {
            Self::OneToOne => "-",
            Self::OneToMany => "<",
            Self::ManyToOne => ">",
            Self::ManyToMany => "<>",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToOne => "many-to-one",
            Self::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbEnum {
    pub name: String,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Nominal grouping of table names as written in the DSL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableGroup {
    pub name: String,
    pub tables: Vec<String>,
}
