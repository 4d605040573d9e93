use tracing::debug;

use crate::lexer::{Token, TokenKind, tokenize};
use crate::schema::*;

/// The first syntax error in a document. Parsing is all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at line {line}, column {column}")]
pub struct ParserError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub value: Option<String>,
}

impl ParserError {
    fn at(token: &Token, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: token.line,
            column: token.column,
            value: (token.kind != TokenKind::Eof).then(|| token.value.clone()),
        }
    }
}

type Result<T> = std::result::Result<T, ParserError>;

/// Read position in a token stream. Productions take `&mut Cursor` so each
/// can be driven on its own.
pub struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    eof: Token,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        let eof = match tokens.last() {
            Some(t) => Token::new(TokenKind::Eof, "", t.line, t.column),
            None => Token::new(TokenKind::Eof, "", 1, 1),
        };
        Self {
            tokens,
            pos: 0,
            eof,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&self.eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_word(&self, word: &str) -> bool {
        let tok = self.peek();
        tok.kind.is_word() && tok.value.eq_ignore_ascii_case(word)
    }

    fn advance(&mut self) -> &Token {
        let tok = self.tokens.get(self.pos).unwrap_or(&self.eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.description()))
        }
    }

    fn expect_word(&mut self, what: &str) -> Result<String> {
        if self.peek().kind.is_word() {
            Ok(self.advance().value.clone())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        Ok(self.expect(TokenKind::String)?.value.clone())
    }

    fn unexpected(&self, expected: &str) -> ParserError {
        let tok = self.peek();
        let found = match tok.kind {
            TokenKind::Eof | TokenKind::Newline => tok.kind.description().to_string(),
            _ => format!("'{}'", tok.value),
        };
        ParserError::at(tok, format!("Expected {expected}, found {found}"))
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }
}

/// Parses DSL source into a [`DatabaseSchema`].
pub fn parse_dsl(input: &str) -> Result<DatabaseSchema> {
    let tokens = tokenize(input);
    let mut cur = Cursor::new(&tokens);
    let schema = parse_schema(&mut cur)?;
    debug!(
        tables = schema.tables.len(),
        relations = schema.relations.len(),
        enums = schema.enums.len(),
        groups = schema.table_groups.len(),
        "parsed schema"
    );
    Ok(schema)
}

/// schema := (table | enum | ref | tablegroup)*
pub fn parse_schema(cur: &mut Cursor<'_>) -> Result<DatabaseSchema> {
    let mut schema = DatabaseSchema::default();

    loop {
        cur.skip_newlines();
        if cur.at_end() {
            break;
        }
        match cur.peek().kind {
            TokenKind::Table => {
                let (table, refs) = parse_table(cur)?;
                schema.tables.push(table);
                schema.relations.extend(refs);
            }
            TokenKind::Enum => schema.enums.push(parse_enum(cur)?),
            TokenKind::Ref => schema.relations.push(parse_ref(cur)?),
            TokenKind::TableGroup => schema.table_groups.push(parse_table_group(cur)?),
            _ => {
                let tok = cur.peek();
                return Err(ParserError::at(
                    tok,
                    format!(
                        "Unexpected token '{}', expected Table, Enum, Ref or TableGroup",
                        tok.value
                    ),
                ));
            }
        }
    }

    resolve_enum_columns(&mut schema);
    Ok(schema)
}

/// Columns typed with a declared enum name become `enum` columns carrying
/// that enum's values. Enums may be declared after the tables using them.
fn resolve_enum_columns(schema: &mut DatabaseSchema) {
    let DatabaseSchema { tables, enums, .. } = schema;
    for column in tables.iter_mut().flat_map(|t| t.columns.iter_mut()) {
        let Some(raw) = column.raw_type.as_deref() else {
            continue;
        };
        if let Some(e) = enums.iter().find(|e| e.name == raw) {
            column.column_type = ColumnType::Enum;
            column.settings.enum_values = Some(e.values.iter().map(|v| v.name.clone()).collect());
        }
    }
}

/// table := "Table" IDENT ["." IDENT] ("as" IDENT)? "{" body "}"
///
/// Returns the table plus relations declared inline with `ref:` settings.
pub fn parse_table(cur: &mut Cursor<'_>) -> Result<(Table, Vec<Relation>)> {
    cur.expect(TokenKind::Table)?;
    let mut table = Table {
        name: cur.expect_word("table name")?,
        ..Table::default()
    };
    if cur.check(TokenKind::Dot) {
        cur.advance();
        let name = cur.expect_word("table name")?;
        table.schema = Some(std::mem::replace(&mut table.name, name));
    }
    if cur.check(TokenKind::As) {
        cur.advance();
        table.alias = Some(cur.expect_word("table alias")?);
    }
    cur.skip_newlines();
    cur.expect(TokenKind::LBrace)?;

    let mut refs = Vec::new();
    loop {
        cur.skip_newlines();
        match cur.peek().kind {
            TokenKind::RBrace => {
                cur.advance();
                break;
            }
            TokenKind::Eof => return Err(cur.unexpected("'}'")),
            TokenKind::Note if cur.peek_at(1).kind == TokenKind::Colon => {
                cur.advance();
                cur.advance();
                table.note = Some(cur.expect_string()?);
            }
            TokenKind::Indexes if cur.peek_at(1).kind == TokenKind::LBrace => {
                table.indexes = parse_indexes(cur)?;
            }
            kind if kind.is_word() && cur.peek_at(1).kind.is_word() => {
                let (column, inline) = parse_column(cur)?;
                refs.extend(inline.into_iter().map(|(relation_type, to)| Relation {
                    name: None,
                    from: RelationEndpoint::new(&table.name, &column.name),
                    to,
                    relation_type,
                }));
                table.columns.push(column);
            }
            // Lenient body: anything else is skipped one token at a time.
            _ => {
                cur.advance();
            }
        }
    }

    Ok((table, refs))
}

type InlineRef = (RelationType, RelationEndpoint);

/// column := IDENT IDENT ("(" NUMBER ("," NUMBER)? ")")? ("[" setting ("," setting)* "]")?
pub fn parse_column(cur: &mut Cursor<'_>) -> Result<(Column, Vec<InlineRef>)> {
    let name = cur.expect_word("column name")?;
    let raw_type = cur.expect_word("column type")?;
    let mut column = Column::new(name, ColumnType::from_type_name(&raw_type));
    column.raw_type = Some(raw_type);

    if cur.check(TokenKind::LParen) {
        cur.advance();
        let first = expect_u32(cur)?;
        if cur.check(TokenKind::Comma) {
            cur.advance();
            column.settings.precision = Some(first);
            column.settings.scale = Some(expect_u32(cur)?);
        } else {
            column.settings.length = Some(first);
        }
        cur.expect(TokenKind::RParen)?;
    }

    let mut refs = Vec::new();
    if cur.check(TokenKind::LBracket) {
        cur.advance();
        loop {
            parse_column_setting(cur, &mut column.settings, &mut refs)?;
            if cur.check(TokenKind::Comma) {
                cur.advance();
                continue;
            }
            cur.expect(TokenKind::RBracket)?;
            break;
        }
    }

    Ok((column, refs))
}

fn expect_u32(cur: &mut Cursor<'_>) -> Result<u32> {
    let tok = cur.expect(TokenKind::Number)?;
    tok.value
        .parse()
        .map_err(|_| ParserError::at(tok, format!("Invalid size '{}'", tok.value)))
}

fn parse_column_setting(
    cur: &mut Cursor<'_>,
    settings: &mut ColumnSettings,
    refs: &mut Vec<InlineRef>,
) -> Result<()> {
    let tok = cur.peek();
    if !tok.kind.is_word() {
        return Err(cur.unexpected("column setting"));
    }
    let word = tok.value.to_ascii_lowercase();
    cur.advance();

    match word.as_str() {
        "pk" | "primary" | "primary_key" => {
            settings.primary_key = true;
            // `primary key` spelled as two words
            if cur.check_word("key") {
                cur.advance();
            }
        }
        "unique" => settings.unique = true,
        "notnull" | "not_null" => settings.not_null = true,
        "not" => {
            if !cur.check_word("null") {
                return Err(cur.unexpected("'null'"));
            }
            cur.advance();
            settings.not_null = true;
        }
        "null" => settings.not_null = false,
        "increment" | "auto_increment" => settings.auto_increment = true,
        "default" => {
            if cur.check(TokenKind::Colon) {
                cur.advance();
                settings.default = Some(parse_default_value(cur)?);
            }
        }
        "note" => {
            cur.expect(TokenKind::Colon)?;
            settings.note = Some(cur.expect_string()?);
        }
        "ref" => {
            cur.expect(TokenKind::Colon)?;
            let relation_type = parse_relation_op(cur)?;
            refs.push((relation_type, parse_endpoint(cur)?));
        }
        // Unrecognized settings are tolerated, including `key: value` forms.
        _ => {
            if cur.check(TokenKind::Colon) {
                cur.advance();
                if !cur.check(TokenKind::Comma) && !cur.check(TokenKind::RBracket) {
                    cur.advance();
                }
            }
        }
    }
    Ok(())
}

fn parse_default_value(cur: &mut Cursor<'_>) -> Result<DefaultValue> {
    let tok = cur.peek().clone();
    match tok.kind {
        TokenKind::String => {
            cur.advance();
            Ok(DefaultValue::String(tok.value))
        }
        TokenKind::Number => {
            cur.advance();
            Ok(DefaultValue::Number(parse_number(&tok)?))
        }
        // A leading `-` lexes as the one-to-one operator.
        TokenKind::RelOneToOne if cur.peek_at(1).kind == TokenKind::Number => {
            cur.advance();
            let num = cur.advance().clone();
            Ok(DefaultValue::Number(-parse_number(&num)?))
        }
        kind if kind.is_word() => {
            cur.advance();
            match tok.value.as_str() {
                "null" | "NULL" => Ok(DefaultValue::Null),
                "true" | "TRUE" => Ok(DefaultValue::Boolean(true)),
                "false" | "FALSE" => Ok(DefaultValue::Boolean(false)),
                _ => {
                    let mut value = tok.value;
                    if cur.check(TokenKind::LParen) {
                        value.push_str(&parse_call_args(cur)?);
                    }
                    Ok(DefaultValue::String(value))
                }
            }
        }
        _ => Err(cur.unexpected("default value")),
    }
}

/// Whether `text` written unquoted after `default:` reads back as the same
/// string value, as `now()` and `nextval('seq')` do.
pub(crate) fn is_bare_default(text: &str) -> bool {
    let tokens = tokenize(text);
    let mut cur = Cursor::new(&tokens);
    match parse_default_value(&mut cur) {
        Ok(DefaultValue::String(value)) => value == text && cur.at_end(),
        _ => false,
    }
}

fn parse_number(tok: &Token) -> Result<f64> {
    tok.value
        .parse()
        .map_err(|_| ParserError::at(tok, format!("Invalid number '{}'", tok.value)))
}

/// Collects a bare function call suffix such as `()` in `now()`.
fn parse_call_args(cur: &mut Cursor<'_>) -> Result<String> {
    cur.expect(TokenKind::LParen)?;
    let mut args = String::from("(");
    loop {
        let tok = cur.peek().clone();
        match tok.kind {
            TokenKind::RParen => {
                cur.advance();
                break;
            }
            TokenKind::Eof | TokenKind::Newline | TokenKind::RBracket => {
                return Err(cur.unexpected("')'"));
            }
            TokenKind::Comma => {
                args.push_str(", ");
                cur.advance();
            }
            TokenKind::String => {
                args.push('\'');
                args.push_str(&tok.value);
                args.push('\'');
                cur.advance();
            }
            _ => {
                args.push_str(&tok.value);
                cur.advance();
            }
        }
    }
    args.push(')');
    Ok(args)
}

/// indexes := "indexes" "{" (entry NEWLINE)* "}"
/// entry   := (IDENT | "(" IDENT ("," IDENT)* ")") ("[" index_setting ("," index_setting)* "]")?
pub fn parse_indexes(cur: &mut Cursor<'_>) -> Result<Vec<Index>> {
    cur.expect(TokenKind::Indexes)?;
    cur.expect(TokenKind::LBrace)?;

    let mut indexes = Vec::new();
    loop {
        cur.skip_newlines();
        match cur.peek().kind {
            TokenKind::RBrace => {
                cur.advance();
                break;
            }
            TokenKind::Eof => return Err(cur.unexpected("'}'")),
            TokenKind::LParen => {
                cur.advance();
                let mut columns = vec![cur.expect_word("column name")?];
                while cur.check(TokenKind::Comma) {
                    cur.advance();
                    columns.push(cur.expect_word("column name")?);
                }
                cur.expect(TokenKind::RParen)?;
                indexes.push(parse_index_settings(cur, columns)?);
            }
            kind if kind.is_word() => {
                let column = cur.advance().value.clone();
                indexes.push(parse_index_settings(cur, vec![column])?);
            }
            _ => {
                cur.advance();
            }
        }
    }

    Ok(indexes)
}

fn parse_index_settings(cur: &mut Cursor<'_>, columns: Vec<String>) -> Result<Index> {
    let mut index = Index {
        columns,
        ..Index::default()
    };
    if !cur.check(TokenKind::LBracket) {
        return Ok(index);
    }
    cur.advance();
    loop {
        let key = cur.expect_word("index setting")?.to_ascii_lowercase();
        let value = if cur.check(TokenKind::Colon) {
            cur.advance();
            let tok = cur.peek();
            if tok.kind.is_word() || tok.kind == TokenKind::String {
                Some(cur.advance().value.clone())
            } else {
                return Err(cur.unexpected("index setting value"));
            }
        } else {
            None
        };
        match key.as_str() {
            "unique" | "pk" => index.unique = true,
            "name" => index.name = value,
            "type" => index.index_type = value,
            _ => {}
        }
        if cur.check(TokenKind::Comma) {
            cur.advance();
            continue;
        }
        cur.expect(TokenKind::RBracket)?;
        break;
    }
    Ok(index)
}

/// enum := "Enum" IDENT "{" (IDENT ("[" "note" ":" STRING "]")?)* "}"
pub fn parse_enum(cur: &mut Cursor<'_>) -> Result<DbEnum> {
    cur.expect(TokenKind::Enum)?;
    let name = cur.expect_word("enum name")?;
    cur.skip_newlines();
    cur.expect(TokenKind::LBrace)?;

    let mut values = Vec::new();
    loop {
        cur.skip_newlines();
        match cur.peek().kind {
            TokenKind::RBrace => {
                cur.advance();
                break;
            }
            kind if kind.is_word() || kind == TokenKind::String => {
                let mut value = EnumValue {
                    name: cur.advance().value.clone(),
                    note: None,
                };
                if cur.check(TokenKind::LBracket) {
                    cur.advance();
                    if !cur.check(TokenKind::Note) {
                        return Err(cur.unexpected("'note'"));
                    }
                    cur.advance();
                    cur.expect(TokenKind::Colon)?;
                    value.note = Some(cur.expect_string()?);
                    cur.expect(TokenKind::RBracket)?;
                }
                values.push(value);
            }
            _ => return Err(cur.unexpected("enum value or '}'")),
        }
    }

    Ok(DbEnum { name, values })
}

/// ref := "Ref" IDENT? ":" IDENT "." IDENT relOp IDENT "." IDENT
pub fn parse_ref(cur: &mut Cursor<'_>) -> Result<Relation> {
    cur.expect(TokenKind::Ref)?;
    let name = if cur.check(TokenKind::Colon) {
        None
    } else {
        Some(cur.expect_word("relation name or ':'")?)
    };
    cur.expect(TokenKind::Colon)?;
    let from = parse_endpoint(cur)?;
    let relation_type = parse_relation_op(cur)?;
    let to = parse_endpoint(cur)?;

    Ok(Relation {
        name,
        from,
        to,
        relation_type,
    })
}

fn parse_endpoint(cur: &mut Cursor<'_>) -> Result<RelationEndpoint> {
    let table = cur.expect_word("table name")?;
    cur.expect(TokenKind::Dot)?;
    let column = cur.expect_word("column name")?;
    Ok(RelationEndpoint { table, column })
}

fn parse_relation_op(cur: &mut Cursor<'_>) -> Result<RelationType> {
    let relation_type = match cur.peek().kind {
        TokenKind::RelOneToOne => RelationType::OneToOne,
        TokenKind::RelOneToMany => RelationType::OneToMany,
        TokenKind::RelManyToOne => RelationType::ManyToOne,
        TokenKind::RelManyToMany => RelationType::ManyToMany,
        _ => return Err(cur.unexpected("relation operator (-, <, >, <>)")),
    };
    cur.advance();
    Ok(relation_type)
}

/// tablegroup := "TableGroup" IDENT "{" IDENT* "}"
pub fn parse_table_group(cur: &mut Cursor<'_>) -> Result<TableGroup> {
    cur.expect(TokenKind::TableGroup)?;
    let name = cur.expect_word("group name")?;
    cur.skip_newlines();
    cur.expect(TokenKind::LBrace)?;

    let mut tables = Vec::new();
    loop {
        cur.skip_newlines();
        if cur.check(TokenKind::RBrace) {
            cur.advance();
            break;
        }
        tables.push(cur.expect_word("table name or '}'")?);
    }

    Ok(TableGroup { name, tables })
}
