use proptest::prelude::*;

use erdkit::lexer::{TokenKind, tokenize};
use erdkit::{build_graph, parse_dsl, print_dsl};

/// Lower-case identifiers that do not collide with DSL keywords.
fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,10}".prop_filter("not a keyword", |s| {
        !matches!(
            s.as_str(),
            "table" | "enum" | "ref" | "tablegroup" | "as" | "note" | "indexes"
        )
    })
}

fn column_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("int"),
        Just("varchar"),
        Just("text"),
        Just("timestamp"),
        Just("boolean"),
        Just("uuid"),
        Just("jsonb"),
    ]
}

/// Quoted default text, including call-like shapes such as `f(a) + g(b)`.
fn default_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z(),+'\\[\\] ]{0,12}",
        (ident(), ident(), ident()).prop_map(|(f, a, g)| format!("{f}({a}) + {g}({a})")),
        (ident(), ident()).prop_map(|(f, a)| format!("{f}({a}), pk")),
    ]
}

fn quoted(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn table_source() -> impl Strategy<Value = (String, String)> {
    (
        ident(),
        prop::collection::vec(
            (ident(), column_type(), any::<bool>(), prop::option::of(default_text())),
            0..6,
        ),
    )
        .prop_map(|(name, columns)| {
            let mut src = format!("Table {name} {{\n");
            for (col, ty, pk, default) in columns {
                let mut settings = Vec::new();
                if pk {
                    settings.push("pk".to_string());
                }
                if let Some(text) = default {
                    settings.push(format!("default: {}", quoted(&text)));
                }
                if settings.is_empty() {
                    src.push_str(&format!("  {col} {ty}\n"));
                } else {
                    src.push_str(&format!("  {col} {ty} [{}]\n", settings.join(", ")));
                }
            }
            src.push_str("}\n");
            (name, src)
        })
}

proptest! {
    /// The lexer is total and always ends with exactly one EOF token.
    #[test]
    fn lexer_never_panics(input in "\\PC{0,200}") {
        let tokens = tokenize(&input);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        prop_assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
    }

    /// Parsing may fail on arbitrary input but never panics.
    #[test]
    fn parser_never_panics(input in "\\PC{0,200}") {
        let _ = parse_dsl(&input);
    }

    /// Error positions are 1-based.
    #[test]
    fn parse_errors_have_positions(input in "[a-zA-Z{}\\[\\]:.<>\\- \n]{0,80}") {
        if let Err(e) = parse_dsl(&input) {
            prop_assert!(e.line >= 1);
            prop_assert!(e.column >= 1);
        }
    }

    /// One graph node per table statement.
    #[test]
    fn generated_tables_build(tables in prop::collection::vec(table_source(), 0..5)) {
        let source: String = tables.iter().map(|(_, src)| src.as_str()).collect();
        let schema = parse_dsl(&source);
        prop_assert!(schema.is_ok(), "failed to parse:\n{}", source);
        let schema = schema.unwrap();
        prop_assert_eq!(schema.tables.len(), tables.len());
        prop_assert_eq!(build_graph(&schema).nodes.len(), tables.len());
    }

    /// Printing then reparsing yields the same schema.
    #[test]
    fn print_round_trip(tables in prop::collection::vec(table_source(), 1..4)) {
        let source: String = tables.iter().map(|(_, src)| src.as_str()).collect();
        let schema = parse_dsl(&source).unwrap();
        let printed = print_dsl(&schema);
        let reparsed = parse_dsl(&printed);
        prop_assert!(reparsed.is_ok(), "reparse failed:\n{}", printed);
        prop_assert_eq!(reparsed.unwrap(), schema);
    }
}
