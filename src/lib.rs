pub mod builder;
pub mod config;
pub mod diff;
pub mod graph;
pub mod layout;
pub mod lexer;
pub mod measure;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod validator;

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

pub use builder::{GraphBuilder, build_graph};
pub use config::{Config, ConfigError};
pub use diff::{DiffAction, SchemaDiff, diff_schemas};
pub use graph::{Graph, compute_graph_bounds, fit_graph_bounds};
pub use layout::{Direction, LayoutEngine, LayoutOptions, LayoutRegistry, layout_graph};
pub use parser::{ParserError, parse_dsl};
pub use printer::print_dsl;
pub use schema::DatabaseSchema;
pub use validator::{ValidationResult, validate_schema};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| js_sys::Error::new(&e.to_string()).into())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_sys::Error::new(&e.to_string()).into())
}

/// A JS `Error` with `line`, `column` and `value` properties for editor markers.
fn parser_error_to_js(e: ParserError) -> JsValue {
    let err = js_sys::Error::new(&e.message);
    let _ = js_sys::Reflect::set(&err, &"line".into(), &JsValue::from(e.line as u32));
    let _ = js_sys::Reflect::set(&err, &"column".into(), &JsValue::from(e.column as u32));
    if let Some(value) = &e.value {
        let _ = js_sys::Reflect::set(&err, &"value".into(), &JsValue::from_str(value));
    }
    err.into()
}

/// Parse DSL source to schema JSON
#[wasm_bindgen(js_name = "parseDsl")]
pub fn parse_dsl_json(input: &str) -> Result<String, JsValue> {
    let schema = parse_dsl(input).map_err(parser_error_to_js)?;
    to_json(&schema)
}

#[wasm_bindgen(js_name = "validateSchema")]
pub fn validate_schema_json(schema: &str) -> Result<String, JsValue> {
    let schema: DatabaseSchema = from_json(schema)?;
    to_json(&validate_schema(&schema))
}

#[wasm_bindgen(js_name = "buildGraph")]
pub fn build_graph_json(schema: &str) -> Result<String, JsValue> {
    let schema: DatabaseSchema = from_json(schema)?;
    to_json(&build_graph(&schema))
}

/// Lay out graph JSON. Unknown or missing engine names use the layered engine.
#[wasm_bindgen(js_name = "layoutGraph")]
pub fn layout_graph_json(
    graph: &str,
    engine: Option<String>,
    options: Option<String>,
) -> Result<String, JsValue> {
    let graph: Graph = from_json(graph)?;
    let options: LayoutOptions = match options.as_deref() {
        Some(json) => from_json(json)?,
        None => LayoutOptions::default(),
    };
    to_json(&layout_graph(graph, engine.as_deref(), &options))
}

#[wasm_bindgen(js_name = "layoutEngines")]
pub fn layout_engines_json() -> Result<String, JsValue> {
    to_json(&LayoutRegistry::default().names())
}

#[wasm_bindgen(js_name = "computeGraphBounds")]
pub fn compute_graph_bounds_json(graph: &str, padding: Option<f64>) -> Result<String, JsValue> {
    let graph: Graph = from_json(graph)?;
    to_json(&compute_graph_bounds(graph, padding))
}

#[wasm_bindgen(js_name = "diffSchemas")]
pub fn diff_schemas_json(old: &str, new: &str) -> Result<String, JsValue> {
    let old: DatabaseSchema = from_json(old)?;
    let new: DatabaseSchema = from_json(new)?;
    to_json(&diff_schemas(&old, &new))
}

#[wasm_bindgen(js_name = "printDsl")]
pub fn print_dsl_json(schema: &str) -> Result<String, JsValue> {
    let schema: DatabaseSchema = from_json(schema)?;
    Ok(print_dsl(&schema))
}
