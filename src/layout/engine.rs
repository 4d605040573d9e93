//! Layout engine trait and the name-keyed registry.

use std::sync::LazyLock;

use tracing::{debug, warn};

use crate::graph::{Graph, fit_graph_bounds};
use crate::measure::GraphMetrics;

use super::grid::GridLayout;
use super::hierarchical::HierarchicalLayout;
use super::types::LayoutOptions;

/// Name of the engine used when none, or an unknown one, is requested.
pub const DEFAULT_ENGINE: &str = "dagre";

/// A stateless placement algorithm.
///
/// Implementations must give every node a finite position, keep node sizes,
/// avoid overlapping node rectangles and recompute bounds before returning.
pub trait LayoutEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn layout(&self, graph: Graph, options: &LayoutOptions) -> Graph;
}

static FALLBACK: HierarchicalLayout = HierarchicalLayout;

static BUILTIN: LazyLock<LayoutRegistry> = LazyLock::new(LayoutRegistry::default);

pub struct LayoutRegistry {
    engines: Vec<Box<dyn LayoutEngine>>,
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(HierarchicalLayout));
        registry.register(Box::new(GridLayout));
        registry
    }
}

impl LayoutRegistry {
    pub fn empty() -> Self {
        Self {
            engines: Vec::new(),
        }
    }

    /// Adds an engine, replacing any engine registered under the same name.
    pub fn register(&mut self, engine: Box<dyn LayoutEngine>) {
        match self.engines.iter_mut().find(|e| e.name() == engine.name()) {
            Some(slot) => *slot = engine,
            None => self.engines.push(engine),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn LayoutEngine> {
        self.engines
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    /// Looks up `name`, falling back to the default engine. Never fails.
    pub fn resolve(&self, name: Option<&str>) -> &dyn LayoutEngine {
        if let Some(engine) = name.and_then(|n| self.get(n)) {
            return engine;
        }
        if let Some(name) = name {
            warn!(engine = name, fallback = DEFAULT_ENGINE, "unknown layout engine");
        }
        let fallback: &dyn LayoutEngine = &FALLBACK;
        self.get(DEFAULT_ENGINE).unwrap_or(fallback)
    }

    /// Registered engine names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    pub fn layout(&self, graph: Graph, engine: Option<&str>, options: &LayoutOptions) -> Graph {
        self.layout_with_metrics(graph, engine, options, &GraphMetrics::default())
    }

    /// Lays out `graph`, then frames it with the group geometry in
    /// `metrics` so group frames start at the options' padding.
    pub fn layout_with_metrics(
        &self,
        graph: Graph,
        engine: Option<&str>,
        options: &LayoutOptions,
        metrics: &GraphMetrics,
    ) -> Graph {
        let engine = self.resolve(engine);
        let options = options.sanitized();
        let graph = engine.layout(graph, &options);
        let graph = fit_graph_bounds(graph, metrics, options.padding);
        debug!(
            engine = engine.name(),
            direction = %options.direction,
            nodes = graph.nodes.len(),
            "laid out graph"
        );
        graph
    }
}

/// Lays out `graph` with one of the built-in engines.
pub fn layout_graph(graph: Graph, engine: Option<&str>, options: &LayoutOptions) -> Graph {
    BUILTIN.layout(graph, engine, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphGroup, Point, Rect, Size, TableNode};

    fn node(id: &str, x: f64, y: f64) -> TableNode {
        TableNode {
            id: id.into(),
            name: id.into(),
            schema: None,
            alias: None,
            note: None,
            position: Point::new(x, y),
            size: Size {
                width: 100.0,
                height: 50.0,
            },
            columns: vec![],
            group: None,
            collapsed: false,
        }
    }

    struct Diagonal;

    impl LayoutEngine for Diagonal {
        fn name(&self) -> &'static str {
            "diagonal"
        }

        fn layout(&self, mut graph: Graph, _options: &LayoutOptions) -> Graph {
            let mut offset = 0.0;
            for node in &mut graph.nodes {
                node.position = Point::new(offset, offset);
                offset += node.size.width.max(node.size.height);
            }
            crate::graph::compute_graph_bounds(graph, None)
        }
    }

    struct NamedGrid;

    impl LayoutEngine for NamedGrid {
        fn name(&self) -> &'static str {
            "grid"
        }

        fn layout(&self, graph: Graph, _options: &LayoutOptions) -> Graph {
            graph
        }
    }

    #[test]
    fn test_default_names() {
        assert_eq!(LayoutRegistry::default().names(), vec!["dagre", "grid"]);
    }

    #[test]
    fn test_unknown_falls_back_to_dagre() {
        let registry = LayoutRegistry::default();
        assert_eq!(registry.resolve(Some("force")).name(), "dagre");
        assert_eq!(registry.resolve(None).name(), "dagre");
        assert_eq!(registry.resolve(Some("grid")).name(), "grid");
    }

    #[test]
    fn test_empty_registry_still_resolves() {
        let registry = LayoutRegistry::empty();
        assert!(registry.names().is_empty());
        assert_eq!(registry.resolve(Some("grid")).name(), "dagre");
    }

    #[test]
    fn test_register_custom_engine() {
        let mut registry = LayoutRegistry::default();
        registry.register(Box::new(Diagonal));
        assert_eq!(registry.names(), vec!["dagre", "grid", "diagonal"]);
        assert!(registry.get("diagonal").is_some());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = LayoutRegistry::default();
        registry.register(Box::new(NamedGrid));
        assert_eq!(registry.names(), vec!["dagre", "grid"]);
        // The replacement leaves positions alone; the registry only moves
        // the drawing to the padding corner.
        let graph = Graph {
            nodes: vec![node("a", 0.0, 0.0), node("b", 500.0, 0.0)],
            ..Graph::default()
        };
        let out = registry.layout(graph, Some("grid"), &LayoutOptions::default());
        assert_eq!(out.nodes[0].position, Point::new(50.0, 50.0));
        assert_eq!(out.nodes[1].position, Point::new(550.0, 50.0));
        assert_eq!(out.bounds.map(|b| (b.x, b.y)), Some((0.0, 0.0)));
    }

    #[test]
    fn test_group_metrics_shape_frames() {
        let graph = Graph {
            nodes: vec![node("a", 0.0, 0.0)],
            groups: vec![GraphGroup {
                id: "g".into(),
                name: "g".into(),
                node_ids: vec!["a".into()],
                bounds: None,
                collapsed: false,
                color: None,
            }],
            ..Graph::default()
        };
        let registry = LayoutRegistry::default();
        let options = LayoutOptions::default();
        let wide = GraphMetrics {
            group_padding: 100.0,
            group_header_height: 300.0,
            ..GraphMetrics::default()
        };
        let plain = registry.layout(graph.clone(), Some("grid"), &options);
        let framed = registry.layout_with_metrics(graph, Some("grid"), &options, &wide);
        assert_eq!(plain.groups[0].bounds, Some(Rect::new(50.0, 50.0, 140.0, 122.0)));
        assert_eq!(framed.groups[0].bounds, Some(Rect::new(50.0, 50.0, 300.0, 550.0)));
        assert_eq!(framed.nodes[0].position, Point::new(150.0, 450.0));
    }

    #[test]
    fn test_layout_graph_empty_for_all_engines() {
        for name in ["dagre", "grid", "nope"] {
            let g = layout_graph(Graph::default(), Some(name), &LayoutOptions::default());
            assert!(g.nodes.is_empty());
            assert_eq!(g.bounds, Some(Rect::default()));
        }
    }
}
