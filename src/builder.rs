use std::collections::HashSet;

use tracing::debug;

use crate::graph::{ColumnNode, Edge, EdgeEndpoint, Graph, GraphGroup, Point, Size, TableNode};
use crate::measure::GraphMetrics;
use crate::schema::{DatabaseSchema, Relation, RelationEndpoint, Table};

/// Turns a [`DatabaseSchema`] into an unpositioned [`Graph`].
///
/// Total over any schema, valid or not: relations naming missing tables
/// still produce edges, pointing at node ids that do not exist.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    metrics: GraphMetrics,
}

impl GraphBuilder {
    pub fn new(metrics: GraphMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &GraphMetrics {
        &self.metrics
    }

    pub fn build(&self, schema: &DatabaseSchema) -> Graph {
        // Only the referencing (`from`) side of a relation is a foreign key.
        let fk_columns: HashSet<String> = schema
            .relations
            .iter()
            .map(|r| r.from.to_string())
            .collect();

        let mut nodes: Vec<TableNode> = schema
            .tables
            .iter()
            .map(|t| self.build_node(t, &fk_columns))
            .collect();

        let edges: Vec<Edge> = schema.relations.iter().map(build_edge).collect();

        let groups: Vec<GraphGroup> = schema
            .table_groups
            .iter()
            .map(|g| GraphGroup {
                id: g.name.clone(),
                name: g.name.clone(),
                node_ids: g.tables.clone(),
                bounds: None,
                collapsed: false,
                color: None,
            })
            .collect();

        // A table listed in several groups keeps the last one.
        for group in &schema.table_groups {
            for node in nodes.iter_mut().filter(|n| group.tables.contains(&n.id)) {
                node.group = Some(group.name.clone());
            }
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            groups = groups.len(),
            "built graph"
        );

        Graph {
            nodes,
            edges,
            groups,
            notes: Vec::new(),
            bounds: None,
        }
    }

    fn build_node(&self, table: &Table, fk_columns: &HashSet<String>) -> TableNode {
        let columns = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let id = column_id(&table.name, &c.name);
                ColumnNode {
                    is_foreign_key: fk_columns.contains(&id),
                    id,
                    name: c.name.clone(),
                    column_type: c.column_type,
                    raw_type: c.raw_type.clone(),
                    settings: c.settings.clone(),
                    is_primary_key: c.settings.primary_key,
                    offset_y: self.metrics.column_offset(i),
                }
            })
            .collect();

        let (width, height) = self.metrics.node_size(table);

        TableNode {
            id: table.name.clone(),
            name: table.name.clone(),
            schema: table.schema.clone(),
            alias: table.alias.clone(),
            note: table.note.clone(),
            position: Point::default(),
            size: Size { width, height },
            columns,
            group: None,
            collapsed: false,
        }
    }
}

fn column_id(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}

fn endpoint(end: &RelationEndpoint) -> EdgeEndpoint {
    EdgeEndpoint {
        node_id: end.table.clone(),
        column_id: column_id(&end.table, &end.column),
    }
}

fn build_edge(relation: &Relation) -> Edge {
    Edge {
        id: relation.name.clone().unwrap_or_else(|| relation.key()),
        from: endpoint(&relation.from),
        to: endpoint(&relation.to),
        relation_type: relation.relation_type,
        points: Vec::new(),
    }
}

/// Builds a graph with the default [`GraphMetrics`].
pub fn build_graph(schema: &DatabaseSchema) -> Graph {
    GraphBuilder::default().build(schema)
}
