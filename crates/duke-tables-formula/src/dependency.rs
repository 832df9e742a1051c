//! Dependency tracking between formula columns

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use duke_tables_core::Column;
use tracing::debug;

use crate::error::{FormulaError, FormulaResult};
use crate::parser::parse_stored_formula;
use crate::resolver::find_column;

/// Dependency graph for formula columns, keyed by column ID
///
/// Tracks which columns each column references.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Column → columns it references (precedents)
    precedents: HashMap<String, HashSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of references between the formula columns of a table.
    ///
    /// Only references to other formula columns are edges. A stored formula
    /// that does not parse contributes nothing.
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = &'a Column>, all: &[Column]) -> Self {
        let mut graph = Self::new();

        for column in columns {
            let Some(tree) = column.formula_text().and_then(|f| parse_stored_formula(f).ok())
            else {
                continue;
            };
            for ident in tree.column_refs() {
                let referenced = find_column(all, &ident.name).filter(|c| c.is_formula());
                if let Some(referenced) = referenced {
                    graph.add_dependency(&referenced.id, &column.id);
                }
            }
        }

        graph
    }

    /// Add a dependency: `dependent` references `precedent`
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(precedent.to_string());
    }

    /// Get columns that the given column references
    pub fn get_precedents(&self, id: &str) -> impl Iterator<Item = &str> + '_ {
        self.precedents
            .get(id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Number of columns that reference at least one other column
    pub fn source_count(&self) -> usize {
        self.precedents.values().filter(|p| !p.is_empty()).count()
    }

    /// Columns on a reference cycle, or referenced from one, sorted by ID.
    ///
    /// Kahn's algorithm: repeatedly remove columns nothing references any
    /// more. Referencing columns that are never removed are reported.
    pub fn cyclic_columns(&self) -> Vec<&str> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for (id, precedents) in &self.precedents {
            in_degree.entry(id.as_str()).or_insert(0);
            for precedent in precedents {
                *in_degree.entry(precedent.as_str()).or_insert(0) += 1;
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut resolved = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if self.precedents.get(id).is_some_and(|p| !p.is_empty()) {
                resolved.insert(id);
            }
            for precedent in self.get_precedents(id) {
                if let Some(degree) = in_degree.get_mut(precedent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(precedent);
                    }
                }
            }
        }

        self.precedents
            .iter()
            .filter(|(id, p)| !p.is_empty() && !resolved.contains(id.as_str()))
            .map(|(id, _)| id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Check that saving `target` with a reference to the formula column
/// `referenced` would not close a loop between the formula columns of
/// `columns`.
pub fn check_circular_reference(
    target: &Column,
    referenced: &Column,
    columns: &[Column],
) -> FormulaResult<()> {
    let others = columns.iter().filter(|c| c.id != target.id && c.is_formula());
    let mut graph = DependencyGraph::from_columns(others, columns);
    graph.add_dependency(&referenced.id, &target.id);

    debug!(
        target = %target.id,
        sources = graph.source_count(),
        "checking formula references for cycles"
    );

    match graph.cyclic_columns().first() {
        Some(id) => Err(FormulaError::CircularReference(id.to_string())),
        None => Ok(()),
    }
}
