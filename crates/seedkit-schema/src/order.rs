//! Foreign-key dependency ordering.

use std::collections::HashMap;

use seedkit_core::ModelRef;

/// Order models so that referenced tables come before the tables that
/// reference them.
///
/// Depth-first over the input order, so unrelated models keep their
/// relative order. References to tables outside the list are ignored; self
/// references and cycles are broken at the first revisit. Create tables in
/// the returned order and drop them in reverse.
pub fn sort_models(models: &[ModelRef]) -> Vec<ModelRef> {
    let by_table: HashMap<&str, usize> = models
        .iter()
        .enumerate()
        .map(|(i, m)| (m.table_name, i))
        .collect();

    let mut state = vec![Mark::Unvisited; models.len()];
    let mut ordered = Vec::with_capacity(models.len());

    for index in 0..models.len() {
        visit(index, models, &by_table, &mut state, &mut ordered);
    }

    ordered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

fn visit(
    index: usize,
    models: &[ModelRef],
    by_table: &HashMap<&str, usize>,
    state: &mut [Mark],
    ordered: &mut Vec<ModelRef>,
) {
    if state[index] != Mark::Unvisited {
        return;
    }
    state[index] = Mark::InProgress;

    for field in models[index].fields {
        if let Some((table, _)) = field.foreign_key_target() {
            if let Some(&dep) = by_table.get(table) {
                if state[dep] == Mark::InProgress {
                    tracing::trace!(
                        from = models[index].table_name,
                        to = table,
                        "foreign key cycle, keeping input order"
                    );
                }
                visit(dep, models, by_table, state, ordered);
            }
        }
    }

    state[index] = Mark::Done;
    ordered.push(models[index].clone());
}
