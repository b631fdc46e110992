//! Dependency ordering for field definitions.

use std::collections::{HashMap, VecDeque};

use crate::core::types::FieldDefinition;
use crate::error::GraphError;

/// Order fields so every field comes after all of its dependencies.
///
/// Kahn's algorithm over edges `dependency -> dependent`. Fields that become
/// ready at the same time keep their relative order from `fields`. Returns
/// references into `fields`; nothing is cloned.
///
/// Fails with [`GraphError::DependencyNotFound`] before sorting if any
/// dependency is not defined, and with [`GraphError::Cycle`] naming the fields
/// left unsorted when the graph is cyclic.
pub fn sort_fields(fields: &[FieldDefinition]) -> Result<Vec<&FieldDefinition>, GraphError> {
    let index: HashMap<&str, usize> = fields
        .iter()
        .enumerate()
        .map(|(idx, field)| (field.id(), idx))
        .collect();

    let mut in_degree = vec![0usize; fields.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); fields.len()];

    for (idx, field) in fields.iter().enumerate() {
        for dep in field.dependencies() {
            let Some(&dep_idx) = index.get(dep.as_str()) else {
                return Err(GraphError::DependencyNotFound {
                    field: field.id().to_string(),
                    dependency: dep.clone(),
                });
            };
            dependents[dep_idx].push(idx);
            in_degree[idx] += 1;
        }
    }

    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(idx, _)| idx)
        .collect();
    let mut sorted = Vec::with_capacity(fields.len());

    while let Some(idx) = queue.pop_front() {
        sorted.push(&fields[idx]);
        for &dependent in &dependents[idx] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if sorted.len() != fields.len() {
        let stuck = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(idx, _)| fields[idx].id().to_string())
            .collect();
        return Err(GraphError::Cycle { fields: stuck });
    }

    Ok(sorted)
}
