use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use super::types::{Criterion, CriterionId};
use crate::scoring::{calculate_parent_score, round2};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("duplicate criterion id '{0}'")]
    DuplicateId(CriterionId),
    #[error("criterion '{child}' references unknown parent '{parent}'")]
    UnknownParent {
        child: CriterionId,
        parent: CriterionId,
    },
    #[error("criterion '{0}' is part of a parent cycle")]
    Cycle(CriterionId),
}

/// Criteria arranged by parent/child id references.
///
/// Nodes are indices into the flat criterion list; scores are never stored on
/// the tree and are recomputed by [`CriteriaTree::aggregate`].
#[derive(Debug, Clone)]
pub struct CriteriaTree {
    criteria: Vec<Criterion>,
    index: HashMap<CriterionId, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    /// Children before parents
    post_order: Vec<usize>,
}

/// A parent whose aggregated score exceeds its declared maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CeilingViolation {
    pub criterion_id: CriterionId,
    pub score: f64,
    pub max_score: f64,
}

impl CriteriaTree {
    pub fn build(criteria: &[Criterion]) -> Result<Self, TreeError> {
        let mut index = HashMap::with_capacity(criteria.len());
        for (i, criterion) in criteria.iter().enumerate() {
            if index.insert(criterion.id.clone(), i).is_some() {
                return Err(TreeError::DuplicateId(criterion.id.clone()));
            }
        }

        let mut children = vec![Vec::new(); criteria.len()];
        let mut roots = Vec::new();
        for (i, criterion) in criteria.iter().enumerate() {
            match &criterion.parent_id {
                Some(parent) => {
                    let parent_idx = *index.get(parent).ok_or_else(|| TreeError::UnknownParent {
                        child: criterion.id.clone(),
                        parent: parent.clone(),
                    })?;
                    children[parent_idx].push(i);
                }
                None => roots.push(i),
            }
        }

        let mut post_order = Vec::with_capacity(criteria.len());
        let mut visited = vec![false; criteria.len()];
        for &root in &roots {
            // Iterative DFS; (node, children_pushed)
            let mut stack = vec![(root, false)];
            while let Some((node, expanded)) = stack.pop() {
                if expanded {
                    post_order.push(node);
                    continue;
                }
                visited[node] = true;
                stack.push((node, true));
                for &child in children[node].iter().rev() {
                    stack.push((child, false));
                }
            }
        }

        // Anything not reachable from a root hangs off a cycle
        if let Some(i) = visited.iter().position(|seen| !seen) {
            return Err(TreeError::Cycle(criteria[i].id.clone()));
        }

        Ok(Self {
            criteria: criteria.to_vec(),
            index,
            children,
            roots,
            post_order,
        })
    }

    pub fn is_leaf(&self, id: &str) -> bool {
        self.index
            .get(id)
            .map(|&i| self.children[i].is_empty())
            .unwrap_or(false)
    }

    pub fn roots(&self) -> impl Iterator<Item = &Criterion> {
        self.roots.iter().map(move |&i| &self.criteria[i])
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria
            .iter()
            .enumerate()
            .filter(move |(i, _)| self.children[*i].is_empty())
            .map(|(_, c)| c)
    }

    /// Depth-first walk yielding each criterion with its depth, parents first.
    pub fn walk(&self) -> Vec<(usize, &Criterion)> {
        let mut out = Vec::with_capacity(self.criteria.len());
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            out.push((depth, &self.criteria[node]));
            for &child in self.children[node].iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Score every criterion: leaves take their own score (missing counts as
    /// zero), parents the rounded sum of their children.
    pub fn aggregate(&self, leaf_scores: &HashMap<CriterionId, f64>) -> HashMap<CriterionId, f64> {
        let mut computed = vec![0.0; self.criteria.len()];
        for &node in &self.post_order {
            computed[node] = if self.children[node].is_empty() {
                leaf_scores
                    .get(&self.criteria[node].id)
                    .copied()
                    .unwrap_or(0.0)
            } else {
                let child_scores: Vec<f64> =
                    self.children[node].iter().map(|&c| computed[c]).collect();
                calculate_parent_score(&child_scores)
            };
        }

        self.criteria
            .iter()
            .zip(computed)
            .map(|(criterion, score)| (criterion.id.clone(), score))
            .collect()
    }

    /// Sum of root scores.
    pub fn total(&self, scores: &HashMap<CriterionId, f64>) -> f64 {
        let sum: f64 = self
            .roots()
            .map(|root| scores.get(&root.id).copied().unwrap_or(0.0))
            .sum();
        round2(sum)
    }

    /// Parents whose aggregated score is above their declared `max_score`.
    /// Parents declaring no maximum (zero) are skipped.
    pub fn ceiling_violations(&self, scores: &HashMap<CriterionId, f64>) -> Vec<CeilingViolation> {
        self.walk()
            .into_iter()
            .filter(|(_, c)| !self.is_leaf(&c.id) && c.max_score > 0.0)
            .filter_map(|(_, c)| {
                let score = scores.get(&c.id).copied().unwrap_or(0.0);
                (score > c.max_score).then(|| CeilingViolation {
                    criterion_id: c.id.clone(),
                    score,
                    max_score: c.max_score,
                })
            })
            .collect()
    }
}
