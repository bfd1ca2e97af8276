//! Foreign-key dependency resolution.
//!
//! [`DependencyResolver`] turns the foreign-key graph above a start table
//! into a linear dump order in which every parent table precedes its
//! children. The traversal is a depth-first post-order walk driven by an
//! explicit stack, so long dependency chains cannot exhaust the call stack.
//!
//! # Cycles
//!
//! The graph is assumed to be acyclic. When it is not, the visited-set check
//! breaks the cycle at the first table that is revisited, and the resulting
//! order is not FK-safe for the tables on the cycle. [`CyclePolicy`] chooses
//! between tolerating that (with a warning) and failing with
//! [`DumpError::CycleDetected`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::MetadataAccessor;
use crate::error::{DumpError, Result};

/// What to do when the reachable FK graph contains a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Break the cycle silently (logged as a warning).
    #[default]
    Tolerate,
    /// Fail with `CycleDetected`.
    Error,
}

/// One pending table on the traversal stack.
struct Frame {
    table: String,
    parents: Vec<String>,
    next: usize,
}

impl Frame {
    fn advance(&mut self) -> Option<String> {
        let parent = self.parents.get(self.next).cloned();
        if parent.is_some() {
            self.next += 1;
        }
        parent
    }
}

/// Computes parent-first table orders.
///
/// The resolver holds configuration only; the visited set, stack and output
/// of a run live inside [`resolve`](Self::resolve), so one instance can be
/// reused for any number of runs.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    policy: CyclePolicy,
}

impl DependencyResolver {
    /// Create a resolver that tolerates cycles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cycle policy.
    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Get the cycle policy.
    pub fn cycle_policy(&self) -> CyclePolicy {
        self.policy
    }

    /// Resolve the dump order for `start_table`.
    ///
    /// Every table reachable from `start_table` through FK parent edges
    /// appears exactly once, parents before children, with `start_table`
    /// last. Parents are visited in the order `parents_of` returns them.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `start_table` or any reachable parent is not in the schema
    /// - `CycleDetected` if a cycle is found and the policy is `Error`
    pub fn resolve<M>(&self, start_table: &str, metadata: &M) -> Result<Vec<String>>
    where
        M: MetadataAccessor + ?Sized,
    {
        if !metadata.has_table(start_table) {
            return Err(DumpError::NotFound(start_table.to_string()));
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut order: Vec<String> = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();

        visited.insert(start_table.to_string());
        stack.push(Self::frame(start_table, metadata)?);

        while let Some(frame) = stack.last_mut() {
            let Some(parent) = frame.advance() else {
                if let Some(done) = stack.pop() {
                    debug!("Placed table {} at position {}", done.table, order.len());
                    order.push(done.table);
                }
                continue;
            };

            // Self-references order rows within one table, not tables.
            if parent == frame.table {
                continue;
            }

            if visited.contains(&parent) {
                if let Some(pos) = stack.iter().position(|f| f.table == parent) {
                    let mut path: Vec<String> =
                        stack[pos..].iter().map(|f| f.table.clone()).collect();
                    path.push(parent);
                    self.on_cycle(path)?;
                }
                continue;
            }

            if !metadata.has_table(&parent) {
                return Err(DumpError::NotFound(parent));
            }

            visited.insert(parent.clone());
            stack.push(Self::frame(&parent, metadata)?);
        }

        debug!(
            "Resolved {} tables for {}: {:?}",
            order.len(),
            start_table,
            order
        );
        Ok(order)
    }

    fn frame<M>(table: &str, metadata: &M) -> Result<Frame>
    where
        M: MetadataAccessor + ?Sized,
    {
        Ok(Frame {
            table: table.to_string(),
            parents: metadata.parents_of(table)?,
            next: 0,
        })
    }

    fn on_cycle(&self, path: Vec<String>) -> Result<()> {
        match self.policy {
            CyclePolicy::Error => Err(DumpError::CycleDetected { path }),
            CyclePolicy::Tolerate => {
                warn!(
                    "Foreign key cycle {} broken at {}; rows of these tables may not replay in FK-safe order",
                    path.join(" -> "),
                    path.last().map(String::as_str).unwrap_or_default()
                );
                Ok(())
            }
        }
    }
}
