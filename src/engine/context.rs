// src/engine/context.rs
//! Immutable per-pass processing context.
//!
//! The context is the only state shared across recursive include
//! expansion, and it is shared by value: every descent builds a new
//! derived copy. The ancestor set is a persistent `im::HashSet`, so the
//! copy is cheap and sibling branches can never poison each other's
//! cycle checks.

use crate::constants::{DEFAULT_MACRO_TIMEOUT, MAX_INCLUDE_DEPTH};
use crate::types::{PageId, SpaceKey};
use std::time::Duration;
use uuid::Uuid;

/// Context for one document conversion pass.
///
/// One instance is created per top-level request; includes derive new
/// copies on descent (`descend_into`). Instances are never mutated.
#[derive(Debug, Clone)]
pub struct ProcessingContext {
    /// The page whose body is being converted.
    pub page_id: PageId,
    /// Space the page lives in, when known.
    pub space_key: Option<SpaceKey>,
    /// How many include expansions deep this pass is.
    pub recursion_depth: u8,
    /// Pages on the current include path (always contains `page_id`).
    ancestor_page_ids: im::HashSet<PageId>,
    /// Wall-clock budget per macro.
    pub timeout: Duration,
    /// Whether sibling macros may be dispatched concurrently.
    pub concurrency_enabled: bool,
    /// Correlates log lines and fallback records across one conversion.
    pub session_id: Uuid,
}

impl ProcessingContext {
    /// Root context for a top-level conversion of `page_id`'s body.
    pub fn new(page_id: PageId) -> Self {
        let ancestor_page_ids = im::HashSet::unit(page_id.clone());
        Self {
            page_id,
            space_key: None,
            recursion_depth: 0,
            ancestor_page_ids,
            timeout: DEFAULT_MACRO_TIMEOUT,
            concurrency_enabled: false,
            session_id: Uuid::new_v4(),
        }
    }

    pub fn with_space_key(mut self, space_key: SpaceKey) -> Self {
        self.space_key = Some(space_key);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, enabled: bool) -> Self {
        self.concurrency_enabled = enabled;
        self
    }

    /// Whether expanding `target` would revisit a page on this path.
    pub fn would_cycle(&self, target: &PageId) -> bool {
        self.ancestor_page_ids.contains(target)
    }

    /// Whether another include level would exceed the depth bound.
    pub fn depth_exhausted(&self, max_depth: u8) -> bool {
        self.recursion_depth >= max_depth.min(crate::constants::INCLUDE_DEPTH_CEILING)
    }

    /// Derive the context for recursing into an included page.
    ///
    /// The copy carries `recursion_depth + 1` and the ancestor set
    /// extended with the target; the original context is untouched, so
    /// a sibling include starting from the same parent sees the same
    /// unextended path.
    pub fn descend_into(&self, target: PageId) -> Self {
        let mut ancestors = self.ancestor_page_ids.clone();
        ancestors.insert(target.clone());
        Self {
            page_id: target,
            space_key: self.space_key.clone(),
            recursion_depth: self.recursion_depth.saturating_add(1),
            ancestor_page_ids: ancestors,
            timeout: self.timeout,
            concurrency_enabled: self.concurrency_enabled,
            session_id: self.session_id,
        }
    }

    /// Number of pages on the current include path (test visibility).
    pub fn ancestor_count(&self) -> usize {
        self.ancestor_page_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(id: &str) -> PageId {
        PageId::parse(id).unwrap()
    }

    #[test]
    fn root_context_contains_its_own_page() {
        let ctx = ProcessingContext::new(page("100"));
        assert!(ctx.would_cycle(&page("100")));
        assert!(!ctx.would_cycle(&page("200")));
    }

    #[test]
    fn descend_extends_path_and_depth() {
        let root = ProcessingContext::new(page("100"));
        let child = root.descend_into(page("200"));

        assert_eq!(child.recursion_depth, 1);
        assert_eq!(child.page_id, page("200"));
        assert!(child.would_cycle(&page("100")));
        assert!(child.would_cycle(&page("200")));
        assert_eq!(child.session_id, root.session_id);
    }

    #[test]
    fn sibling_branches_do_not_poison_each_other() {
        // A includes B and C; both B and C include D. Neither branch is
        // a cycle, and expanding D under B must not mark D visited for C.
        let root = ProcessingContext::new(page("A"));
        let via_b = root.descend_into(page("B"));
        let via_c = root.descend_into(page("C"));

        let b_d = via_b.descend_into(page("D"));
        assert!(b_d.would_cycle(&page("D")));

        // The C branch never saw B or D.
        assert!(!via_c.would_cycle(&page("B")));
        assert!(!via_c.would_cycle(&page("D")));
        assert_eq!(root.ancestor_count(), 1);
    }

    #[test]
    fn depth_bound_is_clamped_to_ceiling() {
        let mut ctx = ProcessingContext::new(page("A"));
        for i in 0..60 {
            ctx = ctx.descend_into(page(&format!("p{i}")));
        }
        // Even with an absurd configured bound, the ceiling holds.
        assert!(ctx.depth_exhausted(255));
    }
}
