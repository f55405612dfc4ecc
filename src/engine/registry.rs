// src/engine/registry.rs
//! Processor registry with enable/disable/blacklist policy.
//!
//! The registry is an explicit instance passed into the engine by
//! reference, never a process-global table, so independent conversions
//! (and parallel test runs) can carry independent processor sets.

use crate::model::MacroNode;
use crate::processors::MacroProcessor;
use std::sync::Arc;

/// Registration filtering policy, taken from configuration.
///
/// A blacklisted type is never registered. When an enabled-list is
/// configured, only listed types register. The disabled list always
/// wins over a conflicting enabled-list entry.
#[derive(Debug, Clone, Default)]
pub struct RegistrationPolicy {
    pub blacklist: Vec<String>,
    pub enabled: Option<Vec<String>>,
    pub disabled: Vec<String>,
}

impl RegistrationPolicy {
    /// Whether a macro type may be registered under this policy.
    pub fn permits(&self, macro_type: &str) -> bool {
        if self.blacklist.iter().any(|t| t == macro_type) {
            return false;
        }
        if self.disabled.iter().any(|t| t == macro_type) {
            return false;
        }
        if let Some(enabled) = &self.enabled {
            return enabled.iter().any(|t| t == macro_type);
        }
        true
    }
}

/// One active registration, owned exclusively by the registry.
#[derive(Clone)]
pub struct ProcessorRegistration {
    pub macro_type: String,
    pub processor: Arc<dyn MacroProcessor>,
    pub priority: i32,
    pub enabled: bool,
    /// Monotonic registration order, used to break priority ties.
    order: usize,
}

impl std::fmt::Debug for ProcessorRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistration")
            .field("macro_type", &self.macro_type)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("order", &self.order)
            .finish()
    }
}

/// Holds processor instances keyed by macro type.
///
/// The only lookup path processors are invoked through.
#[derive(Debug, Default)]
pub struct ProcessorRegistry {
    registrations: Vec<ProcessorRegistration>,
    policy: RegistrationPolicy,
    next_order: usize,
}

impl ProcessorRegistry {
    pub fn new(policy: RegistrationPolicy) -> Self {
        Self {
            registrations: Vec::new(),
            policy,
            next_order: 0,
        }
    }

    /// Register a processor under its declared type and priority.
    ///
    /// Rejected (a logged no-op) when the policy filters the type out.
    /// Re-registering an already-registered type replaces the previous
    /// registration: last write wins, so overriding a stock processor
    /// with a substitute is a single call.
    pub fn register(&mut self, processor: Arc<dyn MacroProcessor>) -> bool {
        let macro_type = processor.macro_type().to_string();
        if !self.policy.permits(&macro_type) {
            log::info!("Registration of macro type '{macro_type}' rejected by policy");
            return false;
        }

        if let Some(existing) = self
            .registrations
            .iter()
            .position(|r| r.macro_type == macro_type)
        {
            log::warn!("Macro type '{macro_type}' re-registered; replacing previous processor");
            self.registrations.remove(existing);
        }

        let registration = ProcessorRegistration {
            priority: processor.priority(),
            enabled: processor.enabled(),
            macro_type,
            processor,
            order: self.next_order,
        };
        self.next_order += 1;
        self.registrations.push(registration);
        true
    }

    /// Remove a registration; returns whether one existed.
    pub fn unregister(&mut self, macro_type: &str) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.macro_type != macro_type);
        self.registrations.len() != before
    }

    /// The active registration for a type, if any is enabled.
    pub fn get_processor(&self, macro_type: &str) -> Option<&ProcessorRegistration> {
        self.registrations
            .iter()
            .find(|r| r.macro_type == macro_type && r.enabled)
    }

    /// All enabled registrations, highest priority first; ties keep
    /// registration order (stable sort).
    pub fn processors_by_priority(&self) -> Vec<&ProcessorRegistration> {
        let mut ordered: Vec<&ProcessorRegistration> =
            self.registrations.iter().filter(|r| r.enabled).collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.order.cmp(&b.order)));
        ordered
    }

    /// Whether a macro type resolves to an active processor, reflecting
    /// post-filter availability rather than raw registration attempts.
    pub fn is_supported(&self, macro_type: &str) -> bool {
        self.get_processor(macro_type).is_some()
    }

    /// Resolve the processor for a discovered node.
    ///
    /// Exact type match first; otherwise the highest-priority processor
    /// whose `can_handle` claims the node.
    pub fn resolve(&self, node: &MacroNode) -> Option<&ProcessorRegistration> {
        if let Some(registration) = self.get_processor(&node.macro_type) {
            return Some(registration);
        }
        self.processors_by_priority()
            .into_iter()
            .find(|r| r.processor.can_handle(node))
    }
}
