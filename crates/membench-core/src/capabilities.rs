//! Provider capability declarations and gating predicates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoreOperations {
    pub add_memory: bool,
    pub retrieve_memory: bool,
    pub delete_memory: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionalOperations {
    pub update_memory: bool,
    pub list_memories: bool,
    pub reset_scope: bool,
    pub get_capabilities: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemFlags {
    pub async_indexing: bool,
    pub convergence_wait_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntelligenceFlags {
    pub auto_extraction: bool,
    pub graph_support: bool,
}

/// A provider's declared capability set (spec.md 3).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderCapabilities {
    pub core_operations: CoreOperations,
    pub optional_operations: OptionalOperations,
    pub system_flags: SystemFlags,
    pub intelligence_flags: IntelligenceFlags,
}

impl ProviderCapabilities {
    /// A provider is valid iff all core operations are true.
    pub fn is_valid(&self) -> bool {
        self.core_operations.add_memory
            && self.core_operations.retrieve_memory
            && self.core_operations.delete_memory
    }

    /// Check whether a single capability name (as it appears in a
    /// benchmark's `required_capabilities`) is satisfied.
    pub fn satisfies(&self, capability: &str) -> bool {
        match capability {
            "add_memory" => self.core_operations.add_memory,
            "retrieve_memory" => self.core_operations.retrieve_memory,
            "delete_memory" => self.core_operations.delete_memory,
            "update_memory" => self.optional_operations.update_memory,
            "list_memories" => self.optional_operations.list_memories,
            "reset_scope" => self.optional_operations.reset_scope,
            "get_capabilities" => self.optional_operations.get_capabilities,
            "async_indexing" => self.system_flags.async_indexing,
            "auto_extraction" => self.intelligence_flags.auto_extraction,
            "graph_support" => self.intelligence_flags.graph_support,
            _ => false,
        }
    }

    /// Return the subset of `required` not satisfied by this capability set.
    pub fn missing(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|cap| !self.satisfies(cap))
            .cloned()
            .collect()
    }
}
