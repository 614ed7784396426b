//! The complete netlist handed to the hierarchy builder.

use crate::arena::Arena;
use crate::ids::ModuleId;
use crate::module::ModuleDecl;
use ghostbus_common::Ident;
use serde::{Deserialize, Serialize};

/// All module declarations plus the top of the instance tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    /// Module declarations keyed by [`ModuleId`].
    pub modules: Arena<ModuleId, ModuleDecl>,
    /// The top-level module.
    pub top: ModuleId,
}

impl Design {
    /// Returns the top-level module.
    pub fn top_module(&self) -> &ModuleDecl {
        &self.modules[self.top]
    }

    /// Finds a module by name.
    pub fn find(&self, name: Ident) -> Option<ModuleId> {
        self.modules
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| id)
    }

    /// Returns the number of module declarations.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}
