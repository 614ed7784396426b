//! Errors raised while reading and lowering a JSON netlist.

/// Problems with the netlist handed over by the front-end.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// The netlist file could not be read.
    #[error("failed to read netlist: {0}")]
    Io(#[from] std::io::Error),

    /// The netlist is not valid JSON for the expected schema.
    #[error("failed to parse netlist: {0}")]
    Json(#[from] serde_json::Error),

    /// The top module is not declared.
    #[error("top module '{0}' is not declared")]
    UnknownTop(String),

    /// An instance refers to an undeclared module.
    #[error("instance '{instance}' in '{parent}' refers to undeclared module '{module}'")]
    UnknownModule {
        /// Declaring module.
        parent: String,
        /// Instance name.
        instance: String,
        /// Missing module name.
        module: String,
    },

    /// A module name is declared twice.
    #[error("module '{0}' is declared more than once")]
    DuplicateModule(String),

    /// Two elements of one module share a name.
    #[error("'{name}' is declared more than once in module '{module}'")]
    DuplicateName {
        /// Declaring module.
        module: String,
        /// Repeated name.
        name: String,
    },

    /// A bus or external binding lacks a required role.
    #[error("bus binding '{owner}' has no net for required role '{role}'")]
    MissingBusRole {
        /// Bus or external module name.
        owner: String,
        /// Missing role.
        role: String,
    },

    /// A strobe names a register that does not exist.
    #[error("strobe '{strobe}' in module '{module}' targets unknown register '{target}'")]
    UnknownStrobeTarget {
        /// Declaring module.
        module: String,
        /// Strobe net.
        strobe: String,
        /// Named target.
        target: String,
    },

    /// A host-writable register is not a `reg`.
    #[error("net '{net}' in module '{module}' is not a reg and cannot be host-writable")]
    WriteToWire {
        /// Declaring module.
        module: String,
        /// Offending net.
        net: String,
    },

    /// An element declares a zero data width or depth.
    #[error("'{name}' in module '{module}' has zero width")]
    ZeroWidth {
        /// Declaring module.
        module: String,
        /// Offending element.
        name: String,
    },

    /// An address width too wide for the allocator.
    #[error("'{name}' in module '{module}' has address width {width}; at most {max} bits are supported")]
    AddressTooWide {
        /// Declaring module.
        module: String,
        /// Bus or external module.
        name: String,
        /// Requested address width.
        width: u32,
        /// Widest supported address.
        max: u32,
    },

    /// A strobe targets a register the host cannot access that way.
    #[error("{kind} strobe '{strobe}' in module '{module}' targets '{target}', which is not host-{access}")]
    StrobeAccess {
        /// Declaring module.
        module: String,
        /// Strobe net.
        strobe: String,
        /// Target register.
        target: String,
        /// `"write"` or `"read"`.
        kind: &'static str,
        /// `"writable"` or `"readable"`.
        access: &'static str,
    },

    /// A generate loop is malformed.
    #[error("generate loop of instance '{instance}' in '{module}': {reason}")]
    InvalidLoop {
        /// Declaring module.
        module: String,
        /// Replicated instance.
        instance: String,
        /// What is wrong.
        reason: String,
    },

    /// Loop bounds could not be reduced to an iteration count.
    #[error("cannot count iterations of {header} around instance '{instance}' in '{module}'; give an explicit count")]
    UnresolvedLoopBound {
        /// Declaring module.
        module: String,
        /// Replicated instance.
        instance: String,
        /// Rendered loop header.
        header: String,
    },

    /// A recognized construct the generator does not handle.
    #[error("unsupported: {0}")]
    FeatureUnsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_module() {
        let err = IrError::UnknownModule {
            parent: "top".into(),
            instance: "u_dsp".into(),
            module: "dsp".into(),
        };
        assert_eq!(
            err.to_string(),
            "instance 'u_dsp' in 'top' refers to undeclared module 'dsp'"
        );
    }

    #[test]
    fn display_unresolved_loop() {
        let err = IrError::UnresolvedLoopBound {
            module: "top".into(),
            instance: "u_chan".into(),
            header: "for (i=0; i<N; i=i+1)".into(),
        };
        assert!(err.to_string().starts_with("cannot count iterations of for (i=0"));
    }
}
