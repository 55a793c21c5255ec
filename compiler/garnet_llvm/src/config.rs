//! Codegen configuration.

/// Environment variable that dumps the finished module's IR to stderr.
pub const DEBUG_IR_ENV: &str = "GARNET_DEBUG_LLVM";

/// Knobs for one compilation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenConfig {
    /// Name of the emitted LLVM module.
    pub module_name: String,
    /// Priority of every `llvm.global_ctors` entry.
    pub ctor_priority: u32,
    /// Run the LLVM verifier in `CompilerState::finish`.
    pub verify: bool,
    /// Print the module IR to stderr in `CompilerState::finish`.
    pub dump_ir: bool,
}

impl CodegenConfig {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            ..Self::default()
        }
    }

    /// Defaults for `module_name`, with IR dumping enabled when
    /// `GARNET_DEBUG_LLVM` is set to a non-empty value.
    pub fn from_env(module_name: impl Into<String>) -> Self {
        let dump_ir = std::env::var(DEBUG_IR_ENV).is_ok_and(|v| !v.is_empty());
        Self {
            dump_ir,
            ..Self::new(module_name)
        }
    }

    #[must_use]
    pub fn with_ctor_priority(mut self, priority: u32) -> Self {
        self.ctor_priority = priority;
        self
    }

    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            module_name: "garnet_module".to_string(),
            ctor_priority: 0,
            verify: true,
            dump_ir: false,
        }
    }
}
