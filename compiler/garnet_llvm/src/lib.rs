//! LLVM payload layer for Garnet
//!
//! This crate lowers the semantic operations of compiled methods (read a
//! variable, test a value against a static type, fetch a constant, build a
//! stack frame, box a literal) into LLVM IR that calls the Garnet runtime
//! ABI. Repeated work that only depends on compile-time data (identifier
//! interning, frozen string literals, stack-frame descriptors) is hoisted
//! into module-load initializers and cached in global cells.
//!
//! # Debug Environment Variables
//!
//! - `GARNET_DEBUG_LLVM`: Print the finished module's IR to stderr (see
//!   [`CodegenConfig::from_env`]). Any non-empty value enables this.
//!
//! - `RUST_LOG=garnet_llvm=debug`: Cache-cell creation, method starts.
//!
//! - `RUST_LOG=garnet_llvm=trace`: Type tests, prologue steps, cached-load
//!   reuse (very verbose).
//!
//! # Architecture
//!
//! - **Context** (`context.rs`): `SimpleCx`, the LLVM module and basic types
//! - **Codegen plumbing** (`codegen/`): ID-based `IrBuilder`, runtime ABI
//!   declarations
//! - **Compilation context** (`state.rs`): `CompilerState`, owner of the
//!   builder, the runtime handles and the cache table
//! - **Global cache** (`cache.rs`): cells, initializers, `MethodEntry`
//! - **Payload helpers** (`payload.rs`): immediates, boxing, constants
//! - **Type tests** (`type_test.rs`)
//! - **Methods** (`method.rs`, `variables.rs`, `prologue.rs`): per-method
//!   storage, variable access, prologue
//!
//! # Example
//!
//! ```ignore
//! use garnet_llvm::{CodegenConfig, CompilerState, SimpleCx};
//! use inkwell::context::Context;
//!
//! let config = CodegenConfig::from_env("app");
//! let context = Context::create();
//! let scx = SimpleCx::new(&context, &config.module_name);
//! let mut state = CompilerState::new(&scx, &program, config);
//!
//! let mut method = state.begin_method(&shape);
//! state.set_stack_frame(&mut method);
//! state.check_arity(&method, ArgCount::Dynamic(method.args().argc));
//! // ... statement lowering ...
//! state.finish_method(&mut method);
//!
//! state.finish()?;
//! ```

// Crate-level lint configuration for codegen-specific patterns
#![allow(
    // LLVM uses u32 for indices and i32 for arity and line offsets
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    // Internal functions - panics are invariant violations
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
)]

pub mod cache;
pub mod codegen;
pub mod config;
pub mod context;
pub mod error;
pub mod ice;
pub mod method;
pub mod payload;
pub mod prologue;
pub mod state;
pub mod variables;

pub use cache::{CacheKey, CacheKind, GlobalCache, GlobalCell, MethodEntry};
pub use codegen::{BlockId, FunctionId, IrBuilder, LLVMTypeId, ValueId};
pub use config::CodegenConfig;
pub use context::SimpleCx;
pub use error::CodegenError;
pub use method::{MethodArgs, MethodContext, VariableStorage};
pub use prologue::{ArgCount, KeywordArgs};
pub use state::CompilerState;

#[cfg(test)]
mod tests;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
