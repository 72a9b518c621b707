// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod bind;
pub mod compiler;
pub mod config;
pub mod quote;

pub use bind::{lowercase_keys, to_arguments, SqlArg};
pub use compiler::{CompiledSql, SqlCompiler};
pub use config::{CompilerConfig, CompilerConfigBuilder, JsonFieldType};
pub use quote::{quote_ident, quote_qualified};
