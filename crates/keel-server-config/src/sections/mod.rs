// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

pub mod database;
pub mod logging;
pub mod query;
pub mod stores;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use query::{QueryConfig, QueryConfigLayer};
pub use stores::{StoreConfig, StoreConfigLayer};
