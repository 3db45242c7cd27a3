// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod http;
mod memory;

pub use http::{DEFAULT_TIMEOUT, HttpService};
pub use memory::{MemoryService, Operation};
