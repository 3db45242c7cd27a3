// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod catalog;
pub mod desk;
pub mod error;
pub mod filter;
pub mod ids;
pub mod model;
pub mod session;
pub mod store;
pub mod table;

pub use desk::*;
pub use error::*;
pub use filter::*;
pub use ids::*;
pub use model::*;
pub use session::*;
pub use store::*;
pub use table::*;
