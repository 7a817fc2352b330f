// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod bulk;
pub mod demo;
pub mod ids;
pub mod model;
pub mod selection;
pub mod state;

pub use bulk::*;
pub use demo::*;
pub use ids::*;
pub use model::*;
pub use selection::*;
pub use state::*;
