// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod aggregate;
pub mod budget;
pub mod editors;
pub mod error;
pub mod events;
pub mod grid;
pub mod model;
pub mod projection;
pub mod relational;
pub mod state;
pub mod store;
pub mod validation;

pub use aggregate::*;
pub use budget::*;
pub use editors::*;
pub use error::*;
pub use events::*;
pub use grid::*;
pub use model::*;
pub use projection::*;
pub use relational::*;
pub use state::*;
pub use store::*;
