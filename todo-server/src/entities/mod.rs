//! SeaORM entities backing the todo store.

pub mod todo;
