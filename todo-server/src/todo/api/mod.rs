use crate::todo::TodoStore;
use std::sync::Arc;

pub mod v1;

/// State shared by the todo API handlers.
#[derive(Clone)]
pub struct TodoState {
    pub store: Arc<dyn TodoStore>,
}

impl TodoState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}
