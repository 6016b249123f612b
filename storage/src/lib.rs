mod connections;

pub use connections::{ConnectionStore, SavedConnection};
