pub mod surreal;

pub use surreal::SurrealStore;
