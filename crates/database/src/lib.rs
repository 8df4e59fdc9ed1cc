pub mod connection;
pub mod error;
pub mod factory;
pub mod model;

pub use connection::Database;
pub use error::{DatabaseError, Result};
pub use factory::PgConnectionFactory;
pub use model::SqlTableModel;
