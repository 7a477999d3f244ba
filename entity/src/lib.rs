//! SeaORM entities for the org directory schema.

pub mod department;
pub mod employee;
