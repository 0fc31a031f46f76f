//! SeaORM migrations for the listings store
//!
//! Column types stay portable across SQLite, PostgreSQL and MySQL; ids and timestamps
//! use native types on PostgreSQL and text elsewhere.

use sea_orm_migration::prelude::*;

pub mod m20251019_000001_initial_schema;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20251019_000001_initial_schema::Migration)]
    }
}
