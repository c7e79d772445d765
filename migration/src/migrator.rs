use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202509100001_create_users::Migration),
            Box::new(migrations::m202509100002_create_sessions::Migration),
            Box::new(migrations::m202509100003_create_attendance_records::Migration),
        ]
    }
}
