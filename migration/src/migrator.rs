use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202510180001_create_users::Migration),
            Box::new(migrations::m202510180002_create_sessions::Migration),
            Box::new(migrations::m202510180003_create_attendance_marks::Migration),
            Box::new(migrations::m202510180004_add_user_password_hash::Migration),
        ]
    }
}
