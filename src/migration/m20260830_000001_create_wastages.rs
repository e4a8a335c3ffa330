//! Migration: Create wastages table.
//!
//! The unique constraint on challan_id is the tie-breaker for concurrent
//! first-time submissions of the same challan.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE wastages (
                    id SERIAL PRIMARY KEY,
                    challan_id VARCHAR(100) NOT NULL UNIQUE,
                    party_name VARCHAR(200) NOT NULL,
                    vehicle_no VARCHAR(50) NOT NULL,
                    date TIMESTAMPTZ NOT NULL,

                    -- Ordered sequences stored as JSONB
                    mou_report JSONB NOT NULL DEFAULT '[]'::jsonb,
                    image_urls JSONB NOT NULL DEFAULT '[]'::jsonb,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ
                );

                -- Index for listing by creation date (newest first)
                CREATE INDEX idx_wastages_created_at ON wastages(created_at DESC);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS wastages CASCADE;")
            .await?;

        Ok(())
    }
}
