//! SeaORM queries implementing the wastage record store.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr};

use crate::entity::wastage::{self, ActiveModel, Entity as Wastage};
use crate::error::{AppError, AppResult};
use crate::models::{NewWastage, WastageUpdate};

use super::{DbPool, WastageStore};

#[async_trait]
impl WastageStore for DbPool {
    async fn find_by_challan_id(&self, challan_id: &str) -> AppResult<Option<wastage::Model>> {
        let result = Wastage::find()
            .filter(wastage::Column::ChallanId.eq(challan_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find wastage by challan: {}", e)))?;

        Ok(result)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<wastage::Model>> {
        let result = Wastage::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find wastage {}: {}", id, e)))?;

        Ok(result)
    }

    async fn list_all(&self) -> AppResult<Vec<wastage::Model>> {
        let result = Wastage::find()
            .order_by_desc(wastage::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list wastages: {}", e)))?;

        Ok(result)
    }

    async fn insert(&self, record: NewWastage) -> AppResult<wastage::Model> {
        let model = ActiveModel {
            id: NotSet,
            challan_id: Set(record.challan_id.clone()),
            party_name: Set(record.party_name),
            vehicle_no: Set(record.vehicle_no),
            date: Set(record.date),
            mou_report: Set(serde_json::to_value(&record.mou_report)?),
            image_urls: Set(serde_json::to_value(&record.image_urls)?),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        match model.insert(self.connection()).await {
            Ok(inserted) => Ok(inserted),
            // The unique constraint is the tie-breaker for concurrent
            // first-time submissions of the same challan.
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(AppError::Conflict(format!(
                    "A wastage entry already exists for challan {}",
                    record.challan_id
                ))),
                _ => Err(AppError::Database(format!(
                    "Failed to insert wastage: {}",
                    e
                ))),
            },
        }
    }

    async fn update(&self, record: WastageUpdate) -> AppResult<wastage::Model> {
        let model = ActiveModel {
            id: Set(record.id),
            challan_id: NotSet,
            party_name: Set(record.party_name),
            vehicle_no: Set(record.vehicle_no),
            date: Set(record.date),
            mou_report: Set(serde_json::to_value(&record.mou_report)?),
            image_urls: Set(serde_json::to_value(&record.image_urls)?),
            created_at: NotSet,
            updated_at: Set(Some(Utc::now())),
        };

        let updated = model
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update wastage: {}", e)))?;

        Ok(updated)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = Wastage::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete wastage {}: {}", id, e)))?;

        Ok(result.rows_affected > 0)
    }
}
