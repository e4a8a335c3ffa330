//! Wastage entity for SeaORM.
//!
//! One row per inward challan; challan_id carries a unique constraint which
//! is the basis for the create-vs-update decision.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wastages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Business key, unique across all records, immutable after creation.
    #[sea_orm(unique)]
    pub challan_id: String,

    pub party_name: String,
    pub vehicle_no: String,
    pub date: DateTimeUtc,

    /// Ordered decimal array; replaced wholesale on update.
    #[sea_orm(column_type = "JsonBinary")]
    pub mou_report: JsonValue,
    /// Ordered array of relative image URLs; appended to on update.
    #[sea_orm(column_type = "JsonBinary")]
    pub image_urls: JsonValue,

    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
