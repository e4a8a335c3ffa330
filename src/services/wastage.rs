//! Wastage workflow: upsert-by-challan, image merge, MOU average, downstream
//! notification.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::db::WastageStore;
use crate::entity::wastage;
use crate::error::{AppError, AppResult};
use crate::models::wastage::{decimals_from_json, strings_from_json};
use crate::models::{NewWastage, UploadedImage, WastageInput, WastageUpdate};
use crate::services::inward_challan::MouNotifier;
use crate::services::storage::ImageStore;

/// Result of a create-or-update submission.
#[derive(Debug)]
pub struct UpsertOutcome {
    pub record: wastage::Model,
    pub mou_average: Option<Decimal>,
    pub is_update: bool,
}

/// Orchestrates the record store, image store, and downstream notifier.
pub struct WastageService {
    store: Arc<dyn WastageStore>,
    images: ImageStore,
    notifier: Arc<dyn MouNotifier>,
}

impl WastageService {
    pub fn new(
        store: Arc<dyn WastageStore>,
        images: ImageStore,
        notifier: Arc<dyn MouNotifier>,
    ) -> Self {
        Self {
            store,
            images,
            notifier,
        }
    }

    /// Create or update the wastage entry for `input.challan_id`.
    ///
    /// The local write is the atomicity boundary: the downstream notification
    /// runs only after a durable insert/update, and its failure never rolls
    /// the write back or fails the caller.
    pub async fn upsert(
        &self,
        input: WastageInput,
        images: Vec<UploadedImage>,
    ) -> AppResult<UpsertOutcome> {
        input.validate()?;

        let existing = self.store.find_by_challan_id(&input.challan_id).await?;

        let (record, is_update) = match existing {
            None => (self.create(&input, &images).await?, false),
            Some(current) => (self.apply_update(&input, current, &images).await?, true),
        };

        let mou_average = mou_average(&decimals_from_json(&record.mou_report));

        if let Some(average) = mou_average {
            let delivered = self
                .notifier
                .notify_average(&record.challan_id, average)
                .await;
            if delivered {
                info!(
                    "MOU average {} for challan {} forwarded to inward challan API",
                    average, record.challan_id
                );
            } else {
                warn!(
                    "MOU average for challan {} not delivered; keeping local write",
                    record.challan_id
                );
            }
        }

        info!(
            "Wastage {} for challan {}",
            if is_update { "updated" } else { "created" },
            record.challan_id
        );

        Ok(UpsertOutcome {
            record,
            mou_average,
            is_update,
        })
    }

    async fn create(
        &self,
        input: &WastageInput,
        images: &[UploadedImage],
    ) -> AppResult<wastage::Model> {
        if images.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one image is required for new wastage entries".to_string(),
            ));
        }

        let image_urls = self.images.save_images(images, &input.challan_id).await?;

        // A losing create race surfaces here as AppError::Conflict
        self.store
            .insert(NewWastage {
                challan_id: input.challan_id.clone(),
                party_name: input.party_name.clone(),
                vehicle_no: input.vehicle_no.clone(),
                date: input.date,
                mou_report: input.mou_report.clone(),
                image_urls,
            })
            .await
    }

    async fn apply_update(
        &self,
        input: &WastageInput,
        current: wastage::Model,
        images: &[UploadedImage],
    ) -> AppResult<wastage::Model> {
        // Existing images first, newly uploaded ones appended in order
        let mut image_urls = strings_from_json(&current.image_urls);
        if !images.is_empty() {
            let new_urls = self.images.save_images(images, &input.challan_id).await?;
            image_urls.extend(new_urls);
        }

        self.store
            .update(WastageUpdate {
                id: current.id,
                party_name: input.party_name.clone(),
                vehicle_no: input.vehicle_no.clone(),
                date: input.date,
                mou_report: input.mou_report.clone(),
                image_urls,
            })
            .await
    }

    pub async fn get_by_challan_id(&self, challan_id: &str) -> AppResult<wastage::Model> {
        self.store
            .find_by_challan_id(challan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Wastage for challan {}", challan_id)))
    }

    pub async fn list(&self) -> AppResult<Vec<wastage::Model>> {
        self.store.list_all().await
    }

    /// Delete a record together with its stored images.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Wastage {}", id)))?;

        self.images
            .delete_images(&strings_from_json(&record.image_urls))
            .await;

        self.store.delete(id).await?;
        info!("Wastage deleted: {}", id);

        Ok(())
    }
}

/// Arithmetic mean of the MOU report; absent when the report is empty.
pub fn mou_average(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().copied().sum();
    Some(sum / Decimal::from(values.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockWastageStore;
    use crate::services::inward_challan::MockMouNotifier;
    use chrono::Utc;
    use mockall::predicate::eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn input(challan_id: &str, mou_report: Vec<Decimal>) -> WastageInput {
        WastageInput {
            challan_id: challan_id.to_string(),
            party_name: "Acme Traders".to_string(),
            vehicle_no: "MH12AB1234".to_string(),
            date: Utc::now(),
            mou_report,
        }
    }

    fn jpg(name: &str) -> UploadedImage {
        UploadedImage {
            filename: name.to_string(),
            data: vec![0xFF, 0xD8, 0xFF],
        }
    }

    fn stored_model(id: i32, challan_id: &str, mou_report: serde_json::Value) -> wastage::Model {
        wastage::Model {
            id,
            challan_id: challan_id.to_string(),
            party_name: "Acme Traders".to_string(),
            vehicle_no: "MH12AB1234".to_string(),
            date: Utc::now(),
            mou_report,
            image_urls: json!(["/uploads/wastage/CH-1/existing.jpg"]),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn model_for_insert(record: &NewWastage) -> wastage::Model {
        wastage::Model {
            id: 1,
            challan_id: record.challan_id.clone(),
            party_name: record.party_name.clone(),
            vehicle_no: record.vehicle_no.clone(),
            date: record.date,
            mou_report: serde_json::to_value(&record.mou_report).unwrap(),
            image_urls: serde_json::to_value(&record.image_urls).unwrap(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn model_for_update(record: &WastageUpdate) -> wastage::Model {
        wastage::Model {
            id: record.id,
            challan_id: "CH-1".to_string(),
            party_name: record.party_name.clone(),
            vehicle_no: record.vehicle_no.clone(),
            date: record.date,
            mou_report: serde_json::to_value(&record.mou_report).unwrap(),
            image_urls: serde_json::to_value(&record.image_urls).unwrap(),
            created_at: Utc::now(),
            updated_at: Some(Utc::now()),
        }
    }

    fn service(
        store: MockWastageStore,
        notifier: MockMouNotifier,
        dir: &TempDir,
    ) -> WastageService {
        WastageService::new(
            Arc::new(store),
            ImageStore::new(dir.path()),
            Arc::new(notifier),
        )
    }

    #[actix_rt::test]
    async fn test_create_persists_and_notifies_average() {
        let dir = TempDir::new().unwrap();
        let mut store = MockWastageStore::new();
        store
            .expect_find_by_challan_id()
            .withf(|challan_id| challan_id == "CH-1")
            .returning(|_| Ok(None));
        store
            .expect_insert()
            .withf(|record: &NewWastage| {
                record.challan_id == "CH-1" && record.image_urls.len() == 1
            })
            .returning(|record| Ok(model_for_insert(&record)));

        let mut notifier = MockMouNotifier::new();
        notifier
            .expect_notify_average()
            .withf(|challan_id, average| challan_id == "CH-1" && *average == Decimal::from(20))
            .times(1)
            .returning(|_, _| true);

        let outcome = service(store, notifier, &dir)
            .upsert(
                input(
                    "CH-1",
                    vec![Decimal::from(10), Decimal::from(20), Decimal::from(30)],
                ),
                vec![jpg("a.jpg")],
            )
            .await
            .unwrap();

        assert!(!outcome.is_update);
        assert_eq!(outcome.mou_average, Some(Decimal::from(20)));
        assert_eq!(outcome.record.challan_id, "CH-1");
    }

    #[actix_rt::test]
    async fn test_create_without_images_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = MockWastageStore::new();
        store
            .expect_find_by_challan_id()
            .returning(|_| Ok(None));
        // No insert expectation: the store must not be written

        let result = service(store, MockMouNotifier::new(), &dir)
            .upsert(input("CH-1", vec![]), vec![])
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[actix_rt::test]
    async fn test_create_race_surfaces_conflict() {
        let dir = TempDir::new().unwrap();
        let mut store = MockWastageStore::new();
        store
            .expect_find_by_challan_id()
            .returning(|_| Ok(None));
        store
            .expect_insert()
            .returning(|record| {
                Err(AppError::Conflict(format!(
                    "A wastage entry already exists for challan {}",
                    record.challan_id
                )))
            });

        let result = service(store, MockMouNotifier::new(), &dir)
            .upsert(input("CH-1", vec![]), vec![jpg("a.jpg")])
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[actix_rt::test]
    async fn test_update_appends_new_images_after_existing() {
        let dir = TempDir::new().unwrap();
        let mut store = MockWastageStore::new();
        store
            .expect_find_by_challan_id()
            .withf(|challan_id| challan_id == "CH-1")
            .returning(|_| Ok(Some(stored_model(7, "CH-1", json!([1, 2])))));
        store
            .expect_update()
            .withf(|record: &WastageUpdate| {
                record.id == 7
                    && record.image_urls.len() == 2
                    && record.image_urls[0] == "/uploads/wastage/CH-1/existing.jpg"
                    && record.image_urls[1].starts_with("/uploads/wastage/CH-1/")
            })
            .returning(|record| Ok(model_for_update(&record)));

        let outcome = service(store, MockMouNotifier::new(), &dir)
            .upsert(input("CH-1", vec![]), vec![jpg("new.jpg")])
            .await
            .unwrap();

        assert!(outcome.is_update);
        assert_eq!(outcome.mou_average, None);
        assert!(outcome.record.updated_at.is_some());
    }

    #[actix_rt::test]
    async fn test_update_with_empty_report_clears_measurements() {
        let dir = TempDir::new().unwrap();
        let mut store = MockWastageStore::new();
        store
            .expect_find_by_challan_id()
            .returning(|_| Ok(Some(stored_model(7, "CH-1", json!([10, 20])))));
        store
            .expect_update()
            .withf(|record: &WastageUpdate| record.mou_report.is_empty())
            .returning(|record| Ok(model_for_update(&record)));

        // No notifier expectation: empty measurements means no call
        let outcome = service(store, MockMouNotifier::new(), &dir)
            .upsert(input("CH-1", vec![]), vec![])
            .await
            .unwrap();

        assert_eq!(outcome.mou_average, None);
    }

    #[actix_rt::test]
    async fn test_notifier_failure_never_fails_the_write() {
        let dir = TempDir::new().unwrap();
        let mut store = MockWastageStore::new();
        store
            .expect_find_by_challan_id()
            .returning(|_| Ok(None));
        store
            .expect_insert()
            .returning(|record| Ok(model_for_insert(&record)));

        let mut notifier = MockMouNotifier::new();
        notifier
            .expect_notify_average()
            .times(1)
            .returning(|_, _| false);

        let outcome = service(store, notifier, &dir)
            .upsert(input("CH-1", vec![Decimal::from(5)]), vec![jpg("a.jpg")])
            .await
            .unwrap();

        assert_eq!(outcome.mou_average, Some(Decimal::from(5)));
    }

    #[actix_rt::test]
    async fn test_delete_removes_row_and_files() {
        let dir = TempDir::new().unwrap();
        let images = ImageStore::new(dir.path());
        let urls = images
            .save_images(&[jpg("a.jpg")], "CH-1")
            .await
            .unwrap();
        let on_disk = dir.path().join(urls[0].trim_start_matches('/'));
        assert!(on_disk.exists());

        let mut model = stored_model(7, "CH-1", json!([]));
        model.image_urls = serde_json::to_value(&urls).unwrap();

        let mut store = MockWastageStore::new();
        let found = model.clone();
        store
            .expect_find_by_id()
            .with(eq(7))
            .returning(move |_| Ok(Some(found.clone())));
        store.expect_delete().with(eq(7)).returning(|_| Ok(true));

        let service = WastageService::new(
            Arc::new(store),
            images,
            Arc::new(MockMouNotifier::new()),
        );
        service.delete(7).await.unwrap();

        assert!(!on_disk.exists());
    }

    #[actix_rt::test]
    async fn test_delete_missing_id_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let mut store = MockWastageStore::new();
        store.expect_find_by_id().returning(|_| Ok(None));
        // No delete expectation: nothing may be removed

        let result = service(store, MockMouNotifier::new(), &dir).delete(42).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_mou_average() {
        assert_eq!(
            mou_average(&[Decimal::from(10), Decimal::from(20), Decimal::from(30)]),
            Some(Decimal::from(20))
        );
        assert_eq!(mou_average(&[]), None);
        assert_eq!(
            mou_average(&[Decimal::new(15, 1), Decimal::new(25, 1)]),
            Some(Decimal::from(2))
        );
    }
}
