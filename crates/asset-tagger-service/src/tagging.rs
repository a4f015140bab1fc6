//! Tagging service
//!
//! This module hands out new tags: previewing the next tag for a prefix,
//! generating batches of sequential tags, manual entry of an explicit tag,
//! and importing tags that were printed before this service existed.

use asset_tagger_core::{Asset, AssetTag, Code, Country, Manufacturer, TagSequencer, TaggerError};
use asset_tagger_store::RecordStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::dto::{
    CreateAssetRequest, GenerateTagsRequest, GenerateTagsResponse, ImportTagsRequest,
    ImportTagsResponse, NextTagRequest, NextTagResponse, Outcome, RejectedLine,
};
use crate::error::ServiceResult;
use crate::validation::{find_asset, require_catalog_code, validate_generate};

/// Trait for tag issuing operations
#[async_trait]
pub trait TaggingService: Send + Sync {
    /// Compute the next tag for a country/manufacturer pair without saving anything
    async fn preview_next_tag(&self, request: NextTagRequest) -> ServiceResult<Outcome<NextTagResponse>>;

    /// Generate sequential tags and persist the new assets unless `dry_run` is set
    async fn generate_tags(&self, request: GenerateTagsRequest) -> ServiceResult<Outcome<GenerateTagsResponse>>;

    /// Create an asset with an explicit tag
    async fn create_asset(&self, request: CreateAssetRequest) -> ServiceResult<Outcome<Asset>>;

    /// Import pasted tags, one per line
    async fn import_tags(&self, request: ImportTagsRequest) -> ServiceResult<Outcome<ImportTagsResponse>>;
}

/// Default implementation of TaggingService
pub struct DefaultTaggingService {
    store: RecordStore,
}

impl DefaultTaggingService {
    /// Create a new tagging service
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn resolve_codes(
        countries: &[Country],
        manufacturers: &[Manufacturer],
        country_code: &str,
        manufacturer_code: &str,
    ) -> ServiceResult<(Code, Code)> {
        Ok((
            require_catalog_code(countries, country_code)?,
            require_catalog_code(manufacturers, manufacturer_code)?,
        ))
    }
}

#[async_trait]
impl TaggingService for DefaultTaggingService {
    #[instrument(skip(self))]
    async fn preview_next_tag(&self, request: NextTagRequest) -> ServiceResult<Outcome<NextTagResponse>> {
        let mut session = self.store.open().await?;
        let (country, manufacturer) = Self::resolve_codes(
            session.countries(),
            session.manufacturers(),
            &request.country_code,
            &request.manufacturer_code,
        )?;

        let tag = TagSequencer::new(country, manufacturer, session.existing_tags()).peek()?;
        debug!(tag = %tag, "Previewed next tag");

        Ok(Outcome::new(NextTagResponse::from(&tag), session.take_warnings()))
    }

    #[instrument(skip(self), fields(country = %request.country_code, manufacturer = %request.manufacturer_code, count = request.count))]
    async fn generate_tags(&self, request: GenerateTagsRequest) -> ServiceResult<Outcome<GenerateTagsResponse>> {
        validate_generate(&request)?;

        let mut session = self.store.open().await?;
        let (country, manufacturer) = Self::resolve_codes(
            session.countries(),
            session.manufacturers(),
            &request.country_code,
            &request.manufacturer_code,
        )?;

        let mut sequencer = TagSequencer::new(country, manufacturer, session.existing_tags());
        let created = Utc::now();
        let base_name = request.name.trim();
        let description = request.description.clone().unwrap_or_default();

        let mut assets = Vec::with_capacity(request.count as usize);
        for i in 1..=request.count {
            let tag = sequencer.next_tag()?;
            let name = if request.count > 1 {
                format!("{} #{}", base_name, i)
            } else {
                base_name.to_string()
            };

            let asset = Asset::builder(tag, name)
                .description(description.clone())
                .date_created(created)
                .build()?;
            assets.push(asset);
        }

        if request.dry_run {
            debug!(count = assets.len(), "Dry run, nothing saved");
        } else {
            session.assets_mut().extend(assets.iter().cloned());
            session.save_assets().await?;
            info!(
                first = %assets.first().map(|a| a.tag.as_str()).unwrap_or_default(),
                count = assets.len(),
                "Generated asset tags"
            );
        }

        Ok(Outcome::new(
            GenerateTagsResponse {
                assets,
                dry_run: request.dry_run,
            },
            session.take_warnings(),
        ))
    }

    #[instrument(skip(self), fields(tag = %request.tag))]
    async fn create_asset(&self, request: CreateAssetRequest) -> ServiceResult<Outcome<Asset>> {
        let tag = AssetTag::parse(&request.tag)?;
        let asset = Asset::builder(tag.clone(), request.name)
            .description(request.description.unwrap_or_default())
            .build()?;

        let mut session = self.store.open().await?;
        if let Some(index) = find_asset(session.assets(), &tag) {
            return Err(TaggerError::DuplicateTag(session.assets()[index].tag.clone()).into());
        }
        if let Some(existing) = session
            .undecoded_tags()
            .find(|raw| same_tag(raw, &tag))
            .map(str::to_string)
        {
            return Err(TaggerError::DuplicateTag(existing).into());
        }

        session.assets_mut().push(asset.clone());
        session.save_assets().await?;
        info!(tag = %asset.tag, "Created asset");

        Ok(Outcome::new(asset, session.take_warnings()))
    }

    #[instrument(skip(self, request), fields(bytes = request.text.len()))]
    async fn import_tags(&self, request: ImportTagsRequest) -> ServiceResult<Outcome<ImportTagsResponse>> {
        let mut session = self.store.open().await?;

        let mut known: HashSet<(Code, Code, u32)> = session
            .existing_tags()
            .filter_map(|raw| AssetTag::parse(raw).ok())
            .map(|tag| owned_key(&tag))
            .collect();
        let known_raw: HashSet<String> = session.existing_tags().map(str::to_string).collect();

        let created = Utc::now();
        let mut report = ImportTagsResponse::default();

        for (index, line) in request.text.lines().enumerate() {
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            let tag = match AssetTag::parse(input) {
                Ok(tag) => tag,
                Err(e) => {
                    report.rejected.push(RejectedLine {
                        line: index + 1,
                        input: input.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if known_raw.contains(&tag.to_string()) || !known.insert(owned_key(&tag)) {
                report.skipped.push(tag.to_string());
                continue;
            }

            let name = format!("Imported Asset {}", tag.sequence_digits());
            let asset = Asset::builder(tag, name).date_created(created).build()?;
            report.imported.push(asset);
        }

        if !report.imported.is_empty() {
            session.assets_mut().extend(report.imported.iter().cloned());
            session.save_assets().await?;
        }

        info!(
            imported = report.imported.len(),
            skipped = report.skipped.len(),
            rejected = report.rejected.len(),
            "Imported asset tags"
        );

        Ok(Outcome::new(report, session.take_warnings()))
    }
}

fn same_tag(raw: &str, tag: &AssetTag) -> bool {
    AssetTag::parse(raw)
        .map(|existing| existing.key() == tag.key())
        .unwrap_or(false)
}

fn owned_key(tag: &AssetTag) -> (Code, Code, u32) {
    let (country, manufacturer, sequence) = tag.key();
    (country.clone(), manufacturer.clone(), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::test_support::{seeded_store, store_with_assets};
    use asset_tagger_store::{MemoryBackend, RecordStoreConfig};
    use std::sync::Arc;

    const MIXED_ASSETS: &str = r#"[
        {"tag": "EGY-ZE-00001", "name": "Printer", "country_code": "EGY",
         "manufacturer_code": "ZE", "date_created": "2024-03-01T09:15:30Z"},
        {"tag": "EGY-ZE-00002", "name": "Scanner", "country_code": "EGY",
         "manufacturer_code": "ZE", "date_created": "sometime in March"}
    ]"#;

    async fn store_with_document(assets: &str) -> (RecordStore, Arc<MemoryBackend>) {
        let local = Arc::new(MemoryBackend::unversioned());
        local.insert("assets.json", assets).await;
        let store = RecordStore::new(local.clone())
            .with_config(RecordStoreConfig::new().seed_defaults(true));
        (store, local)
    }

    fn generate(country: &str, manufacturer: &str, name: &str, count: u32) -> GenerateTagsRequest {
        GenerateTagsRequest {
            country_code: country.to_string(),
            manufacturer_code: manufacturer.to_string(),
            name: name.to_string(),
            description: None,
            count,
            dry_run: false,
        }
    }

    fn tags(assets: &[Asset]) -> Vec<&str> {
        assets.iter().map(|a| a.tag.as_str()).collect()
    }

    #[tokio::test]
    async fn test_generate_first_tag() {
        let service = DefaultTaggingService::new(seeded_store());
        let outcome = service
            .generate_tags(generate("EGY", "ZE", "Zebra Printer", 1))
            .await
            .unwrap();

        let asset = &outcome.data.assets[0];
        assert_eq!(asset.tag, "EGY-ZE-00001");
        assert_eq!(asset.name, "Zebra Printer");
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_generate_batch_numbers_names_and_persists() {
        let store = store_with_assets(&["EGY-ZE-00001", "EGY-ZE-00002", "EGY-HP-00001"]).await;
        let service = DefaultTaggingService::new(store.clone());

        let outcome = service
            .generate_tags(generate("egy", "ze", "Scanner", 3))
            .await
            .unwrap();
        assert_eq!(
            tags(&outcome.data.assets),
            vec!["EGY-ZE-00003", "EGY-ZE-00004", "EGY-ZE-00005"]
        );
        assert_eq!(outcome.data.assets[2].name, "Scanner #3");

        let session = store.open().await.unwrap();
        assert_eq!(session.assets().len(), 6);
    }

    #[tokio::test]
    async fn test_generate_dry_run_saves_nothing() {
        let store = seeded_store();
        let service = DefaultTaggingService::new(store.clone());

        let mut request = generate("KSA", "HP", "Laptop", 2);
        request.dry_run = true;
        let outcome = service.generate_tags(request).await.unwrap();
        assert!(outcome.data.dry_run);
        assert_eq!(tags(&outcome.data.assets), vec!["KSA-HP-00001", "KSA-HP-00002"]);

        assert!(store.open().await.unwrap().assets().is_empty());
    }

    #[tokio::test]
    async fn test_generate_rejects_unknown_codes() {
        let service = DefaultTaggingService::new(seeded_store());
        let err = service
            .generate_tags(generate("FRA", "ZE", "Printer", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));

        let err = service
            .generate_tags(generate("", "ZE", "Printer", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_preview_does_not_consume() {
        let store = store_with_assets(&["KSA-ZE-00009"]).await;
        let service = DefaultTaggingService::new(store);
        let request = NextTagRequest {
            country_code: "KSA".to_string(),
            manufacturer_code: "ZE".to_string(),
        };

        let first = service.preview_next_tag(request.clone()).await.unwrap();
        let second = service.preview_next_tag(request).await.unwrap();
        assert_eq!(first.data.tag, "KSA-ZE-00010");
        assert_eq!(first.data.sequence, 10);
        assert_eq!(second.data.tag, first.data.tag);
    }

    #[tokio::test]
    async fn test_create_asset_rejects_duplicates_and_bad_tags() {
        let store = store_with_assets(&["EGY-ZE-0001"]).await;
        let service = DefaultTaggingService::new(store);

        let request = |tag: &str| CreateAssetRequest {
            tag: tag.to_string(),
            name: "Label printer".to_string(),
            description: None,
        };

        let err = service.create_asset(request("EGY-ZE-00001")).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(_)));

        let err = service.create_asset(request("EGY-ZE")).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));

        let created = service.create_asset(request(" egy-de-00042 ")).await.unwrap();
        assert_eq!(created.data.tag, "EGY-DE-00042");
        assert_eq!(created.data.manufacturer_code.as_str(), "DE");
    }

    #[tokio::test]
    async fn test_import_reports_each_line() {
        let store = store_with_assets(&["EGY-ZE-0001"]).await;
        let service = DefaultTaggingService::new(store.clone());

        let text = "EGY-ZE-0001\n\n  EGY-ZE-0002  \nnot a tag\nEGY-ZE-0002\nKSA-HP-0010\n";
        let outcome = service
            .import_tags(ImportTagsRequest {
                text: text.to_string(),
            })
            .await
            .unwrap();

        let report = outcome.data;
        assert_eq!(tags(&report.imported), vec!["EGY-ZE-0002", "KSA-HP-0010"]);
        assert_eq!(report.imported[0].name, "Imported Asset 0002");
        assert_eq!(report.skipped, vec!["EGY-ZE-0001", "EGY-ZE-0002"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 4);

        // Imported sequences feed the generator
        let next = DefaultTaggingService::new(store)
            .preview_next_tag(NextTagRequest {
                country_code: "EGY".to_string(),
                manufacturer_code: "ZE".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(next.data.tag, "EGY-ZE-00003");
    }

    #[tokio::test]
    async fn test_import_without_new_tags_does_not_save() {
        let store = store_with_assets(&["EGY-ZE-00001"]).await;
        let service = DefaultTaggingService::new(store.clone());

        let outcome = service
            .import_tags(ImportTagsRequest {
                text: "EGY-ZE-00001\nrubbish".to_string(),
            })
            .await
            .unwrap();
        assert!(outcome.data.imported.is_empty());
        assert_eq!(outcome.data.skipped.len(), 1);
        assert_eq!(outcome.data.rejected.len(), 1);
    }

    #[tokio::test]
    async fn test_removed_manufacturer_keeps_existing_tags() {
        let store = store_with_assets(&["EGY-ZE-00001"]).await;
        {
            let mut session = store.open().await.unwrap();
            session.manufacturers_mut().retain(|m| m.code.as_str() != "ZE");
            session.save_manufacturers().await.unwrap();
        }

        let session = store.open().await.unwrap();
        assert_eq!(session.assets()[0].tag, "EGY-ZE-00001");
        drop(session);

        let err = DefaultTaggingService::new(store)
            .generate_tags(generate("EGY", "ZE", "Printer", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_generate_skips_tags_of_undecodable_entries() {
        let (store, local) = store_with_document(MIXED_ASSETS).await;
        let service = DefaultTaggingService::new(store);

        let outcome = service
            .generate_tags(generate("EGY", "ZE", "Label printer", 1))
            .await
            .unwrap();
        assert_eq!(outcome.data.assets[0].tag, "EGY-ZE-00003");
        assert_eq!(outcome.warnings.len(), 1);

        let stored: serde_json::Value =
            serde_json::from_slice(&local.get("assets.json").await.unwrap()).unwrap();
        let names: Vec<&str> = stored
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|entry| entry["name"].as_str())
            .collect();
        assert_eq!(names, vec!["Printer", "Label printer", "Scanner"]);
        assert_eq!(stored[2]["date_created"], "sometime in March");
    }

    #[tokio::test]
    async fn test_manual_entry_and_import_respect_undecodable_entries() {
        let (store, _) = store_with_document(MIXED_ASSETS).await;
        let service = DefaultTaggingService::new(store);

        let err = service
            .create_asset(CreateAssetRequest {
                tag: "EGY-ZE-0002".to_string(),
                name: "Scanner".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(_)));

        let outcome = service
            .import_tags(ImportTagsRequest {
                text: "EGY-ZE-00002\nEGY-ZE-00004".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome.data.skipped, vec!["EGY-ZE-00002"]);
        assert_eq!(tags(&outcome.data.imported), vec!["EGY-ZE-00004"]);
    }

    #[tokio::test]
    async fn test_out_of_range_sequences_cannot_be_recorded() {
        let store = store_with_assets(&["EGY-ZE-00001"]).await;
        let service = DefaultTaggingService::new(store);
        let huge = format!("EGY-ZE-{}", u32::MAX);

        let err = service
            .create_asset(CreateAssetRequest {
                tag: huge.clone(),
                name: "Label printer".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));

        let outcome = service
            .import_tags(ImportTagsRequest { text: huge })
            .await
            .unwrap();
        assert!(outcome.data.imported.is_empty());
        assert_eq!(outcome.data.rejected.len(), 1);

        let next = service
            .preview_next_tag(NextTagRequest {
                country_code: "EGY".to_string(),
                manufacturer_code: "ZE".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(next.data.tag, "EGY-ZE-00002");
    }
}
