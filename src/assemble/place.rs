//! Hotels, restaurants and attractions

use super::EntityAssembler;
use crate::extract;
use crate::http::{RequestConfig, Session};
use crate::record::{EntityDetail, EntityRecord, LocationDetail, PlaceDetail, RatingHistogram};
use crate::seed::SeedRow;
use crate::types::ContentType;
use std::collections::BTreeMap;
use tracing::{debug, warn};

impl EntityAssembler {
    /// Build a record from an already fetched location payload
    pub async fn assemble_place(
        &self,
        seed: &SeedRow,
        detail: &LocationDetail,
        session: &Session,
    ) -> EntityRecord {
        let content_type = seed.content_type;
        let location_id = detail.id().or(seed.external_id).unwrap_or_default();

        let reviews = self
            .collect_reviews(location_id, content_type, session)
            .await;

        let mut place = PlaceDetail::from_location(detail, content_type);
        place.about_rating_notes = self.rating_notes(seed, detail, session).await;

        let mut record = EntityRecord {
            row_id: seed.row_id.clone(),
            id_datatourisme: seed.id_datatourisme.clone(),
            id_tripadvisor: location_id,
            content_type,
            detail: EntityDetail::Place(place),
            reviews,
            tags_object: BTreeMap::new(),
            tags_array: Vec::new(),
            rating_histogram: RatingHistogram::from_raw(detail.rating_histogram.as_ref()),
        };
        record.set_tags(self.collect_tags(location_id, session).await);

        debug!(location_id, %content_type, name = ?detail.name, "Assembled place");
        record
    }

    /// Rating notes from the entity's site page; empty when there is no page
    /// or it cannot be read
    async fn rating_notes(
        &self,
        seed: &SeedRow,
        detail: &LocationDetail,
        session: &Session,
    ) -> BTreeMap<String, f64> {
        if !matches!(seed.content_type, ContentType::Hotel | ContentType::Restaurant) {
            return BTreeMap::new();
        }
        let Some(url) = seed.source_url.as_deref().or(detail.web_url.as_deref()) else {
            return BTreeMap::new();
        };

        match session.client().get_text(url, RequestConfig::new()).await {
            Ok(html) => extract::parse_rating_notes(&html, seed.content_type),
            Err(e) => {
                warn!(url, "Could not read rating notes: {e}");
                BTreeMap::new()
            }
        }
    }
}
