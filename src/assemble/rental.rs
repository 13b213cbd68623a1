//! Vacation rentals
//!
//! Rentals have no REST detail payload; their fields come from the
//! listing page and their reviews are keyed by the listing id found in
//! the page URL.

use super::EntityAssembler;
use crate::error::{Error, Result};
use crate::extract;
use crate::http::{RequestConfig, Session};
use crate::listing::detail_id;
use crate::record::{EntityDetail, EntityRecord, RatingHistogram, RentalDetail};
use crate::seed::SeedRow;
use crate::types::ContentType;
use std::collections::BTreeMap;
use tracing::debug;

impl EntityAssembler {
    /// Build a record for a vacation-rental detail page
    pub async fn assemble_rental(&self, seed: &SeedRow, session: &Session) -> Result<EntityRecord> {
        let url = seed
            .source_url
            .as_deref()
            .ok_or_else(|| Error::lookup(seed.label(), "vacation rental seed has no URL"))?;
        let listing_id = detail_id(url)
            .or(seed.external_id)
            .ok_or_else(|| Error::lookup(url, "no listing id in URL"))?;

        let html = session.client().get_text(url, RequestConfig::new()).await?;
        let page = extract::parse_rental_detail(&html);

        let reviews = self
            .collect_reviews(listing_id, ContentType::VacationRental, session)
            .await;

        debug!(listing_id, name = ?page.name, "Assembled rental");
        Ok(EntityRecord {
            row_id: seed.row_id.clone(),
            id_datatourisme: seed.id_datatourisme.clone(),
            id_tripadvisor: listing_id,
            content_type: ContentType::VacationRental,
            detail: EntityDetail::Rental(RentalDetail::from_page(page, url)),
            reviews,
            tags_object: BTreeMap::new(),
            tags_array: Vec::new(),
            rating_histogram: RatingHistogram::default(),
        })
    }
}
