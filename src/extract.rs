//! HTML extraction
//!
//! The few pieces of data read from rendered site pages: the session
//! security token, vacation-rental list pages, vacation-rental detail
//! pages and the per-criterion rating notes of hotel and restaurant pages.
//! Everything else comes from JSON endpoints.

use crate::types::ContentType;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::Url;

const PAGE_MODEL_PREFIX: &str = "define('page-model', [], function() { return ";

static HEAD_SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("head script").unwrap());
static RENTAL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="VacationRentalReview"]"#).unwrap());
static LAST_PAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".pageNumbers a:last-child").unwrap());
static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static MAP_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="maps.google.com/maps?ll="]"#).unwrap());
static AMENITY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#vr-detail-page-amenities > div > div:nth-child(3) > div").unwrap()
});

static PRICE_BOX: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ppr_priv_vr_traveler_inputs_and_rap").unwrap());
static OVERVIEW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div._2bZ4gZhI").unwrap());
static CATEGORY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#vr-detail-page-overview > div > div:nth-child(2) > div:nth-child(2)").unwrap()
});

static HOTEL_NOTE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div._1krg1t5y").unwrap());
static HOTEL_NOTE_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div._1h7NKZWM").unwrap());
static HOTEL_NOTE_BUBBLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static RESTAURANT_NOTE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.jT_QMHn2").unwrap());
static RESTAURANT_NOTE_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span._2vS3p6SS").unwrap());
static RESTAURANT_NOTE_BUBBLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span._377onWB- > span").unwrap());

static LAT_LNG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ll=(.*?)&").unwrap());
static PRICE_FROM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"From(.+\d+)").unwrap());
static PRICE_NIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Rate for 1 night(.+?\d+)").unwrap());
static BEDROOMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+chambres*").unwrap());
static BATHROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+salles de bains*").unwrap());
static GUESTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+personnes*").unwrap());
static MIN_NIGHTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+nuits* minimum").unwrap());

/// Read `JS_SECURITY_TOKEN` from the page-model head script
pub fn security_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document.select(&HEAD_SCRIPT).find_map(|script| {
        let text = script.text().collect::<String>();
        let start = text.find(PAGE_MODEL_PREFIX)? + PAGE_MODEL_PREFIX.len();
        let body = text[start..].trim_end();
        let body = body.strip_suffix("});").unwrap_or(body).trim_end();
        let body = body.strip_suffix(';').unwrap_or(body);

        let model: Value = serde_json::from_str(body).ok()?;
        model
            .get("JS_SECURITY_TOKEN")
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

/// Links and page count found on a vacation-rental list page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RentalListPage {
    /// Absolute detail-page URLs, in page order, without duplicates
    pub detail_urls: Vec<String>,
    /// Last page number shown in the pager, if any
    pub last_page: Option<u32>,
}

/// Parse a vacation-rental list page; relative links resolve against `site_base`
pub fn parse_rental_list(html: &str, site_base: &str) -> RentalListPage {
    let document = Html::parse_document(html);
    let base = Url::parse(site_base).ok();

    let mut detail_urls: Vec<String> = Vec::new();
    for link in document.select(&RENTAL_LINK) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.ends_with(".html") {
            continue;
        }
        let Some(url) = base
            .as_ref()
            .map_or_else(|| Url::parse(href), |b| b.join(href))
            .ok()
            .map(String::from)
        else {
            continue;
        };
        if !detail_urls.contains(&url) {
            detail_urls.push(url);
        }
    }

    let last_page = document
        .select(&LAST_PAGE)
        .next()
        .and_then(|a| a.text().collect::<String>().trim().parse().ok());

    RentalListPage {
        detail_urls,
        last_page,
    }
}

/// Fields read from a vacation-rental detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RentalPage {
    pub name: Option<String>,
    pub description: Option<String>,
    pub area_served: Option<Value>,
    pub image: Option<Value>,
    pub rating: Option<Value>,
    pub number_of_reviews: Option<Value>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub amenities: Vec<String>,
    pub category: Option<String>,
    pub price_per_night: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub guests: Option<String>,
    pub minimum_nights: Option<String>,
}

/// Parse a vacation-rental detail page
pub fn parse_rental_detail(html: &str) -> RentalPage {
    let document = Html::parse_document(html);
    let mut page = RentalPage::default();

    let ld = document
        .select(&JSON_LD)
        .find_map(|s| serde_json::from_str::<Value>(&s.text().collect::<String>()).ok());

    if let Some(ld) = ld {
        let text = |key: &str| ld.get(key).and_then(Value::as_str).map(str::to_string);
        page.name = text("name");
        page.description = text("description");
        page.area_served = ld.get("areaServed").cloned();
        page.image = ld.get("image").cloned();
        if let Some(rating) = ld.get("aggregateRating") {
            page.rating = rating.get("ratingValue").cloned();
            page.number_of_reviews = rating.get("reviewCount").cloned();
        }
    }

    let coords = document
        .select(&MAP_LINK)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| LAT_LNG.captures(href).map(|c| c[1].to_string()));
    if let Some(coords) = coords {
        let mut parts = coords.split(',');
        page.latitude = parts.next().map(str::to_string);
        page.longitude = parts.next().map(str::to_string);
    }

    page.amenities = document
        .select(&AMENITY)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(text) = first_text(&document, &PRICE_BOX) {
        page.price_per_night =
            capture(&PRICE_FROM, &text).or_else(|| capture(&PRICE_NIGHT, &text));
    }

    let overview = first_text(&document, &OVERVIEW).unwrap_or_default();
    page.bedrooms = capture(&BEDROOMS, &overview);
    page.bathrooms = capture(&BATHROOMS, &overview);
    page.guests = capture(&GUESTS, &overview);
    page.minimum_nights = capture(&MIN_NIGHTS, &overview);
    page.category = first_text(&document, &CATEGORY);

    page
}

/// Per-criterion rating notes (`"Service" -> 4.5`) from a hotel or
/// restaurant page. Other content types have none.
pub fn parse_rating_notes(html: &str, content_type: ContentType) -> BTreeMap<String, f64> {
    let (row, label, bubble) = match content_type {
        ContentType::Hotel => (&*HOTEL_NOTE, &*HOTEL_NOTE_LABEL, &*HOTEL_NOTE_BUBBLE),
        ContentType::Restaurant => (
            &*RESTAURANT_NOTE,
            &*RESTAURANT_NOTE_LABEL,
            &*RESTAURANT_NOTE_BUBBLE,
        ),
        _ => return BTreeMap::new(),
    };

    let document = Html::parse_document(html);
    document
        .select(row)
        .filter_map(|el| {
            let name = el.select(label).next()?.text().collect::<String>();
            let class = el.select(bubble).next()?.value().attr("class")?;
            Some((name.trim().to_string(), bubble_note(class)?))
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

/// `ui_bubble_rating bubble_45` reads as 4.5
fn bubble_note(class: &str) -> Option<f64> {
    let digits = class.get(class.len().checked_sub(2)?..)?;
    digits.parse::<u32>().ok().map(|n| f64::from(n) / 10.0)
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_security_token() {
        let html = r#"<html><head>
            <script>window.x = 1;</script>
            <script>define('page-model', [], function() { return {"JS_SECURITY_TOKEN":"TNI1625!abc"}; });</script>
            </head></html>"#;
        assert_eq!(security_token(html).as_deref(), Some("TNI1625!abc"));
    }

    #[test]
    fn test_security_token_missing() {
        assert!(security_token("<html><head><script>var a;</script></head></html>").is_none());
        let broken = "<html><head><script>define('page-model', [], function() { return {oops</script></head></html>";
        assert!(security_token(broken).is_none());
    }

    #[test]
    fn test_parse_rental_list() {
        let html = r#"<html><body>
            <a href="/VacationRentalReview-g187147-d1-Flat.html">A</a>
            <a href="/VacationRentalReview-g187147-d1-Flat.html">A again</a>
            <a href="https://www.example.com/VacationRentalReview-g187147-d2-Loft.html">B</a>
            <a href="/VacationRentalReview-g187147-d3-Loft.html#photos">skipped</a>
            <a href="/Hotel_Review-g187147-d9.html">hotel</a>
            <div class="pageNumbers"><a>1</a><a>2</a><a>7</a></div>
            </body></html>"#;

        let page = parse_rental_list(html, "https://www.example.com/");
        assert_eq!(
            page.detail_urls,
            vec![
                "https://www.example.com/VacationRentalReview-g187147-d1-Flat.html".to_string(),
                "https://www.example.com/VacationRentalReview-g187147-d2-Loft.html".to_string(),
            ]
        );
        assert_eq!(page.last_page, Some(7));
    }

    #[test]
    fn test_parse_rental_list_without_pager() {
        let page = parse_rental_list("<html><body></body></html>", "https://www.example.com");
        assert!(page.detail_urls.is_empty());
        assert_eq!(page.last_page, None);
    }

    #[test]
    fn test_parse_rental_detail() {
        let html = r#"<html><head>
            <script type="application/ld+json">{
                "name": "Sunny Flat",
                "description": "Two rooms",
                "areaServed": {"name": "Paris"},
                "image": "https://img/1.jpg",
                "aggregateRating": {"ratingValue": 4.5, "reviewCount": 12}
            }</script></head><body>
            <a href="https://maps.google.com/maps?ll=48.85,2.35&z=15">map</a>
            <div id="vr-detail-page-amenities"><div>
                <div>title</div><div>sub</div>
                <div><div> Wifi </div><div>Kitchen</div></div>
            </div></div>
            </body></html>"#;

        let page = parse_rental_detail(html);
        assert_eq!(page.name.as_deref(), Some("Sunny Flat"));
        assert_eq!(page.description.as_deref(), Some("Two rooms"));
        assert_eq!(page.rating, Some(serde_json::json!(4.5)));
        assert_eq!(page.number_of_reviews, Some(serde_json::json!(12)));
        assert_eq!(page.latitude.as_deref(), Some("48.85"));
        assert_eq!(page.longitude.as_deref(), Some("2.35"));
        assert_eq!(page.amenities, vec!["Wifi".to_string(), "Kitchen".to_string()]);
    }

    #[test]
    fn test_parse_rental_overview() {
        let html = r#"<html><body>
            <div class="ppr_priv_vr_traveler_inputs_and_rap">Price From $120 / night</div>
            <div id="vr-detail-page-overview"><div>
                <div>Header</div>
                <div><div class="_2bZ4gZhI">Maison · 3 chambres · 2 salles de bain · 6 personnes · 2 nuits minimum</div><div>Maison entière</div></div>
            </div></div>
            </body></html>"#;

        let page = parse_rental_detail(html);
        assert_eq!(page.price_per_night.as_deref(), Some(" $120"));
        assert_eq!(page.bedrooms.as_deref(), Some("3"));
        assert_eq!(page.bathrooms.as_deref(), Some("2"));
        assert_eq!(page.guests.as_deref(), Some("6"));
        assert_eq!(page.minimum_nights.as_deref(), Some("2"));
        assert_eq!(page.category.as_deref(), Some("Maison entière"));
    }

    #[test]
    fn test_parse_rental_nightly_rate() {
        let html = r#"<div class="ppr_priv_vr_traveler_inputs_and_rap">Rate for 1 night €95 total €190</div>"#;
        let page = parse_rental_detail(html);
        assert_eq!(page.price_per_night.as_deref(), Some(" €95"));
        assert_eq!(page.bedrooms, None);
    }

    #[test]
    fn test_parse_hotel_rating_notes() {
        let html = r#"<html><body>
            <div class="_1krg1t5y"><span class="ui_bubble_rating bubble_45"></span><div class="_1h7NKZWM">Location</div></div>
            <div class="_1krg1t5y"><span class="ui_bubble_rating bubble_40"></span><div class="_1h7NKZWM"> Service </div></div>
            <div class="_1krg1t5y"><span class="ui_bubble_rating"></span><div class="_1h7NKZWM">Value</div></div>
            </body></html>"#;

        let notes = parse_rating_notes(html, ContentType::Hotel);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes.get("Location"), Some(&4.5));
        assert_eq!(notes.get("Service"), Some(&4.0));
    }

    #[test]
    fn test_parse_restaurant_rating_notes() {
        let html = r#"<html><body>
            <div class="jT_QMHn2"><span class="_2vS3p6SS">Food</span>
                <span class="_377onWB-"><span class="ui_bubble_rating bubble_50"></span></span></div>
            </body></html>"#;

        let notes = parse_rating_notes(html, ContentType::Restaurant);
        assert_eq!(notes.get("Food"), Some(&5.0));
        assert!(parse_rating_notes(html, ContentType::Hotel).is_empty());
        assert!(parse_rating_notes(html, ContentType::Attraction).is_empty());
    }

    #[test]
    fn test_parse_rental_detail_empty_page() {
        assert_eq!(parse_rental_detail("<html></html>"), RentalPage::default());
    }
}
