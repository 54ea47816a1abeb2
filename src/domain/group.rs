use serde::Serialize;

use crate::domain::listing::MatchedListing;

/// Price offered by one platform for a product group.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOffer {
    pub platform: String,
    pub title: String,
    pub price: Option<f64>,
    pub link: Option<String>,
}

/// Per-product price comparison built from a clustered batch.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductGroup {
    pub group_id: usize,
    /// Title of the listing that opened the group.
    pub title: String,
    pub offers: Vec<PlatformOffer>,
    pub lowest_price: Option<f64>,
    pub lowest_price_platform: Option<String>,
}

/// Collapse a clustered batch into one price comparison row per group.
///
/// Groups are returned in group id order. Within a group only the first
/// listing seen for each platform is reported. Offers without a price are
/// kept but never win the lowest price.
pub fn summarize_groups(listings: &[MatchedListing]) -> Vec<ProductGroup> {
    let mut groups: Vec<ProductGroup> = Vec::new();

    for matched in listings {
        let listing = &matched.listing;

        let position = match groups.iter().position(|g| g.group_id == matched.group_id) {
            Some(position) => position,
            None => {
                groups.push(ProductGroup {
                    group_id: matched.group_id,
                    title: listing.title.clone(),
                    offers: Vec::new(),
                    lowest_price: None,
                    lowest_price_platform: None,
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[position];

        if group.offers.iter().any(|o| o.platform == listing.platform) {
            continue;
        }

        group.offers.push(PlatformOffer {
            platform: listing.platform.clone(),
            title: listing.title.clone(),
            price: listing.price_amount(),
            link: listing.link_url().map(str::to_string),
        });

        if let Some(price) = listing.price_amount()
            && group.lowest_price.is_none_or(|lowest| price < lowest)
        {
            group.lowest_price = Some(price);
            group.lowest_price_platform = Some(listing.platform.clone());
        }
    }

    groups.sort_by_key(|g| g.group_id);
    groups
}
