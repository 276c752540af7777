use serde::Serialize;

use crate::domain::models::money::serialize_major;
use crate::error::AppError;

/// (id, display name, sedan price in cents)
const SERVICES: &[(&str, &str, i64)] = &[
    ("express-wash", "Express Wash", 4_900),
    ("exterior-detail", "Exterior Detail", 11_900),
    ("interior-detail", "Interior Detail", 12_900),
    ("full-detail", "Full Detail", 19_900),
    ("ceramic-coating", "Ceramic Coating", 59_900),
];

/// (id, display name, multiplier in percent)
const VEHICLE_SIZES: &[(&str, &str, i64)] = &[
    ("sedan", "Sedan", 100),
    ("coupe", "Coupe", 100),
    ("suv", "SUV", 115),
    ("truck", "Truck", 125),
    ("van", "Van", 130),
];

/// (id, display name, flat price in cents)
const ADD_ONS: &[(&str, &str, i64)] = &[
    ("pet-hair", "Pet Hair Removal", 3_500),
    ("engine-bay", "Engine Bay Cleaning", 4_000),
    ("clay-bar", "Clay Bar Treatment", 4_500),
    ("odor-elimination", "Odor Elimination", 5_000),
    ("headlight-restoration", "Headlight Restoration", 6_000),
];

pub const DEFAULT_VEHICLE_SIZE: &str = "sedan";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotedAddOn {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "serialize_major")]
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub service_type: String,
    pub vehicle_size: String,
    #[serde(serialize_with = "serialize_major")]
    pub base_price: i64,
    pub add_ons: Vec<QuotedAddOn>,
    #[serde(serialize_with = "serialize_major")]
    pub add_ons_total: i64,
    #[serde(serialize_with = "serialize_major")]
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueEntry {
    pub id: &'static str,
    pub name: &'static str,
    /// Major units for prices, percent for size multipliers.
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalogue {
    pub services: Vec<CatalogueEntry>,
    pub vehicle_sizes: Vec<CatalogueEntry>,
    pub add_ons: Vec<CatalogueEntry>,
}

fn lookup<'a>(table: &'a [(&'static str, &'static str, i64)], id: &str) -> Option<&'a (&'static str, &'static str, i64)> {
    table.iter().find(|(key, _, _)| *key == id)
}

pub fn quote(service_type: &str, vehicle_size: Option<&str>, add_ons: &[String]) -> Result<PriceQuote, AppError> {
    let service_type = service_type.trim().to_lowercase();
    let vehicle_size = vehicle_size
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_VEHICLE_SIZE.to_string());

    let (_, _, service_price) = lookup(SERVICES, &service_type)
        .ok_or_else(|| AppError::Validation(format!("Unknown service type: {}", service_type)))?;
    let (_, _, multiplier) = lookup(VEHICLE_SIZES, &vehicle_size)
        .ok_or_else(|| AppError::Validation(format!("Unknown vehicle size: {}", vehicle_size)))?;

    // Rounded to the nearest cent.
    let base_price = (service_price * multiplier + 50) / 100;

    let mut quoted = Vec::new();
    for raw in add_ons {
        let id = raw.trim().to_lowercase();
        if quoted.iter().any(|a: &QuotedAddOn| a.id == id) {
            continue;
        }
        let (key, name, price) = lookup(ADD_ONS, &id)
            .ok_or_else(|| AppError::Validation(format!("Unknown add-on: {}", id)))?;
        quoted.push(QuotedAddOn { id: key.to_string(), name: name.to_string(), price: *price });
    }

    let add_ons_total: i64 = quoted.iter().map(|a| a.price).sum();

    Ok(PriceQuote {
        service_type,
        vehicle_size,
        base_price,
        add_ons: quoted,
        add_ons_total,
        total: base_price + add_ons_total,
    })
}

pub fn is_known_service(service_type: &str) -> bool {
    lookup(SERVICES, &service_type.trim().to_lowercase()).is_some()
}

pub fn catalogue() -> Catalogue {
    let prices = |table: &[(&'static str, &'static str, i64)]| -> Vec<CatalogueEntry> {
        table.iter()
            .map(|(id, name, cents)| CatalogueEntry { id: *id, name: *name, value: *cents as f64 / 100.0 })
            .collect()
    };

    Catalogue {
        services: prices(SERVICES),
        vehicle_sizes: VEHICLE_SIZES.iter()
            .map(|(id, name, pct)| CatalogueEntry { id: *id, name: *name, value: *pct as f64 })
            .collect(),
        add_ons: prices(ADD_ONS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sedan_quote_without_add_ons() {
        let q = quote("full-detail", None, &[]).unwrap();
        assert_eq!(q.vehicle_size, "sedan");
        assert_eq!(q.base_price, 19_900);
        assert_eq!(q.total, 19_900);
    }

    #[test]
    fn test_size_multiplier_rounds_to_cent() {
        // 49.00 * 1.15 = 56.35
        let q = quote("express-wash", Some("SUV"), &[]).unwrap();
        assert_eq!(q.base_price, 5_635);
        // 119.00 * 1.25 = 148.75
        let q = quote("exterior-detail", Some("truck"), &[]).unwrap();
        assert_eq!(q.base_price, 14_875);
    }

    #[test]
    fn test_add_ons_are_summed_once() {
        let add_ons = vec!["pet-hair".to_string(), "clay-bar".to_string(), "pet-hair".to_string()];
        let q = quote("interior-detail", Some("sedan"), &add_ons).unwrap();
        assert_eq!(q.add_ons.len(), 2);
        assert_eq!(q.add_ons_total, 8_000);
        assert_eq!(q.total, 12_900 + 8_000);
    }

    #[test]
    fn test_unknown_entries_are_rejected() {
        assert!(matches!(quote("moon-polish", None, &[]), Err(AppError::Validation(_))));
        assert!(matches!(quote("full-detail", Some("bus"), &[]), Err(AppError::Validation(_))));
        assert!(matches!(quote("full-detail", None, &["wax-on".to_string()]), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_catalogue_lists_all_tables() {
        let c = catalogue();
        assert_eq!(c.services.len(), SERVICES.len());
        assert_eq!(c.vehicle_sizes.len(), VEHICLE_SIZES.len());
        assert_eq!(c.add_ons.len(), ADD_ONS.len());
        assert_eq!(c.services[0].value, 49.0);
    }
}
