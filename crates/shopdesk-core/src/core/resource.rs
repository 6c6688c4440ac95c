//! Resource descriptors and filter tuples
//!
//! A [`Resource`] names the endpoint, the key its list items live under,
//! the stat metrics it reports and the form schema its payloads follow.

use crate::api::envelope::Envelope;
use crate::api::models::{OrderStatus, OrderType, PaymentStatus, ProductStatus};
use crate::api::resources::{CATEGORIES_PATH, ORDERS_PATH, PRODUCTS_PATH};
use crate::core::forms::{self, FormSchema};
use crate::error::ApiError;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Metric name to value, e.g. `totalProducts -> 12`.
pub type Stats = BTreeMap<String, f64>;

/// Table column shown for a resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub key: &'static str,
    pub header: &'static str,
}

const fn col(key: &'static str, header: &'static str) -> Column {
    Column { key, header }
}

/// Filter tuple of one list request. Equal tuples are the same request.
pub trait ListFilters: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Query parameters in wire names. Empty values are dropped by the client.
    fn query_pairs(&self) -> Vec<(String, String)>;
    fn page(&self) -> u32;
    fn set_page(&mut self, page: u32);
}

pub trait Resource: Send + Sync + 'static {
    type Filters: ListFilters;

    /// Singular display name, capitalized
    const LABEL: &'static str;
    const PATH: &'static str;
    const ITEMS_KEY: &'static str;
    const STAT_KEYS: &'static [&'static str];
    const COLUMNS: &'static [Column];
    const SCHEMA: &'static FormSchema;

    fn default_stats() -> Stats {
        Self::STAT_KEYS
            .iter()
            .map(|k| (k.to_string(), 0.0))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Products;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categories;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orders;

impl Resource for Products {
    type Filters = ProductFilters;

    const LABEL: &'static str = "Product";
    const PATH: &'static str = PRODUCTS_PATH;
    const ITEMS_KEY: &'static str = "products";
    const STAT_KEYS: &'static [&'static str] =
        &["totalProducts", "totalActiveProducts", "totalInactiveProducts"];
    const COLUMNS: &'static [Column] = &[
        col("_id", "ID"),
        col("title", "Product"),
        col("category", "Category"),
        col("price", "Price"),
        col("stock", "Stock"),
        col("sizes", "Sizes"),
        col("colors", "Colors"),
        col("isActive", "Active"),
        col("createdAt", "Created"),
    ];
    const SCHEMA: &'static FormSchema = &forms::PRODUCT;
}

impl Resource for Categories {
    type Filters = CategoryFilters;

    const LABEL: &'static str = "Category";
    const PATH: &'static str = CATEGORIES_PATH;
    const ITEMS_KEY: &'static str = "categories";
    const STAT_KEYS: &'static [&'static str] = &[
        "totalCategories",
        "totalActiveCategories",
        "totalInactiveCategories",
    ];
    const COLUMNS: &'static [Column] = &[
        col("_id", "ID"),
        col("name", "Name"),
        col("status", "Status"),
        col("createdAt", "Created"),
    ];
    const SCHEMA: &'static FormSchema = &forms::CATEGORY;
}

impl Resource for Orders {
    type Filters = OrderFilters;

    const LABEL: &'static str = "Order";
    const PATH: &'static str = ORDERS_PATH;
    const ITEMS_KEY: &'static str = "orders";
    const STAT_KEYS: &'static [&'static str] = &[
        "totalOrders",
        "pendingOrders",
        "processingOrders",
        "shippedOrders",
        "deliveredOrders",
        "totalRevenue",
    ];
    const COLUMNS: &'static [Column] = &[
        col("_id", "ID"),
        col("shortCode", "Order ID"),
        col("contact", "Customer Email"),
        col("products", "Items"),
        col("totalAmount", "Total"),
        col("shippingCost", "Shipping Cost"),
        col("orderStatus", "Status"),
        col("paymentStatus", "Payment"),
        col("createdAt", "Order Date"),
    ];
    const SCHEMA: &'static FormSchema = &forms::ORDER;
}

fn opt_str<T: fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilters {
    pub search: String,
    pub status: Option<ProductStatus>,
    pub category: String,
    pub page: u32,
    pub limit: u32,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            category: String::new(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListFilters for ProductFilters {
    fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("search".to_string(), self.search.trim().to_string()),
            ("status".to_string(), opt_str(&self.status)),
            ("category".to_string(), self.category.clone()),
        ]
    }

    fn page(&self) -> u32 {
        self.page
    }

    fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFilters {
    pub search: String,
    pub status: Option<ProductStatus>,
    pub page: u32,
    pub limit: u32,
}

impl Default for CategoryFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListFilters for CategoryFilters {
    fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("search".to_string(), self.search.trim().to_string()),
            ("status".to_string(), opt_str(&self.status)),
        ]
    }

    fn page(&self) -> u32 {
        self.page
    }

    fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderFilters {
    pub payment_status: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: String,
    pub page: u32,
    pub limit: u32,
}

impl Default for OrderFilters {
    fn default() -> Self {
        Self {
            payment_status: None,
            order_status: None,
            order_type: None,
            start_date: None,
            end_date: None,
            search: String::new(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListFilters for OrderFilters {
    fn query_pairs(&self) -> Vec<(String, String)> {
        let date = |d: &Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("search".to_string(), self.search.trim().to_string()),
            ("paymentStatus".to_string(), opt_str(&self.payment_status)),
            ("orderStatus".to_string(), opt_str(&self.order_status)),
            ("orderType".to_string(), opt_str(&self.order_type)),
            ("startDate".to_string(), date(&self.start_date)),
            ("endDate".to_string(), date(&self.end_date)),
        ]
    }

    fn page(&self) -> u32 {
        self.page
    }

    fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }
}

/// One page of a list response, extracted from the envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub stats: Stats,
    pub total_pages: u32,
    pub total_items: u64,
}

impl Page {
    /// Items come from `data.<ITEMS_KEY>` and must be an array. Stats start at
    /// zero for every declared metric and are overlaid with numeric values from
    /// `data.stats`. Missing pagination falls back to one page of all items.
    pub fn extract<R: Resource>(envelope: Envelope) -> Result<Self, ApiError> {
        let Envelope {
            data, pagination, ..
        } = envelope;

        let decode_error = |message: String| ApiError::Decode {
            endpoint: R::PATH.to_string(),
            message,
        };

        let Value::Object(mut data) = data else {
            return Err(decode_error("response data is not an object".to_string()));
        };

        let items = match data.remove(R::ITEMS_KEY) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(decode_error(format!(
                    "data.{} is not an array: {}",
                    R::ITEMS_KEY,
                    other
                )));
            }
            None => {
                return Err(decode_error(format!(
                    "response is missing data.{}",
                    R::ITEMS_KEY
                )));
            }
        };

        let mut stats = R::default_stats();
        if let Some(Value::Object(reported)) = data.get("stats") {
            for (key, value) in reported {
                if let Some(n) = value.as_f64() {
                    stats.insert(key.clone(), n);
                }
            }
        }

        let pagination = pagination.unwrap_or_default();
        let total_pages = pagination
            .total_pages
            .unwrap_or(1)
            .clamp(1, u64::from(u32::MAX)) as u32;
        let total_items = pagination.total_items.unwrap_or(items.len() as u64);

        Ok(Page {
            items,
            stats,
            total_pages,
            total_items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).expect("valid envelope")
    }

    #[test]
    fn test_product_filters_default_query() {
        let pairs = ProductFilters::default().query_pairs();
        assert_eq!(pairs[0], ("page".to_string(), "1".to_string()));
        assert_eq!(pairs[1], ("limit".to_string(), "10".to_string()));
        assert_eq!(pairs[2].1, "");
        assert_eq!(pairs[3].1, "");
    }

    #[test]
    fn test_order_filters_query_names() {
        let filters = OrderFilters {
            payment_status: Some(PaymentStatus::Paid),
            order_type: Some(OrderType::Pickup),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            ..OrderFilters::default()
        };
        let pairs: BTreeMap<_, _> = filters.query_pairs().into_iter().collect();
        assert_eq!(pairs["paymentStatus"], "paid");
        assert_eq!(pairs["orderType"], "pickup");
        assert_eq!(pairs["orderStatus"], "");
        assert_eq!(pairs["startDate"], "2024-01-31");
        assert_eq!(pairs["endDate"], "");
    }

    #[test]
    fn test_set_page_floors_at_one() {
        let mut filters = CategoryFilters::default();
        filters.set_page(0);
        assert_eq!(filters.page(), 1);
        filters.set_page(3);
        assert_eq!(filters.page(), 3);
    }

    #[test]
    fn test_extract_full_page() {
        let page = Page::extract::<Products>(envelope(json!({
            "success": true,
            "data": {
                "products": [{"_id": "a"}, {"_id": "b"}, {"_id": "c"}],
                "stats": {"totalProducts": 3, "totalActiveProducts": 2, "label": "x"}
            },
            "pagination": {"totalPages": 1, "totalItems": 3}
        })))
        .unwrap();

        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 3);
        assert_eq!(page.stats["totalProducts"], 3.0);
        assert_eq!(page.stats["totalActiveProducts"], 2.0);
        assert_eq!(page.stats["totalInactiveProducts"], 0.0);
        assert!(!page.stats.contains_key("label"));
    }

    #[test]
    fn test_extract_defaults_without_pagination() {
        let page = Page::extract::<Orders>(envelope(json!({
            "success": true,
            "data": {"orders": [{"_id": "1"}, {"_id": "2"}]}
        })))
        .unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 2);
        assert_eq!(page.stats.len(), Orders::STAT_KEYS.len());
        assert!(page.stats.values().all(|v| *v == 0.0));
    }

    #[test]
    fn test_extract_zero_pages_clamped() {
        let page = Page::extract::<Categories>(envelope(json!({
            "success": true,
            "data": {"categories": []},
            "pagination": {"totalPages": 0, "totalItems": 0}
        })))
        .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 0);
    }

    #[test]
    fn test_extract_missing_items_is_decode_error() {
        let err = Page::extract::<Products>(envelope(json!({
            "success": true,
            "data": {"items": []}
        })))
        .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));

        let err = Page::extract::<Products>(envelope(json!({
            "success": true,
            "data": {"products": {"_id": "a"}}
        })))
        .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
