use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::order::OrderStatus;
use crate::domain::product::ProductId;
use crate::storage::{AnalyticsSource, ProductLedger, StoreResult, Stores};

/// Days covered by `order_count_per_day`, today included
const DAILY_WINDOW_DAYS: i64 = 7;
const TOP_SELLING_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub total_revenue: Decimal,
    pub order_count_per_day: Vec<DailyOrderCount>,
    pub top_selling_products: Vec<TopSellingProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyOrderCount {
    /// `YYYY-MM-DD`, UTC
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSellingProduct {
    pub name: String,
    pub qty: i64,
    pub image: Option<String>,
}

pub struct StatsService {
    source: Arc<dyn AnalyticsSource>,
    ledger: Arc<dyn ProductLedger>,
}

impl StatsService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            source: stores.analytics.clone(),
            ledger: stores.ledger.clone(),
        }
    }

    pub async fn analytics(&self) -> StoreResult<Analytics> {
        self.analytics_at(Utc::now()).await
    }

    /// Analytics as seen at `now`
    pub async fn analytics_at(&self, now: DateTime<Utc>) -> StoreResult<Analytics> {
        let today = now.date_naive();
        let first_day = today - Duration::days(DAILY_WINDOW_DAYS - 1);
        let since = first_day.and_time(NaiveTime::MIN).and_utc();
        let until = (today + Duration::days(1)).and_time(NaiveTime::MIN).and_utc();

        let (total_products, total_orders, pending_orders, total_revenue, daily, sold) = tokio::try_join!(
            self.source.count_products(),
            self.source.count_orders(None),
            self.source.count_orders(Some(OrderStatus::Pending)),
            self.source.revenue(OrderStatus::Completed),
            self.source.daily_order_counts(since, until),
            self.source.top_selling(TOP_SELLING_LIMIT),
        )?;

        let top_selling_products = self.resolve_top_selling(sold).await?;

        Ok(Analytics {
            total_products,
            total_orders,
            pending_orders,
            total_revenue,
            order_count_per_day: fill_days(first_day, &daily),
            top_selling_products,
        })
    }

    /// Attach catalog details to sales totals; deleted products drop out
    async fn resolve_top_selling(
        &self,
        sold: Vec<(ProductId, i64)>,
    ) -> StoreResult<Vec<TopSellingProduct>> {
        let ids: Vec<ProductId> = sold.iter().map(|(id, _)| *id).collect();
        let products: HashMap<ProductId, _> = self
            .ledger
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut top: Vec<TopSellingProduct> = sold
            .into_iter()
            .filter_map(|(id, qty)| {
                products.get(&id).map(|p| TopSellingProduct {
                    name: p.name.clone(),
                    qty,
                    image: p.image.clone(),
                })
            })
            .collect();

        top.sort_by(|a, b| b.qty.cmp(&a.qty));
        Ok(top)
    }
}

/// One entry per day from `first_day`, oldest first, zero where no orders
fn fill_days(first_day: NaiveDate, counts: &[(NaiveDate, i64)]) -> Vec<DailyOrderCount> {
    let counts: HashMap<NaiveDate, i64> = counts.iter().copied().collect();

    (0..DAILY_WINDOW_DAYS)
        .map(|offset| {
            let day = first_day + Duration::days(offset);
            DailyOrderCount {
                date: day.format("%Y-%m-%d").to_string(),
                count: counts.get(&day).copied().unwrap_or(0),
            }
        })
        .collect()
}
