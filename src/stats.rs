use crate::aggregate::{aggregate, MetricSpec};
use crate::buckets::{bucketize, Granularity};
use crate::models::{DashboardStats, FarmData, RevenuePoint};
use crate::reports::finance_entries;
use chrono::{DateTime, Duration, Utc};

const REVENUE: [MetricSpec; 1] = [MetricSpec::sum("revenue")];

pub fn build_dashboard(data: &FarmData) -> DashboardStats {
    build_dashboard_at(Utc::now(), data)
}

/// All-time headline figures plus daily revenue for the week ending `now`.
pub fn build_dashboard_at(now: DateTime<Utc>, data: &FarmData) -> DashboardStats {
    let today = now.date_naive();

    let revenue: f64 = data.sales.iter().map(|sale| sale.revenue()).sum();
    let expenses: f64 = finance_entries(data)
        .iter()
        .map(|entry| entry.expenses)
        .sum();

    let last_7_days = bucketize(today - Duration::days(6), today, Granularity::Day)
        .map(|buckets| {
            aggregate(&data.sales, &buckets, &REVENUE)
                .into_iter()
                .map(|row| RevenuePoint {
                    revenue: row.get("revenue").unwrap_or_default(),
                    period: row.period,
                })
                .collect()
        })
        .unwrap_or_default();

    DashboardStats {
        generated_at: now.to_rfc3339(),
        sales_count: data.sales.len() as u64,
        revenue,
        health_events: data.health.len() as u64,
        breeding_events: data.breeding.len() as u64,
        offspring: data.breeding.iter().map(|event| event.offspring).sum(),
        feed_quantity: data.feed.iter().map(|entry| entry.quantity).sum(),
        feed_cost: data.feed.iter().map(|entry| entry.cost).sum(),
        expenses,
        net: revenue - expenses,
        last_7_days,
    }
}
