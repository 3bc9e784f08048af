use tracing::debug;
use vcatalog_core::{CatalogItem, ItemId, Variant};

use crate::executor::{RevertStats, clear_overrides};

/// The record(s) a revert is applied to.
pub enum CascadeTarget<'a> {
    /// A category, product or family record on its own.
    Item(&'a mut CatalogItem),
    /// A single variant of a product family.
    Variant(&'a mut Variant),
    /// A product family followed by each of its variants, in order.
    Family(&'a mut CatalogItem),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Number of records the executor ran against.
    pub applications: usize,
    /// Ids of those records, in application order.
    pub visited: Vec<ItemId>,
    pub stats: RevertStats,
}

impl CascadeReport {
    fn record(&mut self, item_id: ItemId, stats: RevertStats) {
        self.applications += 1;
        self.visited.push(item_id);
        self.stats += stats;
    }
}

/// Runs the executor over the target. `variant_properties` is only used for
/// the variants of a `Family` target; every other record gets `properties`.
pub fn apply(
    target: CascadeTarget<'_>,
    properties: &[String],
    variant_properties: &[String],
) -> CascadeReport {
    let mut report = CascadeReport::default();
    match target {
        CascadeTarget::Item(item) => {
            let stats = clear_overrides(properties, item);
            report.record(item.item_id, stats);
        }
        CascadeTarget::Variant(variant) => {
            let stats = clear_overrides(properties, variant);
            report.record(variant.item_id, stats);
        }
        CascadeTarget::Family(family) => {
            let stats = clear_overrides(properties, family);
            report.record(family.item_id, stats);
            for variant in family.variants.iter_mut() {
                let stats = clear_overrides(variant_properties, variant);
                report.record(variant.item_id, stats);
            }
            debug!(
                family = %family.key,
                variants = family.variants.len(),
                "cascaded revert across product family"
            );
        }
    }
    report
}
