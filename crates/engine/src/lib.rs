pub mod cascade;
pub mod config;
pub mod error;
pub mod executor;
pub mod selector;

pub use cascade::{CascadeReport, CascadeTarget};
pub use config::{DEFAULT_IMPLICIT_PROPERTIES, RevertConfig};
pub use error::{EngineError, RevertFailure};
pub use executor::RevertStats;

use tracing::{debug, error, info};

use vcatalog_core::{CatalogItem, ExternalIdInfo, ItemId, ItemKind, PropertyKind};
use vcatalog_storage::{CacheInvalidator, CatalogDirectory, SchemaResolver};

/// A request to revert overrides on one virtual-catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertRequest {
    pub item_id: ItemId,
    pub language: String,
    /// Empty means "derive from the item's definition".
    pub properties: Vec<String>,
    /// When the item is a product family, also revert each of its variants.
    pub revert_family_variants: bool,
}

impl RevertRequest {
    pub fn new(item_id: ItemId, language: impl Into<String>) -> Self {
        Self {
            item_id,
            language: language.into(),
            properties: Vec::new(),
            revert_family_variants: false,
        }
    }

    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    pub fn revert_family_variants(mut self, cascade: bool) -> Self {
        self.revert_family_variants = cascade;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertOutcome {
    pub success: bool,
    pub failure: Option<RevertFailure>,
    pub applications: usize,
    /// Record ids in the order they were reverted.
    pub visited: Vec<ItemId>,
    pub stats: RevertStats,
}

impl RevertOutcome {
    fn succeeded(report: CascadeReport) -> Self {
        Self {
            success: true,
            failure: None,
            applications: report.applications,
            visited: report.visited,
            stats: report.stats,
        }
    }

    fn failed(failure: RevertFailure) -> Self {
        Self {
            success: false,
            failure: Some(failure),
            applications: 0,
            visited: Vec::new(),
            stats: RevertStats::default(),
        }
    }
}

/// Reverts local property overrides on virtual-catalog items so their values
/// fall back to the base catalog.
pub struct Reverter<D, S, C> {
    directory: D,
    schema: S,
    cache: C,
    config: RevertConfig,
}

impl<D, S, C> Reverter<D, S, C>
where
    D: CatalogDirectory,
    S: SchemaResolver,
    C: CacheInvalidator,
{
    pub fn new(directory: D, schema: S, cache: C) -> Self {
        Self::with_config(directory, schema, cache, RevertConfig::default())
    }

    pub fn with_config(directory: D, schema: S, cache: C, config: RevertConfig) -> Self {
        Self {
            directory,
            schema,
            cache,
            config,
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Reverts the requested overrides and saves the item.
    ///
    /// Refusals (bad id, unsupported kind, non-virtual catalog, missing item)
    /// come back as an unsuccessful outcome with nothing mutated or saved.
    /// Collaborator faults are returned as errors.
    pub fn revert(&self, request: &RevertRequest) -> Result<RevertOutcome, EngineError> {
        if request.item_id.is_nil() {
            return Ok(self.refuse(RevertFailure::InvalidArgument));
        }

        let info = match self.directory.resolve_external_id(request.item_id)? {
            Some(info) if info.item_kind.is_revertible() => info,
            other => {
                return Ok(self.refuse(RevertFailure::UnsupportedItemKind {
                    item_id: request.item_id,
                    kind: other.map(|i| i.item_kind),
                }));
            }
        };
        debug!(item_id = %request.item_id, kind = %info.item_kind, catalog = %info.catalog_name, "resolved external id");

        let is_virtual = self
            .directory
            .get_catalog(&info.catalog_name)?
            .is_some_and(|catalog| catalog.is_virtual);
        if !is_virtual {
            return Ok(self.refuse(RevertFailure::NotVirtualCatalog {
                item_id: request.item_id,
                catalog_name: info.catalog_name.clone(),
            }));
        }

        let Some(mut item) = self.load_target(&info, &request.language)? else {
            return Ok(self.refuse(not_found(&info, &request.language)));
        };

        let mut invalidate = None;
        let report = if info.item_kind == ItemKind::Variant {
            let is_family = item.is_product_family();
            let definition_name = item.definition_name.clone();
            let variant = info
                .variant_id
                .as_deref()
                .filter(|_| is_family)
                .and_then(|key| item.variant_mut(key));
            let Some(variant) = variant else {
                return Ok(self.refuse(not_found(&info, &request.language)));
            };
            invalidate = Some(variant.item_id);

            let properties = self.select(request, &definition_name, PropertyKind::VariantScoped)?;
            cascade::apply(CascadeTarget::Variant(variant), &properties, &[])
        } else {
            let properties = self.select(request, &item.definition_name, PropertyKind::Normal)?;
            if request.revert_family_variants && item.is_product_family() {
                let variant_properties = if request.properties.is_empty() {
                    self.select(request, &item.definition_name, PropertyKind::VariantScoped)?
                } else {
                    properties.clone()
                };
                cascade::apply(CascadeTarget::Family(&mut item), &properties, &variant_properties)
            } else {
                cascade::apply(CascadeTarget::Item(&mut item), &properties, &[])
            }
        };

        self.directory.save_item(&item)?;

        if let Some(variant_item_id) = invalidate {
            self.cache.remove_item(variant_item_id);
        }

        info!(
            item_id = %request.item_id,
            kind = %info.item_kind,
            applications = report.applications,
            cleared = report.stats.cleared,
            skipped = report.stats.skipped,
            "reverted virtual catalog overrides"
        );
        Ok(RevertOutcome::succeeded(report))
    }

    fn load_target(
        &self,
        info: &ExternalIdInfo,
        language: &str,
    ) -> Result<Option<CatalogItem>, EngineError> {
        let item = match info.item_kind {
            ItemKind::Category => match info.category_name.as_deref() {
                Some(category) => self.directory.get_category(&info.catalog_name, category, language)?,
                None => None,
            },
            ItemKind::Product | ItemKind::ProductFamily | ItemKind::Variant => {
                match info.product_id.as_deref() {
                    Some(product) => self.directory.get_product(&info.catalog_name, product, language)?,
                    None => None,
                }
            }
            ItemKind::Catalog => None,
        };
        Ok(item)
    }

    fn select(
        &self,
        request: &RevertRequest,
        definition_name: &str,
        kind: PropertyKind,
    ) -> Result<Vec<String>, EngineError> {
        selector::select_properties(
            &self.schema,
            &request.properties,
            definition_name,
            kind,
            &self.config.implicit_properties,
        )
    }

    fn refuse(&self, failure: RevertFailure) -> RevertOutcome {
        error!(reason = %failure, "cannot revert virtual catalog property overrides");
        RevertOutcome::failed(failure)
    }
}

fn not_found(info: &ExternalIdInfo, language: &str) -> RevertFailure {
    RevertFailure::ItemNotFound {
        kind: info.item_kind,
        catalog_name: info.catalog_name.clone(),
        category: info.category_name.clone(),
        product: info.product_id.clone(),
        variant: info.variant_id.clone(),
        language: language.to_string(),
    }
}
