use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{ContentItem, FieldType};

pub const PRODUCT_POST_TYPE: &str = "product";
/// Field-map prefix of product attributes, e.g. `attribute_color`.
pub const ATTRIBUTE_PREFIX: &str = "attribute_";
pub const STOCK_QUANTITY_FIELD: &str = "stock_quantity";
pub const STOCK_STATUS_FIELD: &str = "stock_status";

const PRODUCT_FIELDS: [(&str, FieldType); 3] = [
    ("product_name", FieldType::Text),
    ("product_description", FieldType::Textarea),
    ("product_short_description", FieldType::Textarea),
];

pub fn is_product(item: &ContentItem) -> bool {
    item.post_type == PRODUCT_POST_TYPE
}

/// Name, descriptions and one text field per attribute.
pub fn product_fields(item: &ContentItem) -> Vec<(String, FieldType)> {
    let mut fields: Vec<(String, FieldType)> = PRODUCT_FIELDS
        .iter()
        .map(|(name, field_type)| (name.to_string(), *field_type))
        .collect();
    fields.extend(
        item.fields
            .keys()
            .filter(|key| key.starts_with(ATTRIBUTE_PREFIX) && key.len() > ATTRIBUTE_PREFIX.len())
            .map(|key| (key.clone(), FieldType::Text)),
    );
    fields
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockStatus {
    InStock,
    OutOfStock,
    OnBackorder,
}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "instock",
            Self::OutOfStock => "outofstock",
            Self::OnBackorder => "onbackorder",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "instock" => Ok(Self::InStock),
            "outofstock" => Ok(Self::OutOfStock),
            "onbackorder" => Ok(Self::OnBackorder),
            other => Err(AppError::InvalidInput(format!("unknown stock status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    /// `None` for products that don't track a quantity
    pub quantity: Option<i64>,
    pub status: StockStatus,
}

impl StockLevel {
    fn fields(self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                STOCK_QUANTITY_FIELD.to_string(),
                self.quantity.map(|q| q.to_string()).unwrap_or_default(),
            ),
            (STOCK_STATUS_FIELD.to_string(), self.status.as_str().to_string()),
        ])
    }
}

/// Keeps stock fields equal across every product of a translation group.
pub struct InventorySync<'a> {
    repo: &'a Repository,
}

impl<'a> InventorySync<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Ids sharing the item's translation group, the item included. The
    /// group comes from the item, else from its stored hreflang rows.
    async fn translations_of(&self, item: &ContentItem) -> Result<BTreeSet<i64>> {
        let group = match item.translation_group.clone() {
            Some(group) => Some(group),
            None => self
                .repo
                .list_for_content(item.id)
                .await?
                .into_iter()
                .find_map(|e| e.translation_group.filter(|g| !g.is_empty())),
        };

        let mut ids = BTreeSet::from([item.id]);
        let Some(group) = group else {
            return Ok(ids);
        };
        ids.extend(self.repo.group_members(&group, None).await?.iter().map(|m| m.id));
        ids.extend(self.repo.list_for_group(&group).await?.iter().map(|e| e.content_id));
        Ok(ids)
    }

    /// Set the stock of a product and copy it to its translations; returns
    /// the ids of the translations that were updated.
    pub async fn set_stock(&self, product_id: i64, level: StockLevel) -> Result<Vec<i64>> {
        let item = self
            .repo
            .get_content(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("content {product_id}")))?;
        if !is_product(&item) {
            return Err(AppError::InvalidInput(format!(
                "content {product_id} is a {}, not a product",
                item.post_type
            )));
        }

        self.repo.set_content_fields(product_id, level.fields()).await?;

        let mut synced = Vec::new();
        for id in self.translations_of(&item).await? {
            if id == product_id {
                continue;
            }
            match self.repo.get_content(id).await? {
                Some(member) if is_product(&member) => {
                    self.repo.set_content_fields(id, level.fields()).await?;
                    synced.push(id);
                }
                Some(member) => {
                    tracing::debug!("Skipping stock sync to {} ({})", id, member.post_type)
                }
                None => tracing::debug!("Skipping stock sync to missing content {}", id),
            }
        }

        tracing::info!(
            "Stock of product {} set to {}; synced {} translation(s)",
            product_id,
            level.status.as_str(),
            synced.len()
        );
        Ok(synced)
    }
}
