use crate::{merge_properties, Catalog, CatalogError, CatalogUser, Outcomes, PropertyMap};
use serde::Serialize;
use tracing::{debug, info};

/// Merges new facts into catalog users and upserts them one at a time.
pub struct CatalogWriter<'a> {
    catalog: &'a dyn Catalog,
    blueprint: &'a str,
}

/// What happened to the users handed to [`CatalogWriter::write_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub updated: Vec<String>,
    pub skipped: usize,
    pub failed: Vec<String>,
}

impl<'a> CatalogWriter<'a> {
    pub fn new(catalog: &'a dyn Catalog, blueprint: &'a str) -> Self {
        Self { catalog, blueprint }
    }

    /// Overlay `fragment` on the user's existing properties and upsert the
    /// result. Relations are sent back exactly as read.
    pub async fn merge_and_upsert(
        &self,
        user: &CatalogUser,
        fragment: PropertyMap,
    ) -> Result<CatalogUser, CatalogError> {
        let merged = CatalogUser {
            identifier: user.identifier.clone(),
            title: user.title.clone(),
            properties: merge_properties(&user.properties, fragment),
            relations: user.relations.clone(),
        };
        self.catalog.upsert_entity(self.blueprint, &merged).await?;
        debug!("Upserted {} into {}", merged.identifier, self.blueprint);
        Ok(merged)
    }

    /// Write every pending update. `None` fragments are users without new
    /// facts and are skipped without an API call; a failed upsert is logged
    /// and does not stop the remaining users.
    pub async fn write_all<'u, I>(&self, updates: I) -> WriteReport
    where
        I: IntoIterator<Item = (&'u CatalogUser, Option<PropertyMap>)>,
    {
        let mut outcomes: Outcomes<CatalogUser, CatalogError> = Outcomes::new();
        let mut skipped = 0;

        for (user, fragment) in updates {
            match fragment {
                Some(fragment) if !fragment.is_empty() => {
                    let result = self.merge_and_upsert(user, fragment).await;
                    outcomes.push(user.identifier.clone(), result);
                }
                _ => skipped += 1,
            }
        }

        outcomes.log_failures("Catalog upsert");
        let report = WriteReport {
            updated: outcomes
                .successes()
                .map(|(key, _)| key.to_string())
                .collect(),
            skipped,
            failed: outcomes.failures().map(|(key, _)| key.to_string()).collect(),
        };
        info!(
            "Catalog write finished: {} updated, {} skipped, {} failed",
            report.updated.len(),
            report.skipped,
            report.failed.len()
        );
        report
    }
}
