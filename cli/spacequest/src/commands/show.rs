use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use bpaf::Bpaf;
use spacequest_sdk::catalog::{Client, ClientTrait, Resource};
use spacequest_sdk::models::entity::Entity;
use spacequest_sdk::models::resource_list::{ControllerOptions, ResourceListController};
use tracing::instrument;

use super::for_entity;
use crate::utils::render::DisplayDetail;

// Show every detail of a single record
#[derive(Debug, Bpaf, Clone)]
pub struct Show {
    /// One of people (or characters), starships, planets, species, vehicles, films
    #[bpaf(positional("resource"))]
    pub resource: Resource,

    /// The name (or title) of the record, e.g. "Luke Skywalker".
    /// Must match exactly, ignoring case.
    #[bpaf(positional("name"))]
    pub name: String,
}

impl Show {
    #[instrument(name = "show", skip_all, fields(resource = %self.resource, name = %self.name))]
    pub async fn handle(self, client: Client) -> Result<()> {
        for_entity!(self.resource, |E| {
            let entity = find_entity::<E, _>(client, self.resource, &self.name).await?;
            println!("{}", DisplayDetail(&entity.detail()));
            Ok(())
        })
    }
}

/// Fetch `resource` and pick the record called `name`.
async fn find_entity<E, C>(client: C, resource: Resource, name: &str) -> Result<E>
where
    E: Entity,
    C: ClientTrait + Send + Sync + 'static,
{
    let controller =
        ResourceListController::<E, C>::mount(Arc::new(client), resource, ControllerOptions::default());

    let view = controller.settled().await;
    if let Some(error) = view.error {
        return Err(anyhow!(error))
            .with_context(|| format!("could not load {}", resource.label().to_lowercase()));
    }

    let name = name.trim();
    controller
        .find(|entity| entity.display_name().trim().eq_ignore_ascii_case(name))
        .with_context(|| {
            format!(
                "no record named '{name}' among {}",
                resource.label().to_lowercase()
            )
        })
}
