use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use bpaf::Bpaf;
use spacequest_sdk::catalog::{Client, ClientTrait, Resource};
use spacequest_sdk::models::entity::Entity;
use spacequest_sdk::models::resource_list::{
    ControllerOptions,
    ResourceListController,
    ResourceListView,
};
use tracing::{debug, instrument};

use super::for_entity;
use crate::utils::message;
use crate::utils::render::DisplayPage;

// List one page of a resource
#[derive(Debug, Bpaf, Clone)]
pub struct List {
    /// Display the page as a JSON array
    #[bpaf(long)]
    pub json: bool,

    /// Only list records matching TERM by name, title or any other field
    #[bpaf(short, long, argument("TERM"))]
    pub search: Option<String>,

    /// The page to show, clamped to the last page
    #[bpaf(short, long, argument("N"), fallback(1))]
    pub page: u32,

    /// One of people (or characters), starships, planets, species, vehicles, films
    #[bpaf(positional("resource"))]
    pub resource: Resource,
}

impl List {
    #[instrument(name = "list", skip_all, fields(resource = %self.resource, search = self.search.as_deref(), page = self.page))]
    pub async fn handle(self, client: Client) -> Result<()> {
        for_entity!(self.resource, |E| {
            let view = load_page::<E, _>(client, self.resource, self.search.as_deref(), self.page)
                .await?;
            if view.page < self.page {
                message::warning(format!(
                    "there are only {} pages, showing page {}",
                    view.page_count, view.page
                ));
            }
            render_page(&view, self.json, &mut std::io::stdout())
        })
    }
}

/// Fetch `resource` and navigate to one page of the records matching `search`.
pub(super) async fn load_page<E, C>(
    client: C,
    resource: Resource,
    search: Option<&str>,
    page: u32,
) -> Result<ResourceListView<E>>
where
    E: Entity,
    C: ClientTrait + Send + Sync + 'static,
{
    // Input is complete up front, nothing to wait for.
    let options = ControllerOptions {
        initial_page: 1,
        search_debounce: Duration::ZERO,
    };
    let controller = ResourceListController::<E, C>::mount(Arc::new(client), resource, options);

    let mut view = controller.settled().await;
    if let Some(term) = search {
        controller.set_search_term(term);
        view = controller.settled().await;
    }
    if let Some(error) = view.error {
        return Err(anyhow!(error))
            .with_context(|| format!("could not list {}", resource.label().to_lowercase()));
    }

    controller.go_to_page(page);
    let view = controller.view();
    debug!(page = view.page, total = view.total_count, "loaded page");
    Ok(view)
}

pub(super) fn render_page<E: Entity>(
    view: &ResourceListView<E>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    if json {
        let items = serde_json::to_string_pretty(&view.items)?;
        writeln!(out, "{items}")?;
    } else {
        writeln!(out, "{}", DisplayPage::new(view))?;
    }
    Ok(())
}
