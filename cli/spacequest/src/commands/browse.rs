use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use bpaf::Bpaf;
use indoc::indoc;
use spacequest_sdk::catalog::{Client, ClientTrait, Resource};
use spacequest_sdk::models::entity::Entity;
use spacequest_sdk::models::resource_list::{
    ControllerOptions,
    ResourceListController,
    ResourceListView,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, instrument};

use super::for_entity;
use crate::config::Config;
use crate::utils::render::{DisplayDetail, DisplayPage};

const BROWSE_HELP: &str = indoc! {"
    n          next page
    p          previous page
    /TERM      search for TERM, '/' alone clears the search
    r          fetch again
    NUMBER     show the record with that number
    q          quit"};

// Page and search through a resource interactively
#[derive(Debug, Bpaf, Clone)]
pub struct Browse {
    /// One of people (or characters), starships, planets, species, vehicles, films
    #[bpaf(positional("resource"))]
    pub resource: Resource,
}

impl Browse {
    #[instrument(name = "browse", skip_all, fields(resource = %self.resource))]
    pub async fn handle(self, config: Config, client: Client) -> Result<()> {
        let options = ControllerOptions {
            initial_page: 1,
            search_debounce: config.search_debounce(),
        };
        for_entity!(self.resource, |E| {
            let controller =
                ResourceListController::<E, Client>::mount(Arc::new(client), self.resource, options);
            let stdin = BufReader::new(tokio::io::stdin());
            run_browser(&controller, stdin, &mut std::io::stdout()).await
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseInput {
    Next,
    Previous,
    Search(String),
    Refresh,
    Open(usize),
    Help,
    Quit,
}

impl BrowseInput {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(term) = line.strip_prefix('/') {
            return Some(BrowseInput::Search(term.trim().to_string()));
        }
        let input = match line.to_lowercase().as_str() {
            "n" | "next" => BrowseInput::Next,
            "p" | "prev" | "previous" => BrowseInput::Previous,
            "r" | "refresh" => BrowseInput::Refresh,
            "?" | "h" | "help" => BrowseInput::Help,
            "q" | "quit" | "exit" => BrowseInput::Quit,
            other => BrowseInput::Open(other.parse().ok().filter(|n| *n > 0)?),
        };
        Some(input)
    }
}

/// Read commands from `input` until it ends or `q`, printing the list after
/// every command once the controller has settled.
async fn run_browser<E, C>(
    controller: &ResourceListController<E, C>,
    input: impl AsyncBufRead + Unpin,
    out: &mut impl Write,
) -> Result<()>
where
    E: Entity,
    C: ClientTrait + Send + Sync + 'static,
{
    write_view(out, &controller.settled().await)?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(input) = BrowseInput::parse(&line) else {
            if !line.trim().is_empty() {
                writeln!(out, "unknown command '{}'\n{BROWSE_HELP}", line.trim())?;
            }
            continue;
        };
        debug!(?input, "browse input");

        match input {
            BrowseInput::Next => controller.go_to_next_page(),
            BrowseInput::Previous => controller.go_to_previous_page(),
            BrowseInput::Search(term) => controller.set_search_term(term),
            BrowseInput::Refresh => controller.refresh(),
            BrowseInput::Open(number) => {
                match controller.view().items.get(number - 1) {
                    Some(entity) => writeln!(out, "{}", DisplayDetail(&entity.detail()))?,
                    None => writeln!(out, "there is no record {number} on this page")?,
                }
                continue;
            },
            BrowseInput::Help => {
                writeln!(out, "{BROWSE_HELP}")?;
                continue;
            },
            BrowseInput::Quit => break,
        }

        write_view(out, &controller.settled().await)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_view<E: Entity>(out: &mut impl Write, view: &ResourceListView<E>) -> Result<()> {
    if let Some(error) = &view.error {
        writeln!(out, "ERROR: {error}")?;
        writeln!(out, "Press 'r' to try again.")?;
    }
    writeln!(out, "{}", DisplayPage::new(view))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use spacequest_sdk::catalog::{MockClient, MockResponse};
    use spacequest_sdk::models::entity::Person;

    use super::*;

    fn people(n: usize) -> Value {
        Value::Array(
            (1..=n)
                .map(|i| json!({"name": format!("Person {i}")}))
                .collect(),
        )
    }

    async fn browse(mock: MockClient, input: &str) -> String {
        let controller = ResourceListController::<Person, _>::mount(
            Arc::new(mock),
            Resource::People,
            ControllerOptions::default(),
        );
        let mut out = Vec::new();
        run_browser(&controller, input.as_bytes(), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_inputs() {
        assert_eq!(BrowseInput::parse(" n "), Some(BrowseInput::Next));
        assert_eq!(BrowseInput::parse("Prev"), Some(BrowseInput::Previous));
        assert_eq!(
            BrowseInput::parse("/ luke "),
            Some(BrowseInput::Search("luke".to_string()))
        );
        assert_eq!(BrowseInput::parse("/"), Some(BrowseInput::Search(String::new())));
        assert_eq!(BrowseInput::parse("3"), Some(BrowseInput::Open(3)));
        assert_eq!(BrowseInput::parse("0"), None);
        assert_eq!(BrowseInput::parse("jump"), None);
        assert_eq!(BrowseInput::parse(""), None);
    }

    #[tokio::test(start_paused = true)]
    async fn pages_searches_and_opens() {
        let mock = MockClient::new();
        mock.push_json(people(23));

        let out = browse(mock, "n\nn\nn\np\n/person 2\n3\nq\n").await;

        assert!(out.contains("Page 1 of 3 • Total: 23"));
        assert!(out.contains("Page 3 of 3 • Total: 23"));
        // the third `n` is a no-op on the last page
        assert_eq!(out.matches("Page 3 of 3").count(), 2);
        assert!(out.contains("Page 1 of 1 • Total: 5"));
        assert!(out.contains("Person 21\nBorn —"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_shown_and_refresh_recovers() {
        let mock = MockClient::new();
        mock.push_response(MockResponse::status(500));
        mock.push_json(people(3));

        let out = browse(mock, "r\n").await;

        assert!(out.contains("ERROR: catalog request failed: 500 Internal Server Error"));
        assert!(out.contains("Page 1 of 1 • Total: 0"));
        assert!(out.contains("Page 1 of 1 • Total: 3"));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_input_prints_help() {
        let mock = MockClient::new();
        mock.push_json(people(3));

        let out = browse(mock, "jump\n9\nq\n").await;

        assert!(out.contains("unknown command 'jump'"));
        assert!(out.contains("next page"));
        assert!(out.contains("there is no record 9 on this page"));
    }
}
