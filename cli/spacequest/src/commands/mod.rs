mod browse;
mod list;
mod show;

use anyhow::Result;
use bpaf::Bpaf;
use indoc::indoc;

use crate::config::Config;
use crate::utils::init::init_catalog_client;

static SPACEQUEST_DESCRIPTION: &'_ str = indoc! {"
    Browse, search and page through the characters, starships, planets,
    species, vehicles and films of the public reference catalog."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, version, descr(SPACEQUEST_DESCRIPTION))]
pub struct SpaceQuestCli(#[bpaf(external(space_quest_args))] pub SpaceQuestArgs);

/// Main spacequest args parser
///
/// To parse the spacequest CLI, use [`SpaceQuestCli`] instead using [`space_quest_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct SpaceQuestArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl SpaceQuestArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        let client = init_catalog_client(&config)?;

        match self.command {
            Commands::List(args) => args.handle(client).await,
            Commands::Show(args) => args.handle(client).await,
            Commands::Browse(args) => args.handle(config, client).await,
        }
    }
}

#[derive(Debug, Bpaf, Clone)]
enum Commands {
    /// List one page of a resource
    #[bpaf(command, short('l'))]
    List(#[bpaf(external(list::list))] list::List),

    /// Show every detail of a single record
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),

    /// Page and search through a resource interactively
    #[bpaf(command)]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),
}

/// Evaluate `$body` with `$entity` naming the record type of `$resource`.
macro_rules! for_entity {
    ($resource:expr, | $entity:ident | $body:expr) => {{
        use spacequest_sdk::catalog::Resource;
        use spacequest_sdk::models::entity;

        match $resource {
            Resource::People => {
                type $entity = entity::Person;
                $body
            },
            Resource::Starships => {
                type $entity = entity::Starship;
                $body
            },
            Resource::Planets => {
                type $entity = entity::Planet;
                $body
            },
            Resource::Species => {
                type $entity = entity::Species;
                $body
            },
            Resource::Vehicles => {
                type $entity = entity::Vehicle;
                $body
            },
            Resource::Films => {
                type $entity = entity::Film;
                $body
            },
        }
    }};
}
pub(crate) use for_entity;

#[cfg(test)]
mod tests {
    use bpaf::Args;

    use super::*;

    fn parse(args: &[&str]) -> SpaceQuestArgs {
        let SpaceQuestCli(args) = space_quest_cli()
            .run_inner(Args::from(args))
            .unwrap();
        args
    }

    #[test]
    fn verbosity_is_counted() {
        assert!(matches!(
            parse(&["-vv", "list", "people"]).verbosity,
            Verbosity::Verbose(2)
        ));
        assert!(matches!(
            parse(&["--quiet", "list", "people"]).verbosity,
            Verbosity::Quiet
        ));
        assert!(matches!(
            parse(&["list", "people"]).verbosity,
            Verbosity::Verbose(0)
        ));
    }

    #[test]
    fn list_accepts_display_alias() {
        let args = parse(&["list", "characters", "--search", "sky", "--page", "2"]);
        let Commands::List(list) = args.command else {
            panic!("expected list command");
        };
        assert_eq!(list.resource, spacequest_sdk::catalog::Resource::People);
        assert_eq!(list.search.as_deref(), Some("sky"));
        assert_eq!(list.page, 2);
        assert!(!list.json);
    }

    #[test]
    fn show_takes_a_name() {
        let args = parse(&["show", "planets", "Tatooine"]);
        let Commands::Show(show) = args.command else {
            panic!("expected show command");
        };
        assert_eq!(show.name, "Tatooine");
    }

    #[test]
    fn unknown_resource_is_rejected() {
        assert!(
            space_quest_cli()
                .run_inner(Args::from(&["list", "droids"][..]))
                .is_err()
        );
    }
}
