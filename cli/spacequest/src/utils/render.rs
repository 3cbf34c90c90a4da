use std::fmt::Display;

use itertools::Itertools;
use spacequest_sdk::models::entity::{Entity, EntityDetail};
use spacequest_sdk::models::resource_list::ResourceListView;

/// One page of a list as numbered cards followed by a pagination footer.
///
/// Cards are numbered from 1 on every page, which is what `browse` accepts
/// to open a record.
pub struct DisplayPage<'a, E> {
    view: &'a ResourceListView<E>,
}

impl<'a, E: Entity> DisplayPage<'a, E> {
    pub fn new(view: &'a ResourceListView<E>) -> Self {
        Self { view }
    }
}

impl<E: Entity> Display for DisplayPage<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let view = self.view;

        if view.items.is_empty() && !view.is_loading {
            if view.search_term.trim().is_empty() {
                writeln!(f, "No {} found.", view.resource.label().to_lowercase())?;
            } else {
                writeln!(
                    f,
                    "No {} matched '{}'.",
                    view.resource.label().to_lowercase(),
                    view.search_term.trim()
                )?;
            }
        }

        let number_width = view.items.len().to_string().len();
        for (index, item) in view.items.iter().enumerate() {
            let card = item.card();
            writeln!(f, "{:>number_width$}. {}", index + 1, card.title)?;
            writeln!(f, "{:number_width$}  {}", "", card.subtitle)?;
            writeln!(f, "{:number_width$}  {}", "", card.badges.iter().join(" · "))?;
        }

        write!(
            f,
            "Page {} of {} • Total: {}",
            view.page, view.page_count, view.total_count
        )
    }
}

/// The detail sections of one record, labels aligned.
pub struct DisplayDetail<'a>(pub &'a EntityDetail);

impl Display for DisplayDetail<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let detail = self.0;
        writeln!(f, "{}", detail.title)?;
        writeln!(f, "{}", detail.description)?;

        let label_width = detail
            .sections
            .iter()
            .map(|section| section.label.len())
            .max()
            .unwrap_or_default();

        let mut sections = detail.sections.iter().peekable();
        if sections.peek().is_some() {
            writeln!(f)?;
        }
        while let Some(section) = sections.next() {
            // the opening crawl comes with hard line breaks
            let value = section.value.split_whitespace().join(" ");
            write!(f, "{:<label_width$}  {value}", section.label)?;
            // Only print a newline if there are more sections to print
            if sections.peek().is_some() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
