//! Interactive product search: stdin lines feed a debounced search term,
//! the debounced term drives the product list filters.

use crate::cli::command_handlers::{flush_notifications, print_list};
use crate::cli::dispatcher::Services;
use shopdesk_core::core::debounce::Debounced;
use shopdesk_core::core::list::ResourceList;
use shopdesk_core::core::resource::{ListFilters, ProductFilters, Products};
use shopdesk_core::error::{AppError, CliError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, PartialEq)]
enum Input {
    Quit,
    NextPage,
    PrevPage,
    Term(String),
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        ":q" => Input::Quit,
        ":n" => Input::NextPage,
        ":p" => Input::PrevPage,
        term => Input::Term(term.to_string()),
    }
}

pub async fn interactive_search(
    services: &Services,
    filters: ProductFilters,
) -> Result<(), AppError> {
    let delay = Duration::from_millis(services.config.search_debounce_ms);
    let list: ResourceList<Products> =
        ResourceList::new(services.api.clone(), filters, services.ctx.clone());
    let search = Debounced::new(String::new(), delay);

    let mut terms = search.subscribe();
    let mut states = list.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type a search term and press Enter. ':n' next page, ':p' previous page, ':q' quit.");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|e| {
                    AppError::Cli(CliError::InvalidArguments(format!("Failed to read input: {}", e)))
                })?;
                let Some(line) = line else { break };
                match parse_input(&line) {
                    Input::Quit => break,
                    Input::NextPage => {
                        let total_pages = list.state().total_pages;
                        list.update_filters(|f| {
                            if f.page() < total_pages {
                                f.set_page(f.page() + 1);
                            }
                        });
                    }
                    Input::PrevPage => {
                        list.update_filters(|f| f.set_page(f.page().saturating_sub(1)));
                    }
                    Input::Term(term) => search.set(term),
                }
            }
            Ok(()) = terms.changed() => {
                let term = terms.borrow_and_update().clone();
                log::debug!("Search term settled: {:?}", term);
                list.update_filters(|f| {
                    f.search = term;
                    f.set_page(1);
                });
            }
            Ok(()) = states.changed() => {
                let state = states.borrow_and_update().clone();
                if !state.loading {
                    flush_notifications(&services.ctx);
                    if state.error.is_none() {
                        print_list::<Products>(services.format, &state, list.filters().page())?;
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(":q"), Input::Quit);
        assert_eq!(parse_input(" :n "), Input::NextPage);
        assert_eq!(parse_input(":p"), Input::PrevPage);
        assert_eq!(parse_input("  linen shirt "), Input::Term("linen shirt".to_string()));
        assert_eq!(parse_input(""), Input::Term(String::new()));
    }
}
