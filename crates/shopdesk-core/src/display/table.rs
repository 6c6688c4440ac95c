use crate::core::list::ListState;
use crate::core::resource::{Column, Resource, Stats};
use crate::utils::text::{humanize_key, truncate_text, value_to_cell};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets};
use crossterm::terminal;
use serde_json::Value;

const MAX_CELL_WIDTH: usize = 40;

pub struct TableDisplay {
    max_width: Option<usize>,
    use_colors: bool,
}

impl TableDisplay {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: true,
        }
    }

    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _)) => {
                let width = cols as usize;
                Some(width.clamp(40, 200))
            }
            Err(_) => Some(80),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn bold_header(&self, text: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).add_attribute(Attribute::Bold).fg(color)
        } else {
            Cell::new(text).add_attribute(Attribute::Bold)
        }
    }

    fn colored_cell(&self, text: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).fg(color)
        } else {
            Cell::new(text)
        }
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        self.configure_table_width(&mut table);
        table
    }

    fn configure_table_width(&self, table: &mut Table) {
        let width = self
            .max_width
            .map(|w| if w > 20 { w - 6 } else { w.max(40) })
            .unwrap_or(80);
        table.set_width(width as u16);
    }

    /// Entity field for a column. `_id` falls back to `id`.
    fn field<'a>(entity: &'a Value, column: &Column) -> Option<&'a Value> {
        match entity.get(column.key) {
            None if column.key == "_id" => entity.get("id"),
            other => other,
        }
    }

    fn status_color(text: &str) -> Option<Color> {
        match text {
            "active" | "paid" | "delivered" | "yes" => Some(Color::Green),
            "inactive" | "failed" | "cancelled" | "no" => Some(Color::Red),
            "pending" | "processing" => Some(Color::Yellow),
            "confirmed" | "shipped" => Some(Color::Cyan),
            _ => None,
        }
    }

    /// Items of a list state as a table with the resource's columns.
    pub fn render_items<R: Resource>(&self, state: &ListState) -> String {
        if state.items.is_empty() {
            return format!("No {} found.", R::ITEMS_KEY);
        }

        let mut table = self.new_table();
        let headers: Vec<Cell> = R::COLUMNS
            .iter()
            .map(|c| self.bold_header(c.header, Color::Cyan))
            .collect();
        table.set_header(headers);

        for entity in &state.items {
            let cells: Vec<Cell> = R::COLUMNS
                .iter()
                .map(|column| {
                    let text = Self::field(entity, column)
                        .map(value_to_cell)
                        .unwrap_or_else(|| "-".to_string());
                    let text = truncate_text(&text, MAX_CELL_WIDTH);
                    match Self::status_color(&text) {
                        Some(color) => self.colored_cell(&text, color),
                        None => Cell::new(text),
                    }
                })
                .collect();
            table.add_row(cells);
        }

        table.to_string()
    }

    pub fn render_stats(&self, stats: &Stats) -> String {
        let rows: Vec<Vec<String>> = stats
            .iter()
            .map(|(key, value)| vec![humanize_key(key), format_number(*value)])
            .collect();
        self.render_simple_table(&["Metric", "Value"], &rows)
    }

    /// `Page 2/5 | 47 items`, plus the last error if the most recent fetch failed.
    pub fn render_footer(&self, state: &ListState, page: u32) -> String {
        let mut footer = format!(
            "Page {}/{} | {} items",
            page, state.total_pages, state.total_items
        );
        if let Some(error) = &state.error {
            footer.push_str(&format!(" | Error: {}", error));
        }
        footer
    }

    /// Stats, items and footer of one list state.
    pub fn render_list<R: Resource>(&self, state: &ListState, page: u32) -> String {
        format!(
            "{}\n{}\n{}",
            self.render_stats(&state.stats),
            self.render_items::<R>(state),
            self.render_footer(state, page)
        )
    }

    /// One entity as a field/value table, keys in document order of the object.
    pub fn render_entity(&self, entity: &Value) -> String {
        let Some(object) = entity.as_object() else {
            return value_to_cell(entity);
        };
        let rows: Vec<Vec<String>> = object
            .iter()
            .map(|(key, value)| vec![key.clone(), value_to_cell(value)])
            .collect();
        self.render_simple_table(&["Field", "Value"], &rows)
    }

    /// Render a simple table with custom headers and rows
    pub fn render_simple_table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut table = self.new_table();
        let header_cells: Vec<Cell> = headers
            .iter()
            .map(|h| self.bold_header(h, Color::Cyan))
            .collect();
        table.set_header(header_cells);

        for row in rows {
            let cells: Vec<Cell> = row.iter().map(Cell::new).collect();
            table.add_row(cells);
        }

        table.to_string()
    }
}

impl Default for TableDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::{Orders, Products};
    use serde_json::json;

    fn product_state() -> ListState {
        let mut stats = Products::default_stats();
        stats.insert("totalProducts".to_string(), 2.0);
        ListState {
            items: vec![
                json!({"_id": "p1", "title": "Linen Shirt", "price": 49.5, "stock": 3,
                       "category": {"_id": "c1", "name": "Shirts"}, "isActive": true}),
                json!({"id": 7, "title": "Canvas Tote", "price": 12, "stock": 0, "isActive": false}),
            ],
            stats,
            total_pages: 3,
            total_items: 21,
            loading: false,
            error: None,
        }
    }

    #[test]
    fn test_table_display_creation() {
        let display = TableDisplay::new();
        assert!(display.use_colors);

        let display = TableDisplay::new().with_max_width(80).with_colors(false);
        assert_eq!(display.max_width, Some(80));
        assert!(!display.use_colors);
    }

    #[test]
    fn test_render_items_uses_resource_columns() {
        let display = TableDisplay::new().with_max_width(200).with_colors(false);
        let out = display.render_items::<Products>(&product_state());
        assert!(out.contains("Product"));
        assert!(out.contains("Linen Shirt"));
        assert!(out.contains("Shirts"));
        assert!(out.contains("Canvas Tote"));
        // `id` stands in for a missing `_id`
        assert!(out.contains('7'));
    }

    #[test]
    fn test_render_items_empty() {
        let display = TableDisplay::new().with_colors(false);
        let state = ListState::empty(Orders::default_stats());
        assert_eq!(display.render_items::<Orders>(&state), "No orders found.");
    }

    #[test]
    fn test_render_stats_and_footer() {
        let display = TableDisplay::new().with_max_width(120).with_colors(false);
        let state = product_state();
        let stats = display.render_stats(&state.stats);
        assert!(stats.contains("Total Products"));
        assert!(stats.contains("Total Inactive Products"));

        assert_eq!(display.render_footer(&state, 2), "Page 2/3 | 21 items");

        let failed = ListState {
            error: Some("Network down".to_string()),
            ..state
        };
        assert_eq!(
            display.render_footer(&failed, 1),
            "Page 1/3 | 21 items | Error: Network down"
        );
    }

    #[test]
    fn test_render_entity() {
        let display = TableDisplay::new().with_max_width(120).with_colors(false);
        let out = display.render_entity(&json!({"orderStatus": "shipped", "totalAmount": 99.9}));
        assert!(out.contains("orderStatus"));
        assert!(out.contains("shipped"));
        assert!(out.contains("99.9"));
        assert_eq!(display.render_entity(&json!("plain")), "plain");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(1234.5), "1234.50");
        assert_eq!(format_number(0.0), "0");
    }
}
