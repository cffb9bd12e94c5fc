use tabled::{builder::Builder, settings::Style};

use crate::{Route, RowSet};

/// Render a query result with its own column headers
pub fn row_set_table(rows: &RowSet) -> String {
    let mut builder = Builder::default();
    builder.push_record(rows.columns.iter().cloned());
    for row in &rows.rows {
        builder.push_record(row.iter().map(ToString::to_string));
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn routes_table(routes: &[Route]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Code", "Authority", "Path", "Table"].map(String::from));
    for route in routes {
        builder.push_record([
            route.code.to_string(),
            route.authority.clone().unwrap_or_default(),
            route.path.clone(),
            if route.table.is_empty() { "-".to_string() } else { route.table.clone() },
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}
