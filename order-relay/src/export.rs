//! Order list export
//!
//! Two formats: a pretty-printed JSON array and a UTF-8 CSV table with
//! a byte-order mark so spreadsheet imports pick the right encoding.
//! Filenames embed the current date. Presentation only — nothing here
//! touches the store.

use shared::Order;

/// UTF-8 byte-order mark, expected by spreadsheet CSV importers
const BOM: &[u8] = b"\xEF\xBB\xBF";

const CSV_HEADER: &str = "ID,Full Name,Phone,Email,Address,Type,Total,Date,Status";

/// Render the order list as a pretty-printed JSON array.
///
/// Returns `(filename, body)`.
pub fn json_export(orders: &[Order]) -> serde_json::Result<(String, String)> {
    let filename = format!("orders_{}.json", shared::util::today());
    let body = serde_json::to_string_pretty(orders)?;
    Ok((filename, body))
}

/// Render the order list as a BOM-prefixed CSV table.
///
/// Text fields are quoted with embedded quotes doubled; id and total
/// are emitted bare. Returns `(filename, bytes)`.
pub fn csv_export(orders: &[Order]) -> (String, Vec<u8>) {
    let filename = format!("orders_{}.csv", shared::util::today());

    let mut body = String::from(CSV_HEADER);
    for order in orders {
        body.push('\n');
        body.push_str(&csv_row(order));
    }
    body.push('\n');

    let mut bytes = Vec::with_capacity(BOM.len() + body.len());
    bytes.extend_from_slice(BOM);
    bytes.extend_from_slice(body.as_bytes());
    (filename, bytes)
}

fn csv_row(order: &Order) -> String {
    [
        order.id.to_string(),
        quote(&order.full_name),
        quote(&order.phone),
        quote(&order.email),
        quote(&order.address),
        quote(&order.order_type),
        order.total.to_string(),
        quote(&order.date),
        quote(&order.status),
    ]
    .join(",")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
