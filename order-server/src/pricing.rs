//! Pricing engine
//!
//! Turns requested order lines into priced, snapshotted items using only
//! persisted menu and option records. Nothing price-related is read from the
//! client request.
//!
//! Stale menu ids (deleted since the client cached the menu) are skipped so one
//! outdated line does not abort an otherwise valid order. Options are money and
//! get no such leniency: an unknown option id fails the order.

use std::collections::HashMap;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Menu, MenuOption, OrderItemSnapshot, OrderLineRequest};

/// One priced line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineQuote {
    pub menu_id: i64,
    pub item: OrderItemSnapshot,
}

/// Priced order, ready to persist
#[derive(Debug, Clone, Default)]
pub struct OrderQuote {
    pub lines: Vec<LineQuote>,
    pub total: i64,
    /// Requested menu ids that no longer exist
    pub skipped_menu_ids: Vec<i64>,
}

impl OrderQuote {
    /// `(menu_id, quantity)` pairs for inventory planning
    pub fn menu_quantities(&self) -> Vec<(i64, i32)> {
        self.lines
            .iter()
            .map(|l| (l.menu_id, l.item.quantity))
            .collect()
    }

    pub fn items(&self) -> Vec<OrderItemSnapshot> {
        self.lines.iter().map(|l| l.item.clone()).collect()
    }
}

fn overflow() -> AppError {
    AppError::with_message(ErrorCode::ValueOutOfRange, "Order amount is out of range")
}

/// Price a single line: `(menu.price + Σ option.price) * quantity`
pub fn price_line(menu: &Menu, quantity: i32, options: &[&MenuOption]) -> AppResult<LineQuote> {
    if quantity < 1 {
        return Err(AppError::validation("quantity must be at least 1")
            .with_detail("menu_id", menu.id)
            .with_detail("quantity", quantity));
    }

    let unit_price = options
        .iter()
        .try_fold(menu.price, |acc, opt| acc.checked_add(opt.price))
        .ok_or_else(overflow)?;
    // Option deltas may be discounts, but never below zero per unit
    if unit_price < 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{} is priced below zero with the chosen options", menu.name),
        )
        .with_detail("menu_id", menu.id)
        .with_detail("unit_price", unit_price));
    }
    let line_total = unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(overflow)?;

    let options_desc = if options.is_empty() {
        None
    } else {
        Some(
            options
                .iter()
                .map(|o| o.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    };

    Ok(LineQuote {
        menu_id: menu.id,
        item: OrderItemSnapshot {
            menu_id: Some(menu.id),
            menu_name: menu.name.clone(),
            unit_price,
            quantity,
            line_total,
            options_desc,
        },
    })
}

/// Price a whole order against the store's menu and option records.
///
/// `menus` and `options` are keyed by id and must already be scoped to the
/// ordering store.
pub fn quote_order(
    requested: &[OrderLineRequest],
    menus: &HashMap<i64, Menu>,
    options: &HashMap<i64, MenuOption>,
) -> AppResult<OrderQuote> {
    let mut quote = OrderQuote::default();

    for line in requested {
        if line.quantity < 1 {
            return Err(AppError::validation("quantity must be at least 1")
                .with_detail("menu_id", line.menu_id)
                .with_detail("quantity", line.quantity));
        }

        let Some(menu) = menus.get(&line.menu_id) else {
            tracing::warn!(menu_id = line.menu_id, "Skipping unknown menu item");
            quote.skipped_menu_ids.push(line.menu_id);
            continue;
        };

        if menu.is_sold_out {
            return Err(AppError::with_message(
                ErrorCode::MenuSoldOut,
                format!("{} is sold out", menu.name),
            )
            .with_detail("menu_id", menu.id));
        }

        let resolved = line
            .option_ids
            .iter()
            .map(|id| {
                options
                    .get(id)
                    .filter(|opt| opt.menu_id == menu.id)
                    .ok_or_else(|| {
                        AppError::new(ErrorCode::OptionNotFound)
                            .with_detail("menu_id", menu.id)
                            .with_detail("option_id", *id)
                    })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let priced = price_line(menu, line.quantity, &resolved)?;
        quote.total = quote
            .total
            .checked_add(priced.item.line_total)
            .ok_or_else(overflow)?;
        quote.lines.push(priced);
    }

    if quote.lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    Ok(quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(id: i64, name: &str, price: i64) -> Menu {
        Menu {
            id,
            store_id: 1,
            name: name.to_string(),
            price,
            is_sold_out: false,
        }
    }

    fn option(id: i64, menu_id: i64, name: &str, price: i64) -> MenuOption {
        MenuOption {
            id,
            group_id: 100 + menu_id,
            menu_id,
            name: name.to_string(),
            price,
        }
    }

    fn line(menu_id: i64, quantity: i32, option_ids: Vec<i64>) -> OrderLineRequest {
        OrderLineRequest {
            menu_id,
            quantity,
            option_ids,
        }
    }

    fn catalog() -> (HashMap<i64, Menu>, HashMap<i64, MenuOption>) {
        let menus = [menu(1, "Ramen", 4000), menu(2, "Gyoza", 3000)]
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let options = [
            option(10, 1, "Extra egg", 500),
            option(11, 1, "Spicy", 0),
            option(20, 2, "Large", 1000),
        ]
        .into_iter()
        .map(|o| (o.id, o))
        .collect();
        (menus, options)
    }

    #[test]
    fn line_with_option_uses_server_prices() {
        let ramen = menu(1, "Ramen", 4000);
        let egg = option(10, 1, "Extra egg", 500);
        let quote = price_line(&ramen, 2, &[&egg]).unwrap();

        assert_eq!(quote.item.unit_price, 4500);
        assert_eq!(quote.item.line_total, 9000);
        assert_eq!(quote.item.options_desc.as_deref(), Some("Extra egg"));
    }

    #[test]
    fn option_free_line_is_base_times_quantity() {
        let gyoza = menu(2, "Gyoza", 3000);
        let quote = price_line(&gyoza, 3, &[]).unwrap();
        assert_eq!(quote.item.line_total, 9000);
        assert!(quote.item.options_desc.is_none());
    }

    #[test]
    fn order_total_is_sum_of_lines() {
        let (menus, options) = catalog();
        let quote = quote_order(
            &[line(1, 2, vec![10, 11]), line(2, 1, vec![])],
            &menus,
            &options,
        )
        .unwrap();

        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.lines[0].item.options_desc.as_deref(), Some("Extra egg, Spicy"));
        assert_eq!(quote.total, 9000 + 3000);
        assert_eq!(quote.menu_quantities(), vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn stale_menu_is_skipped() {
        let (menus, options) = catalog();
        let quote = quote_order(&[line(1, 1, vec![]), line(99, 5, vec![])], &menus, &options)
            .unwrap();

        assert_eq!(quote.total, 4000);
        assert_eq!(quote.skipped_menu_ids, vec![99]);
    }

    #[test]
    fn all_lines_stale_is_empty_order() {
        let (menus, options) = catalog();
        let err = quote_order(&[line(99, 1, vec![])], &menus, &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);

        let err = quote_order(&[], &menus, &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn foreign_option_is_rejected() {
        let (menus, options) = catalog();
        // "Large" belongs to Gyoza, not Ramen
        let err = quote_order(&[line(1, 1, vec![20])], &menus, &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::OptionNotFound);

        let err = quote_order(&[line(1, 1, vec![404])], &menus, &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::OptionNotFound);
    }

    #[test]
    fn sold_out_menu_is_rejected() {
        let (mut menus, options) = catalog();
        menus.get_mut(&2).unwrap().is_sold_out = true;
        let err = quote_order(&[line(2, 1, vec![])], &menus, &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuSoldOut);
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let (menus, options) = catalog();
        for qty in [0, -1] {
            let err = quote_order(&[line(1, qty, vec![])], &menus, &options).unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed);
        }
    }

    #[test]
    fn negative_unit_price_is_rejected() {
        let ramen = menu(1, "Ramen", 4000);
        let coupon = option(12, 1, "Coupon", -5000);
        let err = price_line(&ramen, 1, &[&coupon]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert_eq!(err.details.unwrap()["unit_price"], -1000);

        // A discount that keeps the unit price at zero or above is fine
        let half = option(13, 1, "Half portion", -2000);
        let quote = price_line(&ramen, 2, &[&half]).unwrap();
        assert_eq!(quote.item.line_total, 4000);
    }

    #[test]
    fn overflow_is_reported() {
        let huge = menu(3, "Gold leaf", i64::MAX / 2);
        let err = price_line(&huge, 3, &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }
}
