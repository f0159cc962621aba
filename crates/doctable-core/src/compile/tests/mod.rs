
use crate::expr::Expr;
use doctable_primitives::AttributeType;

pub(super) const TABLE: &str = "StockTable";

pub(super) fn symbol() -> Expr {
    Expr::table_attribute("symbol", AttributeType::String)
}

pub(super) fn price() -> Expr {
    Expr::table_attribute("price", AttributeType::Float)
}

pub(super) fn volume() -> Expr {
    Expr::table_attribute("volume", AttributeType::Long)
}
