// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tabula_app::{
    CellEditorRegistry, EditorKind, ForeignKeyRef, RelationColumn, RelationSpec, ValueKind,
};

pub const STAFF: &str = "Staff";
pub const CUSTOMERS: &str = "Customers";
pub const ORDERS: &str = "Orders";
pub const CATEGORIES: &str = "Categories";
pub const PRODUCTS: &str = "Products";

/// Browser tabs for the inventory database, in display order. Staff
/// accounts are only listed for administrators.
pub fn inventory_relations(include_staff: bool) -> Vec<RelationSpec> {
    let mut relations = Vec::with_capacity(5);
    if include_staff {
        relations.push(staff());
    }
    relations.extend([customers(), orders(), categories(), products()]);
    relations
}

pub fn inventory_editors() -> CellEditorRegistry {
    CellEditorRegistry::new()
        .with("phone", EditorKind::phone())
        .with("date_of_order", EditorKind::date())
        .with("product_price", EditorKind::currency())
        .with("unit_price", EditorKind::currency())
        .with("total", EditorKind::currency())
}

fn staff() -> RelationSpec {
    RelationSpec::new(STAFF, "staff_id")
        .column(RelationColumn::new("staff_id", ValueKind::Text))
        .column(RelationColumn::new("username", ValueKind::Text))
        .column(RelationColumn::new("password", ValueKind::Text).read_only())
        .column(RelationColumn::new("is_admin", ValueKind::Integer))
}

fn customers() -> RelationSpec {
    RelationSpec::new(CUSTOMERS, "customer_id")
        .column(RelationColumn::new("customer_id", ValueKind::Text))
        .column(RelationColumn::new("first_name", ValueKind::Text))
        .column(RelationColumn::new("last_name", ValueKind::Text))
        .column(RelationColumn::new("address", ValueKind::Text))
        .column(RelationColumn::new("phone", ValueKind::Text))
        .column(RelationColumn::new("email", ValueKind::Text))
        .column(
            RelationColumn::new("staff_id", ValueKind::Text)
                .with_label("staff_username")
                .references(ForeignKeyRef::new(STAFF, "staff_id", "username")),
        )
}

fn orders() -> RelationSpec {
    RelationSpec::new(ORDERS, "order_id")
        .column(RelationColumn::new("order_id", ValueKind::Text))
        .column(RelationColumn::new("date_of_order", ValueKind::Date))
        .column(RelationColumn::new("order_status", ValueKind::Text))
        .column(RelationColumn::new("unit_price", ValueKind::Currency))
        .column(RelationColumn::new("quantity", ValueKind::Integer))
        .column(RelationColumn::new("discount", ValueKind::Real))
        .column(RelationColumn::new("total", ValueKind::Currency))
        .column(
            RelationColumn::new("product_id", ValueKind::Text)
                .with_label("product_name")
                .references(ForeignKeyRef::new(PRODUCTS, "product_id", "product_name")),
        )
        .column(
            RelationColumn::new("customer_id", ValueKind::Text)
                .with_label("customer_name")
                .references(ForeignKeyRef::new(CUSTOMERS, "customer_id", "first_name")),
        )
}

fn categories() -> RelationSpec {
    RelationSpec::new(CATEGORIES, "category_id")
        .column(RelationColumn::new("category_id", ValueKind::Integer))
        .column(RelationColumn::new("category_name", ValueKind::Text))
        .column(RelationColumn::new("category_description", ValueKind::Text))
}

fn products() -> RelationSpec {
    RelationSpec::new(PRODUCTS, "product_id")
        .column(RelationColumn::new("product_id", ValueKind::Text))
        .column(RelationColumn::new("product_name", ValueKind::Text))
        .column(RelationColumn::new("product_description", ValueKind::Text))
        .column(RelationColumn::new("product_price", ValueKind::Currency))
        .column(
            RelationColumn::new("category_id", ValueKind::Integer)
                .with_label("category_name")
                .references(ForeignKeyRef::new(CATEGORIES, "category_id", "category_name")),
        )
}

#[cfg(test)]
mod tests {
    use super::{STAFF, inventory_editors, inventory_relations};
    use tabula_app::{ColumnSpec, EditorKind, ValueKind};

    #[test]
    fn staff_requires_admin() {
        let admin = inventory_relations(true);
        let clerk = inventory_relations(false);
        assert_eq!(admin.len(), 5);
        assert_eq!(clerk.len(), 4);
        assert_eq!(admin[0].relation, STAFF);
        assert!(clerk.iter().all(|spec| spec.relation != STAFF));
    }

    #[test]
    fn every_relation_lists_its_primary_key_first() {
        for spec in inventory_relations(true) {
            assert_eq!(spec.columns[0].name, spec.primary_key, "{}", spec.relation);
        }
    }

    #[test]
    fn phone_column_is_masked() {
        let editors = inventory_editors();
        let phone = ColumnSpec::new("phone", ValueKind::Text);
        assert_eq!(editors.editor_for(&phone), &EditorKind::phone());
    }
}
