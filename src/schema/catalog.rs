//! The food-delivery data model: fourteen tables, their foreign keys and
//! which of them are served over HTTP.
//!
//! Delete policy is RESTRICT unless stated otherwise below: order line items
//! and status history cascade with their order, and an order outlives its
//! driver (SET NULL).

use crate::schema::types::*;
use std::collections::HashMap;

use ColumnType::{Boolean, Integer, Timestamp, Varchar};

fn col(name: &str, type_: ColumnType) -> ColumnConfig {
    ColumnConfig {
        name: name.to_string(),
        type_,
        nullable: true,
        default: None,
    }
}

fn timestamp_now(name: &str) -> ColumnConfig {
    ColumnConfig {
        default: Some(ColumnDefault::Now),
        ..col(name, Timestamp)
    }
}

fn table(name: &str, label: &str, mut columns: Vec<ColumnConfig>) -> TableConfig {
    columns.insert(
        0,
        ColumnConfig {
            name: "id".into(),
            type_: ColumnType::Serial,
            nullable: false,
            default: None,
        },
    );
    TableConfig {
        name: name.to_string(),
        label: label.to_string(),
        primary_key: "id".into(),
        columns,
        validation: HashMap::new(),
    }
}

fn with_rules(mut t: TableConfig, rules: Vec<(&str, ValidationRule)>) -> TableConfig {
    t.validation = rules.into_iter().map(|(c, r)| (c.to_string(), r)).collect();
    t
}

fn required() -> ValidationRule {
    ValidationRule {
        required: Some(true),
        min_length: Some(1),
        ..Default::default()
    }
}

fn non_negative() -> ValidationRule {
    ValidationRule {
        minimum: Some(0.0),
        ..Default::default()
    }
}

fn fk(
    from_table: &str,
    from_column: &str,
    to_table: &str,
    to_one_name: &str,
    to_many_name: &str,
    on_delete: OnDelete,
) -> RelationshipConfig {
    RelationshipConfig {
        from_table: from_table.to_string(),
        from_column: from_column.to_string(),
        to_table: to_table.to_string(),
        to_column: "id".into(),
        on_delete,
        to_one_name: to_one_name.to_string(),
        to_many_name: to_many_name.to_string(),
    }
}

fn tables() -> Vec<TableConfig> {
    vec![
        with_rules(
            table(
                "users",
                "User",
                vec![
                    col("name", Varchar),
                    col("contact_phone", Varchar),
                    col("phone_verified", Boolean),
                    col("email", Varchar),
                    col("email_verified", Boolean),
                    col("confirmation_code", Varchar),
                    col("password", Varchar),
                    timestamp_now("created_at"),
                    timestamp_now("updated_at"),
                ],
            ),
            vec![
                ("name", required()),
                (
                    "email",
                    ValidationRule {
                        format: Some("email".into()),
                        ..required()
                    },
                ),
                (
                    "contact_phone",
                    ValidationRule {
                        pattern: Some(r"^\+?[0-9 ()-]{6,20}$".into()),
                        ..Default::default()
                    },
                ),
            ],
        ),
        with_rules(
            table("state", "State", vec![col("name", Varchar), col("code", Varchar)]),
            vec![("name", required())],
        ),
        with_rules(
            table("city", "City", vec![col("name", Varchar), col("state_id", Integer)]),
            vec![("name", required())],
        ),
        with_rules(
            table(
                "address",
                "Address",
                vec![
                    col("street_address_1", Varchar),
                    col("street_address_2", Varchar),
                    col("zip_code", Varchar),
                    col("delivery_instructions", Varchar),
                    col("user_id", Integer),
                    col("city_id", Integer),
                    timestamp_now("created_at"),
                    timestamp_now("updated_at"),
                ],
            ),
            vec![("street_address_1", required())],
        ),
        with_rules(
            table(
                "restaurant",
                "Restaurant",
                vec![
                    col("name", Varchar),
                    col("street_address", Varchar),
                    col("zip_code", Varchar),
                    col("city_id", Integer),
                    timestamp_now("created_at"),
                    timestamp_now("updated_at"),
                ],
            ),
            vec![("name", required())],
        ),
        table("category", "Category", vec![col("name", Varchar)]),
        with_rules(
            table(
                "menu_item",
                "Menu item",
                vec![
                    col("name", Varchar),
                    col("restaurant_id", Integer),
                    col("category_id", Integer),
                    col("description", Varchar),
                    col("ingredients", Varchar),
                    col("price", Integer),
                    col("active", Boolean),
                    timestamp_now("created_at"),
                    timestamp_now("updated_at"),
                ],
            ),
            vec![("price", non_negative())],
        ),
        table(
            "restaurant_owner",
            "Restaurant owner",
            vec![col("restaurant_id", Integer), col("owner_id", Integer)],
        ),
        table(
            "driver",
            "Driver",
            vec![
                col("car_make", Varchar),
                col("car_model", Varchar),
                col("car_year", Varchar),
                col("user_id", Integer),
                col("online", Boolean),
                col("delivering", Boolean),
                timestamp_now("created_at"),
                timestamp_now("updated_at"),
            ],
        ),
        with_rules(
            table(
                "orders",
                "Order",
                vec![
                    col("restaurant_id", Integer),
                    col("estimated_delivery_time", Timestamp),
                    col("actual_delivery_time", Timestamp),
                    col("delivery_address_id", Integer),
                    col("user_id", Integer),
                    col("driver_id", Integer),
                    col("price", Integer),
                    col("discount", Integer),
                    col("final_price", Integer),
                    col("comment", Varchar),
                    timestamp_now("created_at"),
                    timestamp_now("updated_at"),
                ],
            ),
            vec![
                ("price", non_negative()),
                ("discount", non_negative()),
                ("final_price", non_negative()),
            ],
        ),
        table(
            "comment",
            "Comment",
            vec![
                col("order_id", Integer),
                col("user_id", Integer),
                col("comment_text", Varchar),
                col("is_compliant", Boolean),
                col("is_praise", Boolean),
                timestamp_now("created_at"),
                timestamp_now("updated_at"),
            ],
        ),
        table("status_catalog", "Status", vec![col("name", Varchar)]),
        table(
            "order_status",
            "Order status",
            vec![
                col("order_id", Integer),
                col("status_catalog_id", Integer),
                timestamp_now("created_at"),
            ],
        ),
        with_rules(
            table(
                "order_menu_item",
                "Order item",
                vec![
                    col("order_id", Integer),
                    col("menu_item_id", Integer),
                    col("quantity", Integer),
                    col("item_price", Integer),
                    col("price", Integer),
                    col("comment", Varchar),
                ],
            ),
            vec![
                ("quantity", non_negative()),
                ("item_price", non_negative()),
                ("price", non_negative()),
            ],
        ),
    ]
}

fn relationships() -> Vec<RelationshipConfig> {
    use OnDelete::{Cascade, Restrict, SetNull};
    vec![
        fk("city", "state_id", "state", "state", "cities", Restrict),
        fk("address", "user_id", "users", "user", "addresses", Restrict),
        fk("address", "city_id", "city", "city", "addresses", Restrict),
        fk("restaurant", "city_id", "city", "city", "restaurants", Restrict),
        fk("menu_item", "restaurant_id", "restaurant", "restaurant", "menuItems", Restrict),
        fk("menu_item", "category_id", "category", "category", "menuItems", Restrict),
        fk("restaurant_owner", "restaurant_id", "restaurant", "restaurant", "owners", Restrict),
        fk("restaurant_owner", "owner_id", "users", "owner", "restaurantOwners", Restrict),
        fk("driver", "user_id", "users", "user", "drivers", Restrict),
        fk("orders", "restaurant_id", "restaurant", "restaurant", "orders", Restrict),
        fk("orders", "delivery_address_id", "address", "deliveryAddress", "orders", Restrict),
        fk("orders", "user_id", "users", "user", "orders", Restrict),
        fk("orders", "driver_id", "driver", "driver", "orders", SetNull),
        fk("comment", "order_id", "orders", "order", "comments", Restrict),
        fk("comment", "user_id", "users", "user", "comments", Restrict),
        fk("order_status", "order_id", "orders", "order", "statuses", Cascade),
        fk("order_status", "status_catalog_id", "status_catalog", "status", "orderStatuses", Restrict),
        fk("order_menu_item", "order_id", "orders", "order", "orderMenuItems", Cascade),
        fk("order_menu_item", "menu_item_id", "menu_item", "menuItem", "orderMenuItems", Restrict),
    ]
}

fn api_entities() -> Vec<ApiEntityConfig> {
    use Operation::*;
    vec![
        ApiEntityConfig {
            table: "users".into(),
            path_segment: "users".into(),
            operations: vec![List, Read, Create, Update, Delete],
            sensitive_columns: vec!["password".into(), "confirmation_code".into()],
        },
        ApiEntityConfig {
            table: "city".into(),
            path_segment: "cities".into(),
            operations: vec![List, Read],
            sensitive_columns: Vec::new(),
        },
        ApiEntityConfig {
            table: "state".into(),
            path_segment: "state".into(),
            operations: vec![List, Read],
            sensitive_columns: Vec::new(),
        },
    ]
}

/// Full food-delivery schema in the given PostgreSQL schema.
pub fn food_delivery(schema_name: &str) -> SchemaConfig {
    SchemaConfig {
        schema_name: schema_name.to_string(),
        tables: tables(),
        relationships: relationships(),
        api_entities: api_entities(),
    }
}
