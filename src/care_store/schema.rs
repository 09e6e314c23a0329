//! Schema of the care database: the operational tables agents read and the
//! notifications table they append to.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const RESIDENT_FK: ForeignKey = ForeignKey {
    foreign_table: "residents",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const STAFF_CASCADE_FK: ForeignKey = ForeignKey {
    foreign_table: "staff",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const STAFF_SET_NULL_FK: ForeignKey = ForeignKey {
    foreign_table: "staff",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const RESIDENTS_TABLE_V1: Table = Table {
    name: "residents",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("room", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
};

const STAFF_TABLE_V1: Table = Table {
    name: "staff",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("role", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

const INVENTORY_ITEMS_TABLE_V1: Table = Table {
    name: "inventory_items",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("stock", &SqlType::Integer, non_null = true),
        sqlite_column!("min_stock", &SqlType::Integer, non_null = true),
        sqlite_column!("unit", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

const ACTIVITY_LOGS_TABLE_V1: Table = Table {
    name: "activity_logs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "resident_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RESIDENT_FK)
        ),
        sqlite_column!(
            "author_id",
            &SqlType::Integer,
            foreign_key = Some(&STAFF_SET_NULL_FK)
        ),
        sqlite_column!("log_type", &SqlType::Text, non_null = true),
        sqlite_column!("details", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_activity_logs_created_at", "created_at")],
};

const TASKS_TABLE_V1: Table = Table {
    name: "tasks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_tasks_status", "status")],
};

const ATTENDANCE_TABLE_V1: Table = Table {
    name: "attendance",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "staff_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&STAFF_CASCADE_FK)
        ),
        sqlite_column!("check_in", &SqlType::Integer, non_null = true),
        sqlite_column!("check_out", &SqlType::Integer),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_attendance_created_at", "created_at")],
};

const FAMILY_MESSAGES_TABLE_V1: Table = Table {
    name: "family_messages",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "resident_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&RESIDENT_FK)
        ),
        sqlite_column!("author_name", &SqlType::Text, non_null = true),
        sqlite_column!("content", &SqlType::Text, non_null = true),
        sqlite_column!("from_family", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[(
        "idx_family_messages_resident_created",
        "resident_id, created_at DESC",
    )],
};

const NOTIFICATIONS_TABLE_V1: Table = Table {
    name: "notifications",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("message", &SqlType::Text, non_null = true),
        sqlite_column!("notification_type", &SqlType::Text, non_null = true),
        sqlite_column!(
            "is_read",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_notifications_created_at", "created_at DESC")],
};

pub static CARE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        RESIDENTS_TABLE_V1,
        STAFF_TABLE_V1,
        INVENTORY_ITEMS_TABLE_V1,
        ACTIVITY_LOGS_TABLE_V1,
        TASKS_TABLE_V1,
        ATTENDANCE_TABLE_V1,
        FAMILY_MESSAGES_TABLE_V1,
        NOTIFICATIONS_TABLE_V1,
    ],
    migration: None,
}];
