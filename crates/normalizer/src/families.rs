//! Built-in schemas for the fixed upstream entity families.
//!
//! Field lists mirror the source-of-record payloads. The five families feed
//! two merges: fixed-asset + tool + inventory-item into the unified
//! inventory table, requested-tool + requested-inventory into the unified
//! requests table.

use crate::schema::{EntitySchema, Source, SubObject};

const STORE_FIELDS: &[&str] = &[
    "id",
    "store_name",
    "location",
    "project_id",
    "store_keeper_id",
    "description",
    "is_permanent",
    "created_by",
    "updated_by",
    "is_deleted",
    "created_at",
    "updated_at",
];

const UOM_FIELDS: &[&str] = &[
    "id",
    "name",
    "is_countable",
    "created_by",
    "updated_by",
    "is_deleted",
    "description",
    "created_at",
    "updated_at",
];

const CURRENCY_FIELDS: &[&str] = &[
    "id",
    "name",
    "code",
    "symbol",
    "format",
    "exchange_rate",
    "active",
    "created_at",
    "updated_at",
    "is_offshore",
];

const STATUS_FIELDS: &[&str] = &[
    "id",
    "status_name",
    "created_by",
    "updated_by",
    "is_deleted",
    "description",
    "created_at",
    "updated_at",
];

const TYPE_FIELDS: &[&str] = &[
    "id",
    "inventory_type",
    "created_by",
    "updated_by",
    "is_deleted",
    "description",
    "created_at",
    "updated_at",
];

const PROJECT_FIELDS: &[&str] = &[
    "id",
    "project_name",
    "budget",
    "currency_id",
    "contract_sign_date",
    "client_id",
    "start_date",
    "lc_opening_date",
    "advance_payment_date",
    "end_date",
    "forex_resource",
    "isActive",
    "milestone_amount",
    "isDeleted",
    "system_id",
    "contract_payment",
    "forex_contract_payment",
    "forex_contract_payment_currency",
    "is_office",
    "created_by",
    "updated_by",
    "created_at",
    "updated_at",
    "plannedStart",
    "plannedFinish",
    "startVariance",
    "finishVariance",
    "actualStart",
    "actualFinish",
    "start",
    "finish",
    "duration",
    "actualDuration",
    "isOpportunity",
    "sector_id",
    "businessUnitId",
];

/// Stock-view output columns shared by the three inventory-side families.
const STOCK_COLUMNS: &[&str] = &[
    "id",
    "item_name",
    "price",
    "amount",
    "is_consumable",
    "department_id",
    "date_of_purchased",
    "description",
    "store_store_name",
    "uom_name",
    "quantity",
];

const STOCK_MEASURES: &[&str] = &["quantity", "amount"];

/// Request-view output columns shared by the two requested families.
const REQUEST_COLUMNS: &[&str] = &[
    "id",
    "item_name",
    "requested_date",
    "requested_project_name",
    "requested_quantity",
    "requester_id",
    "requester_name",
    "requester_received_date",
    "status_name",
    "store_name",
    "tool_id",
    "uom_name",
    "is_returned",
    "current_consumed_amount",
    "returned_quantity",
];

const REQUEST_MEASURES: &[&str] = &["requested_quantity", "item_name"];

pub static FIXED_ASSET: EntitySchema = EntitySchema {
    family: "fixed-asset",
    source: Source::Asset,
    output_columns: STOCK_COLUMNS,
    sub_objects: &[
        SubObject { name: "store", fields: STORE_FIELDS },
        SubObject { name: "uom", fields: UOM_FIELDS },
        SubObject { name: "currency", fields: CURRENCY_FIELDS },
        SubObject { name: "department", fields: &[] },
        SubObject { name: "manufacturer", fields: &[] },
        SubObject { name: "category", fields: &[] },
        SubObject { name: "asset_user", fields: &[] },
    ],
    renames: &[],
    excluded_fields: &[],
    id_columns: &["id"],
    measure_columns: STOCK_MEASURES,
    constants: &[("is_fixed_asset", 1)],
};

pub static TOOL: EntitySchema = EntitySchema {
    family: "tool",
    source: Source::Tools,
    output_columns: STOCK_COLUMNS,
    sub_objects: &[
        SubObject { name: "store", fields: STORE_FIELDS },
        SubObject { name: "status", fields: STATUS_FIELDS },
        SubObject { name: "uom", fields: UOM_FIELDS },
        SubObject { name: "currency", fields: CURRENCY_FIELDS },
        SubObject { name: "department", fields: &[] },
        SubObject { name: "manufacturer", fields: &[] },
        SubObject { name: "category", fields: &[] },
    ],
    renames: &[],
    excluded_fields: &["inventory_user"],
    id_columns: &["id"],
    measure_columns: STOCK_MEASURES,
    constants: &[],
};

pub static INVENTORY_ITEM: EntitySchema = EntitySchema {
    family: "inventory-item",
    source: Source::Inventory,
    output_columns: STOCK_COLUMNS,
    sub_objects: &[
        SubObject { name: "type", fields: TYPE_FIELDS },
        SubObject { name: "project", fields: PROJECT_FIELDS },
        SubObject { name: "store", fields: STORE_FIELDS },
        SubObject { name: "status", fields: STATUS_FIELDS },
        SubObject { name: "uom", fields: UOM_FIELDS },
        SubObject { name: "currency", fields: CURRENCY_FIELDS },
        SubObject { name: "department", fields: &[] },
        SubObject { name: "manufacturer", fields: &[] },
        SubObject { name: "category", fields: &[] },
    ],
    renames: &[],
    excluded_fields: &["inventory_user"],
    id_columns: &["id"],
    measure_columns: STOCK_MEASURES,
    constants: &[],
};

pub static REQUESTED_TOOL: EntitySchema = EntitySchema {
    family: "requested-tool",
    source: Source::Tools,
    output_columns: REQUEST_COLUMNS,
    sub_objects: &[],
    renames: &[],
    excluded_fields: &[],
    id_columns: &["id", "tool_id"],
    measure_columns: REQUEST_MEASURES,
    constants: &[],
};

pub static REQUESTED_INVENTORY: EntitySchema = EntitySchema {
    family: "requested-inventory",
    source: Source::Inventory,
    output_columns: REQUEST_COLUMNS,
    sub_objects: &[],
    renames: &[("name", "requester_name"), ("inventory_id", "tool_id")],
    excluded_fields: &[],
    id_columns: &["id", "tool_id"],
    measure_columns: REQUEST_MEASURES,
    constants: &[],
};

/// All built-in family schemas.
pub static ALL: &[&EntitySchema] = &[
    &FIXED_ASSET,
    &TOOL,
    &INVENTORY_ITEM,
    &REQUESTED_TOOL,
    &REQUESTED_INVENTORY,
];
