//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    royalties (id) {
        id -> Uuid,
        author_id -> Uuid,
        work_id -> Nullable<Uuid>,
        amount -> Int8,
        approved -> Bool,
        paid -> Bool,
        paid_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    withdrawals (id) {
        id -> Uuid,
        author_id -> Uuid,
        amount -> Int8,
        #[max_length = 32]
        method -> Varchar,
        #[max_length = 32]
        mobile_money_number -> Nullable<Varchar>,
        #[max_length = 255]
        bank_name -> Nullable<Varchar>,
        #[max_length = 64]
        bank_account -> Nullable<Varchar>,
        #[max_length = 255]
        bank_account_name -> Nullable<Varchar>,
        #[max_length = 32]
        status -> Varchar,
        requested_at -> Timestamptz,
        validated_at -> Nullable<Timestamptz>,
        paid_at -> Nullable<Timestamptz>,
        rejection_reason -> Nullable<Text>,
        validator_id -> Nullable<Uuid>,
        notes -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(royalties, withdrawals);
