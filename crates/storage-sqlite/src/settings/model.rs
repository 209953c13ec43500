//! Database model for ledger settings.

use diesel::prelude::*;

/// One key/value row of `app_settings`.
#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::app_settings)]
pub struct AppSettingDB {
    pub setting_key: String,
    pub setting_value: String,
}
