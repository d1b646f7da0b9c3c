//! Composite (pk, sk) keys of the `entities` table.
//!
//! | pk                 | sk                 | item                 |
//! |--------------------|--------------------|----------------------|
//! | `SHORTURL#<code>`  | `DETAILS`          | short URL record     |
//! | `USER#<owner>`     | `SHORTURL#<code>`  | owner index entry    |
//! | `shorturl:counter` | `COUNTER`          | fallback counter     |
//! | `SHORTURL#<code>`  | `DAY#<YYYY-MM-DD>` | daily rollup         |
//! | `SHORTURL#<code>`  | `EVENT#<key>`      | applied-event marker |

use chrono::NaiveDate;

pub const SHORT_URL_PREFIX: &str = "SHORTURL#";
pub const OWNER_PREFIX: &str = "USER#";
pub const DAY_PREFIX: &str = "DAY#";
pub const EVENT_PREFIX: &str = "EVENT#";

pub const DETAILS_SK: &str = "DETAILS";
pub const COUNTER_PK: &str = "shorturl:counter";
pub const COUNTER_SK: &str = "COUNTER";

const DAY_FORMAT: &str = "%Y-%m-%d";

pub fn short_url_pk(code: &str) -> String {
    format!("{SHORT_URL_PREFIX}{code}")
}

pub fn owner_pk(owner_id: &str) -> String {
    format!("{OWNER_PREFIX}{owner_id}")
}

pub fn day_sk(day: NaiveDate) -> String {
    format!("{DAY_PREFIX}{}", day.format(DAY_FORMAT))
}

pub fn event_sk(event_key: &str) -> String {
    format!("{EVENT_PREFIX}{event_key}")
}

pub fn parse_day_sk(sk: &str) -> Option<NaiveDate> {
    let day = sk.strip_prefix(DAY_PREFIX)?;
    NaiveDate::parse_from_str(day, DAY_FORMAT).ok()
}
