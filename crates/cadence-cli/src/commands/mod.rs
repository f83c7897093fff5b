pub mod add;
pub mod backfill;
pub mod r#do;
pub mod list;
pub mod preview;
pub mod status;
